//! Data generator tests — demand model invariants.

use cashcycle_core::generator;
use cashcycle_core::types::LocationType;
use chrono::Datelike;

/// Every generated row satisfies net_cash_flow == deposits - withdrawals.
#[test]
fn net_flow_invariant_holds_on_every_row() {
    let rows = generator::generate(365, 5, 42);
    for obs in &rows {
        assert_eq!(
            obs.net_cash_flow(),
            obs.deposits - obs.withdrawals,
            "net flow drifted for machine {} on {}",
            obs.machine_id,
            obs.date
        );
    }
}

/// A bootstrap produces exactly n_days × n_machines observations.
#[test]
fn bootstrap_row_count() {
    let rows = generator::generate(365, 5, 42);
    assert_eq!(rows.len(), 365 * 5);

    let rows = generator::generate(30, 3, 42);
    assert_eq!(rows.len(), 30 * 3);
}

/// Even machine ids are Market, odd ids Residential.
#[test]
fn location_follows_machine_parity() {
    let rows = generator::generate(10, 5, 42);
    for obs in &rows {
        let expected = if obs.machine_id % 2 == 0 {
            LocationType::Market
        } else {
            LocationType::Residential
        };
        assert_eq!(obs.location_type, expected);
    }
}

/// Calendar flags match the row's date: payday on month edges, weekend
/// on Saturday/Sunday.
#[test]
fn calendar_flags_match_dates() {
    let rows = generator::generate(60, 2, 42);
    for obs in &rows {
        assert_eq!(
            obs.is_payday,
            matches!(obs.date.day(), 1..=5 | 30 | 31),
            "payday flag wrong on {}",
            obs.date
        );
        assert_eq!(
            obs.is_weekend,
            obs.date.weekday().number_from_monday() >= 6,
            "weekend flag wrong on {}",
            obs.date
        );
    }
}

/// Health starts near the top of the scale: 100 - U(0, 5).
#[test]
fn bootstrap_health_stays_in_band() {
    let rows = generator::generate(90, 5, 42);
    for obs in &rows {
        assert!(
            obs.health > 95.0 - f64::EPSILON && obs.health <= 100.0,
            "health {} outside bootstrap band",
            obs.health
        );
    }
}

/// Residential machines see markedly lower deposits than Market machines
/// (0.3x vs 1.6x location multipliers) over a long run.
#[test]
fn market_machines_collect_more_deposits() {
    let rows = generator::generate(365, 2, 42);
    let avg = |id: u32| {
        let series: Vec<_> = rows.iter().filter(|o| o.machine_id == id).collect();
        series.iter().map(|o| o.deposits as f64).sum::<f64>() / series.len() as f64
    };
    let market = avg(0);
    let residential = avg(1);
    assert!(
        market > residential * 3.0,
        "market avg {market} vs residential avg {residential}"
    );
}
