//! Synthetic fleet history — the parametric daily demand model.
//!
//! `generate` bootstraps N days × M machines of observations from a seeded
//! stream; the engine's day-advance step reuses the same demand chain via
//! `draw_day` with its own festival constant and an optional storm collapse.
//!
//! The multiplicative adjustments compose in a fixed order and are never
//! reordered: payday → weekend → location → festival → storm.

use crate::observation::Observation;
use crate::rng::{RngBank, StreamRng};
use crate::types::{LocationType, MachineId, Money};
use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// First date of a bootstrapped history.
pub const START_DATE: (i32, u32, u32) = (2024, 1, 1);

/// Days generated by a full reset.
pub const BOOTSTRAP_DAYS: u32 = 365;

const WITHDRAW_MEAN: f64 = 500_000.0;
const WITHDRAW_SD: f64 = 50_000.0;
const DEPOSIT_MEAN: f64 = 300_000.0;
const DEPOSIT_SD: f64 = 30_000.0;

const PAYDAY_SPIKE: f64 = 1.4;
const WEEKEND_SPIKE: f64 = 1.2;

/// Festival withdrawal multiplier during history bootstrap. The live
/// day-advance step uses the larger FESTIVAL_SPIKE_LIVE — two distinct
/// constants, kept separate on purpose.
pub const FESTIVAL_SPIKE_BOOTSTRAP: f64 = 1.8;

/// Festival withdrawal multiplier applied by the day-advance step.
pub const FESTIVAL_SPIKE_LIVE: f64 = 2.5;

/// Independent per-machine-day probability of a spontaneous festival.
pub const FESTIVAL_CHANCE: f64 = 0.02;

/// Storm demand collapse: both sides of the flow drop to 20%.
pub const STORM_COLLAPSE: f64 = 0.2;

/// The raw demand outcome for one machine-day, before health and unit
/// economics are attached.
#[derive(Debug, Clone, Copy)]
pub struct DayDraw {
    pub withdrawals: Money,
    pub deposits:    Money,
    pub is_weekend:  bool,
    pub is_payday:   bool,
    pub is_festival: bool,
}

pub fn is_payday(date: NaiveDate) -> bool {
    matches!(date.day(), 1..=5 | 30 | 31)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Draw one machine-day of demand.
///
/// `festival_forced` short-circuits the spontaneous festival roll (a
/// scheduled festival consumes no RNG for the flag). `festival_spike`
/// differs between bootstrap and live advancement. Amounts truncate to
/// whole units; negative tail draws pass through untouched.
pub fn draw_day(
    rng: &mut StreamRng,
    date: NaiveDate,
    location: LocationType,
    festival_forced: bool,
    festival_spike: f64,
    storm: bool,
) -> DayDraw {
    let mut withdraw = rng.normal(WITHDRAW_MEAN, WITHDRAW_SD);
    let mut deposit = rng.normal(DEPOSIT_MEAN, DEPOSIT_SD);

    let payday = is_payday(date);
    if payday {
        withdraw *= PAYDAY_SPIKE;
    }

    let weekend = is_weekend(date);
    if weekend {
        withdraw *= WEEKEND_SPIKE;
    }

    match location {
        LocationType::Market => {
            deposit *= 1.6;
            withdraw *= 0.8;
        }
        LocationType::Residential => {
            deposit *= 0.3;
            withdraw *= 1.2;
        }
    }

    let festival = festival_forced || rng.chance(FESTIVAL_CHANCE);
    if festival {
        withdraw *= festival_spike;
    }

    if storm {
        withdraw *= STORM_COLLAPSE;
        deposit *= STORM_COLLAPSE;
    }

    DayDraw {
        withdrawals: withdraw as Money,
        deposits: deposit as Money,
        is_weekend: weekend,
        is_payday: payday,
        is_festival: festival,
    }
}

/// Generate a fresh history of `n_days` × `n_machines` observations.
/// Pure function of the seed: the same seed always yields the same rows.
/// Rows are grouped by machine, date-ascending within each machine.
pub fn generate(n_days: u32, n_machines: MachineId, seed: u64) -> Vec<Observation> {
    let bank = RngBank::new(seed);
    let mut rng = bank.bootstrap();
    let start = start_date();

    let mut rows = Vec::with_capacity(n_days as usize * n_machines as usize);
    for machine_id in 0..n_machines {
        let location = LocationType::for_machine(machine_id);
        for offset in 0..n_days {
            let date = start + Duration::days(offset as i64);
            let draw = draw_day(&mut rng, date, location, false, FESTIVAL_SPIKE_BOOTSTRAP, false);
            // Bootstrap health is an independent draw near the top of the
            // scale; the live random-walk decay only starts once the
            // engine advances days.
            let health = 100.0 - rng.uniform(0.0, 5.0);
            rows.push(Observation::new(
                date,
                machine_id,
                location,
                draw.is_weekend,
                draw.is_payday,
                draw.is_festival,
                draw.withdrawals,
                draw.deposits,
                health,
            ));
        }
    }
    rows
}

pub fn start_date() -> NaiveDate {
    let (y, m, d) = START_DATE;
    NaiveDate::from_ymd_opt(y, m, d).expect("static start date is valid")
}
