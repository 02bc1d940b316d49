//! Service façade tests — configuration cascade, forecasting through a
//! stub predictor, and the detail views.

use cashcycle_core::config::{ConfigUpdate, RiskTolerance};
use cashcycle_core::error::{SimError, SimResult};
use cashcycle_core::observation::Observation;
use cashcycle_core::optimizer::{FlowStatus, RebalanceAction};
use cashcycle_core::predictor::{FeatureVector, NetFlowPredictor, SeasonalBaseline};
use cashcycle_core::service::CashService;
use cashcycle_core::store::HistoryStore;
use cashcycle_core::types::{LocationType, ShockEvent, FLEET_SIZE};
use chrono::NaiveDate;

/// Returns a canned prediction per machine, in input order.
struct FixedPredictor(Vec<f64>);

impl NetFlowPredictor for FixedPredictor {
    fn predict(&self, _rows: &[FeatureVector]) -> SimResult<Vec<f64>> {
        Ok(self.0.clone())
    }
}

/// Always fails, standing in for a missing model artifact.
struct BrokenPredictor;

impl NetFlowPredictor for BrokenPredictor {
    fn predict(&self, _rows: &[FeatureVector]) -> SimResult<Vec<f64>> {
        Err(SimError::PredictorUnavailable("model file missing".into()))
    }
}

fn service_with(predictor: Box<dyn NetFlowPredictor>) -> CashService {
    CashService::new(HistoryStore::in_memory().unwrap(), 42, predictor).unwrap()
}

/// Selecting a risk tolerance overwrites both thresholds from the fixed
/// lookup table.
#[test]
fn risk_tolerance_cascades_to_thresholds() {
    let mut service = service_with(Box::new(SeasonalBaseline));
    assert_eq!(service.config().min_cash_threshold, 100_000);
    assert_eq!(service.config().max_cash_threshold, 500_000);

    service.update_config(ConfigUpdate {
        risk_tolerance: Some(RiskTolerance::Aggressive),
        ..Default::default()
    });
    assert_eq!(service.config().min_cash_threshold, 50_000);
    assert_eq!(service.config().max_cash_threshold, 300_000);

    service.update_config(ConfigUpdate {
        risk_tolerance: Some(RiskTolerance::Conservative),
        ..Default::default()
    });
    assert_eq!(service.config().min_cash_threshold, 200_000);
    assert_eq!(service.config().max_cash_threshold, 800_000);
}

/// Explicit threshold values apply when no risk change rides along, and
/// lose to the lookup table when one does.
#[test]
fn risk_cascade_wins_over_explicit_thresholds() {
    let mut service = service_with(Box::new(SeasonalBaseline));

    service.update_config(ConfigUpdate {
        min_cash_threshold: Some(75_000),
        ..Default::default()
    });
    assert_eq!(service.config().min_cash_threshold, 75_000);
    assert_eq!(service.config().risk_tolerance, RiskTolerance::Moderate);

    service.update_config(ConfigUpdate {
        risk_tolerance: Some(RiskTolerance::Moderate),
        min_cash_threshold: Some(1),
        max_cash_threshold: Some(2),
        ..Default::default()
    });
    assert_eq!(service.config().min_cash_threshold, 100_000);
    assert_eq!(service.config().max_cash_threshold, 500_000);
}

/// Canned predictions flow through classification into the expected
/// schedule under the configured thresholds.
#[test]
fn forecast_runs_predictions_through_the_optimizer() {
    let mut service = service_with(Box::new(FixedPredictor(vec![
        150_000.0, -120_000.0, 0.0, -200_000.0, 0.0,
    ])));
    service.update_config(ConfigUpdate {
        min_cash_threshold: Some(100_000),
        max_cash_threshold: Some(100_000),
        ..Default::default()
    });

    let plan = service.forecast().unwrap();

    assert_eq!(plan.network_status.len(), FLEET_SIZE as usize);
    assert_eq!(plan.network_status[0].status, FlowStatus::Surplus);
    assert_eq!(
        plan.rebalancing_schedule,
        vec![
            RebalanceAction::InterAtmTransfer {
                source: 0,
                destination: 1,
                amount: 120_000,
            },
            RebalanceAction::VaultRefill {
                destination: 3,
                amount: 200_000,
            },
        ]
    );
}

/// A failing predictor is fatal to the forecast call — no retry, no
/// degraded output.
#[test]
fn predictor_failure_surfaces_as_unavailable() {
    let service = service_with(Box::new(BrokenPredictor));
    match service.forecast() {
        Err(SimError::PredictorUnavailable(_)) => {}
        other => panic!("expected PredictorUnavailable, got {other:?}"),
    }
}

/// A predictor that returns the wrong number of outputs violates the
/// contract and is treated as unavailable.
#[test]
fn short_prediction_vector_is_rejected() {
    let service = service_with(Box::new(FixedPredictor(vec![1.0, 2.0])));
    match service.forecast() {
        Err(SimError::PredictorUnavailable(_)) => {}
        other => panic!("expected PredictorUnavailable, got {other:?}"),
    }
}

/// Machines with fewer than 7 days of history get zero-valued lag and
/// rolling features instead of blocking the forecast.
#[test]
fn short_history_machines_get_zero_features() {
    // Seed the store with only 3 days per machine, below the lag window.
    let mut store = HistoryStore::in_memory().unwrap();
    store.migrate().unwrap();
    let mut rows = Vec::new();
    for machine_id in 0..FLEET_SIZE {
        for day in 1..=3 {
            rows.push(Observation::new(
                NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
                machine_id,
                LocationType::for_machine(machine_id),
                false,
                true,
                false,
                500_000,
                300_000,
                99.0,
            ));
        }
    }
    store.replace_history(&rows, &[]).unwrap();

    // SeasonalBaseline blends the (zeroed) features, so every machine
    // predicts 0 and classifies stable.
    let service = CashService::new(store, 42, Box::new(SeasonalBaseline)).unwrap();
    let plan = service.forecast().unwrap();

    assert_eq!(plan.network_status.len(), FLEET_SIZE as usize);
    for machine in &plan.network_status {
        assert_eq!(machine.net_flow, 0);
        assert_eq!(machine.status, FlowStatus::Stable);
    }
    assert!(plan.rebalancing_schedule.is_empty());
}

/// Status reports the latest day's aggregate flow and at most a 30-day
/// trend window.
#[test]
fn network_status_aggregates_latest_day() {
    let service = service_with(Box::new(SeasonalBaseline));
    let status = service.network_status().unwrap();

    let latest = service.engine().latest_date().unwrap();
    assert_eq!(status.date, latest);

    let expected: i64 = service
        .engine()
        .history()
        .iter()
        .filter(|o| o.date == latest)
        .map(|o| o.net_cash_flow())
        .sum();
    assert_eq!(status.total_cash_flow, expected);

    assert!(!status.chart_data.is_empty() && status.chart_data.len() <= 30);
    assert_eq!(status.chart_data.last().unwrap().date, latest);
}

/// Detail lookups for machines outside the fleet report not-found
/// instead of defaulting.
#[test]
fn unknown_machine_detail_is_not_found() {
    let service = service_with(Box::new(SeasonalBaseline));
    match service.machine_detail(99) {
        Err(SimError::MachineNotFound { machine_id: 99 }) => {}
        other => panic!("expected MachineNotFound, got {other:?}"),
    }
}

/// The drill-down view carries 30-day histories and consistent unit
/// economics.
#[test]
fn machine_detail_reports_consistent_windows() {
    let service = service_with(Box::new(SeasonalBaseline));
    let detail = service.machine_detail(0).unwrap();

    assert_eq!(detail.machine_id, 0);
    assert_eq!(detail.location_type, "Market");
    assert!(!detail.transaction_history.is_empty());
    assert!(detail.transaction_history.len() <= 30);
    assert_eq!(
        detail.transaction_history.len(),
        detail.financial_history.len()
    );
    assert!(detail.refill_history.len() <= 5);
    assert!(detail.health > 0.0 && detail.health <= 100.0);

    let volume: i64 = detail
        .transaction_history
        .iter()
        .map(|d| d.withdrawals + d.deposits)
        .sum();
    assert_eq!(detail.total_30d_volume, volume);
}

/// Injected events reach the engine through the façade.
#[test]
fn inject_event_reaches_the_engine() {
    let mut service = service_with(Box::new(SeasonalBaseline));
    service.inject_event(ShockEvent::Storm);
    assert_eq!(service.engine().pending_event(), Some(ShockEvent::Storm));
    service.advance_day().unwrap();
    assert_eq!(service.engine().pending_event(), None);
}
