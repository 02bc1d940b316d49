//! Forecast boundary — the regression model is an external collaborator.
//!
//! The core never inspects the predictor's internals. It hands over rows
//! with a fixed column contract and takes back one net-flow value per
//! row, same order. Any numeric output (negative, zero) is valid. A
//! predictor failure is fatal to the forecast call: no retry, no
//! degraded output.

use crate::error::SimResult;
use crate::types::MachineId;
use serde::Serialize;

/// The fixed predictor input contract. Field order is the column order:
/// machine_id, is_weekend, is_payday, is_festival, net_flow_lag_7,
/// net_flow_rolling_3.
#[derive(Debug, Clone, Serialize)]
pub struct FeatureVector {
    pub machine_id:         MachineId,
    pub is_weekend:         bool,
    pub is_payday:          bool,
    pub is_festival:        bool,
    pub net_flow_lag_7:     f64,
    pub net_flow_rolling_3: f64,
}

/// Anything that can map feature rows to predicted net cash flows.
pub trait NetFlowPredictor {
    /// One prediction per input row, in input order.
    fn predict(&self, rows: &[FeatureVector]) -> SimResult<Vec<f64>>;
}

/// Deterministic stand-in shipped with the crate: a blend of weekly
/// seasonality (lag-7) and the short-term trend (rolling-3). A trained
/// regressor slots in behind the same trait.
pub struct SeasonalBaseline;

impl NetFlowPredictor for SeasonalBaseline {
    fn predict(&self, rows: &[FeatureVector]) -> SimResult<Vec<f64>> {
        Ok(rows
            .iter()
            .map(|r| 0.5 * r.net_flow_lag_7 + 0.5 * r.net_flow_rolling_3)
            .collect())
    }
}
