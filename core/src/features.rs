//! Lag and rolling-window features over the raw history.
//!
//! RULE: derivation always starts from raw observations. The signature
//! only accepts `Observation`s — a derived row cannot be fed back in, so
//! the 7-day trim can never compound across repeated calls.

use crate::observation::Observation;
use crate::types::{MachineId, Money};
use std::collections::BTreeMap;

/// How many leading rows per machine lack a lag-7 value and are dropped.
pub const LAG_WINDOW: usize = 7;

/// Trailing window length for the rolling mean (inclusive of the current day).
pub const ROLLING_WINDOW: usize = 3;

/// A raw observation plus its derived seasonality features. Rows without
/// enough same-machine history never appear here.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub observation: Observation,
    /// Net cash flow exactly one week prior, same machine.
    pub net_flow_lag_7: Money,
    /// Mean net cash flow over the trailing 3 days, same machine,
    /// including the current day.
    pub net_flow_rolling_3: f64,
}

/// Compute lag/rolling features per machine and drop every row whose lag
/// is undefined — exactly the first LAG_WINDOW rows of each machine's
/// series. For N days × M machines (N > 7) the output has M × (N − 7)
/// rows, grouped by machine id ascending, date ascending within machine.
pub fn derive(history: &[Observation]) -> Vec<FeatureRow> {
    let mut by_machine: BTreeMap<MachineId, Vec<&Observation>> = BTreeMap::new();
    for obs in history {
        by_machine.entry(obs.machine_id).or_default().push(obs);
    }

    let mut rows = Vec::with_capacity(history.len());
    for series in by_machine.values_mut() {
        series.sort_by_key(|obs| obs.date);
        for i in LAG_WINDOW..series.len() {
            let lag = series[i - LAG_WINDOW].net_cash_flow();
            let window = &series[i + 1 - ROLLING_WINDOW..=i];
            let rolling = window.iter().map(|o| o.net_cash_flow() as f64).sum::<f64>()
                / ROLLING_WINDOW as f64;
            rows.push(FeatureRow {
                observation: series[i].clone(),
                net_flow_lag_7: lag,
                net_flow_rolling_3: rolling,
            });
        }
    }
    rows
}
