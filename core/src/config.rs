//! Runtime operating parameters, owned by the service façade.

use crate::types::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTolerance {
    Aggressive,
    Moderate,
    Conservative,
}

impl RiskTolerance {
    /// Fixed threshold lookup: (min_cash_threshold, max_cash_threshold).
    pub fn thresholds(self) -> (Money, Money) {
        match self {
            Self::Aggressive => (50_000, 300_000),
            Self::Moderate => (100_000, 500_000),
            Self::Conservative => (200_000, 800_000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub risk_tolerance:      RiskTolerance,
    pub min_cash_threshold:  Money,
    pub max_cash_threshold:  Money,
    pub cost_per_trip:       Money,
    /// ~7% per annum.
    pub interest_rate_daily: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let (min, max) = RiskTolerance::Moderate.thresholds();
        Self {
            risk_tolerance: RiskTolerance::Moderate,
            min_cash_threshold: min,
            max_cash_threshold: max,
            cost_per_trip: 2_000,
            interest_rate_daily: 0.0002,
        }
    }
}

/// A partial configuration update from the service boundary. Absent
/// fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    pub risk_tolerance:      Option<RiskTolerance>,
    pub min_cash_threshold:  Option<Money>,
    pub max_cash_threshold:  Option<Money>,
    pub cost_per_trip:       Option<Money>,
    pub interest_rate_daily: Option<f64>,
}

impl RuntimeConfig {
    /// Apply an update. A risk-tolerance change cascades through the
    /// lookup table and overwrites both thresholds, including any
    /// explicit threshold values carried in the same update.
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(min) = update.min_cash_threshold {
            self.min_cash_threshold = min;
        }
        if let Some(max) = update.max_cash_threshold {
            self.max_cash_threshold = max;
        }
        if let Some(cost) = update.cost_per_trip {
            self.cost_per_trip = cost;
        }
        if let Some(rate) = update.interest_rate_daily {
            self.interest_rate_daily = rate;
        }
        if let Some(risk) = update.risk_tolerance {
            let (min, max) = risk.thresholds();
            self.risk_tolerance = risk;
            self.min_cash_threshold = min;
            self.max_cash_threshold = max;
        }
    }
}
