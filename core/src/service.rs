//! Service façade — binds the engine, the predictor, and the optimizer
//! behind the operations the external boundary exposes 1:1.
//!
//! Owns the runtime configuration. All methods run to completion before
//! returning; the façade assumes at most one mutating caller at a time,
//! enforced outside this crate.

use crate::config::{ConfigUpdate, RuntimeConfig};
use crate::engine::SimulationEngine;
use crate::error::{SimError, SimResult};
use crate::generator;
use crate::observation::Observation;
use crate::optimizer::{self, RebalancePlan};
use crate::predictor::{FeatureVector, NetFlowPredictor};
use crate::store::HistoryStore;
use crate::types::{MachineId, Money, ShockEvent, FLEET_SIZE};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

/// Days of history included in trend and detail views.
const TREND_WINDOW_DAYS: i64 = 30;

/// Net inflows above this size are surfaced as probable refill events.
const REFILL_SIGNATURE: Money = 200_000;

pub struct CashService {
    engine:    SimulationEngine,
    predictor: Box<dyn NetFlowPredictor>,
    config:    RuntimeConfig,
}

// ── Report types ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct DailyFlow {
    pub date:     NaiveDate,
    pub net_flow: Money,
}

/// Fleet-level status: the latest day's aggregate flow plus a trend
/// window for charting.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkStatus {
    pub date:            NaiveDate,
    pub total_cash_flow: Money,
    pub chart_data:      Vec<DailyFlow>,
    pub config:          RuntimeConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthBand {
    #[serde(rename = "OK")]
    Ok,
    Caution,
    Critical,
}

impl HealthBand {
    fn for_health(health: f64) -> Self {
        if health > 80.0 {
            Self::Ok
        } else if health > 50.0 {
            Self::Caution
        } else {
            Self::Critical
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionDay {
    pub date:        NaiveDate,
    pub withdrawals: Money,
    pub deposits:    Money,
    pub net_flow:    Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinancialDay {
    pub date:    NaiveDate,
    pub revenue: Money,
    pub cost:    Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct DenominationSlice {
    pub name:  &'static str,
    pub value: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RefillEvent {
    pub date:   NaiveDate,
    pub amount: Money,
}

/// Drill-down view for a single machine.
#[derive(Debug, Clone, Serialize)]
pub struct MachineDetail {
    pub machine_id:          MachineId,
    pub location_type:       &'static str,
    pub status:              HealthBand,
    pub health:              f64,
    pub current_net_flow:    Money,
    pub avg_daily_flow:      Money,
    pub total_30d_volume:    Money,
    pub total_revenue:       Money,
    pub total_cost:          Money,
    pub roi:                 f64,
    pub denom_mix:           Vec<DenominationSlice>,
    pub transaction_history: Vec<TransactionDay>,
    pub financial_history:   Vec<FinancialDay>,
    pub refill_history:      Vec<RefillEvent>,
}

// ── Operations ─────────────────────────────────────────────

impl CashService {
    pub fn new(
        store: HistoryStore,
        seed: u64,
        predictor: Box<dyn NetFlowPredictor>,
    ) -> SimResult<Self> {
        Ok(Self {
            engine: SimulationEngine::load_or_init(store, seed)?,
            predictor,
            config: RuntimeConfig::default(),
        })
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn update_config(&mut self, update: ConfigUpdate) -> &RuntimeConfig {
        self.config.apply(update);
        log::info!("config updated: {:?}", self.config);
        &self.config
    }

    pub fn engine(&self) -> &SimulationEngine {
        &self.engine
    }

    pub fn advance_day(&mut self) -> SimResult<NaiveDate> {
        self.engine.advance_day()
    }

    pub fn reset(&mut self) -> SimResult<()> {
        self.engine.reset()
    }

    pub fn inject_event(&mut self, kind: ShockEvent) {
        self.engine.set_next_event(kind);
    }

    /// Fleet status for the latest simulated day plus a 30-day trend.
    pub fn network_status(&self) -> SimResult<NetworkStatus> {
        let latest = self.latest_date()?;
        let total_cash_flow = self
            .engine
            .history()
            .iter()
            .filter(|o| o.date == latest)
            .map(|o| o.net_cash_flow())
            .sum();

        let cutoff = latest - Duration::days(TREND_WINDOW_DAYS);
        let mut by_date: std::collections::BTreeMap<NaiveDate, Money> = Default::default();
        for obs in self.engine.history().iter().filter(|o| o.date > cutoff) {
            *by_date.entry(obs.date).or_insert(0) += obs.net_cash_flow();
        }
        let chart_data = by_date
            .into_iter()
            .map(|(date, net_flow)| DailyFlow { date, net_flow })
            .collect();

        Ok(NetworkStatus {
            date: latest,
            total_cash_flow,
            chart_data,
            config: self.config.clone(),
        })
    }

    /// Predict tomorrow's net flow per machine and turn the predictions
    /// into a rebalancing plan under the configured thresholds.
    pub fn forecast(&self) -> SimResult<RebalancePlan> {
        let inputs = self.forecast_inputs()?;
        let flows = self.predictor.predict(&inputs)?;
        if flows.len() != inputs.len() {
            return Err(SimError::PredictorUnavailable(format!(
                "expected {} predictions, got {}",
                inputs.len(),
                flows.len()
            )));
        }
        let predictions: Vec<(MachineId, f64)> = inputs
            .iter()
            .map(|r| r.machine_id)
            .zip(flows)
            .collect();
        Ok(optimizer::optimize(
            &predictions,
            self.config.min_cash_threshold,
            self.config.max_cash_threshold,
        ))
    }

    /// Build one feature row per machine for the day after the latest
    /// observation. Calendar flags come from the actual next date; a
    /// machine with fewer than 7 days of history gets zero-valued lag
    /// and rolling features rather than blocking the others.
    fn forecast_inputs(&self) -> SimResult<Vec<FeatureVector>> {
        let next_date = self
            .latest_date()?
            .succ_opt()
            .ok_or_else(|| anyhow::anyhow!("date overflow"))?;
        let is_weekend = generator::is_weekend(next_date);
        let is_payday = generator::is_payday(next_date);

        let mut inputs = Vec::with_capacity(FLEET_SIZE as usize);
        for machine_id in 0..FLEET_SIZE {
            let mut series: Vec<&Observation> = self
                .engine
                .history()
                .iter()
                .filter(|o| o.machine_id == machine_id)
                .collect();
            series.sort_by_key(|o| o.date);

            let (lag_7, rolling_3) = if series.len() < 7 {
                log::debug!("machine {machine_id}: short history, zero features");
                (0.0, 0.0)
            } else {
                let last_7 = &series[series.len() - 7..];
                let lag = last_7[0].net_cash_flow() as f64;
                let tail_3 = &last_7[4..];
                let rolling =
                    tail_3.iter().map(|o| o.net_cash_flow() as f64).sum::<f64>() / 3.0;
                (lag, rolling)
            };

            inputs.push(FeatureVector {
                machine_id,
                is_weekend,
                is_payday,
                is_festival: false,
                net_flow_lag_7: lag_7,
                net_flow_rolling_3: rolling_3,
            });
        }
        Ok(inputs)
    }

    /// Drill-down for one machine: latest state, 30-day histories, unit
    /// economics, and probable refill events. Unknown ids are reported
    /// as not-found, never defaulted.
    pub fn machine_detail(&self, machine_id: MachineId) -> SimResult<MachineDetail> {
        let mut series: Vec<&Observation> = self
            .engine
            .history()
            .iter()
            .filter(|o| o.machine_id == machine_id)
            .collect();
        if series.is_empty() {
            return Err(SimError::MachineNotFound { machine_id });
        }
        series.sort_by_key(|o| o.date);
        let latest = series[series.len() - 1];

        let cutoff = latest.date - Duration::days(TREND_WINDOW_DAYS);
        let last_30: Vec<&&Observation> = series.iter().filter(|o| o.date > cutoff).collect();

        let transaction_history = last_30
            .iter()
            .map(|o| TransactionDay {
                date: o.date,
                withdrawals: o.withdrawals,
                deposits: o.deposits,
                net_flow: o.net_cash_flow(),
            })
            .collect();
        let financial_history = last_30
            .iter()
            .map(|o| FinancialDay {
                date: o.date,
                revenue: o.revenue,
                cost: o.cost,
            })
            .collect();

        let avg_daily_flow = last_30.iter().map(|o| o.net_cash_flow()).sum::<Money>()
            / last_30.len() as Money;
        let total_30d_volume = last_30
            .iter()
            .map(|o| o.withdrawals + o.deposits)
            .sum::<Money>();
        let total_revenue = last_30.iter().map(|o| o.revenue).sum::<Money>();
        let total_cost = last_30.iter().map(|o| o.cost).sum::<Money>();
        let roi = if total_cost > 0 {
            let pct = (total_revenue - total_cost) as f64 / total_cost as f64 * 100.0;
            (pct * 10.0).round() / 10.0
        } else {
            0.0
        };

        let mix = &latest.denominations;
        let denom_mix = vec![
            DenominationSlice {
                name: "100",
                value: mix.withdrawn_100 + mix.deposited_100,
            },
            DenominationSlice {
                name: "500",
                value: mix.withdrawn_500 + mix.deposited_500,
            },
            DenominationSlice {
                name: "2000",
                value: mix.withdrawn_2000 + mix.deposited_2000,
            },
        ];

        let refill_history = series
            .iter()
            .filter(|o| o.net_cash_flow() > REFILL_SIGNATURE)
            .rev()
            .take(5)
            .map(|o| RefillEvent {
                date: o.date,
                amount: o.net_cash_flow(),
            })
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();

        Ok(MachineDetail {
            machine_id,
            location_type: latest.location_type.as_str(),
            status: HealthBand::for_health(latest.health),
            health: (latest.health * 10.0).round() / 10.0,
            current_net_flow: latest.net_cash_flow(),
            avg_daily_flow,
            total_30d_volume,
            total_revenue,
            total_cost,
            roi,
            denom_mix,
            transaction_history,
            financial_history,
            refill_history,
        })
    }

    fn latest_date(&self) -> SimResult<NaiveDate> {
        self.engine
            .latest_date()
            .ok_or_else(|| anyhow::anyhow!("engine has no history").into())
    }
}
