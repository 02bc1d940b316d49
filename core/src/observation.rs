//! One machine-day of raw fleet data.
//!
//! RULE: `net_cash_flow` is always `deposits - withdrawals` for the same
//! observation. The field is private and computed on construction — it
//! can never be stored independently of its inputs.

use crate::types::{LocationType, MachineId, Money};
use chrono::NaiveDate;
use serde::Serialize;

/// Unit counts per denomination, split separately for the withdrawn and
/// deposited sides. Counts are signed so that the rare negative demand
/// draw flows through instead of being treated as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DenominationMix {
    pub withdrawn_100:  i64,
    pub withdrawn_500:  i64,
    pub withdrawn_2000: i64,
    pub deposited_100:  i64,
    pub deposited_500:  i64,
    pub deposited_2000: i64,
}

/// A single machine-day observation: calendar flags, cash movement,
/// denomination mix, mechanical health, and unit economics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date:          NaiveDate,
    pub machine_id:    MachineId,
    pub location_type: LocationType,
    pub is_weekend:    bool,
    pub is_payday:     bool,
    pub is_festival:   bool,
    pub withdrawals:   Money,
    pub deposits:      Money,
    pub denominations: DenominationMix,
    /// Mechanical health in [0, 100].
    pub health:        f64,
    pub revenue:       Money,
    pub cost:          Money,
    net_cash_flow:     Money,
}

impl Observation {
    /// Build an observation from its raw inputs. The denomination mix,
    /// revenue, operating cost, and net cash flow are all derived here
    /// so they can never drift from withdrawals/deposits/health.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        date: NaiveDate,
        machine_id: MachineId,
        location_type: LocationType,
        is_weekend: bool,
        is_payday: bool,
        is_festival: bool,
        withdrawals: Money,
        deposits: Money,
        health: f64,
    ) -> Self {
        Self {
            date,
            machine_id,
            location_type,
            is_weekend,
            is_payday,
            is_festival,
            withdrawals,
            deposits,
            denominations: split_denominations(withdrawals, deposits),
            health,
            revenue: revenue(withdrawals, deposits),
            cost: operating_cost(health),
            net_cash_flow: deposits - withdrawals,
        }
    }

    /// Deposits minus withdrawals. Positive = surplus, negative = deficit.
    pub fn net_cash_flow(&self) -> Money {
        self.net_cash_flow
    }
}

/// Fixed-ratio decomposition of a day's cash movement into note counts.
/// Withdrawals: 30% in 100s, 60% in 500s, 10% in 2000s. Deposits: 20% /
/// 75% / 5% in the same notes. Integer division discards the remainder,
/// so the buckets need not sum back to the parent amount.
fn split_denominations(withdrawals: Money, deposits: Money) -> DenominationMix {
    let bucket = |amount: Money, share: f64, note: Money| ((amount as f64 * share) as Money) / note;
    DenominationMix {
        withdrawn_100:  bucket(withdrawals, 0.30, 100),
        withdrawn_500:  bucket(withdrawals, 0.60, 500),
        withdrawn_2000: bucket(withdrawals, 0.10, 2000),
        deposited_100:  bucket(deposits, 0.20, 100),
        deposited_500:  bucket(deposits, 0.75, 500),
        deposited_2000: bucket(deposits, 0.05, 2000),
    }
}

/// Interchange income: 25 per 5,000 withdrawn, 10 per 5,000 deposited.
fn revenue(withdrawals: Money, deposits: Money) -> Money {
    (withdrawals / 5000) * 25 + (deposits / 5000) * 10
}

/// Fixed servicing cost plus a wear term that grows as health declines.
fn operating_cost(health: f64) -> Money {
    (500.0 + (100.0 - health) * 50.0) as Money
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(withdrawals: Money, deposits: Money) -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            0,
            LocationType::Market,
            false,
            true,
            false,
            withdrawals,
            deposits,
            98.0,
        )
    }

    #[test]
    fn net_flow_is_deposits_minus_withdrawals() {
        assert_eq!(obs(400_000, 550_000).net_cash_flow(), 150_000);
        assert_eq!(obs(550_000, 400_000).net_cash_flow(), -150_000);
    }

    #[test]
    fn denomination_split_uses_integer_division() {
        let mix = obs(500_000, 300_000).denominations;
        assert_eq!(mix.withdrawn_100, 1500); // 500_000 * 0.30 / 100
        assert_eq!(mix.withdrawn_500, 600);
        assert_eq!(mix.withdrawn_2000, 25);
        assert_eq!(mix.deposited_100, 600);
        assert_eq!(mix.deposited_500, 450);
        assert_eq!(mix.deposited_2000, 7); // 15_000 / 2000, remainder dropped
    }

    #[test]
    fn unit_economics_formulas() {
        let o = obs(500_000, 300_000);
        assert_eq!(o.revenue, 100 * 25 + 60 * 10);
        assert_eq!(o.cost, (500.0 + 2.0 * 50.0) as Money);
    }
}
