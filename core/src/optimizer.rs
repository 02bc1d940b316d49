//! Greedy cash rebalancing across the fleet.
//!
//! Pure function of the predictions and thresholds — no hidden state.
//! The matching policy is a single O(n) sweep over deficits in discovery
//! order, always serving from the oldest queued surplus. It never
//! revisits a processed deficit and never searches for a better match;
//! a smarter vault-logistics optimizer is explicitly out of scope.

use crate::types::{MachineId, Money};
use serde::Serialize;
use std::collections::VecDeque;

/// A surplus machine is dropped from the queue once its remaining
/// amount falls below this absolute floor — independent of the
/// configured thresholds.
pub const SURPLUS_FLOOR: Money = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlowStatus {
    Surplus,
    Deficit,
    Stable,
}

/// Per-machine classification of the predicted next-day net flow.
#[derive(Debug, Clone, Serialize)]
pub struct MachineStatus {
    pub machine_id: MachineId,
    pub net_flow:   Money,
    pub status:     FlowStatus,
}

/// One scheduled cash movement. Vault refills draw from the unlimited
/// central reserve rather than another machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RebalanceAction {
    InterAtmTransfer {
        source:      MachineId,
        destination: MachineId,
        amount:      Money,
    },
    VaultRefill {
        destination: MachineId,
        amount:      Money,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RebalancePlan {
    pub network_status:       Vec<MachineStatus>,
    pub rebalancing_schedule: Vec<RebalanceAction>,
}

struct CashEntry {
    machine_id: MachineId,
    amount:     Money,
}

/// Classify each machine and compute the transfer schedule.
///
/// The surplus test compares the raw flow against `max_threshold`; the
/// deficit test compares against `-min_threshold`. Two independent
/// cutoffs, not a symmetric band.
pub fn optimize(
    predictions: &[(MachineId, f64)],
    min_threshold: Money,
    max_threshold: Money,
) -> RebalancePlan {
    let mut surplus: VecDeque<CashEntry> = VecDeque::new();
    let mut deficits: Vec<CashEntry> = Vec::new();
    let mut network_status = Vec::with_capacity(predictions.len());

    for &(machine_id, flow) in predictions {
        let status = if flow > max_threshold as f64 {
            surplus.push_back(CashEntry {
                machine_id,
                amount: flow as Money,
            });
            FlowStatus::Surplus
        } else if flow < -(min_threshold as f64) {
            deficits.push(CashEntry {
                machine_id,
                amount: flow.abs() as Money,
            });
            FlowStatus::Deficit
        } else {
            FlowStatus::Stable
        };
        network_status.push(MachineStatus {
            machine_id,
            net_flow: flow as Money,
            status,
        });
    }

    // Greedy pass: each deficit gets at most one movement — from the
    // oldest surplus still queued, or from the vault when none remains.
    let mut schedule = Vec::new();
    for deficit in &mut deficits {
        match surplus.front_mut() {
            Some(head) => {
                let amount = head.amount.min(deficit.amount);
                schedule.push(RebalanceAction::InterAtmTransfer {
                    source: head.machine_id,
                    destination: deficit.machine_id,
                    amount,
                });
                head.amount -= amount;
                deficit.amount -= amount;
                if head.amount < SURPLUS_FLOOR {
                    surplus.pop_front();
                }
            }
            None => {
                schedule.push(RebalanceAction::VaultRefill {
                    destination: deficit.machine_id,
                    amount: deficit.amount,
                });
            }
        }
    }

    RebalancePlan {
        network_status,
        rebalancing_schedule: schedule,
    }
}
