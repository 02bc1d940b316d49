//! Shared primitive types used across the entire fleet simulation.

use serde::{Deserialize, Serialize};

/// Abstract currency units. All persisted amounts are whole units;
/// fractional draws are truncated at the observation boundary.
pub type Money = i64;

/// A stable, zero-based machine identifier within the fleet.
pub type MachineId = u32;

/// Number of machines in the simulated fleet.
pub const FLEET_SIZE: MachineId = 5;

/// Siting of a machine. Even machine ids are Market (deposit-heavy,
/// shopkeeper traffic), odd ids are Residential (withdrawal-heavy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationType {
    Market,
    Residential,
}

impl LocationType {
    pub fn for_machine(machine_id: MachineId) -> Self {
        if machine_id % 2 == 0 {
            Self::Market
        } else {
            Self::Residential
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Market => "Market",
            Self::Residential => "Residential",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Market" => Some(Self::Market),
            "Residential" => Some(Self::Residential),
            _ => None,
        }
    }
}

/// A demand shock scheduled for the next simulated day.
/// Held in a single slot — injecting a second event before the next
/// day-advance overwrites the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShockEvent {
    /// Withdrawal spike (festival crowds).
    Festival,
    /// Demand collapse — both withdrawals and deposits drop to 20%.
    Storm,
}

impl ShockEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Festival => "FESTIVAL",
            Self::Storm => "STORM",
        }
    }

    /// Parse the wire form used by the service boundary.
    /// Unknown strings are rejected at the boundary, never queued.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "FESTIVAL" => Some(Self::Festival),
            "STORM" => Some(Self::Storm),
            _ => None,
        }
    }
}
