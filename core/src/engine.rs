//! The simulation engine — owns the persisted history and the passage
//! of time.
//!
//! Lifecycle:
//!   UNINITIALIZED --load_or_init--> READY
//!
//! A constructed engine is always READY: if the persisted history is
//! missing or fails to parse, it is regenerated from scratch. Silent
//! data loss is the accepted recovery policy — load failures are logged,
//! never surfaced to callers.
//!
//! RULES:
//!   - New days are appended to the RAW history; the derived feature
//!     layer is recomputed over the entire series on every advance.
//!     Full recomputation is a correctness-over-efficiency choice.
//!   - A pending shock event is consumed and cleared by exactly the
//!     next day-advance, whether or not any branch read it.
//!   - All randomness flows through the RngBank; each day's advance has
//!     its own stream keyed by the date.

use crate::error::SimResult;
use crate::features::{self, FeatureRow};
use crate::generator::{self, FESTIVAL_SPIKE_LIVE};
use crate::observation::Observation;
use crate::rng::RngBank;
use crate::store::HistoryStore;
use crate::types::{LocationType, MachineId, ShockEvent, FLEET_SIZE};
use anyhow::anyhow;
use chrono::NaiveDate;

/// Mechanical health never decays below this floor.
const HEALTH_FLOOR: f64 = 40.0;

/// Maximum per-day health loss of the bounded random walk.
const HEALTH_DECAY_MAX: f64 = 0.5;

pub struct SimulationEngine {
    store:         HistoryStore,
    rng_bank:      RngBank,
    seed:          u64,
    history:       Vec<Observation>,
    derived:       Vec<FeatureRow>,
    pending_event: Option<ShockEvent>,
}

impl SimulationEngine {
    /// Load persisted history, or bootstrap a fresh one when it is
    /// absent, empty, or unparsable.
    pub fn load_or_init(store: HistoryStore, seed: u64) -> SimResult<Self> {
        let mut engine = Self {
            store,
            rng_bank: RngBank::new(seed),
            seed,
            history: Vec::new(),
            derived: Vec::new(),
            pending_event: None,
        };
        engine.store.migrate()?;

        match engine.store.load_history() {
            Ok(rows) if !rows.is_empty() => {
                log::info!("loaded {} history rows", rows.len());
                engine.derived = features::derive(&rows);
                engine.history = rows;
            }
            Ok(_) => {
                log::info!("no persisted history; bootstrapping");
                engine.reset()?;
            }
            Err(e) => {
                log::warn!("history unreadable ({e}); regenerating from scratch");
                engine.reset()?;
            }
        }
        Ok(engine)
    }

    /// Regenerate the full bootstrap history, derive features, persist,
    /// and drop any pending event. Replaces all prior state wholesale.
    pub fn reset(&mut self) -> SimResult<()> {
        let rows = generator::generate(generator::BOOTSTRAP_DAYS, FLEET_SIZE, self.seed);
        self.derived = features::derive(&rows);
        self.history = rows;
        self.pending_event = None;
        self.store.replace_history(&self.history, &self.derived)?;
        log::info!(
            "bootstrapped {} days x {} machines",
            generator::BOOTSTRAP_DAYS,
            FLEET_SIZE
        );
        Ok(())
    }

    /// Schedule a shock for the next day-advance. Overwrites any event
    /// still pending from an earlier injection.
    pub fn set_next_event(&mut self, kind: ShockEvent) {
        if let Some(prior) = self.pending_event {
            log::warn!("replacing pending {} with {}", prior.name(), kind.name());
        }
        log::info!("event injected: {}", kind.name());
        self.pending_event = Some(kind);
    }

    pub fn pending_event(&self) -> Option<ShockEvent> {
        self.pending_event
    }

    /// Advance the simulation by one day: generate one observation per
    /// machine dated one past the current maximum, append to the raw
    /// history, re-derive features over the whole series, persist, and
    /// clear the pending event. Returns the new date.
    pub fn advance_day(&mut self) -> SimResult<NaiveDate> {
        let last = self
            .history
            .iter()
            .map(|o| o.date)
            .max()
            .ok_or_else(|| anyhow!("engine has no history"))?;
        let new_date = last
            .succ_opt()
            .ok_or_else(|| anyhow!("date overflow past {last}"))?;

        let mut rng = self.rng_bank.day_stream(new_date);
        let festival_forced = self.pending_event == Some(ShockEvent::Festival);
        let storm = self.pending_event == Some(ShockEvent::Storm);

        for machine_id in 0..FLEET_SIZE {
            let location = LocationType::for_machine(machine_id);
            let draw = generator::draw_day(
                &mut rng,
                new_date,
                location,
                festival_forced,
                FESTIVAL_SPIKE_LIVE,
                storm,
            );
            let prior_health = self.latest_health(machine_id).unwrap_or(100.0);
            let health = (prior_health - rng.uniform(0.0, HEALTH_DECAY_MAX)).max(HEALTH_FLOOR);
            self.history.push(Observation::new(
                new_date,
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

        self.derived = features::derive(&self.history);
        self.store.replace_history(&self.history, &self.derived)?;
        // Consumed whether or not any branch above read it.
        self.pending_event = None;

        log::info!("advanced fleet to {new_date}");
        Ok(new_date)
    }

    /// Most recent stored health for a machine, if it has any history.
    fn latest_health(&self, machine_id: MachineId) -> Option<f64> {
        self.history
            .iter()
            .filter(|o| o.machine_id == machine_id)
            .max_by_key(|o| o.date)
            .map(|o| o.health)
    }

    /// The full raw history (no rows trimmed).
    pub fn history(&self) -> &[Observation] {
        &self.history
    }

    /// The derived feature view — first 7 days per machine excluded.
    pub fn derived(&self) -> &[FeatureRow] {
        &self.derived
    }

    /// Latest observed date across the fleet.
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.history.iter().map(|o| o.date).max()
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}
