//! SQLite persistence layer.
//!
//! RULE: Only store.rs talks to the database.
//! The engine calls store methods — nothing else executes SQL directly.
//!
//! The whole history is replaced on every persist. Day-advance recomputes
//! the derived feature layer over the full series anyway, so a wholesale
//! rewrite keeps the on-disk table trivially consistent with memory.

use crate::error::SimResult;
use crate::features::FeatureRow;
use crate::observation::Observation;
use crate::types::{LocationType, MachineId, Money};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::collections::HashMap;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct HistoryStore {
    conn: Connection,
}

impl HistoryStore {
    /// Open (or create) the history database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let conn = Connection::open(path)?;
        // WAL mode: better concurrent read performance.
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../migrations/001_history.sql"))?;
        Ok(())
    }

    /// Replace the persisted history wholesale with the given raw rows
    /// and their derived feature layer.
    pub fn replace_history(
        &mut self,
        history: &[Observation],
        derived: &[FeatureRow],
    ) -> SimResult<()> {
        let mut features: HashMap<(NaiveDate, MachineId), (Money, f64)> =
            HashMap::with_capacity(derived.len());
        for row in derived {
            features.insert(
                (row.observation.date, row.observation.machine_id),
                (row.net_flow_lag_7, row.net_flow_rolling_3),
            );
        }

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM history", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO history (
                     date, machine_id, location_type,
                     is_weekend, is_payday, is_festival,
                     withdrawals, deposits,
                     withdrawn_100, withdrawn_500, withdrawn_2000,
                     deposited_100, deposited_500, deposited_2000,
                     health, revenue, cost, net_cash_flow,
                     net_flow_lag_7, net_flow_rolling_3
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                           ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
            )?;
            for obs in history {
                let feat = features.get(&(obs.date, obs.machine_id));
                stmt.execute(params![
                    obs.date.format(DATE_FORMAT).to_string(),
                    obs.machine_id,
                    obs.location_type.as_str(),
                    obs.is_weekend,
                    obs.is_payday,
                    obs.is_festival,
                    obs.withdrawals,
                    obs.deposits,
                    obs.denominations.withdrawn_100,
                    obs.denominations.withdrawn_500,
                    obs.denominations.withdrawn_2000,
                    obs.denominations.deposited_100,
                    obs.denominations.deposited_500,
                    obs.denominations.deposited_2000,
                    obs.health,
                    obs.revenue,
                    obs.cost,
                    obs.net_cash_flow(),
                    feat.map(|(lag, _)| *lag),
                    feat.map(|(_, roll)| *roll),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Load the full raw history, grouped by machine, date-ascending.
    /// Returns an empty vec when no history has ever been persisted.
    /// Any malformed row (unparsable date or location) is an error — the
    /// engine treats that as corrupt state and regenerates.
    pub fn load_history(&self) -> SimResult<Vec<Observation>> {
        let mut stmt = self.conn.prepare(
            "SELECT date, machine_id, location_type,
                    is_weekend, is_payday, is_festival,
                    withdrawals, deposits, health
             FROM history
             ORDER BY machine_id ASC, date ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                let date_text: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_text, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                })?;
                let location_text: String = row.get(2)?;
                let location = LocationType::parse(&location_text).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        Type::Text,
                        format!("unknown location type '{location_text}'").into(),
                    )
                })?;
                // Observation::new recomputes denominations, economics, and
                // net flow from the raw columns, re-establishing the
                // net-flow invariant on every load.
                Ok(Observation::new(
                    date,
                    row.get(1)?,
                    location,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
