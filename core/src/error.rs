use crate::types::MachineId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Machine {machine_id} not found in history")]
    MachineNotFound { machine_id: MachineId },

    #[error("Predictor unavailable: {0}")]
    PredictorUnavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SimResult<T> = Result<T, SimError>;
