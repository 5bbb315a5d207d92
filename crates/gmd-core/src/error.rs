//! Error types for the simulation core.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A command carried missing or malformed parameters.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced missile or site does not exist, or is no longer active.
    #[error("not found: {0}")]
    NotFound(String),

    /// Advancing one missile failed; the rest of the tick is unaffected.
    #[error("computation failed for missile {missile_id}: {reason}")]
    Computation { missile_id: String, reason: String },
}

impl CoreError {
    pub fn computation(missile_id: &str, reason: impl Into<String>) -> Self {
        CoreError::Computation {
            missile_id: missile_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
