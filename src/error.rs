//! Error types for the nudge crate

use thiserror::Error;

/// Main error type for the nudge crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("timestep {timestep} is out of range (must be < {n_timestep})")]
    TimestepOutOfRange { timestep: usize, n_timestep: usize },

    #[error("position index {position} is out of range (must be < {n_position})")]
    PositionOutOfRange { position: usize, n_position: usize },

    #[error("action {action} is out of range (must be < {n_action})")]
    ActionOutOfRange { action: usize, n_action: usize },

    #[error("shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        context: String,
        expected: usize,
        got: usize,
    },

    #[error("horizon overflow: t_idx {t_idx} + horizon {horizon} exceeds {n_timestep} timesteps")]
    HorizonOverflow {
        t_idx: usize,
        horizon: usize,
        n_timestep: usize,
    },

    #[error("no candidate action plans to evaluate")]
    NoActionPlans,

    #[error("challenge window [{earliest}, {latest}) of width {width} cannot hold a run of {duration} timesteps")]
    InvalidChallengeWindow {
        earliest: usize,
        latest: usize,
        width: usize,
        duration: usize,
    },

    #[error("duration of {seconds}s is not a positive whole number of {timestep_seconds}s timesteps")]
    InvalidDuration { seconds: i64, timestep_seconds: i64 },

    #[error("heuristic index {index} is out of range ({n_candidates} candidate plans)")]
    HeuristicOutOfRange { index: usize, n_candidates: usize },

    #[error("unknown user '{user}'")]
    UnknownUser { user: String },

    #[error("unknown challenge {id} for user '{user}'")]
    UnknownChallenge { user: String, id: uuid::Uuid },

    #[error("a schedule is already committed for user '{user}' on {date}")]
    AlreadyScheduled { user: String, date: chrono::NaiveDate },

    #[error("challenge {id} cannot be rewritten: its offer window already opened")]
    ChallengeAlreadyOffered { id: uuid::Uuid },

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to {operation}: {message}")]
    SerializationContext { operation: String, message: String },
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Error::InvalidConfiguration {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}
