use std::path::PathBuf;
use thiserror::Error;

/// Result type for the fallible edges of the trainer (config, history, export).
pub type Result<T> = std::result::Result<T, PileupError>;

/// Errors raised outside the simulation core.
///
/// The contact engine itself never fails; invalid commands resolve to
/// [`crate::session::CommandOutcome::Ignored`].
#[derive(Debug, Error)]
pub enum PileupError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("history database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not resolve a state directory for '{0}'")]
    NoStateDir(&'static str),

    #[error("failed to create directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("embedded data table '{0}' is missing or empty")]
    MissingData(String),

    #[error("corrupt history row {id}: {message}")]
    CorruptRow { id: i64, message: String },
}
