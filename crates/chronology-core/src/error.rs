use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChronologyError {
    #[error("not initialized: run 'chronology init'")]
    NotInitialized,

    #[error("invalid utc offset '{0}': expected a value like +02:00 or -0500")]
    InvalidOffset(String),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid submission: {0}")]
    InvalidSubmission(String),

    #[error("subject type '{0}' does not support scheduled events")]
    UnsupportedKind(String),

    #[error("cron database error: {0}")]
    CronDb(String),

    #[error("no event scheduled for '{action}' at {run_at}")]
    NotScheduled { run_at: i64, action: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChronologyError>;
