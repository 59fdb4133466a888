use std::path::PathBuf;

use thiserror::Error;

/// Failures surfaced by the player. None of them are fatal: callers log and
/// degrade the affected feature.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("media not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("history storage unavailable at {}: {source}", path.display())]
    PersistenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history file {} is corrupt: {source}", path.display())]
    PersistenceCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{component} unavailable: {reason}")]
    EngineUnavailable {
        component: &'static str,
        reason: String,
    },

    #[error("failed to open media: {0}")]
    Decode(#[from] anyhow::Error),

    #[error("config error: {0}")]
    Config(String),
}
