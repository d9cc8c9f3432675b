use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackportError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Could not resolve {what} for '{branch}': {reason}")]
    Resolution {
        what: &'static str,
        branch: String,
        reason: String,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Failed to replay {range} onto '{branch}': {reason}")]
    Replay {
        branch: String,
        range: String,
        reason: String,
    },

    #[error("Failed to publish '{branch}': {reason}")]
    Publish { branch: String, reason: String },

    #[error("{cause}; cleanup also failed, please manually delete branch '{branch}': {reason}")]
    Cleanup {
        branch: String,
        reason: String,
        cause: Box<BackportError>,
    },

    #[error("{cause}; could not return to '{origin}': {reason}")]
    Stranded {
        origin: String,
        reason: String,
        cause: Box<BackportError>,
    },

    #[error("Backport failed for: {0}")]
    Incomplete(String),

    #[error("Git command failed: {0}")]
    Command(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BackportError>;
