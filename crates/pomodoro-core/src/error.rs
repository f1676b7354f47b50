use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration value outside its allowed range
    #[error("Config error: {0}")]
    Config(String),

    /// Scenario steps must be ordered by time
    #[error("Scenario step {step} at {at_ms}ms comes before the previous step at {previous_ms}ms")]
    StepOrder {
        step: usize,
        at_ms: u64,
        previous_ms: u64,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
