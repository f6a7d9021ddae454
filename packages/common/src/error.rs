use thiserror::Error;

/// Common error type for loading host-provided data
#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Setting '{field}' is {value}ms, above the {max}ms limit")]
    DelayTooLong { field: &'static str, value: u64, max: u64 },
}
