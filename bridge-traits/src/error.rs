use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    /// The platform refused to start playback without a user gesture.
    ///
    /// Callers must treat this as "needs explicit user interaction", never as
    /// a stream failure, and must not retry it automatically.
    #[error("Playback start blocked by autoplay policy")]
    AutoplayBlocked,

    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Media sink unavailable: {0}")]
    SinkUnavailable(String),

    #[error("Settings storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
