//! Bridge error types for robust error handling.

use thiserror::Error;

/// Fixed error code attached to synchronous call failures.
pub const ERROR_CODE: &str = "channels-bridge";

/// Bridge-level errors.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Channels client already initialized")]
    AlreadyInitialized,

    #[error("Channels client not initialized, call init first")]
    NotInitialized,

    #[error("Not connected")]
    NotConnected,

    #[error("Channel not subscribed: {0}")]
    NotSubscribed(String),

    #[error("Channel does not support client events: {0}")]
    TriggerNotSupported(String),

    #[error("Invalid option: {0}")]
    InvalidOptions(String),

    #[error("Missing or invalid argument: {0}")]
    InvalidArguments(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
