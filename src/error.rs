use std::path::PathBuf;

use thiserror::Error;

use crate::bridge::DeviceStatus;
use crate::session::Side;

/// Failures of a single bridge invocation.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("adb not found at {0}. Please check the config file.")]
    ExecutableNotFound(PathBuf),
    #[error("Failed to start adb process at {path}: {source}")]
    ProcessStart {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read adb output as UTF-8")]
    OutputDecode,
    #[error("`{command}` failed: {message}")]
    CommandFailed { command: String, message: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to resolve {path}: {source}")]
    PathResolution {
        path: String,
        #[source]
        source: BridgeError,
    },
    #[error("Failed to load local files {}: {source}", path.display())]
    LocalListing {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load device files {path}: {source}")]
    RemoteListing {
        path: String,
        #[source]
        source: BridgeError,
    },
    #[error("{}", .0.message())]
    DeviceNotReady(DeviceStatus),
    #[error("{0} side is still loading")]
    Busy(Side),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{0} already exists, skipped")]
    DestinationAlreadyExists(String),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}
