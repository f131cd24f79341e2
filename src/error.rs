//! Volume error types.

use std::io;

use thiserror::Error;

/// Result alias for volume operations.
pub type VolumeResult<T> = Result<T, VolumeError>;

/// Errors surfaced by volume backends and the network volume server.
#[derive(Debug, Error)]
pub enum VolumeError {
    /// I/O error from the local file backend or a network socket.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The account key failed validation before any request was made.
    #[error("invalid account credentials: {0}")]
    InvalidCredentials(String),

    /// Open was asked for a page blob the container does not hold.
    #[error("page blob not found: {0}")]
    BlobNotFound(String),

    /// Listing the container to discover an existing blob failed.
    #[error("listing blobs in container {container} failed: {source}")]
    List {
        container: String,
        #[source]
        source: azure_core::error::Error,
    },

    /// Creating the page blob failed.
    #[error("creating page blob {name} failed: {source}")]
    Create {
        name: String,
        #[source]
        source: azure_core::error::Error,
    },

    /// A ranged download failed.
    #[error("download failed at offset {offset}, len {len}: {source}")]
    Download {
        offset: u64,
        len: usize,
        #[source]
        source: azure_core::error::Error,
    },

    /// A page upload failed.
    #[error("upload failed at offset {offset}, len {len}: {source}")]
    Upload {
        offset: u64,
        len: usize,
        #[source]
        source: azure_core::error::Error,
    },

    /// The backend signaled end of data before the requested range was
    /// fully transferred.
    #[error("short transfer at offset {offset}: {transferred} of {requested} bytes")]
    ShortTransfer {
        offset: u64,
        requested: usize,
        transferred: usize,
    },

    /// The volume was closed and can no longer serve I/O.
    #[error("volume is closed")]
    Closed,

    /// A malformed frame or request payload.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A frame payload exceeded the wire size cap.
    #[error("frame payload too large: {0} bytes")]
    FrameTooLarge(u32),
}
