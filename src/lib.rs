//! Blobvol: remotely-backed block volumes behind one contract.
//!
//! A volume is a fixed-size, randomly addressable byte range with
//! fully-consumed read/write semantics. Three backends implement the
//! same contract: an Azure page blob, a local file, and a local file
//! that is also served to remote peers over a TCP frame protocol.
//!
//! # Example
//!
//! ```no_run
//! use blobvol::{NetFileVolume, Volume};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let shutdown = CancellationToken::new();
//!     let volume = NetFileVolume::open("disk.img", 8888, shutdown.clone())
//!         .await
//!         .unwrap();
//!     let mut buf = vec![0u8; 1024];
//!     volume.read_at(&mut buf, 0).await.unwrap();
//!     shutdown.cancel();
//!     volume.shutdown().await.unwrap();
//! }
//! ```

pub mod blob;
pub mod config;
pub mod error;
pub mod file;
pub mod net;
pub mod netvol;
pub mod volume;

// Re-exports for convenience
pub use blob::BlobVolume;
pub use config::{Args, Config, Mode, DEFAULT_NET_PORT, READ_DEADLINE, VOLUME_BLOCK_SIZE};
pub use error::{VolumeError, VolumeResult};
pub use file::FileVolume;
pub use net::{
    Frame, NetServer, Request, CMD_READ, CMD_SIZE, CMD_WRITE, MAX_FRAME_PAYLOAD, REPLY_ERR,
    REPLY_OK,
};
pub use netvol::NetFileVolume;
pub use volume::Volume;
