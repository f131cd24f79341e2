//! Net file volume: a local file served both locally and over TCP.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::VolumeResult;
use crate::file::FileVolume;
use crate::net::NetServer;
use crate::volume::Volume;

/// A [`FileVolume`] paired with a [`NetServer`] bound to the same file.
///
/// The local caller and remote peers go through the same `FileVolume`,
/// whose internal lock serializes all transfers on the shared
/// descriptor.
pub struct NetFileVolume {
    file: Arc<FileVolume>,
    server: NetServer,
}

impl NetFileVolume {
    /// Opens `path`, captures its size, and starts the network server
    /// against the same open file.
    pub async fn open(
        path: impl AsRef<Path>,
        port: u16,
        shutdown: CancellationToken,
    ) -> VolumeResult<Self> {
        let file = Arc::new(FileVolume::open(path).await?);
        let server = NetServer::bind(port, Arc::clone(&file) as Arc<dyn Volume>, shutdown).await?;
        Ok(Self { file, server })
    }

    /// The network server's bound address.
    pub fn local_addr(&self) -> SocketAddr {
        self.server.local_addr()
    }

    /// Waits for the accept loop to exit (after the cancellation token
    /// fired), then closes the file.
    pub async fn shutdown(self) -> VolumeResult<()> {
        self.server.stopped().await;
        self.file.close().await
    }
}

#[async_trait]
impl Volume for NetFileVolume {
    fn size(&self) -> u64 {
        self.file.size()
    }

    async fn read_at(&self, buf: &mut [u8], offset: u64) -> VolumeResult<usize> {
        self.file.read_at(buf, offset).await
    }

    async fn write_at(&self, buf: &[u8], offset: u64) -> VolumeResult<usize> {
        self.file.write_at(buf, offset).await
    }

    async fn close(&self) -> VolumeResult<()> {
        self.file.close().await
    }
}
