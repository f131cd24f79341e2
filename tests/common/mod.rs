//! Common test utilities.

use std::net::SocketAddr;
use std::path::PathBuf;

use bytes::{Buf, Bytes};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

use blobvol::{Frame, NetFileVolume, Request, REPLY_OK};

/// A network volume serving a zero-filled temp file on a random port.
pub struct TestVolume {
    pub volume: NetFileVolume,
    pub shutdown: CancellationToken,
    pub path: PathBuf,
    _dir: tempfile::TempDir,
}

impl TestVolume {
    /// Creates a `size`-byte scratch file and serves it on port 0.
    pub async fn serve(size: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volume.img");
        std::fs::write(&path, vec![0u8; size]).unwrap();

        let shutdown = CancellationToken::new();
        let volume = NetFileVolume::open(&path, 0, shutdown.clone())
            .await
            .unwrap();

        Self {
            volume,
            shutdown,
            path,
            _dir: dir,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        let mut addr = self.volume.local_addr();
        addr.set_ip("127.0.0.1".parse().unwrap());
        addr
    }

    pub async fn connect(&self) -> TcpStream {
        TcpStream::connect(self.addr()).await.unwrap()
    }
}

/// Sends a read request and returns the raw reply frame.
pub async fn remote_read(stream: &mut TcpStream, offset: u64, length: u32) -> Frame {
    Request::Read { offset, length }
        .to_frame()
        .write(stream)
        .await
        .unwrap();
    Frame::read(stream).await.unwrap()
}

/// Sends a write request and returns the raw reply frame.
pub async fn remote_write(stream: &mut TcpStream, offset: u64, data: &[u8]) -> Frame {
    Request::Write {
        offset,
        data: Bytes::copy_from_slice(data),
    }
    .to_frame()
    .write(stream)
    .await
    .unwrap();
    Frame::read(stream).await.unwrap()
}

/// Sends a size request and returns the reported size.
pub async fn remote_size(stream: &mut TcpStream) -> u64 {
    Request::Size.to_frame().write(stream).await.unwrap();
    let reply = Frame::read(stream).await.unwrap();
    assert_eq!(reply.cmd, REPLY_OK);
    payload_u64(&reply)
}

/// Reads the 64-bit payload of an ok reply.
pub fn payload_u64(frame: &Frame) -> u64 {
    let mut payload = frame.payload.clone();
    assert_eq!(payload.len(), 8);
    payload.get_u64()
}
