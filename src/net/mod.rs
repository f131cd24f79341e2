//! Network volume wire protocol.
//!
//! A connection carries a sequence of frames, each a signed 32-bit
//! command tag followed by a length-prefixed payload:
//!
//! ```text
//! +--------+-------------+------------------+
//! | i32 cmd| u32 len     | len payload bytes|
//! +--------+-------------+------------------+
//! ```
//!
//! All integers are big-endian. Requests carry an offset (and for
//! writes, the data; for reads, a length); replies echo either the
//! data, a 64-bit count, or an error message.

mod connection;
mod server;

pub use server::NetServer;

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{VolumeError, VolumeResult};

/// Read `length` bytes at `offset`.
pub const CMD_READ: i32 = 1;
/// Write the payload data at `offset`.
pub const CMD_WRITE: i32 = 2;
/// Report the volume size.
pub const CMD_SIZE: i32 = 3;

/// Successful reply; payload is command-specific.
pub const REPLY_OK: i32 = 0;
/// Failed reply; payload is a UTF-8 message.
pub const REPLY_ERR: i32 = -1;

/// Upper bound on a frame payload (and on a remote read length).
pub const MAX_FRAME_PAYLOAD: u32 = 16 * 1024 * 1024;

/// One protocol message: a command tag plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub cmd: i32,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(cmd: i32, payload: Bytes) -> Self {
        Self { cmd, payload }
    }

    /// Successful reply carrying raw data.
    pub fn ok(payload: Bytes) -> Self {
        Self::new(REPLY_OK, payload)
    }

    /// Successful reply carrying a 64-bit count or size.
    pub fn ok_u64(value: u64) -> Self {
        let mut payload = BytesMut::with_capacity(8);
        payload.put_u64(value);
        Self::new(REPLY_OK, payload.freeze())
    }

    /// Error reply carrying a diagnostic message.
    pub fn error(message: impl AsRef<str>) -> Self {
        Self::new(REPLY_ERR, Bytes::copy_from_slice(message.as_ref().as_bytes()))
    }

    /// Decodes one frame from the stream.
    pub async fn read<R: AsyncRead + Unpin>(reader: &mut R) -> VolumeResult<Self> {
        let cmd = reader.read_i32().await?;
        let len = reader.read_u32().await?;
        if len > MAX_FRAME_PAYLOAD {
            return Err(VolumeError::FrameTooLarge(len));
        }
        let mut payload = vec![0u8; len as usize];
        reader.read_exact(&mut payload).await?;
        Ok(Self::new(cmd, Bytes::from(payload)))
    }

    /// Encodes this frame onto the stream.
    pub async fn write<W: AsyncWrite + Unpin>(&self, writer: &mut W) -> VolumeResult<()> {
        let mut buf = BytesMut::with_capacity(8 + self.payload.len());
        buf.put_i32(self.cmd);
        buf.put_u32(self.payload.len() as u32);
        buf.extend_from_slice(&self.payload);
        writer.write_all(&buf).await?;
        writer.flush().await?;
        Ok(())
    }
}

/// A decoded remote I/O request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Read { offset: u64, length: u32 },
    Write { offset: u64, data: Bytes },
    Size,
}

impl Request {
    /// Parses a request frame's command and payload.
    pub fn parse(frame: &Frame) -> VolumeResult<Self> {
        let mut payload = frame.payload.clone();
        match frame.cmd {
            CMD_READ => {
                if payload.len() != 12 {
                    return Err(VolumeError::Protocol(format!(
                        "read request payload must be 12 bytes, got {}",
                        payload.len()
                    )));
                }
                let offset = payload.get_u64();
                let length = payload.get_u32();
                if length > MAX_FRAME_PAYLOAD {
                    return Err(VolumeError::Protocol(format!(
                        "read length {} exceeds frame cap",
                        length
                    )));
                }
                Ok(Request::Read { offset, length })
            }
            CMD_WRITE => {
                if payload.len() < 8 {
                    return Err(VolumeError::Protocol(format!(
                        "write request payload must carry an offset, got {} bytes",
                        payload.len()
                    )));
                }
                let offset = payload.get_u64();
                Ok(Request::Write {
                    offset,
                    data: payload,
                })
            }
            CMD_SIZE => {
                if !payload.is_empty() {
                    return Err(VolumeError::Protocol(
                        "size request carries no payload".to_string(),
                    ));
                }
                Ok(Request::Size)
            }
            other => Err(VolumeError::Protocol(format!("unknown command: {other}"))),
        }
    }

    /// Encodes this request as a frame, for clients.
    pub fn to_frame(&self) -> Frame {
        match self {
            Request::Read { offset, length } => {
                let mut payload = BytesMut::with_capacity(12);
                payload.put_u64(*offset);
                payload.put_u32(*length);
                Frame::new(CMD_READ, payload.freeze())
            }
            Request::Write { offset, data } => {
                let mut payload = BytesMut::with_capacity(8 + data.len());
                payload.put_u64(*offset);
                payload.extend_from_slice(data);
                Frame::new(CMD_WRITE, payload.freeze())
            }
            Request::Size => Frame::new(CMD_SIZE, Bytes::new()),
        }
    }
}
