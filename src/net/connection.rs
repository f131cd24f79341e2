//! Per-connection frame decode and dispatch.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::READ_DEADLINE;
use crate::error::VolumeError;
use crate::net::{Frame, Request};
use crate::volume::Volume;

/// Runs one connection until the peer disconnects, a decode fails, or
/// the rolling read deadline expires. Dispatch errors are answered with
/// an error reply and do not end the session.
pub(crate) async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    volume: Arc<dyn Volume>,
) {
    loop {
        let frame = match timeout(READ_DEADLINE, Frame::read(&mut stream)).await {
            Err(_) => {
                debug!("connection [{}] idle past read deadline", peer);
                break;
            }
            Ok(Err(VolumeError::Io(err))) if err.kind() == io::ErrorKind::UnexpectedEof => {
                debug!("connection [{}] closed by peer", peer);
                break;
            }
            Ok(Err(err)) => {
                warn!("connection [{}] decode failed: {}", peer, err);
                break;
            }
            Ok(Ok(frame)) => frame,
        };

        let reply = dispatch(&frame, volume.as_ref()).await;
        if let Err(err) = reply.write(&mut stream).await {
            warn!("connection [{}] reply failed: {}", peer, err);
            break;
        }
    }
}

/// Maps one request frame onto the shared volume and builds the reply.
async fn dispatch(frame: &Frame, volume: &dyn Volume) -> Frame {
    let request = match Request::parse(frame) {
        Ok(request) => request,
        Err(err) => return Frame::error(err.to_string()),
    };

    match request {
        Request::Read { offset, length } => {
            let mut buf = vec![0u8; length as usize];
            match volume.read_at(&mut buf, offset).await {
                Ok(_) => Frame::ok(Bytes::from(buf)),
                Err(err) => {
                    warn!("remote read failed: [{}], len: [{}]: {}", offset, length, err);
                    Frame::error(err.to_string())
                }
            }
        }
        Request::Write { offset, data } => match volume.write_at(&data, offset).await {
            Ok(written) => Frame::ok_u64(written as u64),
            Err(err) => {
                warn!(
                    "remote write failed: [{}], len: [{}]: {}",
                    offset,
                    data.len(),
                    err
                );
                Frame::error(err.to_string())
            }
        },
        Request::Size => Frame::ok_u64(volume.size()),
    }
}
