//! TCP listener and accept loop for the network volume server.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::error::VolumeResult;
use crate::net::connection::handle_connection;
use crate::volume::Volume;

/// Serves remote block I/O requests against a shared volume.
///
/// Each accepted connection runs in its own task; the cancellation
/// token stops only the accept loop, and open connections drain
/// through their own read deadlines.
pub struct NetServer {
    local_addr: SocketAddr,
    accept_task: JoinHandle<()>,
}

impl NetServer {
    /// Binds `0.0.0.0:port` (port 0 picks a free port) and starts the
    /// background accept loop.
    pub async fn bind(
        port: u16,
        volume: Arc<dyn Volume>,
        shutdown: CancellationToken,
    ) -> VolumeResult<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port)).await?;
        let local_addr = listener.local_addr()?;
        info!("network volume server listening on {}", local_addr);

        let accept_task = tokio::spawn(accept_loop(listener, volume, shutdown));

        Ok(Self {
            local_addr,
            accept_task,
        })
    }

    /// The bound address; useful when the server was started on port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Waits for the accept loop to exit after cancellation.
    pub async fn stopped(self) {
        let _ = self.accept_task.await;
    }
}

async fn accept_loop(
    listener: TcpListener,
    volume: Arc<dyn Volume>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("network volume server shutting down");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    info!("new connection from: [{}]", peer);
                    tokio::spawn(handle_connection(stream, peer, Arc::clone(&volume)));
                }
                Err(err) => {
                    warn!("accept failed: {}", err);
                }
            }
        }
    }
    // Dropping the listener here closes it; no new connections land.
}
