//! Local file volume backend.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task;
use tracing::{debug, error};

use crate::error::{VolumeError, VolumeResult};
use crate::volume::Volume;

/// A volume backed by a local file opened read-write.
///
/// The size is captured at open time and never changes, even if a write
/// past the end grows the underlying file.
///
/// All transfers are serialized through one reader-writer lock held for
/// the whole request: concurrent reads proceed in parallel, writes are
/// exclusive. The network volume server shares this same `FileVolume`,
/// so a remote write cannot interleave with a local read mid-transfer.
pub struct FileVolume {
    file: RwLock<Option<Arc<File>>>,
    size: u64,
}

impl FileVolume {
    /// Opens `path` read-write and adopts its current length as the
    /// volume size.
    pub async fn open(path: impl AsRef<Path>) -> VolumeResult<Self> {
        let path = path.as_ref().to_owned();
        let (file, size) = task::spawn_blocking(move || -> io::Result<(File, u64)> {
            let file = OpenOptions::new().read(true).write(true).open(&path)?;
            let size = file.metadata()?.len();
            Ok((file, size))
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            file: RwLock::new(Some(Arc::new(file))),
            size,
        })
    }
}

#[async_trait]
impl Volume for FileVolume {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_at(&self, buf: &mut [u8], offset: u64) -> VolumeResult<usize> {
        debug!("read: [{}], len: [{}]", offset, buf.len());
        if buf.is_empty() {
            return Ok(0);
        }

        // The shared guard is held across the blocking transfer so a
        // concurrent write cannot interleave with this request.
        let guard = self.file.read().await;
        let file = Arc::clone(guard.as_ref().ok_or(VolumeError::Closed)?);

        let len = buf.len();
        let mut owned = vec![0u8; len];
        let owned = task::spawn_blocking(move || -> VolumeResult<Vec<u8>> {
            read_full(&file, &mut owned, offset)?;
            Ok(owned)
        })
        .await
        .map_err(join_error)?
        .map_err(|err| {
            error!("read file failed: [{}], len: [{}]: {}", offset, len, err);
            err
        })?;

        buf.copy_from_slice(&owned);
        Ok(len)
    }

    async fn write_at(&self, buf: &[u8], offset: u64) -> VolumeResult<usize> {
        debug!("write: [{}], len: [{}]", offset, buf.len());
        if buf.is_empty() {
            return Ok(0);
        }

        let guard = self.file.write().await;
        let file = Arc::clone(guard.as_ref().ok_or(VolumeError::Closed)?);

        let len = buf.len();
        let owned = buf.to_vec();
        task::spawn_blocking(move || write_full(&file, &owned, offset))
            .await
            .map_err(join_error)?
            .map_err(|err| {
                error!("write file failed: [{}], len: [{}]: {}", offset, len, err);
                err
            })?;

        Ok(len)
    }

    /// Syncs and releases the descriptor. Idempotent; later I/O fails
    /// with [`VolumeError::Closed`].
    async fn close(&self) -> VolumeResult<()> {
        let mut guard = self.file.write().await;
        if let Some(file) = guard.take() {
            task::spawn_blocking(move || file.sync_all())
                .await
                .map_err(join_error)??;
        }
        Ok(())
    }
}

/// Fills `buf` from `file` at `offset`, looping on short reads.
///
/// Completion is `pos == buf.len()`; end of data with bytes still
/// outstanding is a `ShortTransfer` error.
fn read_full(file: &File, buf: &mut [u8], offset: u64) -> VolumeResult<()> {
    let requested = buf.len();
    let mut pos = 0usize;
    while pos < requested {
        match file.read_at(&mut buf[pos..], offset + pos as u64) {
            Ok(0) => {
                return Err(VolumeError::ShortTransfer {
                    offset,
                    requested,
                    transferred: pos,
                })
            }
            Ok(n) => pos += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Writes all of `buf` to `file` at `offset`, looping on short writes.
fn write_full(file: &File, buf: &[u8], offset: u64) -> VolumeResult<()> {
    let requested = buf.len();
    let mut pos = 0usize;
    while pos < requested {
        match file.write_at(&buf[pos..], offset + pos as u64) {
            Ok(0) => {
                return Err(VolumeError::ShortTransfer {
                    offset,
                    requested,
                    transferred: pos,
                })
            }
            Ok(n) => pos += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

fn join_error(err: task::JoinError) -> VolumeError {
    VolumeError::Io(io::Error::new(io::ErrorKind::Other, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn scratch_file(content: &[u8]) -> (tempfile::TempDir, File) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.img");
        let mut f = File::create(&path).unwrap();
        f.write_all(content).unwrap();
        let f = OpenOptions::new().read(true).write(true).open(&path).unwrap();
        (dir, f)
    }

    #[test]
    fn read_full_reads_exact_range() {
        let (_dir, file) = scratch_file(b"0123456789");
        let mut buf = [0u8; 4];
        read_full(&file, &mut buf, 3).unwrap();
        assert_eq!(&buf, b"3456");
    }

    #[test]
    fn read_full_errors_on_end_of_data() {
        let (_dir, file) = scratch_file(b"0123456789");
        let mut buf = [0u8; 8];
        let err = read_full(&file, &mut buf, 6).unwrap_err();
        match err {
            VolumeError::ShortTransfer {
                offset,
                requested,
                transferred,
            } => {
                assert_eq!(offset, 6);
                assert_eq!(requested, 8);
                assert_eq!(transferred, 4);
            }
            other => panic!("expected short transfer, got {other}"),
        }
    }

    #[test]
    fn write_full_round_trips() {
        let (_dir, file) = scratch_file(&[0u8; 16]);
        write_full(&file, b"abcd", 8).unwrap();
        let mut buf = [0u8; 4];
        read_full(&file, &mut buf, 8).unwrap();
        assert_eq!(&buf, b"abcd");
    }
}
