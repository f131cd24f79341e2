//! The common volume contract every backend implements.

use async_trait::async_trait;

use crate::error::VolumeResult;

/// A fixed-size, randomly addressable block volume.
///
/// Transfers are fully consumed: `read_at` and `write_at` resolve only
/// once the entire requested range has been moved, or fail. Backends
/// that deliver data in fragments shorter than the request loop
/// internally; completion is `transferred == requested`, and an
/// end-of-data signal with bytes still outstanding is an error, never a
/// success marker.
#[async_trait]
pub trait Volume: Send + Sync {
    /// Size in bytes, fixed at open/create time.
    fn size(&self) -> u64;

    /// Fills `buf` from the volume starting at `offset`.
    async fn read_at(&self, buf: &mut [u8], offset: u64) -> VolumeResult<usize>;

    /// Writes all of `buf` to the volume at `offset`.
    async fn write_at(&self, buf: &[u8], offset: u64) -> VolumeResult<usize>;

    /// Releases local resources. Does not delete remote data.
    async fn close(&self) -> VolumeResult<()>;
}
