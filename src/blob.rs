//! Azure page-blob volume backend.

use async_trait::async_trait;
use azure_storage::prelude::*;
use azure_storage_blobs::blob::BlobType;
use azure_storage_blobs::prelude::*;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use bytes::Bytes;
use futures::StreamExt;
use tracing::{debug, error, info};

use crate::config::VOLUME_BLOCK_SIZE;
use crate::error::{VolumeError, VolumeResult};
use crate::volume::Volume;

/// A volume backed by one Azure page blob.
///
/// Reads are ranged downloads, writes are 512-aligned page uploads.
/// Alignment of `offset` and length is the page-blob service contract
/// and is not pre-validated here; violations surface as backend errors.
pub struct BlobVolume {
    blob: BlobClient,
    size: u64,
    name: String,
}

impl BlobVolume {
    /// Allocates a new page blob of `blocks * 1024` bytes.
    ///
    /// Creating over an already-existing container is benign; the
    /// service's "already exists" answer is logged and absorbed.
    pub async fn create(
        name: &str,
        blocks: u64,
        container: &str,
        account: &str,
        key: &str,
    ) -> VolumeResult<Self> {
        let size = VOLUME_BLOCK_SIZE as u64 * blocks;
        Self::open_inner(name, size, true, container, account, key).await
    }

    /// Adopts an existing page blob, taking its reported content length
    /// as the volume size.
    pub async fn open(
        name: &str,
        container: &str,
        account: &str,
        key: &str,
    ) -> VolumeResult<Self> {
        Self::open_inner(name, 0, false, container, account, key).await
    }

    async fn open_inner(
        name: &str,
        mut size: u64,
        is_new: bool,
        container: &str,
        account: &str,
        key: &str,
    ) -> VolumeResult<Self> {
        // The shared key must be valid base64; a bad key would otherwise
        // only fail once the first signed request goes out.
        BASE64
            .decode(key)
            .map_err(|err| VolumeError::InvalidCredentials(err.to_string()))?;

        let credentials = StorageCredentials::access_key(account.to_string(), key.to_string());
        let container_client =
            ClientBuilder::new(account.to_string(), credentials).container_client(container);
        let blob_client = container_client.blob_client(name);

        // Single unmarked segment listing; an existing volume is
        // expected to show up in the first page.
        let mut found = false;
        let mut pages = container_client.list_blobs().into_stream();
        if let Some(page) = pages.next().await {
            let page = page.map_err(|source| {
                error!("listing blobs in container [{}] failed: {}", container, source);
                VolumeError::List {
                    container: container.to_string(),
                    source,
                }
            })?;
            for blob in page.blobs.blobs() {
                if matches!(blob.properties.blob_type, BlobType::PageBlob) && blob.name == name {
                    info!(
                        "found page blob [{}] with size: {}",
                        blob.name, blob.properties.content_length
                    );
                    size = blob.properties.content_length;
                    found = true;
                    break;
                }
            }
        }

        if is_new {
            info!("creating page blob [{}] with size: {}", name, size);
            if let Err(source) = blob_client.put_page_blob(size as u128).await {
                if service_code(&source) == Some("ContainerAlreadyExists") {
                    error!("received 409, container already exists");
                } else {
                    error!("creating page blob [{}] failed: {}", name, source);
                    return Err(VolumeError::Create {
                        name: name.to_string(),
                        source,
                    });
                }
            }
        } else if !found {
            error!("page blob not found: [{}] in container [{}]", name, container);
            return Err(VolumeError::BlobNotFound(name.to_string()));
        }

        Ok(Self {
            blob: blob_client,
            size,
            name: name.to_string(),
        })
    }

    /// Name of the backing page blob.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl Volume for BlobVolume {
    fn size(&self) -> u64 {
        self.size
    }

    async fn read_at(&self, buf: &mut [u8], offset: u64) -> VolumeResult<usize> {
        debug!("read: [{}], len: [{}]", offset, buf.len());
        let len = buf.len();
        if len == 0 {
            return Ok(0);
        }

        let mut stream = self
            .blob
            .get()
            .range(offset..offset + len as u64)
            .into_stream();

        // The response body arrives in fragments; completion is the
        // requested length, not the end of the stream.
        let mut pos = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| {
                error!("download failed: [{}], len: [{}]: {}", offset, len, source);
                VolumeError::Download {
                    offset,
                    len,
                    source,
                }
            })?;
            let data = chunk.data.collect().await.map_err(|source| {
                error!("download failed: [{}], len: [{}]: {}", offset, len, source);
                VolumeError::Download {
                    offset,
                    len,
                    source,
                }
            })?;

            let end = pos + data.len();
            if end > len {
                return Err(VolumeError::Protocol(format!(
                    "ranged download returned {} bytes for a {} byte request",
                    end, len
                )));
            }
            buf[pos..end].copy_from_slice(&data);
            pos = end;
        }

        if pos != len {
            return Err(VolumeError::ShortTransfer {
                offset,
                requested: len,
                transferred: pos,
            });
        }
        Ok(len)
    }

    async fn write_at(&self, buf: &[u8], offset: u64) -> VolumeResult<usize> {
        debug!("write: [{}], len: [{}]", offset, buf.len());
        let len = buf.len();
        if len == 0 {
            return Ok(0);
        }

        let range = BA512Range::new(offset, offset + len as u64 - 1).map_err(|source| {
            error!("upload failed: [{}], len: [{}]: {}", offset, len, source);
            VolumeError::Upload {
                offset,
                len,
                source,
            }
        })?;

        self.blob
            .put_page(range, Bytes::copy_from_slice(buf))
            .await
            .map_err(|source| {
                error!("upload failed: [{}], len: [{}]: {}", offset, len, source);
                VolumeError::Upload {
                    offset,
                    len,
                    source,
                }
            })?;

        Ok(len)
    }

    /// The HTTP client owns no local resources.
    async fn close(&self) -> VolumeResult<()> {
        Ok(())
    }
}

/// Service error code from an SDK error, if the response carried one.
fn service_code(err: &azure_core::error::Error) -> Option<&str> {
    err.as_http_error().and_then(|http| http.error_code())
}
