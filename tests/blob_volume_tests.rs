//! Cloud page-blob volume tests.
//!
//! The round-trip scenarios need a reachable blob endpoint; they run
//! only when `AZURE_STORAGE_ACCOUNT`, `AZURE_STORAGE_KEY`, and
//! `AZURE_STORAGE_CONTAINER` are set, and are skipped otherwise.

use blobvol::{BlobVolume, Volume, VolumeError, VOLUME_BLOCK_SIZE};
use rand::Rng;

struct LiveAccount {
    account: String,
    key: String,
    container: String,
}

fn live_account() -> Option<LiveAccount> {
    let account = std::env::var("AZURE_STORAGE_ACCOUNT").ok()?;
    let key = std::env::var("AZURE_STORAGE_KEY").ok()?;
    let container = std::env::var("AZURE_STORAGE_CONTAINER").ok()?;
    Some(LiveAccount {
        account,
        key,
        container,
    })
}

fn scratch_name() -> String {
    format!("blobvol-test-{:08x}", rand::thread_rng().gen::<u32>())
}

#[tokio::test]
async fn test_invalid_key_is_rejected_before_any_request() {
    // No endpoint involved; the key fails base64 validation eagerly.
    let result = BlobVolume::open("vol1", "cont", "acct", "not-base64!!").await;
    assert!(matches!(result, Err(VolumeError::InvalidCredentials(_))));
}

#[tokio::test]
async fn test_create_sizes_by_block_count() {
    let Some(live) = live_account() else {
        eprintln!("skipping: AZURE_STORAGE_* not set");
        return;
    };

    let name = scratch_name();
    let volume = BlobVolume::create(&name, 10, &live.container, &live.account, &live.key)
        .await
        .unwrap();
    assert_eq!(volume.size(), 10 * VOLUME_BLOCK_SIZE as u64);

    // A second create with the same name must absorb the
    // already-exists condition rather than fail.
    let again = BlobVolume::create(&name, 10, &live.container, &live.account, &live.key)
        .await
        .unwrap();
    assert_eq!(again.size(), volume.size());
}

#[tokio::test]
async fn test_open_adopts_reported_size() {
    let Some(live) = live_account() else {
        eprintln!("skipping: AZURE_STORAGE_* not set");
        return;
    };

    let name = scratch_name();
    BlobVolume::create(&name, 10, &live.container, &live.account, &live.key)
        .await
        .unwrap();

    let opened = BlobVolume::open(&name, &live.container, &live.account, &live.key)
        .await
        .unwrap();
    assert_eq!(opened.size(), 10240);
}

#[tokio::test]
async fn test_open_missing_blob_fails_without_creating() {
    let Some(live) = live_account() else {
        eprintln!("skipping: AZURE_STORAGE_* not set");
        return;
    };

    let name = scratch_name();
    let result = BlobVolume::open(&name, &live.container, &live.account, &live.key).await;
    assert!(matches!(result, Err(VolumeError::BlobNotFound(_))));

    // Still absent afterwards.
    let result = BlobVolume::open(&name, &live.container, &live.account, &live.key).await;
    assert!(matches!(result, Err(VolumeError::BlobNotFound(_))));
}

#[tokio::test]
async fn test_write_then_read_round_trip() {
    let Some(live) = live_account() else {
        eprintln!("skipping: AZURE_STORAGE_* not set");
        return;
    };

    let name = scratch_name();
    let volume = BlobVolume::create(&name, 10, &live.container, &live.account, &live.key)
        .await
        .unwrap();

    let mut data = vec![0u8; 2048];
    rand::thread_rng().fill(&mut data[..]);

    assert_eq!(volume.write_at(&data, 1024).await.unwrap(), 2048);

    let mut read_back = vec![0u8; 2048];
    assert_eq!(volume.read_at(&mut read_back, 1024).await.unwrap(), 2048);
    assert_eq!(read_back, data);
}
