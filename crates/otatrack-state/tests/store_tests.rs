//! State file behaviour on disk

use anyhow::Result;
use otatrack_state::{StateStore, WriteLock};

#[tokio::test]
async fn save_appends_without_touching_existing_lines() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("processed_fingerprints.txt");
    std::fs::write(&path, "old/fingerprint:1\n\nother:2\n")?;

    let store = StateStore::new(&path, WriteLock::new());
    store.save("new/fingerprint:3").await?;

    let text = std::fs::read_to_string(&path)?;
    assert_eq!(text, "old/fingerprint:1\n\nother:2\nnew/fingerprint:3\n");

    let set = store.load().await;
    assert_eq!(set.len(), 3);
    assert!(set.contains("new/fingerprint:3"));
    Ok(())
}

#[tokio::test]
async fn save_terminates_an_unterminated_last_line() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("processed_fingerprints.txt");
    std::fs::write(&path, "old-id")?;

    let store = StateStore::new(&path, WriteLock::new());
    store.save("new-id").await?;

    assert_eq!(std::fs::read_to_string(&path)?, "old-id\nnew-id\n");
    let set = store.load().await;
    assert!(set.contains("old-id"));
    assert!(set.contains("new-id"));
    Ok(())
}

#[tokio::test]
async fn first_save_creates_file() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.txt");
    let store = StateStore::new(&path, WriteLock::new());
    store.save("fp").await?;
    assert_eq!(std::fs::read_to_string(&path)?, "fp\n");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_appends_never_interleave() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.txt");
    let lock = WriteLock::new();

    let mut tasks = tokio::task::JoinSet::new();
    for i in 0..32 {
        let store = StateStore::new(&path, lock.clone());
        tasks.spawn(async move { store.save(&format!("vendor/product/device:14/TAG/{i}:user/release-keys")).await });
    }
    while let Some(joined) = tasks.join_next().await {
        joined??;
    }

    let text = std::fs::read_to_string(&path)?;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 32);
    assert!(lines.iter().all(|line| line.ends_with(":user/release-keys")));
    assert_eq!(StateStore::new(&path, lock).load().await.len(), 32);
    Ok(())
}

#[tokio::test]
async fn known_identifier_is_reported_every_time() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("state.txt");
    let store = StateStore::new(&path, WriteLock::new());
    store.save("fp").await?;
    let before = std::fs::read(&path)?;
    for _ in 0..3 {
        assert!(store.load().await.contains("fp"));
    }
    assert_eq!(std::fs::read(&path)?, before);
    Ok(())
}

#[test]
fn clones_share_the_lock() {
    let lock = WriteLock::new();
    assert!(lock.clone().same_as(&lock));
    assert!(!WriteLock::new().same_as(&lock));
}
