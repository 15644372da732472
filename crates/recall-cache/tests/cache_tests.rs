use std::time::Duration;

use recall_cache::{normalize_key, LanceResultCache};
use recall_core::traits::ResultCache;

#[test]
fn keys_are_lowercased_and_collapsed() {
    assert_eq!(normalize_key("  Rust   ERROR handling "), "rust error handling");
    assert_eq!(normalize_key("already normal"), "already normal");
}

#[tokio::test]
async fn put_get_roundtrip() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cache = LanceResultCache::open(&tmp.path().to_string_lossy()).await?;

    cache
        .put("rust error handling", "{\"hits\":3}", Duration::from_secs(60))
        .await?;
    assert_eq!(
        cache.get("rust error handling").await?,
        Some("{\"hits\":3}".to_string())
    );
    assert_eq!(cache.get("unknown key").await?, None);
    Ok(())
}

#[tokio::test]
async fn put_overwrites_existing_entry() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cache = LanceResultCache::open(&tmp.path().to_string_lossy()).await?;

    cache.put("k", "old", Duration::from_secs(60)).await?;
    cache.put("k", "new", Duration::from_secs(60)).await?;
    assert_eq!(cache.get("k").await?, Some("new".to_string()));
    Ok(())
}

#[tokio::test]
async fn expired_entries_are_never_returned() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cache = LanceResultCache::open(&tmp.path().to_string_lossy()).await?;

    cache.put("k", "v", Duration::from_millis(0)).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(cache.get("k").await?, None, "expired entry must not surface");
    Ok(())
}

#[tokio::test]
async fn invalidate_removes_the_entry() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir()?;
    let cache = LanceResultCache::open(&tmp.path().to_string_lossy()).await?;

    cache.put("a", "1", Duration::from_secs(60)).await?;
    cache.put("b", "2", Duration::from_secs(60)).await?;
    cache.invalidate("a").await?;
    assert_eq!(cache.get("a").await?, None);
    assert_eq!(cache.get("b").await?, Some("2".to_string()));

    cache.invalidate_all().await?;
    assert_eq!(cache.get("b").await?, None);
    Ok(())
}
