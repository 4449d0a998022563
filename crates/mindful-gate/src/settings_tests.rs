use super::*;
use mindful_storage::{MemoryKvStore, StorageError};
use std::sync::Mutex;

fn store() -> SettingsStore {
    SettingsStore::new(Arc::new(MemoryKvStore::new())).unwrap()
}

fn at(millis: i64) -> Timestamp {
    Timestamp::from_millis(millis).unwrap()
}

const HOUR_MS: i64 = 60 * 60 * 1000;

fn entry(site: &str, millis: i64) -> HistoryEntry {
    HistoryEntry {
        reason: format!("reason at {millis}"),
        site: site.to_string(),
        timestamp: at(millis),
    }
}

#[derive(Default)]
struct ScriptedPermissions {
    deny: bool,
    requested: Mutex<Vec<String>>,
    revoked: Mutex<Vec<String>>,
}

#[async_trait]
impl PermissionGate for ScriptedPermissions {
    async fn request(&self, origin: &str) -> bool {
        self.requested.lock().unwrap().push(origin.to_string());
        !self.deny
    }

    async fn revoke(&self, origin: &str) {
        self.revoked.lock().unwrap().push(origin.to_string());
    }
}

struct BrokenStore;

#[async_trait]
impl KvStore for BrokenStore {
    async fn get(&self, _: &str, _: &str) -> StorageResult<Option<Vec<u8>>> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn set(&self, _: &str, _: &str, _: Vec<u8>) -> StorageResult<()> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn delete(&self, _: &str, _: &str) -> StorageResult<bool> {
        Err(StorageError::Connection("disk unplugged".into()))
    }

    async fn list_keys(&self, _: &str) -> StorageResult<Vec<String>> {
        Err(StorageError::Connection("disk unplugged".into()))
    }
}

#[tokio::test]
async fn test_load_empty_store() {
    let settings = store().load().await;
    assert!(!settings.enabled);
    assert_eq!(settings.blocked_sites.len(), DEFAULT_BLOCKED_SITES.len());
    assert_eq!(settings.timer_minutes, 5);
    assert_eq!(settings.window_ms(), 300_000);
}

#[tokio::test]
async fn test_initialize_defaults_seeds_once() {
    let settings = store();
    settings.initialize_defaults().await.unwrap();
    let loaded = settings.load().await;
    assert!(loaded.enabled);
    assert_eq!(
        loaded.blocked_sites,
        vec!["twitter.com", "x.com", "facebook.com", "instagram.com", "reddit.com"]
    );

    settings.set_enabled(false).await.unwrap();
    settings
        .remove_site("x.com", &AllowAllPermissions)
        .await
        .unwrap();
    settings.initialize_defaults().await.unwrap();

    let loaded = settings.load().await;
    assert!(!loaded.enabled);
    assert!(!loaded.blocked_sites.contains(&"x.com".to_string()));
}

#[tokio::test]
async fn test_unreadable_store_fails_open() {
    let settings = SettingsStore::new(Arc::new(BrokenStore)).unwrap();
    assert!(settings.try_load().await.is_err());
    assert_eq!(settings.load().await, Settings::disabled());
}

#[tokio::test]
async fn test_corrupt_value_fails_open() {
    let kv: Arc<dyn KvStore> = Arc::new(MemoryKvStore::new());
    kv.set(SETTINGS_NAMESPACE, KEY_ENABLED, b"\"yes\"".to_vec())
        .await
        .unwrap();
    let settings = SettingsStore::new(kv).unwrap();
    assert!(!settings.load().await.enabled);
}

#[tokio::test]
async fn test_timer_minutes() {
    let settings = store();
    settings.set_timer_minutes(15).await.unwrap();
    let loaded = settings.load().await;
    assert_eq!(loaded.timer_minutes, 15);
    assert_eq!(loaded.window(), Duration::from_secs(900));

    assert!(matches!(
        settings.set_timer_minutes(0).await,
        Err(GateError::InvalidSetting(_))
    ));
    assert_eq!(settings.load().await.timer_minutes, 15);
}

#[tokio::test]
async fn test_add_site_normalizes_and_requests_permission() {
    let settings = store();
    let permissions = ScriptedPermissions::default();

    let outcome = settings
        .add_site("  https://www.YouTube.com/ ", &permissions)
        .await
        .unwrap();
    assert_eq!(outcome, AddSiteOutcome::Added("youtube.com".into()));
    assert_eq!(
        *permissions.requested.lock().unwrap(),
        vec!["*://*.youtube.com/*"]
    );
    assert_eq!(
        settings.blocked_sites().await.unwrap().last().map(String::as_str),
        Some("youtube.com")
    );
}

#[tokio::test]
async fn test_add_site_rejections() {
    let settings = store();
    settings.initialize_defaults().await.unwrap();
    let permissions = ScriptedPermissions::default();

    assert_eq!(
        settings.add_site("   ", &permissions).await.unwrap(),
        AddSiteOutcome::Empty
    );
    assert_eq!(
        settings.add_site("localhost", &permissions).await.unwrap(),
        AddSiteOutcome::Invalid("localhost".into())
    );
    assert_eq!(
        settings.add_site("www.reddit.com", &permissions).await.unwrap(),
        AddSiteOutcome::Duplicate("reddit.com".into())
    );
    assert!(permissions.requested.lock().unwrap().is_empty());

    let denying = ScriptedPermissions {
        deny: true,
        ..ScriptedPermissions::default()
    };
    assert_eq!(
        settings.add_site("tiktok.com", &denying).await.unwrap(),
        AddSiteOutcome::PermissionDenied("tiktok.com".into())
    );
    assert!(
        !settings
            .blocked_sites()
            .await
            .unwrap()
            .contains(&"tiktok.com".to_string())
    );
}

#[tokio::test]
async fn test_remove_site_revokes() {
    let settings = store();
    settings.initialize_defaults().await.unwrap();
    let permissions = ScriptedPermissions::default();

    assert!(settings.remove_site("reddit.com", &permissions).await.unwrap());
    assert!(!settings.remove_site("reddit.com", &permissions).await.unwrap());
    assert_eq!(
        *permissions.revoked.lock().unwrap(),
        vec!["*://*.reddit.com/*"]
    );
}

#[tokio::test]
async fn test_history_is_capped() {
    let settings = store();
    for i in 0..25 {
        settings
            .append_history(entry("reddit.com", i64::from(i)))
            .await
            .unwrap();
    }

    let history = settings.history().await.unwrap();
    assert_eq!(history.len(), HISTORY_CAP);
    assert_eq!(history.first().unwrap().timestamp, at(5));
    assert_eq!(history.last().unwrap().timestamp, at(24));
}

#[tokio::test]
async fn test_recent_history_groups() {
    let settings = store();
    let now = at(100 * HOUR_MS);
    settings
        .append_history(entry("reddit.com", 70 * HOUR_MS))
        .await
        .unwrap();
    settings
        .append_history(entry("reddit.com", 90 * HOUR_MS))
        .await
        .unwrap();
    settings
        .append_history(entry("x.com", 95 * HOUR_MS))
        .await
        .unwrap();
    settings
        .append_history(entry("reddit.com", 80 * HOUR_MS))
        .await
        .unwrap();

    let groups = settings
        .recent_history(now, RECENT_HISTORY_WINDOW)
        .await
        .unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].site, "x.com");
    assert_eq!(groups[1].site, "reddit.com");

    let reddit: Vec<Timestamp> = groups[1].entries.iter().map(|e| e.timestamp).collect();
    assert_eq!(reddit, vec![at(90 * HOUR_MS), at(80 * HOUR_MS)]);
}

#[test]
fn test_relative_time() {
    let now = at(10 * 24 * HOUR_MS);
    assert_eq!(relative_time(now, now), "just now");
    assert_eq!(relative_time(now, at(10 * 24 * HOUR_MS - 5 * 60_000)), "5m ago");
    assert_eq!(relative_time(now, at(10 * 24 * HOUR_MS - 3 * HOUR_MS)), "3h ago");
    assert_eq!(relative_time(now, at(7 * 24 * HOUR_MS)), "3d ago");
}

#[test]
fn test_history_entry_json() {
    let json = serde_json::to_value(entry("x.com", 0)).unwrap();
    assert_eq!(json["site"], "x.com");
    assert!(json.get("reason").is_some());
    assert!(json.get("timestamp").is_some());
}
