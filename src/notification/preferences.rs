//! 偏好存储 - 本地键值持久化与通知设置的加载/保存

use anyhow::{Context, Result};
use async_trait::async_trait;
use fs2::FileExt;
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, RwLock};
use tracing::{debug, info, warn};

use super::settings::NotificationSettings;

/// 通知设置在键值存储中的键
pub const SETTINGS_KEY: &str = "notificationSettings";

/// 扁平键值存储（跨进程重启保留）
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// 读取键值，不存在时返回 `None`
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// 写入键值（写入完成后才返回）
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// 基于单个 JSON 文件的键值存储
///
/// 写入时持有独占锁，先写临时文件再原子替换，读者不会看到写了一半的文件。
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 默认路径 `~/.config/clinic-notify/preferences.json`
    pub fn default_path() -> PathBuf {
        crate::config::AppConfig::default_data_dir().join("preferences.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(path: &Path) -> PathBuf {
        path.with_extension("lock")
    }

    fn open_lock(path: &Path) -> Result<File> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let lock_path = Self::lock_path(path);
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open lock file {}", lock_path.display()))
    }

    fn read_map(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        let map = serde_json::from_str(&content)
            .with_context(|| format!("corrupt preference file {}", path.display()))?;
        Ok(map)
    }

    fn get_blocking(path: &Path, key: &str) -> Result<Option<String>> {
        let lock = Self::open_lock(path)?;
        lock.lock_shared()?;
        let result = Self::read_map(path).map(|mut map| map.remove(key));
        lock.unlock()?;
        result
    }

    fn set_blocking(path: &Path, key: &str, value: &str) -> Result<()> {
        let lock = Self::open_lock(path)?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<()> {
            let mut map = Self::read_map(path)?;
            map.insert(key.to_string(), value.to_string());

            let temp_path = path.with_extension("tmp");
            fs::write(&temp_path, serde_json::to_string_pretty(&map)?)?;
            fs::rename(&temp_path, path)?;
            Ok(())
        })();

        lock.unlock()?;
        result
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path.clone();
        let key = key.to_string();
        tokio::task::spawn_blocking(move || Self::get_blocking(&path, &key)).await?
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path.clone();
        let key = key.to_string();
        let value = value.to_string();
        tokio::task::spawn_blocking(move || Self::set_blocking(&path, &key, &value)).await?
    }
}

/// 内存键值存储（测试用，可模拟读写失败）
#[derive(Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一个键值
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.values.lock().ok().and_then(|v| v.get(key).cloned())
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("simulated read failure");
        }
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("simulated write failure");
        }
        self.insert(key, value);
        Ok(())
    }
}

/// 通知设置存储 - 内存快照 + 持久化
///
/// 写入顺序：先持久化，再发布到内存。
/// 加载与保存串行执行，内存中的记录始终是最后一次写入存储的那条。
pub struct SettingsStore {
    store: Arc<dyn PreferenceStore>,
    current: RwLock<NotificationSettings>,
    writer: AsyncMutex<()>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self {
            store,
            current: RwLock::new(NotificationSettings::default()),
            writer: AsyncMutex::new(()),
        }
    }

    /// 从存储加载设置；不存在或解析失败时返回默认值
    pub async fn load(&self) -> NotificationSettings {
        let _writer = self.writer.lock().await;
        let loaded = match self.store.get(SETTINGS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<NotificationSettings>(&raw) {
                Ok(settings) => {
                    debug!("Loaded notification settings from preference store");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Stored notification settings are malformed, using defaults");
                    NotificationSettings::default()
                }
            },
            Ok(None) => {
                debug!("No stored notification settings, using defaults");
                NotificationSettings::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to read notification settings, using defaults");
                NotificationSettings::default()
            }
        };

        *self.current.write().await = loaded;
        loaded
    }

    /// 保存整条记录
    ///
    /// 写入失败只记录日志，内存状态仍然更新；返回值表示是否已持久化。
    pub async fn save(&self, settings: NotificationSettings) -> bool {
        // 持久化与发布之间不允许插入其他保存
        let _writer = self.writer.lock().await;
        let persisted = match self.persist(&settings).await {
            Ok(()) => {
                info!("Notification settings saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "Failed to persist notification settings");
                false
            }
        };

        *self.current.write().await = settings;
        persisted
    }

    /// 整体替换设置（不做字段合并）
    pub async fn update(&self, settings: NotificationSettings) -> bool {
        self.save(settings).await
    }

    /// 当前内存中的设置快照
    pub async fn current(&self) -> NotificationSettings {
        *self.current.read().await
    }

    async fn persist(&self, settings: &NotificationSettings) -> Result<()> {
        let raw = serde_json::to_string(settings)?;
        self.store.set(SETTINGS_KEY, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::settings::NotificationCategory;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// 第一次写入落盘后延迟返回
    struct SlowFirstWrite {
        inner: MemoryPreferenceStore,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl PreferenceStore for SlowFirstWrite {
        async fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> Result<()> {
            let first = self.writes.fetch_add(1, Ordering::SeqCst) == 0;
            self.inner.set(key, value).await?;
            if first {
                tokio::time::sleep(Duration::from_millis(50)).await;
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_load_missing_returns_defaults() {
        let settings = SettingsStore::new(Arc::new(MemoryPreferenceStore::new()));
        assert_eq!(settings.load().await, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_load_malformed_returns_defaults() {
        let store = MemoryPreferenceStore::new().with_value(SETTINGS_KEY, "{not json");
        let settings = SettingsStore::new(Arc::new(store));
        assert_eq!(settings.load().await, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_load_read_failure_returns_defaults() {
        let store = MemoryPreferenceStore::new()
            .with_value(SETTINGS_KEY, r#"{"appointmentReminders":false}"#);
        store.set_fail_reads(true);
        let settings = SettingsStore::new(Arc::new(store));
        assert_eq!(settings.load().await, NotificationSettings::default());
    }

    #[tokio::test]
    async fn test_save_then_reload_round_trip() {
        let backing = Arc::new(MemoryPreferenceStore::new());
        let settings = SettingsStore::new(backing.clone());
        let wanted = NotificationSettings::default()
            .with(NotificationCategory::UserNotifications, false)
            .with(NotificationCategory::ScheduleNotifications, false);

        assert!(settings.save(wanted).await);

        let reloaded = SettingsStore::new(backing).load().await;
        assert_eq!(reloaded, wanted);
    }

    #[tokio::test]
    async fn test_save_failure_still_publishes() {
        let backing = Arc::new(MemoryPreferenceStore::new());
        backing.set_fail_writes(true);
        let settings = SettingsStore::new(backing.clone());
        let wanted =
            NotificationSettings::default().with(NotificationCategory::AppointmentUpdates, false);

        assert!(!settings.save(wanted).await);
        assert_eq!(settings.current().await, wanted);
        assert!(backing.raw(SETTINGS_KEY).is_none());
    }

    #[tokio::test]
    async fn test_overlapping_saves_keep_memory_and_disk_in_sync() {
        let backing = Arc::new(SlowFirstWrite {
            inner: MemoryPreferenceStore::new(),
            writes: AtomicUsize::new(0),
        });
        let settings = SettingsStore::new(backing.clone());
        let first =
            NotificationSettings::default().with(NotificationCategory::UserNotifications, false);
        let second = NotificationSettings::default()
            .with(NotificationCategory::ScheduleNotifications, false);

        let (a, b) = tokio::join!(settings.save(first), settings.save(second));
        assert!(a && b);

        let stored: NotificationSettings =
            serde_json::from_str(&backing.inner.raw(SETTINGS_KEY).unwrap()).unwrap();
        assert_eq!(settings.current().await, stored);
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let store = FilePreferenceStore::new(&path);
        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.set("a", "3").await.unwrap();

        let reopened = FilePreferenceStore::new(&path);
        assert_eq!(reopened.get("a").await.unwrap(), Some("3".to_string()));
        assert_eq!(reopened.get("b").await.unwrap(), Some("2".to_string()));
        assert_eq!(reopened.get("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = FilePreferenceStore::new(&path);
        assert!(store.get(SETTINGS_KEY).await.is_err());

        // 设置加载仍然回退到默认值
        let settings = SettingsStore::new(Arc::new(store));
        assert_eq!(settings.load().await, NotificationSettings::default());
    }
}
