//! 配置 - `~/.config/clinic-notify/config.json`
//!
//! 文件不存在时使用默认值；`CLINIC_NOTIFY_HOME` 可覆盖数据目录。

use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::notification::event::AppointmentZone;
use crate::notification::service::{PermissionStatus, Platform};

/// 数据目录环境变量
pub const HOME_ENV: &str = "CLINIC_NOTIFY_HOME";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// 目标平台（决定是否配置通知渠道）
    pub platform: Platform,
    /// 预约时间所在时区（分钟），缺省取本机时区
    pub utc_offset_minutes: Option<i32>,
    /// 本地通知队列模拟的授权结果
    pub permission: PermissionStatus,
    /// 数据目录，缺省 `~/.config/clinic-notify`
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Android,
            utc_offset_minutes: None,
            permission: PermissionStatus::Granted,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// 默认数据目录
    pub fn default_data_dir() -> PathBuf {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                return PathBuf::from(home);
            }
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("clinic-notify")
    }

    pub fn default_path() -> PathBuf {
        Self::default_data_dir().join("config.json")
    }

    /// 从默认位置加载
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(Self::default_data_dir)
    }

    pub fn preferences_path(&self) -> PathBuf {
        self.data_dir().join("preferences.json")
    }

    pub fn queue_path(&self) -> PathBuf {
        self.data_dir().join("queue.json")
    }

    /// 未配置偏移时按本机时区（含夏令时规则）解释预约时间
    pub fn appointment_zone(&self) -> Result<AppointmentZone> {
        match self.utc_offset_minutes {
            Some(minutes) => FixedOffset::east_opt(minutes * 60)
                .map(AppointmentZone::Fixed)
                .with_context(|| format!("utc_offset_minutes out of range: {}", minutes)),
            None => Ok(AppointmentZone::Local),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"platform":"ios","utc_offset_minutes":-300,"data_dir":"/tmp/cn"}"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.platform, Platform::Ios);
        assert_eq!(config.permission, PermissionStatus::Granted);
        assert_eq!(
            config.appointment_zone().unwrap(),
            AppointmentZone::Fixed(FixedOffset::west_opt(300 * 60).unwrap())
        );
        assert_eq!(config.queue_path(), PathBuf::from("/tmp/cn/queue.json"));
    }

    #[test]
    fn test_invalid_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_offset_out_of_range() {
        let config = AppConfig {
            utc_offset_minutes: Some(24 * 60),
            ..AppConfig::default()
        };
        assert!(config.appointment_zone().is_err());
    }

    #[test]
    fn test_no_offset_uses_local_zone() {
        assert_eq!(AppConfig::default().appointment_zone().unwrap(), AppointmentZone::Local);
    }
}
