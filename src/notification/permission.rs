//! 权限管理 - 每个进程只请求一次通知授权

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::service::{ChannelConfig, NotificationService, PermissionStatus, Platform};

/// 默认通知渠道 ID
pub const DEFAULT_CHANNEL_ID: &str = "default";

/// 权限状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PermissionState {
    pub granted: bool,
    pub initialized: bool,
}

/// 权限管理器
pub struct PermissionManager {
    service: Arc<dyn NotificationService>,
    platform: Platform,
    channel: ChannelConfig,
    granted: AtomicBool,
    initialized: AtomicBool,
    once: OnceCell<PermissionState>,
}

impl PermissionManager {
    pub fn new(service: Arc<dyn NotificationService>, platform: Platform) -> Self {
        Self {
            service,
            platform,
            channel: ChannelConfig::default(),
            granted: AtomicBool::new(false),
            initialized: AtomicBool::new(false),
            once: OnceCell::new(),
        }
    }

    /// 自定义渠道配置
    pub fn with_channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// 请求授权（进程内只执行一次，不会返回错误）
    ///
    /// 授权失败或请求出错时降级为 `granted = false`。
    pub async fn initialize(&self) -> PermissionState {
        *self.once.get_or_init(|| self.request()).await
    }

    async fn request(&self) -> PermissionState {
        let granted = match self.service.request_permission().await {
            Ok(PermissionStatus::Granted) => true,
            Ok(status) => {
                warn!(?status, "Notification permission not granted");
                false
            }
            Err(e) => {
                warn!(error = %e, "Notification permission request failed");
                false
            }
        };

        if granted && self.platform.requires_channel() {
            match self.service.set_channel(DEFAULT_CHANNEL_ID, &self.channel).await {
                Ok(()) => info!(channel = DEFAULT_CHANNEL_ID, "Notification channel configured"),
                Err(e) => warn!(
                    channel = DEFAULT_CHANNEL_ID,
                    error = %e,
                    "Failed to configure notification channel"
                ),
            }
        }

        self.granted.store(granted, Ordering::SeqCst);
        self.initialized.store(true, Ordering::SeqCst);
        info!(granted, platform = ?self.platform, "Notification permission initialized");

        PermissionState {
            granted,
            initialized: true,
        }
    }

    pub fn is_granted(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> PermissionState {
        PermissionState {
            granted: self.is_granted(),
            initialized: self.is_initialized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::memory::InMemoryNotificationService;
    use crate::notification::service::Importance;

    #[tokio::test]
    async fn test_granted_configures_channel_on_android() {
        let service = Arc::new(InMemoryNotificationService::granted());
        let manager = PermissionManager::new(service.clone(), Platform::Android);

        assert_eq!(manager.state(), PermissionState::default());
        let state = manager.initialize().await;
        assert!(state.granted && state.initialized);

        let channel = service.channel(DEFAULT_CHANNEL_ID).unwrap();
        assert_eq!(channel.importance, Importance::Max);
        assert_eq!(channel.vibration_pattern, vec![0, 250, 250, 250]);
        assert_eq!(channel.light_color, "#FF231F7C");
    }

    #[tokio::test]
    async fn test_ios_skips_channel() {
        let service = Arc::new(InMemoryNotificationService::granted());
        let manager = PermissionManager::new(service.clone(), Platform::Ios);

        assert!(manager.initialize().await.granted);
        assert!(service.channel(DEFAULT_CHANNEL_ID).is_none());
    }

    #[tokio::test]
    async fn test_denied_skips_channel() {
        let service = Arc::new(InMemoryNotificationService::denied());
        let manager = PermissionManager::new(service.clone(), Platform::Android);

        let state = manager.initialize().await;
        assert!(!state.granted);
        assert!(state.initialized);
        assert!(service.channel(DEFAULT_CHANNEL_ID).is_none());
    }

    #[tokio::test]
    async fn test_request_error_degrades() {
        let service = Arc::new(InMemoryNotificationService::granted());
        service.set_permission_error("platform unavailable");
        let manager = PermissionManager::new(service, Platform::Android);

        let state = manager.initialize().await;
        assert!(!state.granted);
        assert!(manager.is_initialized());
    }

    #[tokio::test]
    async fn test_channel_failure_keeps_grant() {
        let service = Arc::new(InMemoryNotificationService::granted());
        service.set_fail_channel(true);
        let manager = PermissionManager::new(service, Platform::Android);

        assert!(manager.initialize().await.granted);
    }

    #[tokio::test]
    async fn test_requests_only_once() {
        let service = Arc::new(InMemoryNotificationService::granted());
        let manager = PermissionManager::new(service.clone(), Platform::Android);

        manager.initialize().await;
        manager.initialize().await;
        assert_eq!(service.permission_requests(), 1);
    }
}
