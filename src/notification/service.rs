//! 系统通知服务 trait - 调度、取消、枚举、权限、渠道

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use super::request::{
    NotificationContent, NotificationId, NotificationRequest, NotificationResponse, Trigger,
};

/// 目标平台
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[default]
    Android,
    Ios,
}

impl Platform {
    /// 是否需要先配置通知渠道
    pub fn requires_channel(&self) -> bool {
        matches!(self, Platform::Android)
    }
}

/// 系统返回的授权状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Granted,
    Denied,
    #[default]
    Undetermined,
}

/// 渠道重要程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Min,
    Low,
    Default,
    High,
    Max,
}

/// 通知渠道配置（Android）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub name: String,
    pub importance: Importance,
    /// 振动模式（毫秒）
    pub vibration_pattern: Vec<u64>,
    /// ARGB 颜色
    pub light_color: String,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            importance: Importance::Max,
            vibration_pattern: vec![0, 250, 250, 250],
            light_color: "#FF231F7C".to_string(),
        }
    }
}

/// 系统推送给应用的通知事件
#[derive(Debug, Clone)]
pub enum NotificationSignal {
    /// 通知已投递
    Delivered(NotificationRequest),
    /// 用户点击了通知
    Response(NotificationResponse),
}

/// 系统通知队列
#[async_trait]
pub trait NotificationService: Send + Sync {
    /// 入队，返回系统分配的 ID
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
    ) -> Result<NotificationId>;

    /// 取消所有待投递通知
    async fn cancel_all(&self) -> Result<()>;

    /// 待投递通知快照
    async fn list_scheduled(&self) -> Result<Vec<NotificationRequest>>;

    /// 请求通知授权
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// 配置通知渠道
    async fn set_channel(&self, id: &str, config: &ChannelConfig) -> Result<()>;

    /// 订阅投递与点击事件
    fn subscribe(&self) -> broadcast::Receiver<NotificationSignal>;
}
