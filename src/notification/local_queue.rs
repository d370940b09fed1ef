//! 本地文件通知队列 - 命令行演练用的系统通知服务
//!
//! 状态保存在 `queue.json`：待投递列表、最近投递记录、渠道配置。
//! 每次读写都持有文件锁，多个命令行进程可以安全地并发操作。

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::request::{
    NotificationContent, NotificationId, NotificationRequest, NotificationResponse, Trigger,
};
use super::service::{ChannelConfig, NotificationService, NotificationSignal, PermissionStatus};

/// 保留的投递记录条数
const MAX_DELIVERED: usize = 50;

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueState {
    #[serde(default)]
    next_id: u64,
    #[serde(default)]
    pending: Vec<NotificationRequest>,
    #[serde(default)]
    delivered: Vec<NotificationRequest>,
    #[serde(default)]
    channels: BTreeMap<String, ChannelConfig>,
}

/// 本地文件通知队列
pub struct LocalNotificationQueue {
    path: PathBuf,
    permission: PermissionStatus,
    events: broadcast::Sender<NotificationSignal>,
}

impl LocalNotificationQueue {
    /// `permission` 是模拟的系统授权结果
    pub fn new(path: impl Into<PathBuf>, permission: PermissionStatus) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            path: path.into(),
            permission,
            events,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut QueueState) -> Result<T>) -> Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let lock_path = self.path.with_extension("lock");
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .with_context(|| format!("failed to open {}", lock_path.display()))?;
        lock.lock_exclusive()?;

        let result = (|| -> Result<T> {
            let mut state = self.read_state()?;
            let value = f(&mut state)?;

            let temp_path = self.path.with_extension("tmp");
            fs::write(&temp_path, serde_json::to_string_pretty(&state)?)?;
            fs::rename(&temp_path, &self.path)?;
            Ok(value)
        })();

        lock.unlock()?;
        result
    }

    fn read_state(&self) -> Result<QueueState> {
        if !self.path.exists() {
            return Ok(QueueState::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(QueueState::default());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("corrupt notification queue {}", self.path.display()))
    }

    /// 投递所有到期通知
    pub fn deliver_due(&self, now: DateTime<Utc>) -> Result<Vec<NotificationRequest>> {
        let due = self.with_state(|state| {
            let (due, rest): (Vec<_>, Vec<_>) =
                state.pending.drain(..).partition(|r| r.trigger.is_due(now));
            state.pending = rest;
            state.delivered.extend(due.iter().cloned());
            let overflow = state.delivered.len().saturating_sub(MAX_DELIVERED);
            state.delivered.drain(..overflow);
            Ok(due)
        })?;

        for request in &due {
            info!(id = %request.identifier, title = %request.title, "Notification delivered");
            let _ = self.events.send(NotificationSignal::Delivered(request.clone()));
        }
        Ok(due)
    }

    /// 最近投递的通知
    pub fn delivered(&self) -> Result<Vec<NotificationRequest>> {
        Ok(self.read_state()?.delivered)
    }

    /// 模拟点击一条已投递的通知
    pub fn tap(&self, id: &NotificationId) -> Result<NotificationRequest> {
        let request = self
            .delivered()?
            .into_iter()
            .find(|r| &r.identifier == id)
            .ok_or_else(|| anyhow!("no delivered notification with id {}", id))?;

        debug!(id = %id, "Simulating notification tap");
        let _ = self
            .events
            .send(NotificationSignal::Response(NotificationResponse::tap(request.clone())));
        Ok(request)
    }
}

#[async_trait]
impl NotificationService for LocalNotificationQueue {
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
    ) -> Result<NotificationId> {
        self.with_state(|state| {
            state.next_id += 1;
            let id = NotificationId(format!("local-{}", state.next_id));
            state
                .pending
                .push(NotificationRequest::new(id.clone(), content, trigger));
            Ok(id)
        })
    }

    async fn cancel_all(&self) -> Result<()> {
        self.with_state(|state| {
            state.pending.clear();
            Ok(())
        })
    }

    async fn list_scheduled(&self) -> Result<Vec<NotificationRequest>> {
        Ok(self.read_state()?.pending)
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.permission)
    }

    async fn set_channel(&self, id: &str, config: &ChannelConfig) -> Result<()> {
        self.with_state(|state| {
            state.channels.insert(id.to_string(), config.clone());
            Ok(())
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationSignal> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::payload::NotificationPayload;
    use chrono::{Duration, TimeZone};

    fn content(id: i64) -> NotificationContent {
        NotificationContent::new("t", "b", &NotificationPayload::UserCreated { user_id: id })
    }

    #[tokio::test]
    async fn test_schedule_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queue.json");
        let now = Utc.with_ymd_and_hms(2025, 3, 8, 9, 0, 0).unwrap();

        let queue = LocalNotificationQueue::new(&path, PermissionStatus::Granted);
        let first = queue.schedule(content(1), Trigger::Immediate).await.unwrap();
        let second = queue
            .schedule(content(2), Trigger::At(now + Duration::hours(1)))
            .await
            .unwrap();
        assert_ne!(first, second);

        let reopened = LocalNotificationQueue::new(&path, PermissionStatus::Granted);
        assert_eq!(reopened.list_scheduled().await.unwrap().len(), 2);

        reopened.cancel_all().await.unwrap();
        assert!(queue.list_scheduled().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deliver_due_and_tap() {
        let dir = tempfile::tempdir().unwrap();
        let queue =
            LocalNotificationQueue::new(dir.path().join("queue.json"), PermissionStatus::Granted);
        let now = Utc.with_ymd_and_hms(2025, 3, 8, 9, 0, 0).unwrap();
        let mut events = queue.subscribe();

        let immediate = queue.schedule(content(1), Trigger::Immediate).await.unwrap();
        queue
            .schedule(content(2), Trigger::At(now + Duration::hours(1)))
            .await
            .unwrap();

        let delivered = queue.deliver_due(now).unwrap();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].identifier, immediate);
        assert_eq!(queue.list_scheduled().await.unwrap().len(), 1);
        assert!(matches!(events.try_recv(), Ok(NotificationSignal::Delivered(_))));

        queue.tap(&immediate).unwrap();
        assert!(matches!(events.try_recv(), Ok(NotificationSignal::Response(_))));
        assert!(queue.tap(&NotificationId::from("missing")).is_err());
    }

    #[tokio::test]
    async fn test_permission_answer_is_configured() {
        let dir = tempfile::tempdir().unwrap();
        let queue =
            LocalNotificationQueue::new(dir.path().join("queue.json"), PermissionStatus::Denied);
        assert_eq!(queue.request_permission().await.unwrap(), PermissionStatus::Denied);
    }
}
