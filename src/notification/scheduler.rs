//! 通知调度器 - 立即/延时入队、枚举、取消

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::request::{NotificationContent, NotificationId, NotificationRequest, Trigger};
use super::service::NotificationService;

/// 调度结果
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleOutcome {
    /// 已入队
    Scheduled(NotificationId),
    /// 跳过（触发时间已过）
    Skipped(String),
    /// 入队失败
    Failed(String),
}

impl ScheduleOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ScheduleOutcome::Failed(_))
    }

    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled(_))
    }

    pub fn id(&self) -> Option<&NotificationId> {
        match self {
            ScheduleOutcome::Scheduled(id) => Some(id),
            _ => None,
        }
    }
}

/// 通知调度器
pub struct Scheduler {
    service: Arc<dyn NotificationService>,
    clock: Arc<dyn Clock>,
}

impl Scheduler {
    pub fn new(service: Arc<dyn NotificationService>, clock: Arc<dyn Clock>) -> Self {
        Self { service, clock }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// 立即投递
    pub async fn schedule_immediate(&self, content: NotificationContent) -> ScheduleOutcome {
        self.enqueue(content, Trigger::Immediate).await
    }

    /// 在指定时刻投递
    ///
    /// 触发时间不晚于当前时间时跳过，不会退化为立即投递。
    pub async fn schedule_at(
        &self,
        content: NotificationContent,
        when: DateTime<Utc>,
    ) -> ScheduleOutcome {
        let now = self.clock.now();
        if when <= now {
            debug!(
                trigger = %when,
                now = %now,
                title = %content.title,
                "Trigger already passed, skipping"
            );
            return ScheduleOutcome::Skipped(format!("trigger {} is not after {}", when, now));
        }
        self.enqueue(content, Trigger::At(when)).await
    }

    async fn enqueue(&self, content: NotificationContent, trigger: Trigger) -> ScheduleOutcome {
        let title = content.title.clone();
        match self.service.schedule(content, trigger).await {
            Ok(id) => {
                info!(
                    id = %id,
                    title = %title,
                    trigger = ?trigger.instant(),
                    "Notification scheduled"
                );
                ScheduleOutcome::Scheduled(id)
            }
            Err(e) => {
                warn!(title = %title, error = %e, "Failed to schedule notification");
                ScheduleOutcome::Failed(e.to_string())
            }
        }
    }

    /// 取消所有待投递通知（幂等）
    pub async fn cancel_all(&self) -> Result<()> {
        self.service.cancel_all().await?;
        info!("All scheduled notifications cancelled");
        Ok(())
    }

    /// 待投递通知快照
    pub async fn list_scheduled(&self) -> Result<Vec<NotificationRequest>> {
        self.service.list_scheduled().await
    }
}
