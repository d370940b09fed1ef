//! 事件映射 - 业务事件 → 通知，按权限与类别开关过滤
//!
//! 每个事件一个入口，返回 `true` 表示调度已尝试且没有失败。
//! 权限未授予或类别关闭时直接返回 `false`，不调用调度器。

use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, warn};

use super::event::{Appointment, AppointmentZone, Schedule, Specialty, User};
use super::formatter;
use super::permission::PermissionManager;
use super::preferences::SettingsStore;
use super::request::NotificationContent;
use super::scheduler::{ScheduleOutcome, Scheduler};
use super::settings::NotificationCategory;

/// 第一次提醒：预约前 24 小时
pub fn day_before_lead() -> Duration {
    Duration::hours(24)
}

/// 第二次提醒：预约前 2 小时
pub fn soon_lead() -> Duration {
    Duration::hours(2)
}

/// 一次预约的两条提醒各自的调度结果
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderOutcomes {
    pub day_before: ScheduleOutcome,
    pub soon: ScheduleOutcome,
}

impl ReminderOutcomes {
    /// 两次调度都没有失败（跳过不算失败）
    pub fn succeeded(&self) -> bool {
        !self.day_before.is_failed() && !self.soon.is_failed()
    }
}

/// 事件映射器
pub struct NotificationMapper {
    scheduler: Arc<Scheduler>,
    permission: Arc<PermissionManager>,
    settings: Arc<SettingsStore>,
    zone: AppointmentZone,
}

impl NotificationMapper {
    pub fn new(
        scheduler: Arc<Scheduler>,
        permission: Arc<PermissionManager>,
        settings: Arc<SettingsStore>,
        zone: AppointmentZone,
    ) -> Self {
        Self {
            scheduler,
            permission,
            settings,
            zone,
        }
    }

    async fn allowed(&self, category: NotificationCategory, event: &str) -> bool {
        if !self.permission.is_granted() {
            debug!(event, "Notification skipped: permission not granted");
            return false;
        }
        if !self.settings.current().await.get(category) {
            debug!(event, category = %category, "Notification skipped: category disabled");
            return false;
        }
        true
    }

    async fn immediate(
        &self,
        category: NotificationCategory,
        event: &str,
        content: NotificationContent,
    ) -> bool {
        if !self.allowed(category, event).await {
            return false;
        }
        !self.scheduler.schedule_immediate(content).await.is_failed()
    }

    /// 预约提醒（24 小时 + 2 小时）
    ///
    /// 两条提醒独立调度，已过期的会被跳过；单一布尔值合并了两次结果，
    /// 需要分别判断时使用 [`Self::appointment_reminders_detailed`]。
    pub async fn appointment_reminders(&self, appointment: &Appointment) -> bool {
        self.appointment_reminders_detailed(appointment)
            .await
            .map(|outcomes| outcomes.succeeded())
            .unwrap_or(false)
    }

    /// 预约提醒，返回每条提醒的结果；被过滤或时间无效时返回 `None`
    pub async fn appointment_reminders_detailed(
        &self,
        appointment: &Appointment,
    ) -> Option<ReminderOutcomes> {
        if !self
            .allowed(NotificationCategory::AppointmentReminders, "appointment_reminder")
            .await
        {
            return None;
        }

        let starts_at = match appointment.starts_at(self.zone) {
            Ok(t) => t,
            Err(e) => {
                warn!(appointment_id = appointment.id, error = %e, "Cannot schedule reminders");
                return None;
            }
        };

        let day_before = self
            .scheduler
            .schedule_at(
                formatter::appointment_reminder(appointment),
                starts_at - day_before_lead(),
            )
            .await;
        let soon = self
            .scheduler
            .schedule_at(formatter::appointment_soon(appointment), starts_at - soon_lead())
            .await;

        debug!(
            appointment_id = appointment.id,
            day_before = ?day_before,
            soon = ?soon,
            "Appointment reminders processed"
        );
        Some(ReminderOutcomes { day_before, soon })
    }

    pub async fn appointment_created(&self, appointment: &Appointment) -> bool {
        self.immediate(
            NotificationCategory::AppointmentUpdates,
            "appointment_created",
            formatter::appointment_created(appointment),
        )
        .await
    }

    pub async fn appointment_updated(&self, appointment: &Appointment) -> bool {
        self.immediate(
            NotificationCategory::AppointmentUpdates,
            "appointment_updated",
            formatter::appointment_updated(appointment),
        )
        .await
    }

    pub async fn appointment_cancelled(&self, appointment: &Appointment) -> bool {
        self.immediate(
            NotificationCategory::AppointmentUpdates,
            "appointment_cancelled",
            formatter::appointment_cancelled(appointment),
        )
        .await
    }

    pub async fn user_created(&self, user: &User) -> bool {
        self.immediate(
            NotificationCategory::UserNotifications,
            "user_created",
            formatter::user_created(user),
        )
        .await
    }

    pub async fn user_deleted(&self, user: &User) -> bool {
        self.immediate(
            NotificationCategory::UserNotifications,
            "user_deleted",
            formatter::user_deleted(user),
        )
        .await
    }

    pub async fn schedule_created(&self, schedule: &Schedule) -> bool {
        self.immediate(
            NotificationCategory::ScheduleNotifications,
            "schedule_created",
            formatter::schedule_created(schedule),
        )
        .await
    }

    pub async fn specialty_created(&self, specialty: &Specialty) -> bool {
        self.immediate(
            NotificationCategory::SpecialtyNotifications,
            "specialty_created",
            formatter::specialty_created(specialty),
        )
        .await
    }

    /// 自检通知：只检查权限，忽略类别开关
    pub async fn test_notification(&self) -> bool {
        if !self.permission.is_granted() {
            debug!("Test notification skipped: permission not granted");
            return false;
        }
        !self
            .scheduler
            .schedule_immediate(formatter::test_notification())
            .await
            .is_failed()
    }
}
