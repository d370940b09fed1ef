//! 通知偏好设置 - 五个可独立开关的通知类别

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn enabled() -> bool {
    true
}

/// 通知偏好设置
///
/// 反序列化时忽略未知字段，缺失字段补默认值 `true`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    /// 预约提醒（提前 24 小时 / 2 小时）
    #[serde(default = "enabled")]
    pub appointment_reminders: bool,
    /// 预约创建、修改、取消
    #[serde(default = "enabled")]
    pub appointment_updates: bool,
    /// 用户创建、删除
    #[serde(default = "enabled")]
    pub user_notifications: bool,
    /// 排班创建
    #[serde(default = "enabled")]
    pub schedule_notifications: bool,
    /// 专科创建
    #[serde(default = "enabled")]
    pub specialty_notifications: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            appointment_reminders: true,
            appointment_updates: true,
            user_notifications: true,
            schedule_notifications: true,
            specialty_notifications: true,
        }
    }
}

impl NotificationSettings {
    /// 读取某个类别的开关
    pub fn get(&self, category: NotificationCategory) -> bool {
        match category {
            NotificationCategory::AppointmentReminders => self.appointment_reminders,
            NotificationCategory::AppointmentUpdates => self.appointment_updates,
            NotificationCategory::UserNotifications => self.user_notifications,
            NotificationCategory::ScheduleNotifications => self.schedule_notifications,
            NotificationCategory::SpecialtyNotifications => self.specialty_notifications,
        }
    }

    /// 设置某个类别的开关，其余类别不变
    pub fn set(&mut self, category: NotificationCategory, enabled: bool) {
        let slot = match category {
            NotificationCategory::AppointmentReminders => &mut self.appointment_reminders,
            NotificationCategory::AppointmentUpdates => &mut self.appointment_updates,
            NotificationCategory::UserNotifications => &mut self.user_notifications,
            NotificationCategory::ScheduleNotifications => &mut self.schedule_notifications,
            NotificationCategory::SpecialtyNotifications => &mut self.specialty_notifications,
        };
        *slot = enabled;
    }

    /// 返回修改了某个类别后的副本
    pub fn with(mut self, category: NotificationCategory, enabled: bool) -> Self {
        self.set(category, enabled);
        self
    }
}

/// 通知类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    AppointmentReminders,
    AppointmentUpdates,
    UserNotifications,
    ScheduleNotifications,
    SpecialtyNotifications,
}

impl NotificationCategory {
    pub const ALL: [NotificationCategory; 5] = [
        NotificationCategory::AppointmentReminders,
        NotificationCategory::AppointmentUpdates,
        NotificationCategory::UserNotifications,
        NotificationCategory::ScheduleNotifications,
        NotificationCategory::SpecialtyNotifications,
    ];

    /// 持久化记录中使用的键名
    pub fn key(&self) -> &'static str {
        match self {
            NotificationCategory::AppointmentReminders => "appointmentReminders",
            NotificationCategory::AppointmentUpdates => "appointmentUpdates",
            NotificationCategory::UserNotifications => "userNotifications",
            NotificationCategory::ScheduleNotifications => "scheduleNotifications",
            NotificationCategory::SpecialtyNotifications => "specialtyNotifications",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for NotificationCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        Self::ALL
            .into_iter()
            .find(|c| c.key().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| anyhow::anyhow!("unknown notification category: {}", s))
    }
}
