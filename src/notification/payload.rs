//! 通知载荷 - 按 `type` 区分的导航数据

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 通知携带的结构化数据
///
/// 只包含点击通知后导航所需的最少 ID。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// 预约前 24 小时提醒
    AppointmentReminder {
        #[serde(rename = "appointmentId")]
        appointment_id: i64,
    },
    /// 预约前 2 小时提醒
    AppointmentSoon {
        #[serde(rename = "appointmentId")]
        appointment_id: i64,
    },
    AppointmentCreated {
        #[serde(rename = "appointmentId")]
        appointment_id: i64,
    },
    AppointmentUpdated {
        #[serde(rename = "appointmentId")]
        appointment_id: i64,
    },
    AppointmentCancelled {
        #[serde(rename = "appointmentId")]
        appointment_id: i64,
    },
    UserCreated {
        #[serde(rename = "userId")]
        user_id: i64,
    },
    UserDeleted {
        #[serde(rename = "userId")]
        user_id: i64,
    },
    ScheduleCreated {
        #[serde(rename = "scheduleId")]
        schedule_id: i64,
    },
    SpecialtyCreated {
        #[serde(rename = "specialtyId")]
        specialty_id: i64,
    },
    /// 用户手动触发的自检通知
    Test,
}

/// 所有已知的 `type` 标签
pub const KNOWN_TAGS: [&str; 10] = [
    "appointment_reminder",
    "appointment_soon",
    "appointment_created",
    "appointment_updated",
    "appointment_cancelled",
    "user_created",
    "user_deleted",
    "schedule_created",
    "specialty_created",
    "test",
];

/// 解码结果
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadDecode {
    Known(NotificationPayload),
    /// 未知的 `type` 标签
    Unknown(String),
    /// 缺少 `type` 或字段不完整
    Malformed(String),
}

impl NotificationPayload {
    /// `type` 标签
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationPayload::AppointmentReminder { .. } => "appointment_reminder",
            NotificationPayload::AppointmentSoon { .. } => "appointment_soon",
            NotificationPayload::AppointmentCreated { .. } => "appointment_created",
            NotificationPayload::AppointmentUpdated { .. } => "appointment_updated",
            NotificationPayload::AppointmentCancelled { .. } => "appointment_cancelled",
            NotificationPayload::UserCreated { .. } => "user_created",
            NotificationPayload::UserDeleted { .. } => "user_deleted",
            NotificationPayload::ScheduleCreated { .. } => "schedule_created",
            NotificationPayload::SpecialtyCreated { .. } => "specialty_created",
            NotificationPayload::Test => "test",
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// 从原始 JSON 解码，区分未知标签和格式错误
    pub fn decode(data: &Value) -> PayloadDecode {
        match serde_json::from_value::<NotificationPayload>(data.clone()) {
            Ok(payload) => PayloadDecode::Known(payload),
            Err(e) => match data.get("type").and_then(|t| t.as_str()) {
                Some(tag) if !KNOWN_TAGS.contains(&tag) => PayloadDecode::Unknown(tag.to_string()),
                _ => PayloadDecode::Malformed(e.to_string()),
            },
        }
    }
}
