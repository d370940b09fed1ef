//! 通知请求 - 提交给系统通知队列的单元

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::payload::{NotificationPayload, PayloadDecode};

/// 系统通知队列分配的 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(pub String);

impl NotificationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 提示音
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    Default,
}

/// 触发时间：`null` 表示立即投递
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Trigger {
    /// 不早于该时刻投递
    At(DateTime<Utc>),
    Immediate,
}

impl Trigger {
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Trigger::At(when) => Some(*when),
            Trigger::Immediate => None,
        }
    }

    /// 在 `now` 时刻是否已可投递
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self {
            Trigger::At(when) => *when <= now,
            Trigger::Immediate => true,
        }
    }
}

/// 通知内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationContent {
    pub title: String,
    pub body: String,
    /// 原始载荷（系统队列原样保存，点击时再解码）
    pub data: Value,
    #[serde(default)]
    pub sound: Option<Sound>,
}

impl NotificationContent {
    pub fn new(
        title: impl Into<String>,
        body: impl Into<String>,
        payload: &NotificationPayload,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: payload.to_value(),
            sound: Some(Sound::Default),
        }
    }

    /// 静音
    pub fn silent(mut self) -> Self {
        self.sound = None;
        self
    }

    pub fn payload(&self) -> PayloadDecode {
        NotificationPayload::decode(&self.data)
    }
}

/// 已入队的通知请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub identifier: NotificationId,
    pub title: String,
    pub body: String,
    pub data: Value,
    #[serde(default)]
    pub sound: Option<Sound>,
    pub trigger: Trigger,
}

impl NotificationRequest {
    pub fn new(identifier: NotificationId, content: NotificationContent, trigger: Trigger) -> Self {
        Self {
            identifier,
            title: content.title,
            body: content.body,
            data: content.data,
            sound: content.sound,
            trigger,
        }
    }

    pub fn payload(&self) -> PayloadDecode {
        NotificationPayload::decode(&self.data)
    }
}

/// 用户对已投递通知的响应（点击）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub request: NotificationRequest,
    /// 操作 ID，默认点击为 `default`
    pub action_identifier: String,
}

impl NotificationResponse {
    pub const DEFAULT_ACTION: &'static str = "default";

    pub fn tap(request: NotificationRequest) -> Self {
        Self {
            request,
            action_identifier: Self::DEFAULT_ACTION.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_trigger_serialization() {
        assert_eq!(serde_json::to_value(Trigger::Immediate).unwrap(), Value::Null);

        let when = Utc.with_ymd_and_hms(2025, 3, 9, 10, 0, 0).unwrap();
        let json = serde_json::to_value(Trigger::At(when)).unwrap();
        assert!(json.is_string());
        let parsed: Trigger = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, Trigger::At(when));

        let parsed: Trigger = serde_json::from_value(Value::Null).unwrap();
        assert_eq!(parsed, Trigger::Immediate);
    }

    #[test]
    fn test_trigger_is_due() {
        let now = Utc.with_ymd_and_hms(2025, 3, 9, 10, 0, 0).unwrap();
        assert!(Trigger::Immediate.is_due(now));
        assert!(Trigger::At(now).is_due(now));
        assert!(!Trigger::At(now + chrono::Duration::seconds(1)).is_due(now));
    }

    #[test]
    fn test_request_wire_shape() {
        let content = NotificationContent::new(
            "Nueva cita",
            "body",
            &NotificationPayload::AppointmentCreated { appointment_id: 1 },
        );
        let request = NotificationRequest::new("n-1".into(), content, Trigger::Immediate);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["identifier"], "n-1");
        assert_eq!(json["sound"], "default");
        assert_eq!(json["trigger"], Value::Null);
        assert_eq!(json["data"], json!({"type": "appointment_created", "appointmentId": 1}));
    }
}
