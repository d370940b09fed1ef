//! Output formatting for CLI commands

use serde::Serialize;

use crate::notification::request::NotificationRequest;
use crate::notification::settings::{NotificationCategory, NotificationSettings};

/// Format output as pretty JSON
pub fn format_output<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

/// 设置列表（每行一个类别）
pub fn format_settings(settings: &NotificationSettings) -> String {
    NotificationCategory::ALL
        .iter()
        .map(|c| {
            let mark = if settings.get(*c) { "on " } else { "off" };
            format!("  [{}] {}", mark, c)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// 单条通知摘要
pub fn format_request(request: &NotificationRequest) -> String {
    let when = match request.trigger.instant() {
        Some(at) => at.to_rfc3339(),
        None => "immediate".to_string(),
    };
    let tag = request
        .data
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("?");
    format!(
        "  {} | {} | {} | {}: {}",
        request.identifier, when, tag, request.title, request.body
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::payload::NotificationPayload;
    use crate::notification::request::{NotificationContent, Trigger};

    #[test]
    fn test_format_settings_marks_disabled() {
        let settings = NotificationSettings::default()
            .with(NotificationCategory::ScheduleNotifications, false);
        let text = format_settings(&settings);
        assert!(text.contains("[off] scheduleNotifications"));
        assert!(text.contains("[on ] appointmentReminders"));
    }

    #[test]
    fn test_format_request() {
        let content = NotificationContent::new("Hola", "mundo", &NotificationPayload::Test);
        let request = NotificationRequest::new("local-1".into(), content, Trigger::Immediate);
        assert_eq!(format_request(&request), "  local-1 | immediate | test | Hola: mundo");
    }
}
