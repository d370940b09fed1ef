//! 命令行运行时测试 - 文件偏好存储 + 本地文件队列，验证跨进程重启

use clinic_notify::cli::{handle_appointment, AppointmentAction, Runtime};
use clinic_notify::notification::{Appointment, NotificationCategory, NotificationSettings};
use clinic_notify::AppConfig;

fn config(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        utc_offset_minutes: Some(0),
        data_dir: Some(dir.to_path_buf()),
        ..AppConfig::default()
    }
}

fn future_appointment() -> Appointment {
    serde_json::from_str(
        r#"{"id":9,"fechaCita":"2099-06-01","horaCita":"09:30","medico_nombre":"Ana","medico_apellido":"Ruiz","paciente_nombre":"Luis"}"#,
    )
    .unwrap()
}

#[tokio::test]
async fn state_survives_runtime_restart() {
    let dir = tempfile::tempdir().unwrap();

    let runtime = Runtime::start(config(dir.path())).await.unwrap();
    assert!(runtime.center.permissions_granted());
    let wanted =
        NotificationSettings::default().with(NotificationCategory::UserNotifications, false);
    assert!(runtime.center.update_settings(wanted).await);

    let appointment = future_appointment();
    let lines =
        handle_appointment(&runtime.center, AppointmentAction::Reminders, &appointment).await;
    assert_eq!(lines.len(), 2);
    assert!(lines.iter().all(|l| l.contains("scheduled (")));
    runtime.shutdown().await;

    let runtime = Runtime::start(config(dir.path())).await.unwrap();
    assert_eq!(runtime.center.settings().await, wanted);
    assert_eq!(runtime.center.get_scheduled_notifications().await.len(), 2);

    assert!(runtime.center.cancel_all_notifications().await);
    assert!(runtime.center.get_scheduled_notifications().await.is_empty());
    runtime.shutdown().await;
}

#[tokio::test]
async fn denied_permission_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config(dir.path());
    config.permission = clinic_notify::notification::PermissionStatus::Denied;

    let runtime = Runtime::start(config).await.unwrap();
    assert!(runtime.center.is_initialized());
    assert!(!runtime.center.test_local_notification().await);
    assert!(runtime.center.get_scheduled_notifications().await.is_empty());
    runtime.shutdown().await;
}
