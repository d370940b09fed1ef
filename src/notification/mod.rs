//! 本地通知子系统
//!
//! # 组成
//! 1. 偏好存储：`PreferenceStore` + `SettingsStore`，五个类别开关持久化
//! 2. 权限管理：`PermissionManager`，每个进程只请求一次授权
//! 3. 调度器：`Scheduler`，立即/延时入队，过期的延时通知直接跳过
//! 4. 事件映射：`NotificationMapper`，业务事件 → 通知，按权限和类别过滤
//! 5. 响应路由：`ResponseRouter`，点击通知后按载荷类型导航
//! 6. 通知中心：`NotificationCenter`，对外唯一入口
//!
//! # 使用示例
//! ```ignore
//! use clinic_notify::notification::{NotificationCenter, FilePreferenceStore};
//!
//! let center = NotificationCenter::builder(service, preferences, navigator)
//!     .platform(Platform::Android)
//!     .start()
//!     .await;
//!
//! center.schedule_appointment_reminders(&appointment).await;
//! center.shutdown().await;
//! ```

pub mod center;
pub mod clock;
pub mod event;
pub mod formatter;
pub mod local_queue;
pub mod mapper;
pub mod memory;
pub mod payload;
pub mod permission;
pub mod preferences;
pub mod request;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod settings;

pub use center::{ListenerGuard, NotificationCenter, NotificationCenterBuilder};
pub use clock::{Clock, FixedClock, SystemClock};
pub use event::{Appointment, AppointmentZone, Schedule, Specialty, User, UserRole};
pub use local_queue::LocalNotificationQueue;
pub use mapper::{NotificationMapper, ReminderOutcomes};
pub use memory::InMemoryNotificationService;
pub use payload::{NotificationPayload, PayloadDecode};
pub use permission::{PermissionManager, PermissionState};
pub use preferences::{
    FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, SettingsStore,
};
pub use request::{
    NotificationContent, NotificationId, NotificationRequest, NotificationResponse, Sound, Trigger,
};
pub use router::{Navigator, ResponseRouter, Route};
pub use scheduler::{ScheduleOutcome, Scheduler};
pub use service::{
    ChannelConfig, Importance, NotificationService, NotificationSignal, PermissionStatus, Platform,
};
pub use settings::{NotificationCategory, NotificationSettings};
