//! Clinic Notify - 医疗预约客户端的本地通知子系统

pub mod cli;
pub mod config;
pub mod notification;

pub use config::AppConfig;
pub use notification::{
    Appointment, AppointmentZone, Navigator, NotificationCategory, NotificationCenter,
    NotificationPayload, NotificationRequest, NotificationSettings, Route, Schedule, Specialty,
    User,
};
