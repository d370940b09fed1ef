//! 消息格式化 - 将业务事件转换为通知标题和正文
//!
//! 纯函数，不做权限和设置判断。

use super::event::{Appointment, Schedule, Specialty, User};
use super::payload::NotificationPayload;
use super::request::NotificationContent;

/// Notification text (Spanish, matches the app UI)
pub mod msg {
    pub const REMINDER_TITLE: &str = "📅 Recordatorio de cita";
    pub const SOON_TITLE: &str = "⏰ Tu cita es pronto";
    pub const CREATED_TITLE: &str = "✅ Nueva cita agendada";
    pub const UPDATED_TITLE: &str = "📝 Cita actualizada";
    pub const CANCELLED_TITLE: &str = "❌ Cita cancelada";
    pub const USER_CREATED_TITLE: &str = "👤 Nuevo usuario";
    pub const USER_DELETED_TITLE: &str = "🗑️ Usuario eliminado";
    pub const SCHEDULE_CREATED_TITLE: &str = "🗓️ Nuevo horario";
    pub const SPECIALTY_CREATED_TITLE: &str = "🏥 Nueva especialidad";
    pub const TEST_TITLE: &str = "🔔 Notificación de prueba";
    pub const TEST_BODY: &str = "Las notificaciones locales funcionan correctamente";
}

/// 提前 24 小时提醒
pub fn appointment_reminder(appointment: &Appointment) -> NotificationContent {
    NotificationContent::new(
        msg::REMINDER_TITLE,
        format!(
            "Mañana tienes cita con Dr. {} a las {}",
            appointment.doctor_name(),
            appointment.display_time()
        ),
        &NotificationPayload::AppointmentReminder {
            appointment_id: appointment.id,
        },
    )
}

/// 提前 2 小时提醒
pub fn appointment_soon(appointment: &Appointment) -> NotificationContent {
    NotificationContent::new(
        msg::SOON_TITLE,
        format!(
            "Tu cita con Dr. {} es en 2 horas ({})",
            appointment.doctor_name(),
            appointment.display_time()
        ),
        &NotificationPayload::AppointmentSoon {
            appointment_id: appointment.id,
        },
    )
}

pub fn appointment_created(appointment: &Appointment) -> NotificationContent {
    NotificationContent::new(
        msg::CREATED_TITLE,
        format!(
            "Cita de {} con Dr. {} el {} a las {}",
            appointment.paciente_nombre,
            appointment.doctor_name(),
            appointment.display_date(),
            appointment.display_time()
        ),
        &NotificationPayload::AppointmentCreated {
            appointment_id: appointment.id,
        },
    )
}

pub fn appointment_updated(appointment: &Appointment) -> NotificationContent {
    NotificationContent::new(
        msg::UPDATED_TITLE,
        format!(
            "La cita de {} con Dr. {} ahora es el {} a las {}",
            appointment.paciente_nombre,
            appointment.doctor_name(),
            appointment.display_date(),
            appointment.display_time()
        ),
        &NotificationPayload::AppointmentUpdated {
            appointment_id: appointment.id,
        },
    )
}

pub fn appointment_cancelled(appointment: &Appointment) -> NotificationContent {
    NotificationContent::new(
        msg::CANCELLED_TITLE,
        format!(
            "Se canceló la cita de {} con Dr. {} del {}",
            appointment.paciente_nombre,
            appointment.doctor_name(),
            appointment.display_date()
        ),
        &NotificationPayload::AppointmentCancelled {
            appointment_id: appointment.id,
        },
    )
}

pub fn user_created(user: &User) -> NotificationContent {
    NotificationContent::new(
        msg::USER_CREATED_TITLE,
        format!("Se registró {} como {}", user.full_name(), user.rol),
        &NotificationPayload::UserCreated { user_id: user.id },
    )
}

pub fn user_deleted(user: &User) -> NotificationContent {
    NotificationContent::new(
        msg::USER_DELETED_TITLE,
        format!("Se eliminó el {} {}", user.rol, user.full_name()),
        &NotificationPayload::UserDeleted { user_id: user.id },
    )
}

pub fn schedule_created(schedule: &Schedule) -> NotificationContent {
    NotificationContent::new(
        msg::SCHEDULE_CREATED_TITLE,
        format!(
            "Dr. {} atenderá los {} de {}",
            schedule.doctor_name(),
            schedule.dia_semana,
            schedule.time_range()
        ),
        &NotificationPayload::ScheduleCreated {
            schedule_id: schedule.id,
        },
    )
}

pub fn specialty_created(specialty: &Specialty) -> NotificationContent {
    NotificationContent::new(
        msg::SPECIALTY_CREATED_TITLE,
        format!("Se agregó la especialidad {}", specialty.nombre),
        &NotificationPayload::SpecialtyCreated {
            specialty_id: specialty.id,
        },
    )
}

pub fn test_notification() -> NotificationContent {
    NotificationContent::new(msg::TEST_TITLE, msg::TEST_BODY, &NotificationPayload::Test)
}
