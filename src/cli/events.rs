//! 业务事件命令 - 从 JSON 文件读取事件并交给通知中心

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::PathBuf;

use crate::notification::center::NotificationCenter;
use crate::notification::event::{Appointment, Schedule, Specialty, User};
use crate::notification::scheduler::ScheduleOutcome;

/// 事件 JSON 来源
#[derive(Args, Debug, Clone)]
pub struct EventSource {
    /// 事件 JSON 文件（`-` 表示标准输入）
    #[arg(long, short)]
    pub file: PathBuf,
}

impl EventSource {
    pub fn read<T: DeserializeOwned>(&self) -> Result<T> {
        let raw = if self.file.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(&self.file)
                .with_context(|| format!("failed to read {}", self.file.display()))?
        };
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid event JSON in {}", self.file.display()))
    }
}

/// 预约事件
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Created,
    Updated,
    Cancelled,
    /// 24 小时 + 2 小时提醒
    Reminders,
}

/// 用户事件
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserAction {
    Created,
    Deleted,
}

fn describe(outcome: &ScheduleOutcome) -> String {
    match outcome {
        ScheduleOutcome::Scheduled(id) => format!("scheduled ({})", id),
        ScheduleOutcome::Skipped(reason) => format!("skipped: {}", reason),
        ScheduleOutcome::Failed(reason) => format!("failed: {}", reason),
    }
}

/// 处理预约事件，返回输出行
pub async fn handle_appointment(
    center: &NotificationCenter,
    action: AppointmentAction,
    appointment: &Appointment,
) -> Vec<String> {
    let ok = match action {
        AppointmentAction::Created => center.notify_appointment_created(appointment).await,
        AppointmentAction::Updated => center.notify_appointment_updated(appointment).await,
        AppointmentAction::Cancelled => center.notify_appointment_cancelled(appointment).await,
        AppointmentAction::Reminders => {
            return match center.schedule_appointment_reminders_detailed(appointment).await {
                Some(outcomes) => vec![
                    format!("24h reminder: {}", describe(&outcomes.day_before)),
                    format!("2h reminder: {}", describe(&outcomes.soon)),
                ],
                None => vec![
                    "reminders not scheduled (permission, setting or invalid date)".to_string(),
                ],
            };
        }
    };
    vec![outcome_line(ok)]
}

pub async fn handle_user(
    center: &NotificationCenter,
    action: UserAction,
    user: &User,
) -> Vec<String> {
    let ok = match action {
        UserAction::Created => center.notify_user_created(user).await,
        UserAction::Deleted => center.notify_user_deleted(user).await,
    };
    vec![outcome_line(ok)]
}

pub async fn handle_schedule(center: &NotificationCenter, schedule: &Schedule) -> Vec<String> {
    vec![outcome_line(center.notify_schedule_created(schedule).await)]
}

pub async fn handle_specialty(center: &NotificationCenter, specialty: &Specialty) -> Vec<String> {
    vec![outcome_line(center.notify_specialty_created(specialty).await)]
}

fn outcome_line(ok: bool) -> String {
    if ok {
        "notification scheduled".to_string()
    } else {
        "notification not scheduled".to_string()
    }
}
