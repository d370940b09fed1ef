//! 业务事件 - CRUD 界面传入的预约、用户、排班、专科记录
//!
//! 字段名沿用后端 API 的线上格式（`fechaCita`、`medico_nombre` 等）。

use anyhow::{anyhow, Context, Result};
use chrono::{
    DateTime, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// 预约日期时间所在的时区
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppointmentZone {
    /// 固定 UTC 偏移
    Fixed(FixedOffset),
    /// 本机时区，按预约当天的规则换算（含夏令时）
    #[default]
    Local,
}

impl From<FixedOffset> for AppointmentZone {
    fn from(offset: FixedOffset) -> Self {
        AppointmentZone::Fixed(offset)
    }
}

impl AppointmentZone {
    /// 本地日期时间 → UTC
    ///
    /// 回拨时重复出现的时刻取较早的一个；夏令时跳过的时刻返回错误。
    pub fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>> {
        match self {
            AppointmentZone::Fixed(offset) => resolve(offset, local),
            AppointmentZone::Local => resolve(&Local, local),
        }
    }
}

fn resolve<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => {
            debug!(%local, "Ambiguous local time, using the earliest instant");
            Ok(earliest.with_timezone(&Utc))
        }
        LocalResult::None => {
            warn!(%local, "Local time does not exist in this zone (DST gap)");
            Err(anyhow!("nonexistent local time: {}", local))
        }
    }
}

/// 预约
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    /// 日期 `YYYY-MM-DD`（也接受完整 ISO 时间戳，只取日期部分）
    #[serde(rename = "fechaCita")]
    pub fecha_cita: String,
    /// 时间 `HH:MM` 或 `HH:MM:SS`
    #[serde(rename = "horaCita")]
    pub hora_cita: String,
    pub medico_nombre: String,
    pub medico_apellido: String,
    pub paciente_nombre: String,
}

impl Appointment {
    /// 医生全名
    pub fn doctor_name(&self) -> String {
        full_name(&self.medico_nombre, &self.medico_apellido)
    }

    pub fn date(&self) -> Result<NaiveDate> {
        let raw = self.fecha_cita.trim();
        let date_part = raw.get(..10).unwrap_or(raw);
        NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            .with_context(|| format!("invalid appointment date: {}", self.fecha_cita))
    }

    pub fn time(&self) -> Result<NaiveTime> {
        parse_time(&self.hora_cita)
    }

    /// 预约开始时刻（按给定时区解释本地日期时间）
    pub fn starts_at(&self, zone: impl Into<AppointmentZone>) -> Result<DateTime<Utc>> {
        let local = NaiveDateTime::new(self.date()?, self.time()?);
        zone.into().to_utc(local)
    }

    /// 展示用时间 `HH:MM`
    pub fn display_time(&self) -> String {
        self.time()
            .map(|t| t.format("%H:%M").to_string())
            .unwrap_or_else(|_| self.hora_cita.clone())
    }

    /// 展示用日期 `DD/MM/YYYY`
    pub fn display_date(&self) -> String {
        self.date()
            .map(|d| d.format("%d/%m/%Y").to_string())
            .unwrap_or_else(|_| self.fecha_cita.clone())
    }
}

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Paciente,
    Medico,
    #[serde(alias = "administrador")]
    Admin,
    #[serde(other)]
    Otro,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UserRole::Paciente => "paciente",
            UserRole::Medico => "médico",
            UserRole::Admin => "administrador",
            UserRole::Otro => "usuario",
        };
        f.write_str(label)
    }
}

/// 用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub nombre: String,
    pub apellido: String,
    #[serde(default = "default_role")]
    pub rol: UserRole,
}

fn default_role() -> UserRole {
    UserRole::Otro
}

impl User {
    pub fn full_name(&self) -> String {
        full_name(&self.nombre, &self.apellido)
    }
}

/// 医生排班
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub medico_nombre: String,
    pub medico_apellido: String,
    #[serde(rename = "diaSemana")]
    pub dia_semana: String,
    #[serde(rename = "horaInicio")]
    pub hora_inicio: String,
    #[serde(rename = "horaFin")]
    pub hora_fin: String,
}

impl Schedule {
    pub fn doctor_name(&self) -> String {
        full_name(&self.medico_nombre, &self.medico_apellido)
    }

    /// `HH:MM - HH:MM`
    pub fn time_range(&self) -> String {
        format!("{} - {}", short_time(&self.hora_inicio), short_time(&self.hora_fin))
    }
}

/// 专科
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specialty {
    pub id: i64,
    pub nombre: String,
}

fn full_name(first: &str, last: &str) -> String {
    format!("{} {}", first.trim(), last.trim()).trim().to_string()
}

fn parse_time(raw: &str) -> Result<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .with_context(|| format!("invalid time: {}", raw))
}

fn short_time(raw: &str) -> String {
    parse_time(raw)
        .map(|t| t.format("%H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(fecha: &str, hora: &str) -> Appointment {
        Appointment {
            id: 1,
            fecha_cita: fecha.to_string(),
            hora_cita: hora.to_string(),
            medico_nombre: "Ana".to_string(),
            medico_apellido: "Ruiz".to_string(),
            paciente_nombre: "Luis".to_string(),
        }
    }

    #[test]
    fn test_appointment_wire_format() {
        let json = r#"{"id":1,"fechaCita":"2025-03-10","horaCita":"10:00","medico_nombre":"Ana","medico_apellido":"Ruiz","paciente_nombre":"Luis"}"#;
        let parsed: Appointment = serde_json::from_str(json).unwrap();
        assert_eq!(parsed, appointment("2025-03-10", "10:00"));
        assert_eq!(parsed.doctor_name(), "Ana Ruiz");
    }

    #[test]
    fn test_starts_at() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let expected = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap();

        assert_eq!(appointment("2025-03-10", "10:00").starts_at(utc).unwrap(), expected);
        assert_eq!(appointment("2025-03-10", "10:00:00").starts_at(utc).unwrap(), expected);
        assert_eq!(
            appointment("2025-03-10T00:00:00.000Z", "10:00").starts_at(utc).unwrap(),
            expected
        );

        let minus_five = FixedOffset::west_opt(5 * 3600).unwrap();
        assert_eq!(
            appointment("2025-03-10", "10:00").starts_at(minus_five).unwrap(),
            Utc.with_ymd_and_hms(2025, 3, 10, 15, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_local_zone_uses_rules_of_the_appointment_date() {
        // 冬季与夏季各取一天，各自按当天的偏移换算
        for (fecha, date) in [
            ("2026-01-15", NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()),
            ("2026-07-15", NaiveDate::from_ymd_opt(2026, 7, 15).unwrap()),
        ] {
            let naive = date.and_hms_opt(10, 0, 0).unwrap();
            let expected = Local
                .from_local_datetime(&naive)
                .earliest()
                .unwrap()
                .with_timezone(&Utc);
            assert_eq!(
                appointment(fecha, "10:00").starts_at(AppointmentZone::Local).unwrap(),
                expected,
                "{}",
                fecha
            );
        }
    }

    #[test]
    fn test_fixed_zone_resolves_every_time() {
        let zone = AppointmentZone::Fixed(FixedOffset::east_opt(-5 * 3600).unwrap());
        let naive = NaiveDate::from_ymd_opt(2026, 12, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        assert_eq!(
            zone.to_utc(naive).unwrap(),
            Utc.with_ymd_and_hms(2026, 12, 1, 15, 0, 0).unwrap()
        );
        assert_eq!(AppointmentZone::default(), AppointmentZone::Local);
    }

    #[test]
    fn test_invalid_date_or_time() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(appointment("10/03/2025", "10:00").starts_at(utc).is_err());
        assert!(appointment("2025-03-10", "diez").starts_at(utc).is_err());
    }

    #[test]
    fn test_display_helpers() {
        let a = appointment("2025-03-10", "09:30:00");
        assert_eq!(a.display_date(), "10/03/2025");
        assert_eq!(a.display_time(), "09:30");
    }

    #[test]
    fn test_user_role_parsing() {
        let user: User =
            serde_json::from_str(r#"{"id":2,"nombre":"Eva","apellido":"Paz","rol":"medico"}"#).unwrap();
        assert_eq!(user.rol, UserRole::Medico);

        let user: User =
            serde_json::from_str(r#"{"id":2,"nombre":"Eva","apellido":"Paz","rol":"recepcion"}"#).unwrap();
        assert_eq!(user.rol, UserRole::Otro);

        let user: User = serde_json::from_str(r#"{"id":2,"nombre":"Eva","apellido":"Paz"}"#).unwrap();
        assert_eq!(user.rol, UserRole::Otro);
        assert_eq!(user.full_name(), "Eva Paz");
    }

    #[test]
    fn test_schedule_time_range() {
        let schedule: Schedule = serde_json::from_str(
            r#"{"id":3,"medico_nombre":"Ana","medico_apellido":"Ruiz","diaSemana":"Lunes","horaInicio":"08:00:00","horaFin":"12:00"}"#,
        )
        .unwrap();
        assert_eq!(schedule.time_range(), "08:00 - 12:00");
        assert_eq!(schedule.doctor_name(), "Ana Ruiz");
    }
}
