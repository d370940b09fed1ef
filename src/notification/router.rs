//! 响应路由 - 用户点击通知后按载荷类型导航

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::payload::{NotificationPayload, PayloadDecode};
use super::request::{NotificationRequest, NotificationResponse};

/// 导航目标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", content = "id", rename_all = "snake_case")]
pub enum Route {
    AppointmentDetail(i64),
    UserList,
    ScheduleList,
    SpecialtyList,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::AppointmentDetail(id) => write!(f, "appointment/{}", id),
            Route::UserList => f.write_str("users"),
            Route::ScheduleList => f.write_str("schedules"),
            Route::SpecialtyList => f.write_str("specialties"),
        }
    }
}

/// 导航协作者（由界面层实现）
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// 响应路由器
pub struct ResponseRouter {
    navigator: Arc<dyn Navigator>,
}

impl ResponseRouter {
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self { navigator }
    }

    /// 载荷对应的导航目标；自检通知没有目标
    pub fn route_for(payload: &NotificationPayload) -> Option<Route> {
        match payload {
            NotificationPayload::AppointmentReminder { appointment_id }
            | NotificationPayload::AppointmentSoon { appointment_id }
            | NotificationPayload::AppointmentCreated { appointment_id }
            | NotificationPayload::AppointmentUpdated { appointment_id }
            | NotificationPayload::AppointmentCancelled { appointment_id } => {
                Some(Route::AppointmentDetail(*appointment_id))
            }
            NotificationPayload::UserCreated { .. } | NotificationPayload::UserDeleted { .. } => {
                Some(Route::UserList)
            }
            NotificationPayload::ScheduleCreated { .. } => Some(Route::ScheduleList),
            NotificationPayload::SpecialtyCreated { .. } => Some(Route::SpecialtyList),
            NotificationPayload::Test => None,
        }
    }

    /// 通知已投递（前台或后台），目前只记录日志
    pub fn on_delivered(&self, request: &NotificationRequest) {
        debug!(id = %request.identifier, title = %request.title, "Notification delivered");
    }

    /// 用户点击通知；返回实际执行的导航
    pub fn on_user_response(&self, response: &NotificationResponse) -> Option<Route> {
        let request = &response.request;
        let payload = match request.payload() {
            PayloadDecode::Known(payload) => payload,
            PayloadDecode::Unknown(tag) => {
                warn!(id = %request.identifier, tag = %tag, "Unknown notification type, ignoring");
                return None;
            }
            PayloadDecode::Malformed(error) => {
                warn!(
                    id = %request.identifier,
                    error = %error,
                    "Malformed notification data, ignoring"
                );
                return None;
            }
        };

        match Self::route_for(&payload) {
            Some(route) => {
                info!(
                    id = %request.identifier,
                    tag = payload.tag(),
                    route = %route,
                    "Routing notification tap"
                );
                self.navigator.navigate(route);
                Some(route)
            }
            None => {
                debug!(
                    id = %request.identifier,
                    tag = payload.tag(),
                    "Notification tap has no destination"
                );
                None
            }
        }
    }
}
