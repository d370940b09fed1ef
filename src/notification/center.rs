//! 通知中心 - 对应用其余部分暴露的唯一入口
//!
//! 显式构造、依赖注入，不是全局单例。启动时并发完成：
//! 1. 权限初始化
//! 2. 偏好设置加载
//! 3. 投递/点击监听注册
//!
//! 监听任务由 [`ListenerGuard`] 持有，`shutdown()` 或 drop 时释放。

use chrono::FixedOffset;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::event::{Appointment, AppointmentZone, Schedule, Specialty, User};
use super::mapper::{NotificationMapper, ReminderOutcomes};
use super::permission::{PermissionManager, PermissionState};
use super::preferences::{PreferenceStore, SettingsStore};
use super::request::NotificationRequest;
use super::router::{Navigator, ResponseRouter};
use super::scheduler::Scheduler;
use super::service::{ChannelConfig, NotificationService, NotificationSignal, Platform};
use super::settings::NotificationSettings;

/// 监听任务句柄
pub struct ListenerGuard {
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ListenerGuard {
    /// 订阅通知事件并转交给路由器
    pub fn register(service: &dyn NotificationService, router: Arc<ResponseRouter>) -> Self {
        let mut events = service.subscribe();
        let (stop, mut stopped) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            loop {
                // 先处理已到达的事件，再响应停止信号
                tokio::select! {
                    biased;
                    signal = events.recv() => match signal {
                        Ok(NotificationSignal::Delivered(request)) => router.on_delivered(&request),
                        Ok(NotificationSignal::Response(response)) => {
                            router.on_user_response(&response);
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Notification listener lagged, events dropped");
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = &mut stopped => break,
                }
            }
            debug!("Notification listener stopped");
        });

        info!("Notification listeners registered");
        Self {
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    /// 停止监听并等待任务退出
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "Notification listener task failed");
            }
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// 通知中心构建器
pub struct NotificationCenterBuilder {
    service: Arc<dyn NotificationService>,
    preferences: Arc<dyn PreferenceStore>,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    platform: Platform,
    zone: AppointmentZone,
    channel: ChannelConfig,
}

impl NotificationCenterBuilder {
    pub fn new(
        service: Arc<dyn NotificationService>,
        preferences: Arc<dyn PreferenceStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            service,
            preferences,
            navigator,
            clock: Arc::new(SystemClock),
            platform: Platform::default(),
            zone: AppointmentZone::Local,
            channel: ChannelConfig::default(),
        }
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// 预约日期时间所在时区，缺省为本机时区
    pub fn zone(mut self, zone: AppointmentZone) -> Self {
        self.zone = zone;
        self
    }

    /// 固定 UTC 偏移
    pub fn utc_offset(self, offset: FixedOffset) -> Self {
        self.zone(AppointmentZone::Fixed(offset))
    }

    pub fn channel(mut self, channel: ChannelConfig) -> Self {
        self.channel = channel;
        self
    }

    /// 构造并启动通知中心
    pub async fn start(self) -> NotificationCenter {
        let scheduler = Arc::new(Scheduler::new(self.service.clone(), self.clock));
        let permission = Arc::new(
            PermissionManager::new(self.service.clone(), self.platform).with_channel(self.channel),
        );
        let settings = Arc::new(SettingsStore::new(self.preferences));
        let router = Arc::new(ResponseRouter::new(self.navigator));
        let mapper = NotificationMapper::new(
            scheduler.clone(),
            permission.clone(),
            settings.clone(),
            self.zone,
        );

        let service = self.service;
        let (permission_state, loaded, listener) = tokio::join!(
            permission.initialize(),
            settings.load(),
            async { ListenerGuard::register(service.as_ref(), router.clone()) },
        );

        info!(
            granted = permission_state.granted,
            settings = ?loaded,
            "Notification center started"
        );

        NotificationCenter {
            scheduler,
            permission,
            settings,
            mapper,
            router,
            listener: Mutex::new(Some(listener)),
        }
    }
}

/// 通知中心
pub struct NotificationCenter {
    scheduler: Arc<Scheduler>,
    permission: Arc<PermissionManager>,
    settings: Arc<SettingsStore>,
    mapper: NotificationMapper,
    router: Arc<ResponseRouter>,
    listener: Mutex<Option<ListenerGuard>>,
}

impl NotificationCenter {
    pub fn builder(
        service: Arc<dyn NotificationService>,
        preferences: Arc<dyn PreferenceStore>,
        navigator: Arc<dyn Navigator>,
    ) -> NotificationCenterBuilder {
        NotificationCenterBuilder::new(service, preferences, navigator)
    }

    pub fn is_initialized(&self) -> bool {
        self.permission.is_initialized()
    }

    pub fn permissions_granted(&self) -> bool {
        self.permission.is_granted()
    }

    pub fn permission_state(&self) -> PermissionState {
        self.permission.state()
    }

    pub async fn settings(&self) -> NotificationSettings {
        self.settings.current().await
    }

    /// 整体替换设置并持久化；返回是否已写入存储
    pub async fn update_settings(&self, settings: NotificationSettings) -> bool {
        self.settings.update(settings).await
    }

    pub fn mapper(&self) -> &NotificationMapper {
        &self.mapper
    }

    pub fn router(&self) -> &ResponseRouter {
        &self.router
    }

    pub async fn schedule_appointment_reminders(&self, appointment: &Appointment) -> bool {
        self.mapper.appointment_reminders(appointment).await
    }

    pub async fn schedule_appointment_reminders_detailed(
        &self,
        appointment: &Appointment,
    ) -> Option<ReminderOutcomes> {
        self.mapper.appointment_reminders_detailed(appointment).await
    }

    pub async fn notify_appointment_created(&self, appointment: &Appointment) -> bool {
        self.mapper.appointment_created(appointment).await
    }

    pub async fn notify_appointment_updated(&self, appointment: &Appointment) -> bool {
        self.mapper.appointment_updated(appointment).await
    }

    pub async fn notify_appointment_cancelled(&self, appointment: &Appointment) -> bool {
        self.mapper.appointment_cancelled(appointment).await
    }

    pub async fn notify_user_created(&self, user: &User) -> bool {
        self.mapper.user_created(user).await
    }

    pub async fn notify_user_deleted(&self, user: &User) -> bool {
        self.mapper.user_deleted(user).await
    }

    pub async fn notify_schedule_created(&self, schedule: &Schedule) -> bool {
        self.mapper.schedule_created(schedule).await
    }

    pub async fn notify_specialty_created(&self, specialty: &Specialty) -> bool {
        self.mapper.specialty_created(specialty).await
    }

    /// 自检：立即发送一条测试通知（只受权限限制）
    pub async fn test_local_notification(&self) -> bool {
        self.mapper.test_notification().await
    }

    pub async fn cancel_all_notifications(&self) -> bool {
        match self.scheduler.cancel_all().await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to cancel notifications");
                false
            }
        }
    }

    /// 待投递通知快照；查询失败返回空列表
    pub async fn get_scheduled_notifications(&self) -> Vec<NotificationRequest> {
        match self.scheduler.list_scheduled().await {
            Ok(list) => list,
            Err(e) => {
                warn!(error = %e, "Failed to list scheduled notifications");
                Vec::new()
            }
        }
    }

    /// 移除监听（幂等）
    pub async fn shutdown(&self) {
        let listener = match self.listener.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(listener) = listener {
            listener.shutdown().await;
            info!("Notification center shut down");
        }
    }
}
