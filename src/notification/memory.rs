//! 进程内通知队列 - 测试与演练用

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::broadcast;

use super::request::{
    NotificationContent, NotificationId, NotificationRequest, NotificationResponse, Trigger,
};
use super::service::{ChannelConfig, NotificationService, NotificationSignal, PermissionStatus};

/// 进程内通知队列
pub struct InMemoryNotificationService {
    pending: Mutex<Vec<NotificationRequest>>,
    channels: Mutex<HashMap<String, ChannelConfig>>,
    permission: Mutex<Result<PermissionStatus, String>>,
    next_id: AtomicU64,
    schedule_calls: AtomicUsize,
    permission_requests: AtomicUsize,
    /// 第 N 次调度调用失败（从 1 开始），0 表示不注入
    fail_on_call: AtomicUsize,
    fail_all: AtomicBool,
    fail_channel: AtomicBool,
    events: broadcast::Sender<NotificationSignal>,
}

impl InMemoryNotificationService {
    pub fn new(permission: PermissionStatus) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            pending: Mutex::new(Vec::new()),
            channels: Mutex::new(HashMap::new()),
            permission: Mutex::new(Ok(permission)),
            next_id: AtomicU64::new(1),
            schedule_calls: AtomicUsize::new(0),
            permission_requests: AtomicUsize::new(0),
            fail_on_call: AtomicUsize::new(0),
            fail_all: AtomicBool::new(false),
            fail_channel: AtomicBool::new(false),
            events,
        }
    }

    pub fn granted() -> Self {
        Self::new(PermissionStatus::Granted)
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied)
    }

    /// 权限请求本身报错
    pub fn set_permission_error(&self, message: &str) {
        if let Ok(mut p) = self.permission.lock() {
            *p = Err(message.to_string());
        }
    }

    pub fn fail_schedule_call(&self, nth: usize) {
        self.fail_on_call.store(nth, Ordering::SeqCst);
    }

    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_channel(&self, fail: bool) {
        self.fail_channel.store(fail, Ordering::SeqCst);
    }

    /// 调度调用次数（含失败）
    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }

    pub fn channel(&self, id: &str) -> Option<ChannelConfig> {
        self.channels.lock().ok().and_then(|c| c.get(id).cloned())
    }

    pub fn pending(&self) -> Vec<NotificationRequest> {
        self.pending.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// 投递所有到期通知，返回已投递的请求
    pub fn deliver_due(&self, now: DateTime<Utc>) -> Vec<NotificationRequest> {
        let due: Vec<NotificationRequest> = match self.pending.lock() {
            Ok(mut pending) => {
                let (due, rest): (Vec<_>, Vec<_>) =
                    pending.drain(..).partition(|r| r.trigger.is_due(now));
                *pending = rest;
                due
            }
            Err(_) => Vec::new(),
        };
        for request in &due {
            let _ = self.events.send(NotificationSignal::Delivered(request.clone()));
        }
        due
    }

    /// 模拟用户点击
    pub fn tap(&self, request: NotificationRequest) {
        let _ = self
            .events
            .send(NotificationSignal::Response(NotificationResponse::tap(request)));
    }
}

#[async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn schedule(
        &self,
        content: NotificationContent,
        trigger: Trigger,
    ) -> Result<NotificationId> {
        let call = self.schedule_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_all.load(Ordering::SeqCst)
            || self.fail_on_call.load(Ordering::SeqCst) == call
        {
            bail!("notification service rejected request #{}", call);
        }

        let id = NotificationId(format!("mem-{}", self.next_id.fetch_add(1, Ordering::SeqCst)));
        let request = NotificationRequest::new(id.clone(), content, trigger);
        self.pending
            .lock()
            .map_err(|_| anyhow::anyhow!("pending queue poisoned"))?
            .push(request);
        Ok(id)
    }

    async fn cancel_all(&self) -> Result<()> {
        self.pending
            .lock()
            .map_err(|_| anyhow::anyhow!("pending queue poisoned"))?
            .clear();
        Ok(())
    }

    async fn list_scheduled(&self) -> Result<Vec<NotificationRequest>> {
        Ok(self.pending())
    }

    async fn request_permission(&self) -> Result<PermissionStatus> {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        let answer = self
            .permission
            .lock()
            .map_err(|_| anyhow::anyhow!("permission state poisoned"))?
            .clone();
        answer.map_err(|e| anyhow::anyhow!(e))
    }

    async fn set_channel(&self, id: &str, config: &ChannelConfig) -> Result<()> {
        if self.fail_channel.load(Ordering::SeqCst) {
            bail!("channel configuration rejected");
        }
        self.channels
            .lock()
            .map_err(|_| anyhow::anyhow!("channel table poisoned"))?
            .insert(id.to_string(), config.clone());
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationSignal> {
        self.events.subscribe()
    }
}
