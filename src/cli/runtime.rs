//! 命令行运行时 - 用本地文件队列和文件偏好存储组装通知中心

use anyhow::Result;
use std::sync::Arc;
use tracing::debug;

use crate::config::AppConfig;
use crate::notification::center::NotificationCenter;
use crate::notification::local_queue::LocalNotificationQueue;
use crate::notification::preferences::FilePreferenceStore;
use crate::notification::router::{Navigator, Route};

/// 把导航目标打印到标准输出
pub struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: Route) {
        println!("→ {}", route);
    }
}

/// 命令行运行时
pub struct Runtime {
    pub config: AppConfig,
    pub queue: Arc<LocalNotificationQueue>,
    pub center: NotificationCenter,
}

impl Runtime {
    pub async fn start(config: AppConfig) -> Result<Self> {
        let queue = Arc::new(LocalNotificationQueue::new(config.queue_path(), config.permission));
        let preferences = Arc::new(FilePreferenceStore::new(config.preferences_path()));
        debug!(
            queue = %queue.path().display(),
            preferences = %preferences.path().display(),
            "Starting notification runtime"
        );

        let navigator = Arc::new(PrintNavigator);
        let center = NotificationCenter::builder(queue.clone(), preferences, navigator)
            .platform(config.platform)
            .zone(config.appointment_zone()?)
            .start()
            .await;

        Ok(Self {
            config,
            queue,
            center,
        })
    }

    /// 等待监听处理完已到达的事件后退出
    pub async fn shutdown(self) {
        self.center.shutdown().await;
    }
}
