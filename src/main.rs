//! Clinic Notify CLI
//!
//! 本地通知子系统的诊断工具：查看/修改通知设置、模拟业务事件、投递与点击通知

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};
use clinic_notify::cli::{
    format_output, format_request, format_settings, handle_appointment, handle_schedule,
    handle_specialty, handle_user, AppointmentAction, EventSource, Runtime, UserAction,
};
use clinic_notify::notification::{NotificationCategory, NotificationId};
use clinic_notify::AppConfig;

#[derive(Parser)]
#[command(name = "clinic-notify")]
#[command(about = "Clinic Notify - 医疗预约本地通知诊断工具")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

#[derive(Subcommand)]
enum Commands {
    /// 显示当前通知设置
    Settings {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 开关某个通知类别
    Set {
        /// 类别，如 appointmentReminders
        category: NotificationCategory,
        /// on / off
        state: Toggle,
    },
    /// 发送一条测试通知
    Test,
    /// 列出待投递的通知
    List {
        /// 输出 JSON 格式
        #[arg(long)]
        json: bool,
    },
    /// 取消所有待投递通知
    CancelAll,
    /// 预约事件
    Appointment {
        action: AppointmentAction,
        #[command(flatten)]
        source: EventSource,
    },
    /// 用户事件
    User {
        action: UserAction,
        #[command(flatten)]
        source: EventSource,
    },
    /// 排班创建事件
    Schedule {
        #[command(flatten)]
        source: EventSource,
    },
    /// 专科创建事件
    Specialty {
        #[command(flatten)]
        source: EventSource,
    },
    /// 投递所有到期的通知
    Deliver,
    /// 模拟点击一条已投递的通知
    Tap {
        /// 通知 ID
        id: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 通过 RUST_LOG 环境变量控制日志级别，默认为 info
    // 例如: RUST_LOG=debug clinic-notify list
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("clinic_notify=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load()?;
    let runtime = Runtime::start(config).await?;
    let center = &runtime.center;

    if !center.permissions_granted() {
        warn!("Notifications are disabled: permission not granted");
    }

    match cli.command {
        Commands::Settings { json } => {
            let settings = center.settings().await;
            if json {
                println!("{}", format_output(&settings));
            } else {
                println!("通知设置:\n{}", format_settings(&settings));
            }
        }
        Commands::Set { category, state } => {
            let settings = center.settings().await.with(category, matches!(state, Toggle::On));
            if !center.update_settings(settings).await {
                eprintln!("设置未能写入存储，仅在本次运行中生效");
            }
            println!("通知设置:\n{}", format_settings(&settings));
        }
        Commands::Test => {
            if center.test_local_notification().await {
                println!("测试通知已发送");
            } else {
                eprintln!("测试通知发送失败（请检查通知权限）");
            }
        }
        Commands::List { json } => {
            let pending = center.get_scheduled_notifications().await;
            if json {
                println!("{}", format_output(&pending));
            } else {
                println!("待投递通知 {} 条:", pending.len());
                for request in &pending {
                    println!("{}", format_request(request));
                }
            }
        }
        Commands::CancelAll => {
            if center.cancel_all_notifications().await {
                println!("已取消所有待投递通知");
            } else {
                eprintln!("取消失败");
            }
        }
        Commands::Appointment { action, source } => {
            for line in handle_appointment(center, action, &source.read()?).await {
                println!("{}", line);
            }
        }
        Commands::User { action, source } => {
            for line in handle_user(center, action, &source.read()?).await {
                println!("{}", line);
            }
        }
        Commands::Schedule { source } => {
            for line in handle_schedule(center, &source.read()?).await {
                println!("{}", line);
            }
        }
        Commands::Specialty { source } => {
            for line in handle_specialty(center, &source.read()?).await {
                println!("{}", line);
            }
        }
        Commands::Deliver => {
            let delivered = runtime.queue.deliver_due(Utc::now())?;
            println!("已投递 {} 条通知:", delivered.len());
            for request in &delivered {
                println!("{}", format_request(request));
            }
        }
        Commands::Tap { id } => {
            let request = runtime.queue.tap(&NotificationId(id))?;
            println!("点击: {}", format_request(&request));
        }
    }

    // 等待监听处理完投递/点击事件
    runtime.shutdown().await;
    Ok(())
}
