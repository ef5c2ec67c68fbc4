// apps/mb_cli/src/main.rs

//! MariBio 命令行界面
//!
//! 提供多分区生态箱式模型模拟的命令行工具。
//!
//! # 架构层级
//!
//! 本模块属于应用层：只消费 `RunConfig` 与装配好的 `Simulation`，
//! 不直接触碰引擎内部类型。

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// MariBio 海湾生态箱式模型命令行工具
#[derive(Parser)]
#[command(name = "mb_cli")]
#[command(author = "MariBio Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MariBio coastal ecosystem box model", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行模拟
    Run(commands::run::RunArgs),
    /// 显示配置与拓扑信息
    Info(commands::info::InfoArgs),
    /// 验证配置与数据集
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // 执行命令
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
