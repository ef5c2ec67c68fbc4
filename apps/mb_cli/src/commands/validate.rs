// apps/mb_cli/src/commands/validate.rs

//! 验证配置命令
//!
//! 加载配置并装配数据集但不运行，报告所有配置/数据问题。

use anyhow::{Context, Result};
use clap::Args;
use mb_config::RunConfig;
use mb_io::{load_dataset, load_observations};
use std::path::PathBuf;
use tracing::info;

/// 验证配置参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    let config = RunConfig::load(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    info!("配置有效: {} 分区", config.zones.names.len());

    let inputs = load_dataset(&config).context("装配数据集失败")?;
    info!(
        "数据集有效: 输运覆盖 {} 步 (需要 {} 步)",
        inputs.transport.horizon(),
        config.time.n_steps
    );
    if inputs.transport.horizon() < config.time.n_steps {
        anyhow::bail!(
            "输运数据不足: 覆盖 {} 步, 需要 {} 步",
            inputs.transport.horizon(),
            config.time.n_steps
        );
    }

    let observations = load_observations(&config).context("加载观测记录失败")?;
    if !observations.is_empty() {
        info!("观测记录: {} 条", observations.len());
    }

    info!("验证通过");
    Ok(())
}
