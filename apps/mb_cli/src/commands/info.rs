// apps/mb_cli/src/commands/info.rs

//! 信息命令
//!
//! 打印配置与分区拓扑摘要。

use anyhow::{Context, Result};
use clap::Args;
use mb_config::RunConfig;
use std::path::PathBuf;
use tracing::info;

/// 信息命令参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let config = RunConfig::load(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;

    info!("=== MariBio 配置摘要 ===");
    info!(
        "时间轴: {} 步 × {} 小时",
        config.time.n_steps, config.time.dt_hours
    );
    info!("分区数: {} (+ 边界区 {})", config.zones.names.len(), config.zones.boundary_name);
    for (i, name) in config.zones.names.iter().enumerate() {
        info!(
            "  [{i}] {name}: 面积 {:.3e} m², 初始体积 {:.3e} m³",
            config.zones.areas[i], config.zones.initial_volumes[i]
        );
    }
    if !config.zones.river_inflow_zones.is_empty() {
        info!("河流入流:");
        for (river, zone) in &config.zones.river_inflow_zones {
            info!("  {river} → {zone}");
        }
    }
    info!(
        "收获日程: 贝类 {} 步, 鱼类 {} 步, 藻类 {} 步 ({:.0}%)",
        config.harvest.shellfish_period,
        config.harvest.fish_period,
        config.harvest.macroalgae_period,
        config.harvest.macroalgae_fraction * 100.0
    );
    info!("参数仓库: {} 项", config.parameters.len());
    info!("输出目录: {}", config.output.dir.display());

    Ok(())
}
