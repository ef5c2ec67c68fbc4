// apps/mb_cli/src/commands/run.rs

//! 运行模拟命令
//!
//! 加载配置 → 装配数据集 → 全程推进 → 写出时序/台账，
//! 可选输出单个目标函数标量（供外部灵敏度/Sobol 驱动消费）。

use anyhow::{Context, Result};
use clap::Args;
use mb_config::RunConfig;
use mb_io::{load_dataset, load_observations, SeriesWriter};
use mb_physics::Simulation;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

/// 运行模拟参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径 (JSON)
    #[arg(short, long)]
    pub config: PathBuf,

    /// 输出目录（覆盖配置中的设置）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 总时间步数（覆盖配置中的设置）
    #[arg(long)]
    pub steps: Option<usize>,

    /// 计算并打印目标函数标量的变量名（如 NH4、DO）
    #[arg(long)]
    pub objective: Option<String>,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== MariBio 模拟启动 ===");

    let mut config = RunConfig::load(&args.config)
        .with_context(|| format!("加载配置失败: {}", args.config.display()))?;
    if let Some(output) = args.output {
        config.output.dir = output;
    }
    if let Some(steps) = args.steps {
        config.time.n_steps = steps;
    }

    info!(
        "配置: {} 分区, {} 步 × {} 小时",
        config.zones.names.len(),
        config.time.n_steps,
        config.time.dt_hours
    );

    let inputs = load_dataset(&config).context("装配数据集失败")?;
    let observations = load_observations(&config).context("加载观测记录失败")?;
    let mut simulation = Simulation::new(inputs).context("装配模拟失败")?;

    // 全程推进
    let start = Instant::now();
    simulation.run().context("模拟运行失败")?;
    let elapsed = start.elapsed();

    info!("=== 模拟完成 ===");
    info!("总步数: {}", simulation.n_steps());
    info!("计算时间: {:.2} s", elapsed.as_secs_f64());
    info!(
        "平均步耗时: {:.3} ms",
        elapsed.as_secs_f64() * 1000.0 / simulation.n_steps().max(1) as f64
    );

    // 写出结果
    let mut zone_names: Vec<String> = config.zones.names.clone();
    zone_names.truncate(simulation.topology().n_interior());
    let writer = SeriesWriter::new(&config.output.dir, zone_names)?;
    let written = writer.write_series(simulation.recorder(), &config.output.variables)?;
    if config.output.contributions {
        writer.write_contributions(simulation.recorder())?;
        writer.write_boundary_budget(simulation.recorder())?;
    }
    info!("输出文件数: {}", written);

    // 目标函数（供外部灵敏度驱动逐行读取）
    if let Some(variable) = args.objective {
        let value = simulation
            .objective(&variable, &observations)
            .with_context(|| format!("计算目标函数失败: {variable}"))?;
        println!("{value}");
    }

    Ok(())
}
