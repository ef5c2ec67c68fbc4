// crates/mb_config/src/lib.rs

//! MariBio Config Layer
//!
//! 配置层，提供参数仓库和运行配置。
//!
//! # 模块概览
//!
//! - [`parameters`]: ParameterStore 扁平参数仓库（标量 / 逐分区数组）
//! - [`run_config`]: RunConfig 运行配置（全 f64，JSON 序列化）
//!
//! # 层级架构
//!
//! ```text
//! Layer 5: mb_cli        ─> uses RunConfig
//! Layer 4: mb_io         ─> dataset assembly from RunConfig
//! Layer 3: mb_physics    ─> typed params resolved once at construction
//! Layer 2: mb_config     ─> ParameterStore, RunConfig (本层)
//! Layer 1: mb_foundation
//! ```
//!
//! # 设计原则
//!
//! 1. **全 f64 配置**: 所有数值使用 f64，便于 JSON 序列化
//! 2. **构造期解析**: 组件在构造时一次性解析所需参数，不在每次调用时按名查找

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod parameters;
pub mod run_config;

// 重导出核心类型
pub use parameters::{ParameterStore, ParameterValue};
pub use run_config::{
    ForcingPaths, HarvestConfig, LoadScaling, OutputConfig, RunConfig, TimeConfig, ZoneConfig,
};
