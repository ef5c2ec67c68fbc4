// crates/mb_physics/src/forcing/mod.rs

//! 环境驱动与外部输入
//!
//! 提供模拟时间轴上的外部强迫数据：
//! - [`series`]: 按时间步索引的序列容器（细分辨率聚合、末端截断）
//! - [`drivers`]: 逐分区温度/光照/盐度驱动，每步重新采样
//! - [`boundary`]: 外海边界浓度（含逐物质缩放因子）
//! - [`loads`]: 河流/地下水/点源/养殖塘/大气负荷聚合

pub mod boundary;
pub mod drivers;
pub mod loads;
pub mod series;

pub use boundary::OuterSeaBoundary;
pub use drivers::{DriverSample, EnvironmentalDrivers};
pub use loads::{ExternalLoads, RiverLoadRecord, LOAD_SUBSTANCES};
pub use series::{StepSeries, ZonalSeries};
