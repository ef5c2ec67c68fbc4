// crates/mb_physics/src/lib.rs

//! MariBio 引擎模块
//!
//! 提供多分区耦合生态箱式模型的数值求解功能，包括：
//! - 分区拓扑 (zone)
//! - 状态变量管理 (state)
//! - 环境驱动与外部负荷 (forcing)
//! - 分区间水交换输运 (transport) - 守恒交换矩阵、体积追踪
//! - 过程函数库 (process) - 限制函数与速率项
//! - 生物模型 (bio) - 浮游生物、大型藻类、养殖种群能量学
//! - 营养盐收支 (nutrients) - 八个质量平衡池
//! - 推进引擎 (engine) - 步序编排、日程、逐步上下文
//!
//! # 推进次序
//!
//! 每个时间步严格按 驱动 → 养殖种群 → 浮游/藻类 → 营养盐 → 输运 →
//! 截断 → 提交 的次序执行；分区间耦合只经由输运步发生。

pub mod bio;
pub mod engine;
pub mod forcing;
pub mod nutrients;
pub mod process;
pub mod state;
pub mod transport;
pub mod zone;

// 重导出常用类型
pub use engine::{HarvestSchedule, Simulation, SimulationInputs, StepContext, StepRecord};
pub use state::{ModelState, StateVariable, VariableKind};
pub use transport::{ExchangeSeries, TransportEngine};
pub use zone::ZoneTopology;
