// crates/mb_physics/src/engine/context.rs

//! 逐步上下文
//!
//! 一个时间步内所有"算一次、处处复用"的量集中放在 [`StepContext`]：
//! 驱动快照、体积/水深、各组件的单步结果、外部输入贡献。
//! 上下文由推进引擎在步内构建、按引用传给下游消费方，步末随作用域
//! 丢弃 —— 不存在跨步缓存，也就不存在"忘记清缓存"一类的陈旧读取。

use mb_foundation::Scalar;
use std::collections::BTreeMap;

use crate::bio::cohort::CohortStep;
use crate::bio::macroalgae::MacroalgaeStep;
use crate::bio::plankton::{PhytoStep, ZooStep};
use crate::forcing::drivers::DriverSample;

/// 一个时间步的共享计算上下文
///
/// 字段按推进次序填充：驱动/几何 → 养殖种群 → 浮游/藻类 → 外部输入。
/// 营养盐池只读借用本结构。
pub struct StepContext {
    /// 时间步编号
    pub step: usize,
    /// 驱动快照
    pub drivers: DriverSample,
    /// 内部分区体积 [m³]
    pub volumes: Vec<Scalar>,
    /// 平均水深 [m]
    pub depth: Vec<Scalar>,
    /// 贝类单步通量
    pub shellfish: CohortStep,
    /// 鱼类单步通量
    pub fish: CohortStep,
    /// 浮游植物单步结果
    pub phyto: PhytoStep,
    /// 浮游动物单步结果
    pub zooplankton: ZooStep,
    /// 大型藻类单步结果
    pub macroalgae: MacroalgaeStep,
    /// 外部输入贡献 [mg/L/步]
    pub external: BTreeMap<&'static str, Vec<Scalar>>,
}
