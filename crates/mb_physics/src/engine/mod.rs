// crates/mb_physics/src/engine/mod.rs

//! 推进引擎
//!
//! - [`schedule`]: 显式收获/补苗日程（每步查询一次，替代散落的取模判断）
//! - [`context`]: 逐步上下文（一步内算一次、处处复用，步末随作用域丢弃）
//! - [`recorder`]: 时序记录与过程贡献台账
//! - [`orchestrator`]: 步序编排与全程推进

pub mod context;
pub mod orchestrator;
pub mod recorder;
pub mod schedule;

pub use context::StepContext;
pub use orchestrator::{Observation, Simulation, SimulationInputs, StepRecord};
pub use recorder::SeriesRecorder;
pub use schedule::{HarvestEvents, HarvestPlan, HarvestSchedule};
