// crates/mb_physics/src/bio/mod.rs

//! 生物模型
//!
//! - [`cohort`]: 贝类/鱼类共用的能量收支种群模型
//! - [`plankton`]: 浮游植物与浮游动物
//! - [`macroalgae`]: 大型藻类与细胞内配额

pub mod cohort;
pub mod macroalgae;
pub mod plankton;

pub use cohort::{CohortModel, CohortParams, CohortState, CohortStep};
pub use macroalgae::{MacroalgaeModel, MacroalgaeParams, MacroalgaeStep};
pub use plankton::{PhytoParams, PhytoStep, ZooParams, ZooStep};
