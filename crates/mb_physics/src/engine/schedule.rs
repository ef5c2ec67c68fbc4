// crates/mb_physics/src/engine/schedule.rs

//! 收获日程
//!
//! 收获与补苗由日历驱动（时间步数的固定倍数），用显式日程结构表达，
//! 推进引擎每步查询一次。

use mb_config::HarvestConfig;
use mb_foundation::Scalar;
use serde::{Deserialize, Serialize};

/// 单个物种的收获日程
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HarvestSchedule {
    /// 周期 [步]；0 表示从不收获
    pub period: usize,
    /// 收获比例 [0,1]
    pub fraction: Scalar,
}

impl HarvestSchedule {
    /// 创建日程
    pub fn new(period: usize, fraction: Scalar) -> Self {
        Self { period, fraction }
    }

    /// 从不收获
    pub fn never() -> Self {
        Self {
            period: 0,
            fraction: 0.0,
        }
    }

    /// 本步是否为收获步
    ///
    /// 步编号 0 起；周期 N 的日程在第 N 步（0 起编号 N−1）触发。
    pub fn is_harvest_step(&self, step: usize) -> bool {
        self.period > 0 && (step + 1) % self.period == 0
    }

    /// 本步的收获率
    pub fn rate_at(&self, step: usize) -> Scalar {
        if self.is_harvest_step(step) {
            self.fraction
        } else {
            0.0
        }
    }
}

/// 全部物种的收获日程
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestPlan {
    /// 贝类（全量收获 + 补苗复位）
    pub shellfish: HarvestSchedule,
    /// 鱼类（全量收获 + 补苗复位）
    pub fish: HarvestSchedule,
    /// 大型藻类（按比例收获，不复位）
    pub macroalgae: HarvestSchedule,
}

/// 一个时间步的收获事件（每步查询一次）
#[derive(Debug, Clone, Copy)]
pub struct HarvestEvents {
    /// 贝类收获率
    pub shellfish_rate: Scalar,
    /// 贝类是否复位补苗
    pub shellfish_restock: bool,
    /// 鱼类收获率
    pub fish_rate: Scalar,
    /// 鱼类是否复位补苗
    pub fish_restock: bool,
    /// 大型藻类收获比例
    pub macroalgae_fraction: Scalar,
}

impl HarvestPlan {
    /// 从配置构建
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            shellfish: HarvestSchedule::new(config.shellfish_period, 1.0),
            fish: HarvestSchedule::new(config.fish_period, 1.0),
            macroalgae: HarvestSchedule::new(config.macroalgae_period, config.macroalgae_fraction),
        }
    }

    /// 查询本步的全部收获事件
    pub fn events_at(&self, step: usize) -> HarvestEvents {
        HarvestEvents {
            shellfish_rate: self.shellfish.rate_at(step),
            shellfish_restock: self.shellfish.is_harvest_step(step),
            fish_rate: self.fish.rate_at(step),
            fish_restock: self.fish.is_harvest_step(step),
            macroalgae_fraction: self.macroalgae.rate_at(step),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_cadence() {
        let schedule = HarvestSchedule::new(10, 1.0);
        // 周期 10：第 10 步（0 起编号 9）触发
        assert!(!schedule.is_harvest_step(0));
        assert!(!schedule.is_harvest_step(8));
        assert!(schedule.is_harvest_step(9));
        assert!(!schedule.is_harvest_step(10));
        assert!(schedule.is_harvest_step(19));
    }

    #[test]
    fn test_never_harvest() {
        let schedule = HarvestSchedule::never();
        for step in 0..100 {
            assert_eq!(schedule.rate_at(step), 0.0);
        }
    }

    #[test]
    fn test_plan_events() {
        let config = HarvestConfig {
            shellfish_period: 4,
            fish_period: 6,
            macroalgae_period: 2,
            macroalgae_fraction: 0.8,
        };
        let plan = HarvestPlan::from_config(&config);

        let e1 = plan.events_at(1);
        assert_eq!(e1.shellfish_rate, 0.0);
        assert!((e1.macroalgae_fraction - 0.8).abs() < 1e-12);

        let e3 = plan.events_at(3);
        assert_eq!(e3.shellfish_rate, 1.0);
        assert!(e3.shellfish_restock);
        assert_eq!(e3.fish_rate, 0.0);

        let e5 = plan.events_at(5);
        assert!(e5.fish_restock);
    }
}
