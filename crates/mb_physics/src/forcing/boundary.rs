// crates/mb_physics/src/forcing/boundary.rs

//! 外海边界浓度
//!
//! 外海边界区的浓度由外部时间序列给定，不受反应项影响；
//! 输运步前以边界浓度覆写边界分量，输运步后再次钉住。
//! 每个物质可配置缩放因子（情景分析用）。

use mb_foundation::{MbResult, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::series::StepSeries;

/// 外海边界浓度提供者
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OuterSeaBoundary {
    /// 物质名 → 逐时间步浓度序列
    series: BTreeMap<String, StepSeries>,
    /// 物质名 → 缩放因子（缺省 1.0）
    scaling: BTreeMap<String, Scalar>,
}

impl OuterSeaBoundary {
    /// 创建空提供者（封闭系统，边界浓度视为 0）
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加物质浓度序列
    pub fn with_series(mut self, substance: &str, values: Vec<Scalar>) -> MbResult<Self> {
        self.series
            .insert(substance.to_string(), StepSeries::new(values)?);
        Ok(self)
    }

    /// 设置缩放因子
    pub fn with_scaling(mut self, scaling: BTreeMap<String, Scalar>) -> Self {
        self.scaling = scaling;
        self
    }

    /// 取指定物质在指定时间步的边界浓度（已缩放）
    ///
    /// 未提供序列的物质返回 0；超出序列末端取末端值。
    pub fn concentration(&self, substance: &str, step: usize) -> Scalar {
        let raw = self
            .series
            .get(substance)
            .map(|s| s.at(step))
            .unwrap_or(0.0);
        let scale = self.scaling.get(substance).copied().unwrap_or(1.0);
        raw * scale
    }

    /// 是否包含物质序列
    pub fn contains(&self, substance: &str) -> bool {
        self.series.contains_key(substance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concentration_lookup() {
        let boundary = OuterSeaBoundary::new()
            .with_series("NO3", vec![0.4, 0.5, 0.6])
            .unwrap();
        assert_eq!(boundary.concentration("NO3", 1), 0.5);
        // 末端截断
        assert_eq!(boundary.concentration("NO3", 99), 0.6);
    }

    #[test]
    fn test_missing_substance_is_zero() {
        let boundary = OuterSeaBoundary::new();
        assert_eq!(boundary.concentration("NH4", 0), 0.0);
    }

    #[test]
    fn test_scaling() {
        let mut scaling = BTreeMap::new();
        scaling.insert("NO3".to_string(), 10.0);
        let boundary = OuterSeaBoundary::new()
            .with_series("NO3", vec![0.4])
            .unwrap()
            .with_scaling(scaling);
        assert!((boundary.concentration("NO3", 0) - 4.0).abs() < 1e-12);
    }
}
