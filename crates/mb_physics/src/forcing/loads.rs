// crates/mb_physics/src/forcing/loads.rs

//! 外部负荷聚合
//!
//! 把原始负荷记录（河流、地下水、点源、养殖塘、大气沉降）换算为逐分区
//! 质量通量，再除以当前分区体积得到浓度变化率贡献：
//! - 河流负荷带完整时间序列（按时间步索引的记录）
//! - 其余四类源是静态的逐分区年均速率
//! - 每类源对每个物质可配置缩放乘子
//!
//! 记录在装配时已应用乘子；查询只做汇总与体积归一。

use mb_foundation::scalar::LITERS_PER_M3;
use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 外部负荷覆盖的物质（顺序固定，作为质量数组的索引）
pub const LOAD_SUBSTANCES: [&str; 7] = ["NH4", "NO3", "ON", "PO4", "OP", "CBOD", "DO"];

/// 一条河流负荷记录（已应用乘子）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiverLoadRecord {
    /// 时间步
    pub step: usize,
    /// 分区索引（内部分区）
    pub zone: usize,
    /// 逐物质质量通量 [mg/步]，索引对应 [`LOAD_SUBSTANCES`]
    pub masses: [Scalar; 7],
}

/// 外部负荷聚合器
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLoads {
    /// 内部分区数
    n_zones: usize,
    /// 时间步 → 分区 × 物质 质量通量（河流，时变）
    river: BTreeMap<usize, Vec<[Scalar; 7]>>,
    /// 分区 × 物质 质量通量（四类静态源合计）
    static_mass: Vec<[Scalar; 7]>,
}

impl ExternalLoads {
    /// 创建空负荷（封闭情景）
    pub fn empty(n_zones: usize) -> Self {
        Self {
            n_zones,
            river: BTreeMap::new(),
            static_mass: vec![[0.0; 7]; n_zones],
        }
    }

    /// 从记录装配
    ///
    /// `static_mass` 是四类静态源逐分区逐物质的合计质量通量。
    pub fn new(
        n_zones: usize,
        river_records: Vec<RiverLoadRecord>,
        static_mass: Vec<[Scalar; 7]>,
    ) -> MbResult<Self> {
        MbError::check_size("static loads", n_zones, static_mass.len())?;
        let mut river: BTreeMap<usize, Vec<[Scalar; 7]>> = BTreeMap::new();
        for record in river_records {
            MbError::check_index("load zone", record.zone, n_zones)?;
            let row = river
                .entry(record.step)
                .or_insert_with(|| vec![[0.0; 7]; n_zones]);
            for (k, mass) in record.masses.iter().enumerate() {
                row[record.zone][k] += mass;
            }
        }
        Ok(Self {
            n_zones,
            river,
            static_mass,
        })
    }

    /// 物质名 → 数组索引
    pub fn substance_index(substance: &str) -> Option<usize> {
        LOAD_SUBSTANCES.iter().position(|s| *s == substance)
    }

    /// 取指定时间步的逐分区浓度变化率贡献 [mg/L/步]
    ///
    /// `volumes` 为当前内部分区体积 [m³]；零体积分区的贡献取 0。
    pub fn concentration_rates(
        &self,
        step: usize,
        volumes: &[Scalar],
    ) -> MbResult<BTreeMap<&'static str, Vec<Scalar>>> {
        MbError::check_size("load volumes", self.n_zones, volumes.len())?;

        let mut result = BTreeMap::new();
        let river_row = self.river.get(&step);

        for (k, substance) in LOAD_SUBSTANCES.iter().enumerate() {
            let mut rates = vec![0.0; self.n_zones];
            for zone in 0..self.n_zones {
                let mut mass = self.static_mass[zone][k];
                if let Some(row) = river_row {
                    mass += row[zone][k];
                }
                let vol_l = volumes[zone] * LITERS_PER_M3;
                rates[zone] = if vol_l > 0.0 { mass / vol_l } else { 0.0 };
            }
            result.insert(*substance, rates);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substance_index() {
        assert_eq!(ExternalLoads::substance_index("NH4"), Some(0));
        assert_eq!(ExternalLoads::substance_index("DO"), Some(6));
        assert_eq!(ExternalLoads::substance_index("PP"), None);
    }

    #[test]
    fn test_static_only() {
        let mut static_mass = vec![[0.0; 7]; 2];
        static_mass[0][0] = 2000.0; // NH4 at zone 0
        let loads = ExternalLoads::new(2, vec![], static_mass).unwrap();

        let rates = loads.concentration_rates(5, &[1.0, 1.0]).unwrap();
        // 2000 mg / (1 m³ = 1000 L) = 2 mg/L
        assert!((rates["NH4"][0] - 2.0).abs() < 1e-12);
        assert_eq!(rates["NH4"][1], 0.0);
    }

    #[test]
    fn test_river_added_at_step() {
        let record = RiverLoadRecord {
            step: 3,
            zone: 1,
            masses: [0.0, 1000.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        };
        let loads = ExternalLoads::new(2, vec![record], vec![[0.0; 7]; 2]).unwrap();

        let rates_hit = loads.concentration_rates(3, &[1.0, 1.0]).unwrap();
        assert!((rates_hit["NO3"][1] - 1.0).abs() < 1e-12);

        let rates_miss = loads.concentration_rates(4, &[1.0, 1.0]).unwrap();
        assert_eq!(rates_miss["NO3"][1], 0.0);
    }

    #[test]
    fn test_zero_volume_guard() {
        let mut static_mass = vec![[0.0; 7]; 1];
        static_mass[0][0] = 1000.0;
        let loads = ExternalLoads::new(1, vec![], static_mass).unwrap();
        let rates = loads.concentration_rates(0, &[0.0]).unwrap();
        assert_eq!(rates["NH4"][0], 0.0);
    }

    #[test]
    fn test_bad_zone_rejected() {
        let record = RiverLoadRecord {
            step: 0,
            zone: 5,
            masses: [0.0; 7],
        };
        assert!(ExternalLoads::new(2, vec![record], vec![[0.0; 7]; 2]).is_err());
    }
}
