// crates/mb_physics/src/forcing/series.rs

//! 时间步序列容器
//!
//! 模拟的时间轴是离散的整数步网格，所有外部数据在装配时对齐到该网格：
//! - 细于时间步的原始观测按块求和聚合
//! - 查询超出末端时返回末端值（截断外推）
//!
//! # 使用示例
//!
//! ```
//! use mb_physics::forcing::series::StepSeries;
//!
//! let series = StepSeries::new(vec![1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(series.at(1), 2.0);
//! assert_eq!(series.at(99), 3.0); // 末端截断
//! ```

use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};

/// 单值时间步序列
///
/// # 约束
///
/// - 序列非空
/// - 全部值有限
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepSeries {
    values: Vec<Scalar>,
}

impl StepSeries {
    /// 从逐步值创建
    pub fn new(values: Vec<Scalar>) -> MbResult<Self> {
        if values.is_empty() {
            return Err(MbError::invalid_input("时间步序列不能为空"));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(MbError::invalid_input("时间步序列包含非有限值"));
        }
        Ok(Self { values })
    }

    /// 从细分辨率观测聚合：每 `chunk` 个原始值求和为一个步值
    pub fn aggregate(raw: &[Scalar], chunk: usize) -> MbResult<Self> {
        if chunk == 0 {
            return Err(MbError::invalid_input("聚合块大小必须为正"));
        }
        let values: Vec<Scalar> = raw.chunks(chunk).map(|c| c.iter().sum()).collect();
        Self::new(values)
    }

    /// 序列长度（可用时间步数）
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 取指定时间步的值，超出末端返回末端值
    pub fn at(&self, step: usize) -> Scalar {
        let idx = step.min(self.values.len() - 1);
        self.values[idx]
    }

    /// 取指定时间步的值，超出范围返回错误
    pub fn at_strict(&self, step: usize) -> MbResult<Scalar> {
        if step >= self.values.len() {
            return Err(MbError::beyond_horizon(step, self.values.len()));
        }
        Ok(self.values[step])
    }

    /// 全部值
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }
}

/// 逐分区时间步序列（行 = 时间步，列 = 分区）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonalSeries {
    n_zones: usize,
    rows: Vec<Vec<Scalar>>,
}

impl ZonalSeries {
    /// 从按行数据创建
    pub fn new(n_zones: usize, rows: Vec<Vec<Scalar>>) -> MbResult<Self> {
        if rows.is_empty() {
            return Err(MbError::invalid_input("逐分区序列不能为空"));
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_zones {
                return Err(MbError::invalid_input(format!(
                    "逐分区序列第{}行长度不匹配: 期望{}, 实际{}",
                    i,
                    n_zones,
                    row.len()
                )));
            }
        }
        Ok(Self { n_zones, rows })
    }

    /// 常值序列（每步每分区同一值）
    pub fn constant(n_zones: usize, value: Scalar, n_steps: usize) -> Self {
        Self {
            n_zones,
            rows: vec![vec![value; n_zones]; n_steps.max(1)],
        }
    }

    /// 分区数
    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    /// 可用时间步数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 取指定时间步的一行，超出末端返回末行
    pub fn row(&self, step: usize) -> &[Scalar] {
        let idx = step.min(self.rows.len() - 1);
        &self.rows[idx]
    }
}
