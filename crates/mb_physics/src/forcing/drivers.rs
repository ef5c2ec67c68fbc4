// crates/mb_physics/src/forcing/drivers.rs

//! 环境驱动
//!
//! 逐分区温度、光照、盐度时间序列 + 复氧计算所需的流速。
//! 每个时间步开始时重新采样一次，采样结果进入当步上下文，
//! 步内各组件共享同一份快照。

use mb_foundation::scalar::KELVIN_OFFSET;
use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};

use super::series::ZonalSeries;

/// 环境驱动数据集
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentalDrivers {
    /// 水温 [°C]
    temperature: ZonalSeries,
    /// 表层光照 [lx/d]
    irradiance: ZonalSeries,
    /// 盐度 [g/kg]
    salinity: ZonalSeries,
    /// 逐分区特征流速 [m/s]（O'Connor-Dobbins 复氧公式用）
    current_speed: Vec<Scalar>,
}

/// 单个时间步的驱动快照
#[derive(Debug, Clone)]
pub struct DriverSample {
    /// 水温 [°C]
    pub temperature_c: Vec<Scalar>,
    /// 水温 [K]
    pub temperature_k: Vec<Scalar>,
    /// 表层光照 [lx/d]
    pub irradiance: Vec<Scalar>,
    /// 盐度 [g/kg]
    pub salinity: Vec<Scalar>,
    /// 特征流速 [m/s]
    pub current_speed: Vec<Scalar>,
}

impl EnvironmentalDrivers {
    /// 创建驱动数据集
    pub fn new(
        temperature: ZonalSeries,
        irradiance: ZonalSeries,
        salinity: ZonalSeries,
        current_speed: Vec<Scalar>,
    ) -> MbResult<Self> {
        let n = temperature.n_zones();
        if irradiance.n_zones() != n || salinity.n_zones() != n {
            return Err(MbError::config("驱动序列的分区数不一致"));
        }
        MbError::check_size("current_speed", n, current_speed.len())?;
        Ok(Self {
            temperature,
            irradiance,
            salinity,
            current_speed,
        })
    }

    /// 分区数
    pub fn n_zones(&self) -> usize {
        self.temperature.n_zones()
    }

    /// 驱动数据可覆盖的最短时间步数
    pub fn horizon(&self) -> usize {
        self.temperature
            .len()
            .min(self.irradiance.len())
            .min(self.salinity.len())
    }

    /// 采样指定时间步的驱动快照
    ///
    /// 超出序列末端时沿用末端值（多年模拟时外层通常提供周期数据）。
    pub fn sample(&self, step: usize) -> DriverSample {
        let temperature_c = self.temperature.row(step).to_vec();
        let temperature_k = temperature_c.iter().map(|t| t + KELVIN_OFFSET).collect();
        DriverSample {
            temperature_c,
            temperature_k,
            irradiance: self.irradiance.row(step).to_vec(),
            salinity: self.salinity.row(step).to_vec(),
            current_speed: self.current_speed.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_drivers() -> EnvironmentalDrivers {
        EnvironmentalDrivers::new(
            ZonalSeries::new(2, vec![vec![20.0, 22.0], vec![21.0, 23.0]]).unwrap(),
            ZonalSeries::constant(2, 7e5, 2),
            ZonalSeries::constant(2, 34.0, 2),
            vec![0.04, 0.05],
        )
        .unwrap()
    }

    #[test]
    fn test_sample() {
        let drivers = sample_drivers();
        let s = drivers.sample(0);
        assert_eq!(s.temperature_c, vec![20.0, 22.0]);
        assert!((s.temperature_k[0] - 293.15).abs() < 1e-12);
        assert_eq!(s.salinity, vec![34.0, 34.0]);
    }

    #[test]
    fn test_sample_clamps_at_end() {
        let drivers = sample_drivers();
        let s = drivers.sample(100);
        assert_eq!(s.temperature_c, vec![21.0, 23.0]);
    }

    #[test]
    fn test_zone_count_mismatch() {
        let result = EnvironmentalDrivers::new(
            ZonalSeries::constant(2, 20.0, 1),
            ZonalSeries::constant(3, 7e5, 1),
            ZonalSeries::constant(2, 34.0, 1),
            vec![0.04, 0.05],
        );
        assert!(result.is_err());
    }
}
