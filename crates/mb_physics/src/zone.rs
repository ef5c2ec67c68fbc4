// crates/mb_physics/src/zone.rs

//! 分区拓扑
//!
//! 定义计算分区（"箱"）的集合：内部分区 + 一个保留的外海边界区。
//! 每个分区持有固定索引，所有逐分区向量按该索引排列；外海边界区
//! 始终位于最后一个索引，其浓度由外部指定、不可被反应项修改。

use mb_config::ZoneConfig;
use mb_foundation::{MbError, MbResult, Scalar};
use mb_foundation::scalar::MIN_DEPTH;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 分区拓扑
///
/// # 约束
///
/// - 内部分区名称唯一，且不与边界区重名
/// - 面积与初始体积为正
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneTopology {
    /// 全部分区名称（内部分区在前，外海边界区在最后）
    names: Vec<String>,
    /// 内部分区水面面积 [m²]
    areas: Vec<Scalar>,
    /// 内部分区初始体积 [m³]
    initial_volumes: Vec<Scalar>,
    /// 外海边界区名义体积 [m³]
    boundary_volume: Scalar,
    /// 河流名称 → 入流分区索引
    river_inflow_index: BTreeMap<String, usize>,
}

impl ZoneTopology {
    /// 从分区配置构建
    pub fn from_config(config: &ZoneConfig) -> MbResult<Self> {
        let n = config.names.len();
        if n == 0 {
            return Err(MbError::invalid_topology("至少需要一个内部分区"));
        }
        MbError::check_size("zone areas", n, config.areas.len())?;
        MbError::check_size("zone volumes", n, config.initial_volumes.len())?;

        let mut names = config.names.clone();
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(MbError::invalid_topology(format!("分区名称重复: {name}")));
            }
            if *name == config.boundary_name {
                return Err(MbError::invalid_topology(format!(
                    "内部分区不能使用边界区名称: {name}"
                )));
            }
        }
        names.push(config.boundary_name.clone());

        let mut river_inflow_index = BTreeMap::new();
        for (river, zone) in &config.river_inflow_zones {
            let idx = config
                .names
                .iter()
                .position(|z| z == zone)
                .ok_or_else(|| {
                    MbError::invalid_topology(format!("河流 {river} 引用未知分区: {zone}"))
                })?;
            river_inflow_index.insert(river.clone(), idx);
        }

        Ok(Self {
            names,
            areas: config.areas.clone(),
            initial_volumes: config.initial_volumes.clone(),
            boundary_volume: config.boundary_volume,
            river_inflow_index,
        })
    }

    /// 直接构建（测试与程序化场景）
    pub fn new(
        names: Vec<String>,
        areas: Vec<Scalar>,
        initial_volumes: Vec<Scalar>,
        boundary_name: &str,
        boundary_volume: Scalar,
    ) -> MbResult<Self> {
        let config = ZoneConfig {
            names,
            areas,
            initial_volumes,
            boundary_name: boundary_name.to_string(),
            boundary_volume,
            river_inflow_zones: BTreeMap::new(),
        };
        Self::from_config(&config)
    }

    /// 内部分区数（不含边界区）
    pub fn n_interior(&self) -> usize {
        self.names.len() - 1
    }

    /// 总分区数（含边界区）
    pub fn n_total(&self) -> usize {
        self.names.len()
    }

    /// 外海边界区索引（恒为最后一个）
    pub fn boundary_index(&self) -> usize {
        self.names.len() - 1
    }

    /// 按名称查找分区索引
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|z| z == name)
    }

    /// 分区名称
    pub fn name(&self, index: usize) -> &str {
        &self.names[index]
    }

    /// 全部分区名称
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// 内部分区面积 [m²]
    pub fn areas(&self) -> &[Scalar] {
        &self.areas
    }

    /// 内部分区初始体积 [m³]
    pub fn initial_volumes(&self) -> &[Scalar] {
        &self.initial_volumes
    }

    /// 外海边界区名义体积 [m³]
    pub fn boundary_volume(&self) -> Scalar {
        self.boundary_volume
    }

    /// 河流入流分区索引
    pub fn river_inflow_index(&self) -> &BTreeMap<String, usize> {
        &self.river_inflow_index
    }

    /// 由体积计算平均水深 H = V/A [m]，下限 0.1 m
    pub fn depths(&self, volumes: &[Scalar]) -> Vec<Scalar> {
        self.areas
            .iter()
            .zip(volumes)
            .map(|(a, v)| {
                if *a > 0.0 {
                    (v / a).max(MIN_DEPTH)
                } else {
                    MIN_DEPTH
                }
            })
            .collect()
    }

    /// 校验一条交换边的两端分区
    pub fn check_edge(&self, from: &str, to: &str) -> MbResult<(usize, usize)> {
        let i = self
            .index_of(from)
            .ok_or_else(|| MbError::invalid_topology(format!("交换边引用未知分区: {from}")))?;
        let j = self
            .index_of(to)
            .ok_or_else(|| MbError::invalid_topology(format!("交换边引用未知分区: {to}")))?;
        if i == j {
            return Err(MbError::invalid_topology(format!("交换边两端相同: {from}")));
        }
        Ok((i, j))
    }
}
