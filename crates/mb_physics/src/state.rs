// crates/mb_physics/src/state.rs

//! 状态变量管理
//!
//! 本模块定义水柱状态相关的类型：
//! - VariableKind: 状态变量类型枚举
//! - StateVariable: 单个变量的逐分区场数据（含有效范围与单位）
//! - ModelState: 全部水柱变量的集合
//!
//! 养殖种群（贝、鱼）的个体状态在 [`crate::bio::cohort`] 中单独管理。
//!
//! # 显式格式不变量
//!
//! 每个变量每个时间步只被推进引擎写入一次，写入后当步不再读取。
//! 每步结束后所有变量被截断到各自的物理有效范围（静默，不报错）。

use mb_config::ParameterStore;
use mb_foundation::float::clamp_range;
use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================
// 变量类型
// ============================================================

/// 状态变量类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// 浮游植物碳 [mgC/L]
    Phytoplankton,
    /// 浮游动物碳 [mgC/L]
    Zooplankton,
    /// 大型藻类干重 [gD/m²]
    Macroalgae,
    /// 大型藻类细胞氮配额 [mgN/gD]
    QuotaN,
    /// 大型藻类细胞磷配额 [mgP/gD]
    QuotaP,
    /// 铵态氮 [mgN/L]
    Ammonium,
    /// 硝态氮 [mgN/L]
    Nitrate,
    /// 有机氮 [mgN/L]
    OrganicN,
    /// 磷酸盐 [mgP/L]
    Phosphate,
    /// 有机磷 [mgP/L]
    OrganicP,
    /// 颗粒态磷 [mgP/L]
    ParticulateP,
    /// 碳质生化需氧量 [mgO2/L]
    Cbod,
    /// 溶解氧 [mgO2/L]
    DissolvedOxygen,
    /// 悬浮颗粒物 [kg/m³]（静态）
    Spm,
}

impl VariableKind {
    /// 全部变量类型（定义顺序即输出顺序）
    pub const ALL: [VariableKind; 14] = [
        Self::Phytoplankton,
        Self::Zooplankton,
        Self::Macroalgae,
        Self::QuotaN,
        Self::QuotaP,
        Self::Ammonium,
        Self::Nitrate,
        Self::OrganicN,
        Self::Phosphate,
        Self::OrganicP,
        Self::ParticulateP,
        Self::Cbod,
        Self::DissolvedOxygen,
        Self::Spm,
    ];

    /// 参与分区间输运的变量（大型藻类固着、配额与 SPM 不随水交换）
    pub const TRANSPORTABLE: [VariableKind; 10] = [
        Self::Phytoplankton,
        Self::Zooplankton,
        Self::Ammonium,
        Self::Nitrate,
        Self::OrganicN,
        Self::Phosphate,
        Self::OrganicP,
        Self::ParticulateP,
        Self::Cbod,
        Self::DissolvedOxygen,
    ];

    /// 变量的字符串标识（与参数仓库/数据文件中的列名一致）
    pub fn name(&self) -> &'static str {
        match self {
            Self::Phytoplankton => "PHY",
            Self::Zooplankton => "ZOO",
            Self::Macroalgae => "MA",
            Self::QuotaN => "qN",
            Self::QuotaP => "qP",
            Self::Ammonium => "NH4",
            Self::Nitrate => "NO3",
            Self::OrganicN => "ON",
            Self::Phosphate => "PO4",
            Self::OrganicP => "OP",
            Self::ParticulateP => "PP",
            Self::Cbod => "CBOD",
            Self::DissolvedOxygen => "DO",
            Self::Spm => "C_SPM",
        }
    }

    /// 单位（仅信息性）
    pub fn unit(&self) -> &'static str {
        match self {
            Self::Phytoplankton | Self::Zooplankton => "mgC/L",
            Self::Macroalgae => "gD/m²",
            Self::QuotaN => "mgN/gD",
            Self::QuotaP => "mgP/gD",
            Self::Ammonium | Self::Nitrate | Self::OrganicN => "mgN/L",
            Self::Phosphate | Self::OrganicP | Self::ParticulateP => "mgP/L",
            Self::Cbod | Self::DissolvedOxygen => "mgO2/L",
            Self::Spm => "kg/m³",
        }
    }

    /// 物理有效范围（步末截断用）
    pub fn valid_range(&self) -> (Scalar, Scalar) {
        match self {
            Self::Phytoplankton => (1e-12, 1e3),
            Self::Zooplankton => (1e-12, 1e3),
            Self::Macroalgae => (1e-12, 5e3),
            Self::QuotaN => (0.0, 500.0),
            Self::QuotaP => (0.0, 50.0),
            Self::Ammonium => (0.0, 100.0),
            Self::Nitrate => (1e-12, 100.0),
            Self::OrganicN => (0.0, 100.0),
            Self::Phosphate => (0.0, 50.0),
            Self::OrganicP => (0.0, 50.0),
            Self::ParticulateP => (0.0, 50.0),
            Self::Cbod => (0.0, 500.0),
            Self::DissolvedOxygen => (0.0, 25.0),
            Self::Spm => (0.0, 100.0),
        }
    }

    /// 是否参与分区间输运
    pub fn is_transportable(&self) -> bool {
        Self::TRANSPORTABLE.contains(self)
    }

    /// 按名称解析
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

// ============================================================
// 状态变量场
// ============================================================

/// 单个状态变量的逐分区场数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateVariable {
    /// 变量类型
    kind: VariableKind,
    /// 逐分区值（仅内部分区，不含外海）
    values: Vec<Scalar>,
    /// 截断范围
    range: (Scalar, Scalar),
}

impl StateVariable {
    /// 创建新变量场
    pub fn new(kind: VariableKind, values: Vec<Scalar>) -> Self {
        Self {
            kind,
            values,
            range: kind.valid_range(),
        }
    }

    /// 变量类型
    pub fn kind(&self) -> VariableKind {
        self.kind
    }

    /// 只读值
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// 覆写整个向量（每步一次的提交写入）
    pub fn commit(&mut self, values: Vec<Scalar>) {
        debug_assert_eq!(self.values.len(), values.len());
        self.values = values;
    }

    /// 截断到有效范围（对已在范围内的向量是恒等操作）
    pub fn clamp(&mut self) {
        let (min, max) = self.range;
        for v in &mut self.values {
            *v = clamp_range(*v, min, max);
        }
    }
}

// ============================================================
// 状态集合
// ============================================================

/// 全部水柱状态变量的集合
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    /// 内部分区数
    n_zones: usize,
    /// 变量场表
    fields: BTreeMap<VariableKind, StateVariable>,
}

impl ModelState {
    /// 从参数仓库初始化全部变量
    ///
    /// 每个变量按其字符串标识从仓库读取逐分区初始向量。
    pub fn from_store(store: &ParameterStore) -> MbResult<Self> {
        let n_zones = store.n_zones();
        let mut fields = BTreeMap::new();
        for kind in VariableKind::ALL {
            let values = store.zonal(kind.name())?;
            fields.insert(kind, StateVariable::new(kind, values));
        }
        Ok(Self { n_zones, fields })
    }

    /// 内部分区数
    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    /// 只读访问变量值
    pub fn get(&self, kind: VariableKind) -> &[Scalar] {
        self.fields[&kind].values()
    }

    /// 提交变量新值（每步一次）
    pub fn commit(&mut self, kind: VariableKind, values: Vec<Scalar>) -> MbResult<()> {
        MbError::check_size("state commit", self.n_zones, values.len())?;
        self.fields
            .get_mut(&kind)
            .ok_or_else(|| MbError::internal(format!("未注册的状态变量: {}", kind.name())))?
            .commit(values);
        Ok(())
    }

    /// 截断全部变量到有效范围
    pub fn clamp_all(&mut self) {
        for field in self.fields.values_mut() {
            field.clamp();
        }
    }

    /// 回写全部变量到参数仓库
    pub fn write_back(&self, store: &mut ParameterStore) -> MbResult<()> {
        for (kind, field) in &self.fields {
            store.update(kind.name(), field.values())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> ParameterStore {
        let mut store = ParameterStore::new(2);
        for kind in VariableKind::ALL {
            store.set_zonal(kind.name(), vec![1.0, 2.0]).unwrap();
        }
        store
    }

    #[test]
    fn test_from_store() {
        let state = ModelState::from_store(&sample_store()).unwrap();
        assert_eq!(state.n_zones(), 2);
        assert_eq!(state.get(VariableKind::Ammonium), &[1.0, 2.0]);
    }

    #[test]
    fn test_missing_variable_rejected() {
        let mut store = ParameterStore::new(2);
        store.set_zonal("PHY", vec![0.1, 0.1]).unwrap();
        assert!(ModelState::from_store(&store).is_err());
    }

    #[test]
    fn test_commit_and_read() {
        let mut state = ModelState::from_store(&sample_store()).unwrap();
        state
            .commit(VariableKind::Nitrate, vec![0.4, 0.5])
            .unwrap();
        assert_eq!(state.get(VariableKind::Nitrate), &[0.4, 0.5]);
    }

    #[test]
    fn test_clamp_noop_when_in_range() {
        // 已在范围内的向量，截断是恒等操作
        let mut state = ModelState::from_store(&sample_store()).unwrap();
        let before = state.get(VariableKind::Ammonium).to_vec();
        state.clamp_all();
        assert_eq!(state.get(VariableKind::Ammonium), before.as_slice());
    }

    #[test]
    fn test_clamp_pulls_into_range() {
        let mut state = ModelState::from_store(&sample_store()).unwrap();
        state
            .commit(VariableKind::DissolvedOxygen, vec![-1.0, 30.0])
            .unwrap();
        state.clamp_all();
        let do_ = state.get(VariableKind::DissolvedOxygen);
        assert_eq!(do_[0], 0.0);
        assert_eq!(do_[1], 25.0);
    }

    #[test]
    fn test_transportable_set() {
        assert!(VariableKind::Ammonium.is_transportable());
        assert!(!VariableKind::Macroalgae.is_transportable());
        assert!(!VariableKind::Spm.is_transportable());
        assert_eq!(VariableKind::TRANSPORTABLE.len(), 10);
    }

    #[test]
    fn test_write_back() {
        let mut store = sample_store();
        let mut state = ModelState::from_store(&store).unwrap();
        state
            .commit(VariableKind::Ammonium, vec![0.7, 0.8])
            .unwrap();
        state.write_back(&mut store).unwrap();
        assert_eq!(store.zonal("NH4").unwrap(), vec![0.7, 0.8]);
    }

    #[test]
    fn test_kind_roundtrip_names() {
        for kind in VariableKind::ALL {
            assert_eq!(VariableKind::from_name(kind.name()), Some(kind));
        }
    }
}
