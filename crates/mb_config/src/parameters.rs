// crates/mb_config/src/parameters.rs

//! 参数仓库
//!
//! 提供扁平的 名称 → 标量/逐分区数组 映射。消费方按名请求并获得
//! 广播后的逐分区值；所有状态变量支持回写更新（供外部驱动把演化后
//! 的状态作为下一次读取的"初始条件"）。
//!
//! 组件只在构造时从仓库解析参数，运行期不做按名查找。
//!
//! # 示例
//!
//! ```
//! use mb_config::parameters::ParameterStore;
//!
//! let mut store = ParameterStore::new(3);
//! store.set_scalar("K_T", 1.068);
//! store.set_zonal("NH4", vec![0.02, 0.02, 0.01]).unwrap();
//!
//! assert_eq!(store.zonal("K_T").unwrap(), vec![1.068; 3]);
//! assert_eq!(store.scalar("K_T").unwrap(), 1.068);
//! ```

use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 参数值：标量或逐分区数组
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    /// 标量值（读取时广播到所有分区）
    Scalar(Scalar),
    /// 逐分区数组（长度必须等于分区数）
    Zonal(Vec<Scalar>),
}

/// 扁平参数仓库
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParameterStore {
    /// 分区数（不含外海边界区）
    n_zones: usize,
    /// 参数表
    entries: BTreeMap<String, ParameterValue>,
}

impl ParameterStore {
    /// 创建空仓库
    pub fn new(n_zones: usize) -> Self {
        Self {
            n_zones,
            entries: BTreeMap::new(),
        }
    }

    /// 分区数
    pub fn n_zones(&self) -> usize {
        self.n_zones
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 是否包含参数
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// 设置标量参数
    pub fn set_scalar(&mut self, name: &str, value: Scalar) {
        self.entries
            .insert(name.to_string(), ParameterValue::Scalar(value));
    }

    /// 设置逐分区参数
    ///
    /// 数组长度必须等于分区数。
    pub fn set_zonal(&mut self, name: &str, values: Vec<Scalar>) -> MbResult<()> {
        MbError::check_size("zonal parameter", self.n_zones, values.len())?;
        self.entries
            .insert(name.to_string(), ParameterValue::Zonal(values));
        Ok(())
    }

    /// 读取标量参数
    ///
    /// 逐分区参数取第一个元素（与参考数据集中标量-数组混排的读取约定一致）。
    pub fn scalar(&self, name: &str) -> MbResult<Scalar> {
        match self.entries.get(name) {
            Some(ParameterValue::Scalar(v)) => Ok(*v),
            Some(ParameterValue::Zonal(vs)) => vs
                .first()
                .copied()
                .ok_or_else(|| MbError::invalid_config(name, "[]", "空数组")),
            None => Err(MbError::missing_config(name)),
        }
    }

    /// 读取逐分区参数（标量广播到所有分区）
    pub fn zonal(&self, name: &str) -> MbResult<Vec<Scalar>> {
        match self.entries.get(name) {
            Some(ParameterValue::Scalar(v)) => Ok(vec![*v; self.n_zones]),
            Some(ParameterValue::Zonal(vs)) => {
                MbError::check_size("zonal parameter", self.n_zones, vs.len())?;
                Ok(vs.clone())
            }
            None => Err(MbError::missing_config(name)),
        }
    }

    /// 回写状态变量
    ///
    /// 每个状态变量都支持更新，供每步结束后把新状态作为下一次读取的
    /// 初始条件。
    pub fn update(&mut self, name: &str, values: &[Scalar]) -> MbResult<()> {
        MbError::check_size("state update", self.n_zones, values.len())?;
        self.entries
            .insert(name.to_string(), ParameterValue::Zonal(values.to_vec()));
        Ok(())
    }

    /// 批量回写
    pub fn update_all(&mut self, updates: &BTreeMap<String, Vec<Scalar>>) -> MbResult<()> {
        for (name, values) in updates {
            self.update(name, values)?;
        }
        Ok(())
    }

    /// 从 JSON 字符串加载
    pub fn from_json(n_zones: usize, json: &str) -> MbResult<Self> {
        let entries: BTreeMap<String, ParameterValue> = serde_json::from_str(json)
            .map_err(|e| MbError::serialization(format!("参数表解析失败: {e}")))?;
        let store = Self { n_zones, entries };
        store.validate()?;
        Ok(store)
    }

    /// 校验所有逐分区参数的长度
    pub fn validate(&self) -> MbResult<()> {
        for (name, value) in &self.entries {
            if let ParameterValue::Zonal(vs) = value {
                if vs.len() != self.n_zones {
                    return Err(MbError::invalid_config(
                        name,
                        format!("len={}", vs.len()),
                        format!("逐分区参数长度应为 {}", self.n_zones),
                    ));
                }
                if vs.iter().any(|v| !v.is_finite()) {
                    return Err(MbError::invalid_config(name, "NaN/Inf", "参数必须有限"));
                }
            }
        }
        Ok(())
    }

    /// 参数名迭代器
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_store() -> ParameterStore {
        let mut store = ParameterStore::new(3);
        store.set_scalar("K_T", 1.068);
        store.set_zonal("NH4", vec![0.02, 0.03, 0.01]).unwrap();
        store
    }

    #[test]
    fn test_scalar_broadcast() {
        let store = sample_store();
        assert_eq!(store.zonal("K_T").unwrap(), vec![1.068; 3]);
    }

    #[test]
    fn test_zonal_read() {
        let store = sample_store();
        let nh4 = store.zonal("NH4").unwrap();
        assert_eq!(nh4, vec![0.02, 0.03, 0.01]);
        // 标量读取取第一个元素
        assert!((store.scalar("NH4").unwrap() - 0.02).abs() < 1e-12);
    }

    #[test]
    fn test_missing_parameter() {
        let store = sample_store();
        assert!(matches!(
            store.zonal("NO3"),
            Err(MbError::MissingConfig { .. })
        ));
    }

    #[test]
    fn test_wrong_length_rejected() {
        let mut store = ParameterStore::new(3);
        assert!(store.set_zonal("NH4", vec![0.1, 0.2]).is_err());
    }

    #[test]
    fn test_state_update() {
        let mut store = sample_store();
        store.update("NH4", &[0.5, 0.5, 0.5]).unwrap();
        assert_eq!(store.zonal("NH4").unwrap(), vec![0.5; 3]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"K_T": 1.068, "NH4": [0.02, 0.03, 0.01]}"#;
        let store = ParameterStore::from_json(3, json).unwrap();
        assert!((store.scalar("K_T").unwrap() - 1.068).abs() < 1e-12);
        assert_eq!(store.zonal("NH4").unwrap().len(), 3);
    }

    #[test]
    fn test_from_json_bad_length() {
        let json = r#"{"NH4": [0.02, 0.03]}"#;
        assert!(ParameterStore::from_json(3, json).is_err());
    }
}
