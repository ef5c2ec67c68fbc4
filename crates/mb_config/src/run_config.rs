// crates/mb_config/src/run_config.rs

//! RunConfig - 运行配置（全 f64）
//!
//! 定义一次模拟运行的所有配置参数，使用纯 f64 类型，JSON 序列化。
//! 生物/生化参数本体放在 [`ParameterStore`](crate::ParameterStore) 中，
//! 本结构只描述拓扑、时间轴、数据文件路径、缩放因子与输出设置。

use mb_foundation::{MbError, MbResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::parameters::ParameterStore;

/// 运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// 时间轴配置
    #[serde(default)]
    pub time: TimeConfig,

    /// 分区拓扑配置
    pub zones: ZoneConfig,

    /// 驱动与负荷数据文件路径
    pub forcing: ForcingPaths,

    /// 负荷/边界缩放因子
    #[serde(default)]
    pub scaling: LoadScaling,

    /// 收获日程配置
    #[serde(default)]
    pub harvest: HarvestConfig,

    /// 输出配置
    #[serde(default)]
    pub output: OutputConfig,

    /// 参数仓库（初始条件 + 生物/生化参数）
    pub parameters: ParameterStore,
}

impl RunConfig {
    /// 从 JSON 文件加载
    pub fn load(path: &Path) -> MbResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MbError::io_with_source(format!("读取配置失败: {}", path.display()), e))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| MbError::serialization(format!("配置解析失败: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置一致性
    pub fn validate(&self) -> MbResult<()> {
        let n = self.zones.names.len();
        if n == 0 {
            return Err(MbError::config("至少需要一个分区"));
        }
        MbError::check_size("zone areas", n, self.zones.areas.len())?;
        MbError::check_size("zone volumes", n, self.zones.initial_volumes.len())?;
        if self.parameters.n_zones() != n {
            return Err(MbError::config(format!(
                "参数仓库分区数 {} 与拓扑分区数 {} 不一致",
                self.parameters.n_zones(),
                n
            )));
        }
        if self.zones.areas.iter().any(|a| *a <= 0.0) {
            return Err(MbError::config("分区面积必须为正"));
        }
        if self.zones.initial_volumes.iter().any(|v| *v <= 0.0) {
            return Err(MbError::config("分区初始体积必须为正"));
        }
        for (river, zone) in &self.zones.river_inflow_zones {
            if !self.zones.names.iter().any(|z| z == zone) {
                return Err(MbError::invalid_topology(format!(
                    "河流 {river} 指定的入流分区 {zone} 不存在"
                )));
            }
        }
        MbError::check_range("time.dt_hours", self.time.dt_hours, 1e-6, 24.0)?;
        if self.time.n_steps == 0 {
            return Err(MbError::config("时间步数必须为正"));
        }
        self.parameters.validate()?;
        self.harvest.validate()?;
        Ok(())
    }
}

// ============================================================================
// 时间轴
// ============================================================================

/// 时间轴配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 时间步长 [小时]
    #[serde(default = "default_dt_hours")]
    pub dt_hours: f64,

    /// 总时间步数
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,

    /// 每个模拟步包含的原始交换通量观测数（块内求和聚合）
    #[serde(default = "default_exchange_chunk")]
    pub exchange_chunk: usize,
}

fn default_dt_hours() -> f64 {
    1.0
}
fn default_n_steps() -> usize {
    24 * 365
}
fn default_exchange_chunk() -> usize {
    1
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            dt_hours: default_dt_hours(),
            n_steps: default_n_steps(),
            exchange_chunk: default_exchange_chunk(),
        }
    }
}

// ============================================================================
// 分区拓扑
// ============================================================================

/// 分区拓扑配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// 内部分区名称（不含外海）
    pub names: Vec<String>,

    /// 分区水面面积 [m²]
    pub areas: Vec<f64>,

    /// 分区初始体积 [m³]
    pub initial_volumes: Vec<f64>,

    /// 外海边界区名称
    #[serde(default = "default_boundary_name")]
    pub boundary_name: String,

    /// 外海边界区的名义体积 [m³]（远大于任何内部分区）
    #[serde(default = "default_boundary_volume")]
    pub boundary_volume: f64,

    /// 河流名称 → 入流分区名称
    #[serde(default)]
    pub river_inflow_zones: BTreeMap<String, String>,
}

fn default_boundary_name() -> String {
    "OuterSea".to_string()
}
fn default_boundary_volume() -> f64 {
    1e12
}

// ============================================================================
// 数据文件路径
// ============================================================================

/// 驱动与负荷数据文件路径
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcingPaths {
    /// 分区间水交换通量表（逐时间步，列名 "i_to_j"）
    pub exchange: PathBuf,

    /// 河流流量表（逐时间步，每河流一列）
    pub river_flow: PathBuf,

    /// 外海边界浓度表（逐时间步，每物质一列）
    pub outer_sea: PathBuf,

    /// 河流营养盐负荷记录（长表: date, Zone, 物质列）
    pub river_loads: PathBuf,

    /// 地下水静态负荷表（Zone, 物质列）
    pub groundwater_loads: PathBuf,

    /// 点源静态负荷表
    pub point_loads: PathBuf,

    /// 养殖塘静态负荷表
    pub pond_loads: PathBuf,

    /// 大气沉降静态负荷表
    pub atmosphere_loads: PathBuf,

    /// 温度驱动表（逐时间步，每分区一列）
    pub temperature: PathBuf,

    /// 光照驱动表
    pub irradiance: PathBuf,

    /// 盐度驱动表
    pub salinity: PathBuf,

    /// 观测记录（Zone, timestep, 物质, 值），可选，仅用于目标函数
    #[serde(default)]
    pub observations: Option<PathBuf>,
}

// ============================================================================
// 缩放因子
// ============================================================================

/// 负荷/边界缩放因子
///
/// 情景分析与灵敏度驱动通过这些乘子扰动输入，而不改动数据文件。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadScaling {
    /// 外海边界浓度缩放: 物质 → 乘子（缺省 1.0）
    #[serde(default)]
    pub outer_sea: BTreeMap<String, f64>,

    /// 负荷缩放: 源类型 → (物质 → 乘子)
    ///
    /// 源类型: river / groundwater / point_source / pond / atmosphere
    #[serde(default)]
    pub loads: BTreeMap<String, BTreeMap<String, f64>>,

    /// 交换矩阵整体系数（参考数据集为 0.5）
    #[serde(default = "default_exchange_coefficient")]
    pub exchange_coefficient: f64,
}

fn default_exchange_coefficient() -> f64 {
    0.5
}

impl Default for LoadScaling {
    fn default() -> Self {
        Self {
            outer_sea: BTreeMap::new(),
            loads: BTreeMap::new(),
            exchange_coefficient: default_exchange_coefficient(),
        }
    }
}

// ============================================================================
// 收获日程
// ============================================================================

/// 收获日程配置
///
/// 周期以时间步计；周期步执行全量收获并按补苗向量/种苗体积复位。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    /// 贝类收获周期 [步]（0 表示不收获）
    #[serde(default = "default_shellfish_period")]
    pub shellfish_period: usize,

    /// 鱼类收获周期 [步]
    #[serde(default = "default_fish_period")]
    pub fish_period: usize,

    /// 大型藻类收获周期 [步]
    #[serde(default = "default_macroalgae_period")]
    pub macroalgae_period: usize,

    /// 大型藻类单次收获比例 [0,1]
    #[serde(default = "default_macroalgae_fraction")]
    pub macroalgae_fraction: f64,
}

fn default_shellfish_period() -> usize {
    24 * 30 * 6
}
fn default_fish_period() -> usize {
    24 * 30 * 12
}
fn default_macroalgae_period() -> usize {
    24 * 30 * 3
}
fn default_macroalgae_fraction() -> f64 {
    0.8
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            shellfish_period: default_shellfish_period(),
            fish_period: default_fish_period(),
            macroalgae_period: default_macroalgae_period(),
            macroalgae_fraction: default_macroalgae_fraction(),
        }
    }
}

impl HarvestConfig {
    /// 校验收获比例
    pub fn validate(&self) -> MbResult<()> {
        MbError::check_range(
            "harvest.macroalgae_fraction",
            self.macroalgae_fraction,
            0.0,
            1.0,
        )
    }
}

// ============================================================================
// 输出
// ============================================================================

/// 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// 输出目录
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// 输出间隔 [步]（每隔多少步落盘一次）
    #[serde(default = "default_output_interval")]
    pub interval: usize,

    /// 需要输出时序的变量名（空表示全部）
    #[serde(default)]
    pub variables: Vec<String>,

    /// 是否输出过程贡献台账
    #[serde(default = "default_true")]
    pub contributions: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}
fn default_output_interval() -> usize {
    24
}
fn default_true() -> bool {
    true
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            interval: default_output_interval(),
            variables: Vec::new(),
            contributions: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config_json() -> String {
        r#"{
            "zones": {
                "names": ["Area1", "Area2"],
                "areas": [1e6, 2e6],
                "initial_volumes": [1e7, 2e7]
            },
            "forcing": {
                "exchange": "flux.csv",
                "river_flow": "river_flow.csv",
                "outer_sea": "outer_sea.csv",
                "river_loads": "river_loads.csv",
                "groundwater_loads": "gw.csv",
                "point_loads": "point.csv",
                "pond_loads": "pond.csv",
                "atmosphere_loads": "atm.csv",
                "temperature": "t.csv",
                "irradiance": "i.csv",
                "salinity": "s.csv"
            },
            "parameters": {
                "n_zones": 2,
                "entries": {"K_T": 1.068}
            }
        }"#
        .to_string()
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: RunConfig = serde_json::from_str(&minimal_config_json()).unwrap();
        assert_eq!(config.zones.names.len(), 2);
        assert_eq!(config.time.dt_hours, 1.0);
        assert_eq!(config.scaling.exchange_coefficient, 0.5);
        assert_eq!(config.harvest.macroalgae_fraction, 0.8);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_river_zone() {
        let mut config: RunConfig = serde_json::from_str(&minimal_config_json()).unwrap();
        config
            .zones
            .river_inflow_zones
            .insert("RiverX".into(), "NoSuchZone".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_size_mismatch() {
        let mut config: RunConfig = serde_json::from_str(&minimal_config_json()).unwrap();
        config.zones.areas.pop();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_nonpositive_volume() {
        let mut config: RunConfig = serde_json::from_str(&minimal_config_json()).unwrap();
        config.zones.initial_volumes[0] = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_harvest_fraction_range() {
        let mut harvest = HarvestConfig::default();
        assert!(harvest.validate().is_ok());
        harvest.macroalgae_fraction = 1.5;
        assert!(harvest.validate().is_err());
    }
}
