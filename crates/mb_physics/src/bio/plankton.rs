// crates/mb_physics/src/bio/plankton.rs

//! 浮游植物与浮游动物
//!
//! 生长 = 限制函数乘积 × 最大生长率 × 生物量；损失 = 温度修正呼吸 +
//! 死亡。浮游植物的死亡率在两个候选公式（常数率 / 密度制约逻辑斯蒂率）
//! 之间逐分区选择与当前生长率数值更接近的一个 —— 这是参考行为中的
//! 稳定化手法，按原输出保留。
//!
//! 净变化扣除浮游动物牧食与贝类清滤（由上游组件在同一步内先行计算），
//! 更新为乘性格式并保留浓度下限。

use mb_config::ParameterStore;
use mb_foundation::scalar::MIN_CONCENTRATION;
use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};

use crate::process::{light_limitation, nutrient_colimitation, temperature_exponential};

// ============================================================
// 浮游植物
// ============================================================

/// 浮游植物参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhytoParams {
    /// 最大生长率 [1/步]
    pub kc: Scalar,
    /// 氮半饱和常数 [mgN/L]
    pub kn: Scalar,
    /// 磷半饱和常数 [mgP/L]
    pub kp: Scalar,
    /// 溶解态无机磷比例
    pub f_po4: Scalar,
    /// 温度底数 θ
    pub theta: Scalar,
    /// 最适温度 [°C]
    pub t_opt: Scalar,
    /// 光衰减系数 [1/m]
    pub k_e: Scalar,
    /// 光饱和常数 [lx/d]
    pub i_s: Scalar,
    /// 常数死亡率 [1/步]
    pub kd: Scalar,
    /// 最大死亡率（密度制约公式）
    pub m_max: Scalar,
    /// 环境负载浓度 [mgC/L]（密度制约公式）
    pub k_load: Scalar,
    /// 呼吸率 [1/步]
    pub kr: Scalar,
}

impl PhytoParams {
    /// 从参数仓库解析
    pub fn from_store(store: &ParameterStore) -> MbResult<Self> {
        Ok(Self {
            kc: store.scalar("KC_PHY")?,
            kn: store.scalar("KN_PHY")?,
            kp: store.scalar("KP_PHY")?,
            f_po4: store.scalar("F_PO4")?,
            theta: store.scalar("K_T")?,
            t_opt: store.scalar("T_opt")?,
            k_e: store.scalar("K_E")?,
            i_s: store.scalar("I_s")?,
            kd: store.scalar("KD_PHY")?,
            m_max: store.scalar("M_max_PHY")?,
            k_load: store.scalar("K_PHY")?,
            kr: store.scalar("KR_PHY")?,
        })
    }
}

/// 死亡率公式选择
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathFormula {
    /// 常数死亡率
    Simple,
    /// 密度制约死亡率
    Detailed,
}

/// 浮游植物单步结果（逐分区）
#[derive(Debug, Clone)]
pub struct PhytoStep {
    /// 营养盐限制因子
    pub nutrient_lim: Vec<Scalar>,
    /// 温度限制因子
    pub temperature_lim: Vec<Scalar>,
    /// 光照限制因子
    pub light_lim: Vec<Scalar>,
    /// 比生长率 [1/步]
    pub growth: Vec<Scalar>,
    /// 比呼吸率 [1/步]
    pub respiration: Vec<Scalar>,
    /// 选定的比死亡率 [1/步]
    pub death: Vec<Scalar>,
    /// 逐分区选择的公式
    pub death_formula: Vec<DeathFormula>,
    /// 比损失率（呼吸 + 死亡）[1/步]
    pub loss: Vec<Scalar>,
    /// 更新后的生物量 [mgC/L]
    pub biomass: Vec<Scalar>,
}

impl PhytoParams {
    /// 推进一步
    ///
    /// `grazing`/`clearance` 为浮游动物牧食与贝类清滤的比压力 [1/步]。
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        phy: &[Scalar],
        nh4: &[Scalar],
        no3: &[Scalar],
        po4: &[Scalar],
        temperature: &[Scalar],
        irradiance: &[Scalar],
        depth: &[Scalar],
        grazing: &[Scalar],
        clearance: &[Scalar],
    ) -> MbResult<PhytoStep> {
        let n = phy.len();
        MbError::check_size("phyto temperature", n, temperature.len())?;
        MbError::check_size("phyto grazing", n, grazing.len())?;
        MbError::check_size("phyto clearance", n, clearance.len())?;

        let mut out = PhytoStep {
            nutrient_lim: vec![0.0; n],
            temperature_lim: vec![0.0; n],
            light_lim: vec![0.0; n],
            growth: vec![0.0; n],
            respiration: vec![0.0; n],
            death: vec![0.0; n],
            death_formula: vec![DeathFormula::Simple; n],
            loss: vec![0.0; n],
            biomass: vec![0.0; n],
        };

        for i in 0..n {
            let phi_n = nutrient_colimitation(nh4[i], no3[i], po4[i], self.kn, self.kp / self.f_po4);
            let phi_t = temperature_exponential(self.theta, temperature[i], self.t_opt);
            let phi_l = light_limitation(irradiance[i], self.i_s, self.k_e, depth[i]);

            out.nutrient_lim[i] = phi_n;
            out.temperature_lim[i] = phi_t;
            out.light_lim[i] = phi_l;

            let growth =
                (self.kc * phi_n.min(1.0) * phi_t.min(1.0) * phi_l.min(1.0)).max(0.0);
            out.growth[i] = growth;

            let respiration = self.kr * temperature_exponential(self.theta, temperature[i], self.t_opt);
            out.respiration[i] = respiration;

            let (death, formula) = self.select_death_rate(phy[i], growth, respiration);
            out.death[i] = death;
            out.death_formula[i] = formula;
            out.loss[i] = respiration + death;

            let delta = growth - out.loss[i] - grazing[i] - clearance[i];
            out.biomass[i] = (phy[i] * (1.0 + delta)).max(MIN_CONCENTRATION);
        }
        Ok(out)
    }

    /// 逐分区选择死亡率公式
    ///
    /// 两个候选：常数率 KD 与密度制约率
    /// `KD + M_max/(1 + (K/PHY)^(KC·11))`；取损失率与当前生长率数值
    /// 更接近的那个。稳定化手法，非物理规律。
    fn select_death_rate(
        &self,
        phy: Scalar,
        growth: Scalar,
        respiration: Scalar,
    ) -> (Scalar, DeathFormula) {
        let simple = self.kd;
        let ratio = self.k_load / phy.max(MIN_CONCENTRATION);
        let detailed = self.kd + self.m_max / (1.0 + ratio.powf(self.kc * 11.0));

        let diff_simple = (respiration + simple - growth).abs();
        let diff_detailed = (respiration + detailed - growth).abs();
        if diff_simple <= diff_detailed {
            (simple, DeathFormula::Simple)
        } else {
            (detailed, DeathFormula::Detailed)
        }
    }
}

// ============================================================
// 浮游动物
// ============================================================

/// 浮游动物参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZooParams {
    /// 牧食效率
    pub eff: Scalar,
    /// 牧食率常数 [1/步]
    pub k_grz: Scalar,
    /// 牧食半饱和常数 [mgC/L]
    pub k_pz: Scalar,
    /// 死亡率 [1/步]
    pub k_dz: Scalar,
}

impl ZooParams {
    /// 从参数仓库解析
    pub fn from_store(store: &ParameterStore) -> MbResult<Self> {
        Ok(Self {
            eff: store.scalar("EFF")?,
            k_grz: store.scalar("K_GRZ")?,
            k_pz: store.scalar("K_PZ")?,
            k_dz: store.scalar("K_DZ")?,
        })
    }
}

/// 浮游动物单步结果（逐分区）
#[derive(Debug, Clone)]
pub struct ZooStep {
    /// 比牧食率 [1/步]
    pub grazing: Vec<Scalar>,
    /// 比生长率 = 效率 × 牧食 [1/步]
    pub growth: Vec<Scalar>,
    /// 比死亡率 [1/步]
    pub loss: Vec<Scalar>,
    /// 更新后的生物量 [mgC/L]
    pub biomass: Vec<Scalar>,
}

impl ZooParams {
    /// 计算比牧食率（种群模型与营养盐池共用，先于更新调用）
    pub fn grazing_rate(&self, phy: &[Scalar]) -> Vec<Scalar> {
        phy.iter()
            .map(|p| self.k_grz * p.max(0.0) / (p.max(0.0) + self.k_pz))
            .collect()
    }

    /// 推进一步
    ///
    /// `clearance` 为贝类对浮游动物的比清滤压力 [1/步]。
    pub fn step(
        &self,
        zoo: &[Scalar],
        grazing: &[Scalar],
        clearance: &[Scalar],
    ) -> MbResult<ZooStep> {
        let n = zoo.len();
        MbError::check_size("zoo grazing", n, grazing.len())?;
        MbError::check_size("zoo clearance", n, clearance.len())?;

        let mut out = ZooStep {
            grazing: grazing.to_vec(),
            growth: vec![0.0; n],
            loss: vec![0.0; n],
            biomass: vec![0.0; n],
        };

        for i in 0..n {
            out.growth[i] = self.eff * grazing[i];
            out.loss[i] = self.k_dz;
            let delta = out.growth[i] - out.loss[i] - clearance[i];
            out.biomass[i] = (zoo[i] * (1.0 + delta)).max(MIN_CONCENTRATION);
        }
        Ok(out)
    }
}
