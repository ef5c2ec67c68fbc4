// crates/mb_physics/src/bio/macroalgae.rs

//! 大型藻类
//!
//! 生长率是五个独立限制项（温度、光照、空间、盐度、细胞配额）与
//! 基础速率常数的乘积；细胞内氮/磷配额由各自的 吸收 − 排泄 −
//! 死亡稀释 平衡演化，下限为零；死亡/呼吸按温度修正扣除；
//! 收获按固定周期移除固定比例生物量。
//!
//! 光照限制带生物量自遮蔽：冠层深度随生物量超出初始值的部分增长，
//! 未超出初始生物量时不受光限制。

use mb_config::ParameterStore;
use mb_foundation::scalar::MIN_CONCENTRATION;
use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};

use crate::process::{
    canopy_light_limitation, michaelis, quota_limitation, salinity_limitation, space_limitation,
    temperature_exponential, temperature_logistic,
};

/// 大型藻类参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MacroalgaeParams {
    /// 最大生长率 [1/步]
    pub kc: Scalar,
    /// 温度底数 θ
    pub theta: Scalar,
    /// 最适温度 [°C]
    pub t_opt: Scalar,
    /// 盐度敏感系数（低于最适）
    pub kappa1_s: Scalar,
    /// 盐度敏感系数（高于最适）
    pub kappa2_s: Scalar,
    /// 最适盐度 [g/kg]
    pub s_opt: Scalar,
    /// 光饱和常数 [lx/d]
    pub i_s: Scalar,
    /// 光衰减系数 [1/m]
    pub k_e: Scalar,
    /// 死亡率常数 [1/步]
    pub kd: Scalar,
    /// 呼吸率常数 [1/步]
    pub kr: Scalar,
    /// 最大生物量 [gD/m²]
    pub ma_max: Scalar,
    /// 最大生长深度 [m]
    pub z_max: Scalar,
    /// 氮最大吸收率 [mgN/gD/步]
    pub f_up_n: Scalar,
    /// 磷最大吸收率 [mgP/gD/步]
    pub f_up_p: Scalar,
    /// 氮配额下限 [mgN/gD]
    pub q0_n: Scalar,
    /// 磷配额下限 [mgP/gD]
    pub q0_p: Scalar,
    /// 水柱氮半饱和常数 [mgN/L]
    pub kn: Scalar,
    /// 细胞内氮半饱和常数 [mgN/gD]
    pub kq_n: Scalar,
    /// 水柱磷半饱和常数 [mgP/L]
    pub kp: Scalar,
    /// 细胞内磷半饱和常数 [mgP/gD]
    pub kq_p: Scalar,
    /// 细胞排泄率常数 [1/步]
    pub k_excretion: Scalar,
    /// 干重碳比 [mgD/mgC]
    pub dc: Scalar,
    /// 氮碳比 [mgN/mgC]
    pub nc: Scalar,
    /// 磷碳比 [mgP/mgC]
    pub pc: Scalar,
    /// 养殖面积占分区面积的比例
    pub area_fraction: Scalar,
}

impl MacroalgaeParams {
    /// 从参数仓库解析
    pub fn from_store(store: &ParameterStore) -> MbResult<Self> {
        Ok(Self {
            kc: store.scalar("KC_MA")?,
            theta: store.scalar("K_T")?,
            t_opt: store.scalar("T_opt")?,
            kappa1_s: store.scalar("kappa_1_MA_S")?,
            kappa2_s: store.scalar("kappa_2_MA_S")?,
            s_opt: store.scalar("S_opt")?,
            i_s: store.scalar("I_s")?,
            k_e: store.scalar("K_E")?,
            kd: store.scalar("KD_MA")?,
            kr: store.scalar("KR_MA")?,
            ma_max: store.scalar("MA_max")?,
            z_max: store.scalar("z")?,
            f_up_n: store.scalar("F_UP_N")?,
            f_up_p: store.scalar("F_UP_P")?,
            q0_n: store.scalar("q_0N")?,
            q0_p: store.scalar("q_0P")?,
            kn: store.scalar("KN_MA")?,
            kq_n: store.scalar("K_qN")?,
            kp: store.scalar("KP_MA")?,
            kq_p: store.scalar("K_qP")?,
            k_excretion: store.scalar("KE_MA")?,
            dc: store.scalar("DC_MA")?,
            nc: store.scalar("NC_MA")?,
            pc: store.scalar("PC_MA")?,
            area_fraction: 0.01,
        })
    }
}

/// 大型藻类单步结果（逐分区）
#[derive(Debug, Clone)]
pub struct MacroalgaeStep {
    /// 温度限制
    pub temperature_lim: Vec<Scalar>,
    /// 光照限制
    pub light_lim: Vec<Scalar>,
    /// 空间限制
    pub space_lim: Vec<Scalar>,
    /// 盐度限制
    pub salinity_lim: Vec<Scalar>,
    /// 配额限制
    pub quota_lim: Vec<Scalar>,
    /// 比生长率 [1/步]
    pub growth: Vec<Scalar>,
    /// 比损失率（呼吸 + 死亡）[1/步]
    pub loss: Vec<Scalar>,
    /// 死亡通量 DMA = 死亡率 × 生物量 [gD/m²/步]
    pub death_flux: Vec<Scalar>,
    /// 氮吸收通量 F_UN [mgN/gD·(gD/m²)/步 ×1e-3]
    pub uptake_n: Vec<Scalar>,
    /// 氮排泄通量 F_EN
    pub excretion_n: Vec<Scalar>,
    /// 氮死亡稀释通量 F_DN
    pub death_n: Vec<Scalar>,
    /// 磷吸收通量 F_UP
    pub uptake_p: Vec<Scalar>,
    /// 磷排泄通量 F_EP
    pub excretion_p: Vec<Scalar>,
    /// 磷死亡稀释通量 F_DP
    pub death_p: Vec<Scalar>,
    /// 更新后的氮配额 [mgN/gD]
    pub quota_n: Vec<Scalar>,
    /// 更新后的磷配额 [mgP/gD]
    pub quota_p: Vec<Scalar>,
    /// 更新后的生物量 [gD/m²]
    pub biomass: Vec<Scalar>,
}

/// 大型藻类模型
#[derive(Debug, Clone)]
pub struct MacroalgaeModel {
    params: MacroalgaeParams,
    /// 初始生物量（自遮蔽光限制的参照）
    initial_biomass: Vec<Scalar>,
}

impl MacroalgaeModel {
    /// 创建模型，记录初始生物量
    pub fn new(params: MacroalgaeParams, initial_biomass: Vec<Scalar>) -> Self {
        Self {
            params,
            initial_biomass,
        }
    }

    /// 参数
    pub fn params(&self) -> &MacroalgaeParams {
        &self.params
    }

    /// 自遮蔽光照限制
    ///
    /// 生物量未超出初始值时限制为 1；超出部分抬高冠层深度，
    /// 对冠层积分 Steele 响应。
    fn light_limitation(&self, irradiance: Scalar, biomass: Scalar, initial: Scalar) -> Scalar {
        if biomass <= initial {
            return 1.0;
        }
        const BASE_DEPTH: Scalar = 0.2;
        const DEPTH_PER_BIOMASS: Scalar = 0.005;
        let canopy = BASE_DEPTH + DEPTH_PER_BIOMASS * (biomass - initial);
        let k_canopy = self.params.k_e
            + 4e-4 * ((canopy / self.params.z_max).max(1.0) / canopy.min(self.params.z_max));
        canopy_light_limitation(irradiance, self.params.i_s, k_canopy, canopy)
    }

    /// 推进一步
    ///
    /// `harvest_fraction` 为本步收获比例（非收获步为 0）。
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        ma: &[Scalar],
        quota_n: &[Scalar],
        quota_p: &[Scalar],
        nh4: &[Scalar],
        no3: &[Scalar],
        po4: &[Scalar],
        temperature: &[Scalar],
        salinity: &[Scalar],
        irradiance: &[Scalar],
        harvest_fraction: Scalar,
    ) -> MbResult<MacroalgaeStep> {
        let n = ma.len();
        MbError::check_size("macroalgae quota_n", n, quota_n.len())?;
        MbError::check_size("macroalgae temperature", n, temperature.len())?;
        MbError::check_size("macroalgae initial biomass", n, self.initial_biomass.len())?;

        let p = &self.params;
        let mut out = MacroalgaeStep {
            temperature_lim: vec![0.0; n],
            light_lim: vec![0.0; n],
            space_lim: vec![0.0; n],
            salinity_lim: vec![0.0; n],
            quota_lim: vec![0.0; n],
            growth: vec![0.0; n],
            loss: vec![0.0; n],
            death_flux: vec![0.0; n],
            uptake_n: vec![0.0; n],
            excretion_n: vec![0.0; n],
            death_n: vec![0.0; n],
            uptake_p: vec![0.0; n],
            excretion_p: vec![0.0; n],
            death_p: vec![0.0; n],
            quota_n: vec![0.0; n],
            quota_p: vec![0.0; n],
            biomass: vec![0.0; n],
        };

        for i in 0..n {
            let theta_t = temperature_exponential(p.theta, temperature[i], p.t_opt);
            let death_rate = p.kd * theta_t;
            let respiration_rate = p.kr * theta_t;
            let death_flux = death_rate * ma[i];
            out.death_flux[i] = death_flux;
            out.loss[i] = death_rate + respiration_rate;

            // 细胞配额演化：吸收 − 排泄 − 死亡稀释，下限 0
            let theta_20 = temperature_exponential(p.theta, temperature[i], 20.0);
            let din = (nh4[i] + no3[i]).max(0.0);
            let f_un = 1e-3
                * p.f_up_n
                * michaelis(din, p.kn)
                * (p.kq_n / (p.kq_n + (quota_n[i] - p.q0_n)))
                * ma[i];
            let f_en = 1e-3 * p.k_excretion * theta_20 * quota_n[i] * ma[i];
            let f_dn = 1e-3 * death_flux * quota_n[i];
            out.uptake_n[i] = f_un;
            out.excretion_n[i] = f_en;
            out.death_n[i] = f_dn;
            out.quota_n[i] = (quota_n[i] + f_un - f_en - f_dn).max(0.0);

            let f_up = 1e-3
                * p.f_up_p
                * michaelis(po4[i], p.kp)
                * (p.kq_p / (p.kq_p + (quota_p[i] - p.q0_p)))
                * ma[i];
            let f_ep = 1e-3 * p.k_excretion * theta_20 * quota_p[i] * ma[i];
            let f_dp = 1e-3 * death_flux * quota_p[i];
            out.uptake_p[i] = f_up;
            out.excretion_p[i] = f_ep;
            out.death_p[i] = f_dp;
            out.quota_p[i] = (quota_p[i] + f_up - f_ep - f_dp).max(0.0);

            // 五因子生长
            let phi_t = temperature_logistic(p.theta, temperature[i], p.t_opt);
            let phi_l = self.light_limitation(irradiance[i], ma[i], self.initial_biomass[i]);
            let phi_space = space_limitation(ma[i], p.ma_max);
            let phi_sal = salinity_limitation(salinity[i], p.s_opt, p.kappa1_s, p.kappa2_s);
            let phi_q = quota_limitation(out.quota_n[i], p.q0_n, out.quota_p[i], p.q0_p);

            out.temperature_lim[i] = phi_t;
            out.light_lim[i] = phi_l;
            out.space_lim[i] = phi_space;
            out.salinity_lim[i] = phi_sal;
            out.quota_lim[i] = phi_q;

            let growth = p.kc * phi_t * phi_l * phi_space * phi_sal * phi_q;
            out.growth[i] = growth;

            let delta = growth - out.loss[i] - harvest_fraction;
            out.biomass[i] = (ma[i] * (1.0 + delta)).max(MIN_CONCENTRATION);
        }
        Ok(out)
    }
}
