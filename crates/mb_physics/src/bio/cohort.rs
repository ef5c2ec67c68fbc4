// crates/mb_physics/src/bio/cohort.rs

//! 养殖种群能量收支模型
//!
//! 贝类与鱼类共用同一套"储备/结构/成熟"能量学骨架，每步一次连续
//! 更新（无离散分支状态）：
//!
//! 1. 温度效应（五参数 Arrhenius 耐受）
//! 2. 摄食功能响应（食物密度饱和函数）
//! 3. 同化速率 = 温度 × 功能响应 × 最大面积比同化率 × V^(2/3)
//! 4. 维持速率 = 温度 × 体积比维持常数 × V
//! 5. 成熟维持 = min(V, V_p) × 维持常数 × (1−κ)/κ
//! 6. 分解代谢通量（储备密度、同化、维持的闭式组合）
//! 7. 结构生长增量 = max(0, (κ·p_C − p_M)/E_G)，体积不回缩
//! 8. 储备更新 = 同化 − 分解
//! 9. 繁殖缓冲更新 = (1−κ)·p_C − p_J
//! 10. 种群更新 = N·(1 − 背景死亡率 − 收获率)；周期步全量收获并按
//!     补苗向量/种苗体积复位
//!
//! 退化保护：结构体积为零时储备密度比值取零；种群为零的分区所有
//! 派生通量（排泄/清滤/呼吸）严格为零。

use mb_config::ParameterStore;
use mb_foundation::float::surface_power;
use mb_foundation::scalar::LITERS_PER_M3;
use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};

use crate::process::{arrhenius_tolerance, michaelis, ThermalTolerance};

// ============================================================
// 参数
// ============================================================

/// 摄食来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodSource {
    /// 滤食浮游生物（PHY+ZOO 密度驱动功能响应）
    Plankton,
    /// 投喂饲料（按存栏量折算的饲料配给）
    Ration,
}

/// 种群参数（构造时从参数仓库一次性解析）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortParams {
    /// 背景死亡率 [1/步]
    pub mortality: Scalar,
    /// 分解代谢通量中用于生长与维持的份额 κ
    pub kappa: Scalar,
    /// 结构体积比生长成本 [J/cm³]
    pub e_g: Scalar,
    /// 最大面积比同化率 [J/cm²/步]
    pub p_am: Scalar,
    /// 最大储备密度 [J/cm³]
    pub e_m: Scalar,
    /// 性成熟结构体积 [cm³]
    pub v_p: Scalar,
    /// 体积比维持率 [J/cm³/步]
    pub p_m: Scalar,
    /// 摄食半饱和常数
    pub half_saturation: Scalar,
    /// 最大面积比清滤率 [1/步 量纲因来源而异]
    pub clearance: Scalar,
    /// 温度耐受参数
    pub thermal: ThermalTolerance,
    /// 摄食来源
    pub food: FoodSource,

    // 元素组成与换算（营养盐池用）
    /// 氮碳比 [mgN/mgC]
    pub nc: Scalar,
    /// 磷碳比 [mgP/mgC]
    pub pc: Scalar,
    /// 食物氮碳比 [mgN/mgC]
    pub nc_food: Scalar,
    /// 结构能量含量 [J/gW]
    pub mu_v: Scalar,
    /// 繁殖储备固定于卵的份额
    pub kappa_r: Scalar,
    /// 碳能量换算 [J/mgC]
    pub mu_cj: Scalar,

    /// 种苗结构体积 [cm³]（收获复位用）
    pub seed_volume: Scalar,
    /// 收获后的补苗向量 [个/分区]
    pub restock: Vec<Scalar>,

    /// 收获个体质量 [g]（饲料配给折算，仅投喂型使用）
    pub harvest_mass: Scalar,
    /// 饲料系数（仅投喂型使用）
    pub fcr: Scalar,
}

impl CohortParams {
    /// 贝类参数
    pub fn shellfish_from_store(store: &ParameterStore) -> MbResult<Self> {
        Ok(Self {
            mortality: store.scalar("DSH")?,
            kappa: store.scalar("kappa_SH")?,
            e_g: store.scalar("[E_G_SH]")?,
            p_am: store.scalar("{p_A_SH}")?,
            e_m: store.scalar("[E_m_SH]")?,
            v_p: store.scalar("V_p_SH")?,
            p_m: store.scalar("[p_M_SH]")?,
            half_saturation: store.scalar("H_SH")?,
            clearance: store.scalar("U_SH")?,
            thermal: ThermalTolerance {
                t_ref: store.scalar("T_0_SH")?,
                t_a: store.scalar("T_A_SH")?,
                t_al: store.scalar("T_AL_SH")?,
                t_ah: store.scalar("T_AH_SH")?,
                t_l: store.scalar("T_L_SH")?,
                t_h: store.scalar("T_H_SH")?,
            },
            food: FoodSource::Plankton,
            nc: store.scalar("NC_SH")?,
            pc: store.scalar("PC_SH")?,
            nc_food: store.scalar("NC_PHY")?,
            mu_v: store.scalar("mu_V_SH")?,
            kappa_r: store.scalar("kappa_R_SH")?,
            mu_cj: store.scalar("mu_CJ")?,
            seed_volume: store.scalar("V_SH_seed")?,
            restock: store.zonal("N_SH_restock")?,
            harvest_mass: 0.0,
            fcr: 0.0,
        })
    }

    /// 鱼类参数
    pub fn fish_from_store(store: &ParameterStore) -> MbResult<Self> {
        Ok(Self {
            mortality: store.scalar("DF")?,
            kappa: store.scalar("kappa_F")?,
            e_g: store.scalar("[E_G_F]")?,
            p_am: store.scalar("{p_A_F}")?,
            e_m: store.scalar("[E_m_F]")?,
            v_p: store.scalar("V_p_F")?,
            p_m: store.scalar("[p_M_F]")?,
            half_saturation: store.scalar("H_F")?,
            clearance: store.scalar("U_F")?,
            thermal: ThermalTolerance {
                t_ref: store.scalar("T_0_F")?,
                t_a: store.scalar("T_A_F")?,
                t_al: store.scalar("T_AL_F")?,
                t_ah: store.scalar("T_AH_F")?,
                t_l: store.scalar("T_L_F")?,
                t_h: store.scalar("T_H_F")?,
            },
            food: FoodSource::Ration,
            nc: store.scalar("NC_F")?,
            pc: store.scalar("PC_F")?,
            nc_food: store.scalar("NC_FEED")?,
            mu_v: store.scalar("mu_V_F")?,
            kappa_r: store.scalar("kappa_R_F")?,
            mu_cj: store.scalar("mu_CJ")?,
            seed_volume: store.scalar("V_F_seed")?,
            restock: store.zonal("N_F_restock")?,
            harvest_mass: store.scalar("M_F")?,
            fcr: store.scalar("FCR_F")?,
        })
    }
}

// ============================================================
// 状态
// ============================================================

/// 种群状态（逐分区）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortState {
    /// 个体数 [个]
    pub population: Vec<Scalar>,
    /// 个体结构体积 [cm³]
    pub volume: Vec<Scalar>,
    /// 个体储备能量 [J]
    pub reserve: Vec<Scalar>,
    /// 个体繁殖缓冲 [J]
    pub repro: Vec<Scalar>,
}

impl CohortState {
    /// 从参数仓库读取初始状态
    pub fn from_store(
        store: &ParameterStore,
        population_key: &str,
        volume_key: &str,
        reserve_key: &str,
        repro_key: &str,
    ) -> MbResult<Self> {
        Ok(Self {
            population: store.zonal(population_key)?,
            volume: store.zonal(volume_key)?,
            reserve: store.zonal(reserve_key)?,
            repro: store.zonal(repro_key)?,
        })
    }

    /// 分区数
    pub fn n_zones(&self) -> usize {
        self.population.len()
    }
}

// ============================================================
// 单步通量
// ============================================================

/// 一个时间步的种群通量（逐分区），供营养盐池消费
#[derive(Debug, Clone, Default)]
pub struct CohortStep {
    /// 温度因子
    pub temp_factor: Vec<Scalar>,
    /// 同化通量 p_A [J/个/步]
    pub assimilation: Vec<Scalar>,
    /// 分解代谢通量 p_C [J/个/步]
    pub catabolic: Vec<Scalar>,
    /// 维持通量 p_M [J/个/步]
    pub maintenance: Vec<Scalar>,
    /// 成熟维持通量 p_J [J/个/步]
    pub maturity: Vec<Scalar>,
    /// 结构生长增量 dV [cm³/个/步]
    pub growth_dv: Vec<Scalar>,
    /// 繁殖缓冲增量 dE_R [J/个/步]
    pub repro_delta: Vec<Scalar>,
    /// 铵排泄 [mgN/个/步]
    pub excretion_per_ind: Vec<Scalar>,
    /// 死亡能量通量 D·N·(μ_V·V + E + κ_R·E_R) [J/步]
    pub death_energy: Vec<Scalar>,
    /// 粪便碳比通量 (k_T·U·food·V^(2/3) − p_A/μ_CJ)·N/V_ind [mgC/步]
    pub faecal_specific: Vec<Scalar>,
    /// 对浮游生物的比清滤压力 k_T·U·V^(2/3)·N/vol [1/步]
    pub clearance_pressure: Vec<Scalar>,
    /// 呼吸耗氧 N·p_C/14.31/vol/1000 [mgO2/L/步]
    pub respiration_o2: Vec<Scalar>,
}

// ============================================================
// 模型
// ============================================================

/// 能量收支种群模型
#[derive(Debug, Clone)]
pub struct CohortModel {
    params: CohortParams,
}

impl CohortModel {
    /// 创建模型
    pub fn new(params: CohortParams, n_zones: usize) -> MbResult<Self> {
        MbError::check_size("cohort restock", n_zones, params.restock.len())?;
        MbError::check_range("cohort kappa", params.kappa, 0.0, 1.0)?;
        Ok(Self { params })
    }

    /// 参数
    pub fn params(&self) -> &CohortParams {
        &self.params
    }

    /// 投喂型的饲料配给 [g/步]
    ///
    /// 按存栏量折算：N · M_F · FCR / 8760（小时步）。
    fn feed_ration(&self, population: Scalar) -> Scalar {
        population * self.params.harvest_mass * self.params.fcr / 8760.0
    }

    /// 推进一步
    ///
    /// `food_density`: 滤食型为 PHY+ZOO 浓度 [mgC/L]，投喂型忽略；
    /// `phy`: 浮游植物浓度（粪便项用）；
    /// `volumes`: 分区水体积 [m³]；
    /// `harvest`: 本步收获率（0 或 1）与是否复位。
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &self,
        state: &mut CohortState,
        temperature_k: &[Scalar],
        food_density: &[Scalar],
        phy: &[Scalar],
        volumes: &[Scalar],
        harvest_rate: Scalar,
        restock_event: bool,
    ) -> MbResult<CohortStep> {
        let n = state.n_zones();
        MbError::check_size("cohort temperature", n, temperature_k.len())?;
        MbError::check_size("cohort food", n, food_density.len())?;
        MbError::check_size("cohort volumes", n, volumes.len())?;

        let p = &self.params;
        let mut out = CohortStep {
            temp_factor: vec![0.0; n],
            assimilation: vec![0.0; n],
            catabolic: vec![0.0; n],
            maintenance: vec![0.0; n],
            maturity: vec![0.0; n],
            growth_dv: vec![0.0; n],
            repro_delta: vec![0.0; n],
            excretion_per_ind: vec![0.0; n],
            death_energy: vec![0.0; n],
            faecal_specific: vec![0.0; n],
            clearance_pressure: vec![0.0; n],
            respiration_o2: vec![0.0; n],
        };

        for i in 0..n {
            // 1. 温度效应（逐分区温度）
            let k_t = arrhenius_tolerance(temperature_k[i], &p.thermal);
            out.temp_factor[i] = k_t;

            let v_ind = state.volume[i];
            let surface = surface_power(v_ind);

            // 2. 摄食功能响应
            let f = match p.food {
                FoodSource::Plankton => michaelis(food_density[i], p.half_saturation),
                FoodSource::Ration => {
                    michaelis(self.feed_ration(state.population[i]), p.half_saturation)
                }
            };

            // 3. 同化
            let p_a = k_t * f * p.p_am * surface;
            // 4. 维持
            let p_m = k_t * p.p_m * v_ind;
            // 5. 成熟维持
            let p_j = v_ind.min(p.v_p) * p.p_m * (1.0 - p.kappa) / p.kappa;

            // 6. 分解代谢：储备密度比值，零体积取零
            let e_density = if v_ind > 0.0 {
                state.reserve[i] / v_ind
            } else {
                0.0
            };
            let mobil = e_density / (p.e_g + p.kappa * e_density);
            let drive = p.e_g * p.p_am * surface / p.e_m + k_t * p.p_m * v_ind;
            let p_c = match p.food {
                // 鱼类变体对整体再乘温度因子
                FoodSource::Ration => k_t * mobil * drive,
                FoodSource::Plankton => mobil * drive,
            };

            // 7. 结构生长（体积不回缩）
            let dv = ((p.kappa * p_c - p_m) / p.e_g).max(0.0);
            // 8-9. 储备与繁殖缓冲增量
            let de = p_a - p_c;
            let de_r = (1.0 - p.kappa) * p_c - p_j;

            out.assimilation[i] = p_a;
            out.catabolic[i] = p_c;
            out.maintenance[i] = p_m;
            out.maturity[i] = p_j;
            out.growth_dv[i] = dv;
            out.repro_delta[i] = de_r;

            // 提交个体状态
            state.volume[i] = v_ind + dv;
            state.reserve[i] += de;
            state.repro[i] += de_r;

            // 10. 种群更新
            state.population[i] =
                (state.population[i] * (1.0 - p.mortality - harvest_rate)).max(0.0);
        }

        // 收获步复位：种苗体积 + 补苗向量
        if restock_event {
            for i in 0..n {
                state.volume[i] = p.seed_volume;
                state.population[i] = p.restock[i];
            }
        }

        // 派生通量：用更新后的状态；零种群分区严格为零
        for i in 0..n {
            let n_pop = state.population[i];
            if n_pop <= 0.0 {
                continue;
            }
            let k_t = out.temp_factor[i];
            let v_ind = state.volume[i];
            let surface = surface_power(v_ind);
            let p_a = out.assimilation[i];
            let p_c = out.catabolic[i];
            let vol_l = volumes[i] * LITERS_PER_M3;

            // 铵排泄 [mgN/个/步]
            let excr = ((p_c - (1.0 - p.kappa_r) * out.repro_delta[i]
                - p.mu_v * out.growth_dv[i])
                * p.nc
                + p_a * (p.nc_food - p.nc).max(0.0))
                / p.mu_cj;
            out.excretion_per_ind[i] = excr;

            // 死亡能量通量 [J/步]
            out.death_energy[i] = p.mortality
                * n_pop
                * (p.mu_v * v_ind + state.reserve[i] + p.kappa_r * state.repro[i]);

            // 粪便碳比通量 [mgC/步]
            if v_ind > 0.0 {
                let intake_c = match p.food {
                    FoodSource::Plankton => k_t * p.clearance * phy[i] * surface,
                    FoodSource::Ration => k_t * p.clearance * surface,
                };
                out.faecal_specific[i] = (intake_c - p_a / p.mu_cj) * n_pop / v_ind;
            }

            // 清滤压力 [1/步]
            if volumes[i] > 0.0 {
                out.clearance_pressure[i] = k_t * p.clearance * surface * n_pop / volumes[i];
            }

            // 呼吸耗氧 [mgO2/L/步]
            if vol_l > 0.0 {
                out.respiration_o2[i] = n_pop * p_c / 14.31 / vol_l;
            }
        }

        Ok(out)
    }
}
