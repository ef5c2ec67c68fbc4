// crates/mb_physics/src/nutrients/pools.rs

//! 八个营养盐池的过程装配
//!
//! 每个池从当步上下文取已算好的组件通量，装配成命名贡献的
//! [`MassBalance`](super::MassBalance)。全部速率为 [mg/L/步]；
//! 养殖种群与大型藻类的面积/个体通量在装配处按当地体积归一。

use mb_foundation::scalar::LITERS_PER_M3;
use mb_foundation::{MbResult, Scalar};
use std::collections::BTreeMap;

use crate::bio::cohort::{CohortParams, CohortState, CohortStep};
use crate::bio::macroalgae::{MacroalgaeParams, MacroalgaeStep};
use crate::bio::plankton::{PhytoStep, ZooParams, ZooStep};
use crate::process::{ammonium_preference, reaeration_coefficient, saturation_oxygen};
use crate::state::VariableKind;

use super::{MassBalance, NutrientParams};

// ============================================================
// 输入
// ============================================================

/// 营养盐池更新所需的当步输入（全部按引用借用，步末随上下文丢弃）
pub struct PoolInputs<'a> {
    // 旧浓度
    /// 铵态氮 [mgN/L]
    pub nh4: &'a [Scalar],
    /// 硝态氮 [mgN/L]
    pub no3: &'a [Scalar],
    /// 有机氮 [mgN/L]
    pub on: &'a [Scalar],
    /// 磷酸盐 [mgP/L]
    pub po4: &'a [Scalar],
    /// 有机磷 [mgP/L]
    pub op: &'a [Scalar],
    /// 颗粒态磷 [mgP/L]
    pub pp: &'a [Scalar],
    /// CBOD [mgO2/L]
    pub cbod: &'a [Scalar],
    /// 溶解氧 [mgO2/L]
    pub oxygen: &'a [Scalar],
    /// 悬浮颗粒物 [kg/m³]
    pub spm: &'a [Scalar],
    /// 浮游植物 [mgC/L]
    pub phy: &'a [Scalar],
    /// 浮游动物 [mgC/L]
    pub zoo: &'a [Scalar],
    /// 大型藻类 [gD/m²]
    pub ma: &'a [Scalar],

    // 驱动与几何
    /// 水温 [°C]
    pub temperature: &'a [Scalar],
    /// 盐度 [g/kg]
    pub salinity: &'a [Scalar],
    /// 特征流速 [m/s]
    pub current_speed: &'a [Scalar],
    /// 平均水深 [m]
    pub depth: &'a [Scalar],
    /// 分区体积 [m³]
    pub volumes: &'a [Scalar],
    /// 分区面积 [m²]
    pub areas: &'a [Scalar],

    // 组件单步结果
    /// 浮游植物
    pub phyto: &'a PhytoStep,
    /// 浮游动物
    pub zoo_step: &'a ZooStep,
    /// 浮游动物参数
    pub zoo_params: &'a ZooParams,
    /// 大型藻类
    pub ma_step: &'a MacroalgaeStep,
    /// 大型藻类参数
    pub ma_params: &'a MacroalgaeParams,
    /// 贝类通量
    pub shellfish: &'a CohortStep,
    /// 贝类状态（更新后）
    pub shellfish_state: &'a CohortState,
    /// 贝类参数
    pub shellfish_params: &'a CohortParams,
    /// 鱼类通量
    pub fish: &'a CohortStep,
    /// 鱼类状态（更新后）
    pub fish_state: &'a CohortState,
    /// 鱼类参数
    pub fish_params: &'a CohortParams,

    /// 外部输入 [mg/L/步]，按物质名索引
    pub external: &'a BTreeMap<&'static str, Vec<Scalar>>,
}

impl<'a> PoolInputs<'a> {
    fn n_zones(&self) -> usize {
        self.nh4.len()
    }

    /// 外部输入贡献；未提供的物质取 0
    fn external_rates(&self, substance: &str) -> Vec<Scalar> {
        self.external
            .get(substance)
            .cloned()
            .unwrap_or_else(|| vec![0.0; self.n_zones()])
    }

    /// 大型藻类养殖面积 [m²]
    fn ma_area(&self, i: usize) -> Scalar {
        self.ma_params.area_fraction * self.areas[i]
    }

    /// 分区体积 [L]
    fn volume_l(&self, i: usize) -> Scalar {
        self.volumes[i] * LITERS_PER_M3
    }
}

/// 一个池的更新结果
pub struct PoolUpdate {
    /// 池对应的状态变量
    pub kind: VariableKind,
    /// 命名贡献集合
    pub balance: MassBalance,
    /// 即时下限（参考行为）
    pub floor: Option<Scalar>,
}

// ============================================================
// 模型
// ============================================================

/// 营养盐池模型
#[derive(Debug, Clone)]
pub struct NutrientModel {
    params: NutrientParams,
}

impl NutrientModel {
    /// 创建模型
    pub fn new(params: NutrientParams) -> Self {
        Self { params }
    }

    /// 参数
    pub fn params(&self) -> &NutrientParams {
        &self.params
    }

    /// 更新全部八个池，返回各池的命名贡献集合
    pub fn update_all(&self, inputs: &PoolInputs<'_>) -> MbResult<Vec<PoolUpdate>> {
        Ok(vec![
            self.update_ammonium(inputs),
            self.update_nitrate(inputs),
            self.update_organic_n(inputs),
            self.update_phosphate(inputs),
            self.update_organic_p(inputs),
            self.update_particulate_p(inputs),
            self.update_cbod(inputs),
            self.update_oxygen(inputs),
        ])
    }

    // --------------------------------------------------------
    // 公共速率项
    // --------------------------------------------------------

    /// θ^(T−20)
    fn theta20(&self, t: Scalar) -> Scalar {
        self.params.theta.powf(t - 20.0)
    }

    /// 硝化速率 [mgN/L/步]
    fn nitrification(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        let p = &self.params;
        (0..inputs.n_zones())
            .map(|i| {
                p.kc_nit
                    * self.theta20(inputs.temperature[i])
                    * inputs.nh4[i].max(0.0)
                    * (inputs.oxygen[i].max(0.0) / (inputs.oxygen[i].max(0.0) + p.k_nit))
            })
            .collect()
    }

    /// 反硝化速率 [mgN/L/步]
    fn denitrification(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        let p = &self.params;
        (0..inputs.n_zones())
            .map(|i| {
                p.kc_den
                    * self.theta20(inputs.temperature[i])
                    * inputs.no3[i].max(0.0)
                    * (p.k_den / (inputs.oxygen[i].max(0.0) + p.k_den))
            })
            .collect()
    }

    /// 有机氮矿化速率 [mgN/L/步]
    fn mineralization_n(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        (0..inputs.n_zones())
            .map(|i| self.params.knc_min * self.theta20(inputs.temperature[i]) * inputs.on[i])
            .collect()
    }

    /// 有机磷矿化速率 [mgP/L/步]
    fn mineralization_p(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        (0..inputs.n_zones())
            .map(|i| self.params.kpc_min * self.theta20(inputs.temperature[i]) * inputs.op[i])
            .collect()
    }

    /// Langmuir 吸附 − 解吸 [mgP/L/步]（正为净吸附）
    fn adsorption_desorption(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        let p = &self.params;
        (0..inputs.n_zones())
            .map(|i| {
                let theta = self.theta20(inputs.temperature[i]);
                let spm = inputs.spm[i];
                let ads = if spm > 0.0 {
                    let occupancy = (1.0 - inputs.pp[i] / (p.q_max * spm)).max(0.0);
                    p.k_ads * spm * theta * occupancy * inputs.po4[i].max(0.0)
                } else {
                    0.0
                };
                let des = p.k_des * theta * inputs.pp[i].max(0.0);
                ads - des
            })
            .collect()
    }

    /// 饲料淋溶贡献 [mg/L/步]
    ///
    /// 0.2 · 系数 [mg/g] · 当步投饲量 [g/步] / 体积 [L]；
    /// 当步投饲量按存栏量折算: N_F·M_F·FCR / 8760。
    fn feed_leach(&self, inputs: &PoolInputs<'_>, coefficient: Scalar) -> Vec<Scalar> {
        let fp = inputs.fish_params;
        (0..inputs.n_zones())
            .map(|i| {
                let feed_mass =
                    inputs.fish_state.population[i] * fp.harvest_mass * fp.fcr / 8760.0;
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    0.2 * coefficient * feed_mass / vol_l
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// 养殖种群的死亡+粪便元素通量 [mg元素/L/步]
    ///
    /// `element_ratio` 为元素碳比；死亡能量经 μ_CJ 换算为碳。
    fn cohort_organic_release(
        &self,
        inputs: &PoolInputs<'_>,
        step: &CohortStep,
        params: &CohortParams,
        element_ratio: Scalar,
    ) -> Vec<Scalar> {
        (0..inputs.n_zones())
            .map(|i| {
                let vol_l = inputs.volume_l(i);
                if vol_l <= 0.0 {
                    return 0.0;
                }
                let death_c = step.death_energy[i] / params.mu_cj;
                let faecal_c = step.faecal_specific[i];
                (death_c + faecal_c) * element_ratio / vol_l
            })
            .collect()
    }

    /// 养殖种群铵排泄 [mgN/L/步]
    fn cohort_excretion(
        &self,
        inputs: &PoolInputs<'_>,
        step: &CohortStep,
        state: &CohortState,
    ) -> Vec<Scalar> {
        (0..inputs.n_zones())
            .map(|i| {
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    state.population[i] * step.excretion_per_ind[i] / vol_l
                } else {
                    0.0
                }
            })
            .collect()
    }

    /// 浮游动物有机物释放碳通量 [mgC/L/步]
    ///
    /// (1−EFF)·牧食·PHY + 死亡·ZOO
    fn zoo_organic_release_c(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        let zp = inputs.zoo_params;
        (0..inputs.n_zones())
            .map(|i| {
                (1.0 - zp.eff) * inputs.zoo_step.grazing[i] * inputs.phy[i].max(0.0)
                    + zp.k_dz * inputs.zoo[i].max(0.0)
            })
            .collect()
    }

    /// 大型藻类氮释放在 NH4/ON 间的分配份额（ON 份额）
    fn ma_organic_n_fraction(&self, inputs: &PoolInputs<'_>, i: usize) -> Scalar {
        let quota = inputs.ma_step.quota_n[i];
        if quota <= 0.0 {
            return 1.0;
        }
        let ratio = (inputs.ma_params.nc / inputs.ma_params.dc) / (quota / 1000.0);
        ratio.min(1.0)
    }

    /// 大型藻类磷释放在 PO4/OP 间的分配份额（OP 份额）
    fn ma_organic_p_fraction(&self, inputs: &PoolInputs<'_>, i: usize) -> Scalar {
        let quota = inputs.ma_step.quota_p[i];
        if quota <= 0.0 {
            return 1.0;
        }
        let ratio = (inputs.ma_params.pc / inputs.ma_params.dc) / (quota / 1000.0);
        ratio.min(1.0)
    }

    // --------------------------------------------------------
    // 铵态氮
    // --------------------------------------------------------

    fn update_ammonium(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        // 浮游植物死亡释放（无机份额）
        let phy_release: Vec<Scalar> = (0..n)
            .map(|i| p.nc_phy * (1.0 - p.fon_phy) * inputs.phyto.loss[i] * inputs.phy[i].max(0.0))
            .collect();
        mb.source("phy_release", phy_release);

        // 大型藻类排泄+死亡释放（无机份额）
        let ma_release: Vec<Scalar> = (0..n)
            .map(|i| {
                let f_on = self.ma_organic_n_fraction(inputs, i);
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    (inputs.ma_step.excretion_n[i] + inputs.ma_step.death_n[i])
                        * (1.0 - f_on)
                        * inputs.ma_area(i)
                        * 1000.0
                        / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.source("ma_release", ma_release);

        // 养殖种群排泄
        mb.source(
            "sh_excretion",
            self.cohort_excretion(inputs, inputs.shellfish, inputs.shellfish_state),
        );
        mb.source(
            "f_excretion",
            self.cohort_excretion(inputs, inputs.fish, inputs.fish_state),
        );

        // 矿化 + 饲料 + 外部输入
        mb.source("mineralization", self.mineralization_n(inputs));
        mb.source("feed", self.feed_leach(inputs, p.feed_nh4));
        mb.source("external_input", inputs.external_rates("NH4"));

        // 吸收（铵偏好份额）与硝化
        let phy_uptake: Vec<Scalar> = (0..n)
            .map(|i| {
                let pn = ammonium_preference(inputs.nh4[i], inputs.no3[i], p.kn_phy);
                inputs.phyto.growth[i] * inputs.phy[i].max(0.0) * pn * p.nc_phy
            })
            .collect();
        mb.sink("phy_uptake", phy_uptake);

        let ma_uptake: Vec<Scalar> = (0..n)
            .map(|i| {
                let pn = ammonium_preference(inputs.nh4[i], inputs.no3[i], p.kn_ma);
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    inputs.ma_step.uptake_n[i] * pn * inputs.ma_area(i) * 1000.0 / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.sink("ma_uptake", ma_uptake);
        mb.sink("nitrification", self.nitrification(inputs));

        PoolUpdate {
            kind: VariableKind::Ammonium,
            balance: mb,
            floor: Some(0.0),
        }
    }

    // --------------------------------------------------------
    // 硝态氮
    // --------------------------------------------------------

    fn update_nitrate(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        mb.source("nitrification", self.nitrification(inputs));
        mb.source("feed", self.feed_leach(inputs, p.feed_no3));
        mb.source("external_input", inputs.external_rates("NO3"));

        let phy_uptake: Vec<Scalar> = (0..n)
            .map(|i| {
                let pn = ammonium_preference(inputs.nh4[i], inputs.no3[i], p.kn_phy);
                inputs.phyto.growth[i] * inputs.phy[i].max(0.0) * (1.0 - pn) * p.nc_phy
            })
            .collect();
        mb.sink("phy_uptake", phy_uptake);

        let ma_uptake: Vec<Scalar> = (0..n)
            .map(|i| {
                let pn = ammonium_preference(inputs.nh4[i], inputs.no3[i], p.kn_ma);
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    inputs.ma_step.uptake_n[i] * (1.0 - pn) * inputs.ma_area(i) * 1000.0 / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.sink("ma_uptake", ma_uptake);
        mb.sink("denitrification", self.denitrification(inputs));

        PoolUpdate {
            kind: VariableKind::Nitrate,
            balance: mb,
            floor: Some(1e-12),
        }
    }

    // --------------------------------------------------------
    // 有机氮
    // --------------------------------------------------------

    fn update_organic_n(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        let phy_release: Vec<Scalar> = (0..n)
            .map(|i| p.nc_phy * p.fon_phy * inputs.phyto.loss[i] * inputs.phy[i].max(0.0))
            .collect();
        mb.source("phy_release", phy_release);

        let zoo_c = self.zoo_organic_release_c(inputs);
        mb.source(
            "zoo_release",
            zoo_c.iter().map(|c| c * p.nc_phy).collect(),
        );

        let ma_release: Vec<Scalar> = (0..n)
            .map(|i| {
                let f_on = self.ma_organic_n_fraction(inputs, i);
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    (inputs.ma_step.excretion_n[i] + inputs.ma_step.death_n[i])
                        * f_on
                        * (1.0 - p.mu_on_sink)
                        * inputs.ma_area(i)
                        * 1000.0
                        / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.source("ma_release", ma_release);

        let sh_release = self
            .cohort_organic_release(
                inputs,
                inputs.shellfish,
                inputs.shellfish_params,
                inputs.shellfish_params.nc,
            )
            .iter()
            .map(|r| r * (1.0 - p.mu_on_sink))
            .collect();
        mb.source("sh_release", sh_release);

        let f_release = self
            .cohort_organic_release(inputs, inputs.fish, inputs.fish_params, inputs.fish_params.nc)
            .iter()
            .map(|r| r * (1.0 - p.mu_on_sink))
            .collect();
        mb.source("f_release", f_release);

        mb.source("feed", self.feed_leach(inputs, p.feed_on));
        mb.source("external_input", inputs.external_rates("ON"));
        mb.sink("mineralization", self.mineralization_n(inputs));

        PoolUpdate {
            kind: VariableKind::OrganicN,
            balance: mb,
            floor: Some(0.0),
        }
    }

    // --------------------------------------------------------
    // 磷酸盐
    // --------------------------------------------------------

    fn update_phosphate(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        mb.source("mineralization", self.mineralization_p(inputs));

        let phy_release: Vec<Scalar> = (0..n)
            .map(|i| p.pc_phy * (1.0 - p.fop_phy) * inputs.phyto.loss[i] * inputs.phy[i].max(0.0))
            .collect();
        mb.source("phy_release", phy_release);

        let ma_release: Vec<Scalar> = (0..n)
            .map(|i| {
                let f_op = self.ma_organic_p_fraction(inputs, i);
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    (inputs.ma_step.excretion_p[i] + inputs.ma_step.death_p[i])
                        * (1.0 - f_op)
                        * inputs.ma_area(i)
                        * 1000.0
                        / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.source("ma_release", ma_release);

        mb.source("feed", self.feed_leach(inputs, p.feed_po4));
        mb.source("external_input", inputs.external_rates("PO4"));

        let phy_uptake: Vec<Scalar> = (0..n)
            .map(|i| inputs.phyto.growth[i] * inputs.phy[i].max(0.0) * p.pc_phy)
            .collect();
        mb.sink("phy_uptake", phy_uptake);

        let ma_uptake: Vec<Scalar> = (0..n)
            .map(|i| {
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    inputs.ma_step.uptake_p[i] * inputs.ma_area(i) * 1000.0 / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.sink("ma_uptake", ma_uptake);

        mb.sink("particulate_ads_des", self.adsorption_desorption(inputs));

        PoolUpdate {
            kind: VariableKind::Phosphate,
            balance: mb,
            floor: None,
        }
    }

    // --------------------------------------------------------
    // 有机磷
    // --------------------------------------------------------

    fn update_organic_p(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        let phy_release: Vec<Scalar> = (0..n)
            .map(|i| p.pc_phy * p.fop_phy * inputs.phyto.loss[i] * inputs.phy[i].max(0.0))
            .collect();
        mb.source("phy_release", phy_release);

        let zoo_c = self.zoo_organic_release_c(inputs);
        mb.source(
            "zoo_release",
            zoo_c
                .iter()
                .map(|c| c * p.pc_phy * (1.0 - p.f_fec))
                .collect(),
        );

        let ma_release: Vec<Scalar> = (0..n)
            .map(|i| {
                let f_op = self.ma_organic_p_fraction(inputs, i);
                let vol_l = inputs.volume_l(i);
                if vol_l > 0.0 {
                    (inputs.ma_step.death_p[i] * (1.0 - p.mu_op_sink)
                        + inputs.ma_step.excretion_p[i])
                        * f_op
                        * inputs.ma_area(i)
                        * 1000.0
                        / vol_l
                } else {
                    0.0
                }
            })
            .collect();
        mb.source("ma_release", ma_release);

        let sh_release = self
            .cohort_organic_release(
                inputs,
                inputs.shellfish,
                inputs.shellfish_params,
                inputs.shellfish_params.pc,
            )
            .iter()
            .map(|r| r * (1.0 - p.f_pp))
            .collect();
        mb.source("sh_release", sh_release);

        let f_release = self
            .cohort_organic_release(inputs, inputs.fish, inputs.fish_params, inputs.fish_params.pc)
            .iter()
            .map(|r| r * (1.0 - p.f_pp))
            .collect();
        mb.source("f_release", f_release);

        mb.source("feed", self.feed_leach(inputs, p.feed_op));
        mb.source("external_input", inputs.external_rates("OP"));
        mb.sink("mineralization", self.mineralization_p(inputs));

        PoolUpdate {
            kind: VariableKind::OrganicP,
            balance: mb,
            floor: None,
        }
    }

    // --------------------------------------------------------
    // 颗粒态磷
    // --------------------------------------------------------

    fn update_particulate_p(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        let zoo_c = self.zoo_organic_release_c(inputs);
        mb.source(
            "zoo_release",
            zoo_c.iter().map(|c| c * p.pc_phy * p.f_fec).collect(),
        );

        let sh_release = self
            .cohort_organic_release(
                inputs,
                inputs.shellfish,
                inputs.shellfish_params,
                inputs.shellfish_params.pc,
            )
            .iter()
            .map(|r| r * p.f_pp)
            .collect();
        mb.source("sh_release", sh_release);

        let f_release = self
            .cohort_organic_release(inputs, inputs.fish, inputs.fish_params, inputs.fish_params.pc)
            .iter()
            .map(|r| r * p.f_pp)
            .collect();
        mb.source("f_release", f_release);

        mb.source("ads_des", self.adsorption_desorption(inputs));

        // 沉降净再悬浮
        let set_resus: Vec<Scalar> = (0..n)
            .map(|i| {
                let pp = inputs.pp[i].max(0.0);
                p.v_set * pp / inputs.depth[i].max(1e-6) - p.k_resus * pp
            })
            .collect();
        mb.sink("set_resus", set_resus);

        PoolUpdate {
            kind: VariableKind::ParticulateP,
            balance: mb,
            floor: None,
        }
    }

    // --------------------------------------------------------
    // CBOD
    // --------------------------------------------------------

    /// CBOD 氧化速率 [mgO2/L/步]
    fn cbod_oxidation(&self, inputs: &PoolInputs<'_>) -> Vec<Scalar> {
        let p = &self.params;
        (0..inputs.n_zones())
            .map(|i| {
                p.kdc
                    * self.theta20(inputs.temperature[i])
                    * inputs.cbod[i].max(0.0)
                    * (inputs.oxygen[i].max(0.0) / (inputs.oxygen[i].max(0.0) + p.k_bod))
            })
            .collect()
    }

    fn update_cbod(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        let phy_release: Vec<Scalar> = (0..n)
            .map(|i| p.oc * inputs.phyto.loss[i] * inputs.phy[i].max(0.0))
            .collect();
        mb.source("phy_release", phy_release);

        let zoo_c = self.zoo_organic_release_c(inputs);
        mb.source("zoo_release", zoo_c.iter().map(|c| c * p.oc).collect());

        // 大型藻类死亡/呼吸：干重经 DC 换算为碳
        let ma_release: Vec<Scalar> = (0..n)
            .map(|i| {
                let vol = inputs.volumes[i];
                if vol > 0.0 {
                    inputs.ma_step.loss[i] * inputs.ma[i].max(0.0) * inputs.ma_area(i) * p.oc
                        / (inputs.ma_params.dc * vol)
                } else {
                    0.0
                }
            })
            .collect();
        mb.source("ma_release", ma_release);

        let sh_release = self.cohort_organic_release(
            inputs,
            inputs.shellfish,
            inputs.shellfish_params,
            p.oc,
        );
        mb.source("sh_release", sh_release);

        let f_release =
            self.cohort_organic_release(inputs, inputs.fish, inputs.fish_params, p.oc);
        mb.source("f_release", f_release);

        mb.source("feed", self.feed_leach(inputs, p.feed_cbod));
        mb.source("external_input", inputs.external_rates("CBOD"));

        mb.sink("oxidation", self.cbod_oxidation(inputs));

        // 反硝化关联去除: (5/4)·(32/14)·DenN
        let den_removal: Vec<Scalar> = self
            .denitrification(inputs)
            .iter()
            .map(|d| 1.25 * (32.0 / 14.0) * d)
            .collect();
        mb.sink("denitrification", den_removal);

        PoolUpdate {
            kind: VariableKind::Cbod,
            balance: mb,
            floor: None,
        }
    }

    // --------------------------------------------------------
    // 溶解氧
    // --------------------------------------------------------

    fn update_oxygen(&self, inputs: &PoolInputs<'_>) -> PoolUpdate {
        let n = inputs.n_zones();
        let p = &self.params;
        let mut mb = MassBalance::new(n);

        // 大气交换
        let atmosphere: Vec<Scalar> = (0..n)
            .map(|i| {
                let o_sat = saturation_oxygen(inputs.temperature[i], inputs.salinity[i]);
                let ka = reaeration_coefficient(
                    inputs.current_speed[i],
                    inputs.depth[i],
                    inputs.temperature[i],
                );
                ka * (o_sat - inputs.oxygen[i].max(0.0))
            })
            .collect();
        mb.source("atmosphere", atmosphere);

        // 初级生产（按氮源拆分化学计量）
        let phy_production: Vec<Scalar> = (0..n)
            .map(|i| {
                let pn = ammonium_preference(inputs.nh4[i], inputs.no3[i], p.kn_phy);
                let growth_flux = inputs.phyto.growth[i] * inputs.phy[i].max(0.0);
                let nh4_part = pn * growth_flux * p.oc;
                let no3_part =
                    (1.0 - pn) * growth_flux * 32.0 * (1.0 / 12.0 + 1.5 * p.nc_phy / 14.0);
                nh4_part + no3_part
            })
            .collect();
        mb.source("phy_production", phy_production);

        let ma_production: Vec<Scalar> = (0..n)
            .map(|i| {
                let vol = inputs.volumes[i];
                if vol <= 0.0 {
                    return 0.0;
                }
                let pn = ammonium_preference(inputs.nh4[i], inputs.no3[i], p.kn_ma);
                let growth_flux = inputs.ma_step.growth[i] * inputs.ma[i].max(0.0);
                let base = growth_flux * inputs.ma_area(i) / (inputs.ma_params.dc * vol);
                let nh4_part = base * p.roc_ma * pn;
                let no3_part =
                    base * inputs.ma_params.nc * (1.0 - pn) * 1.5 * (32.0 / 14.0);
                nh4_part + no3_part
            })
            .collect();
        mb.source("ma_production", ma_production);

        // 呼吸
        let phy_respiration: Vec<Scalar> = (0..n)
            .map(|i| inputs.phyto.respiration[i] * inputs.phy[i].max(0.0) * p.oc)
            .collect();
        mb.sink("phy_respiration", phy_respiration);

        let ma_respiration: Vec<Scalar> = (0..n)
            .map(|i| {
                let vol = inputs.volumes[i];
                if vol > 0.0 {
                    // 比损失中的呼吸部分 = loss − death
                    let death_rate = if inputs.ma[i] > 0.0 {
                        inputs.ma_step.death_flux[i] / inputs.ma[i]
                    } else {
                        0.0
                    };
                    let respiration = (inputs.ma_step.loss[i] - death_rate).max(0.0);
                    respiration * inputs.ma[i].max(0.0) * inputs.ma_area(i) * p.oc
                        / (inputs.ma_params.dc * vol)
                } else {
                    0.0
                }
            })
            .collect();
        mb.sink("ma_respiration", ma_respiration);

        mb.sink("sh_respiration", inputs.shellfish.respiration_o2.to_vec());
        mb.sink("f_respiration", inputs.fish.respiration_o2.to_vec());

        // 硝化耗氧 64/14
        let nit_demand: Vec<Scalar> = self
            .nitrification(inputs)
            .iter()
            .map(|r| (64.0 / 14.0) * r)
            .collect();
        mb.sink("nitrification", nit_demand);

        mb.sink("cbod_oxidation", self.cbod_oxidation(inputs));

        // 沉积物耗氧
        let sod: Vec<Scalar> = (0..n)
            .map(|i| {
                (p.sod / inputs.depth[i].max(1e-6)) * self.theta20(inputs.temperature[i])
            })
            .collect();
        mb.sink("sediment_demand", sod);

        mb.source("external_input", inputs.external_rates("DO"));

        PoolUpdate {
            kind: VariableKind::DissolvedOxygen,
            balance: mb,
            floor: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bio::cohort::FoodSource;
    use crate::bio::plankton::DeathFormula;
    use crate::process::ThermalTolerance;

    fn zero_cohort_step(n: usize) -> CohortStep {
        CohortStep {
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
        }
    }

    fn zero_cohort_state(n: usize) -> CohortState {
        CohortState {
            population: vec![0.0; n],
            volume: vec![0.6; n],
            reserve: vec![0.0; n],
            repro: vec![0.0; n],
        }
    }

    fn cohort_params(n: usize) -> CohortParams {
        CohortParams {
            mortality: 0.001 / 24.0,
            kappa: 0.7,
            e_g: 2500.0,
            p_am: 440.0 / 24.0,
            e_m: 2600.0,
            v_p: 0.36,
            p_m: 12.2 / 24.0,
            half_saturation: 0.295,
            clearance: 0.045 / 24.0,
            thermal: ThermalTolerance {
                t_ref: 288.0,
                t_a: 5530.0,
                t_al: 21000.0,
                t_ah: 42000.0,
                t_l: 283.0,
                t_h: 296.0,
            },
            food: FoodSource::Plankton,
            nc: 0.183,
            pc: 0.0025,
            nc_food: 0.065,
            mu_v: 2700.0,
            kappa_r: 0.8,
            mu_cj: 48.8,
            seed_volume: 0.6,
            restock: vec![0.0; n],
            harvest_mass: 500.0,
            fcr: 3.5,
        }
    }

    fn ma_params() -> MacroalgaeParams {
        MacroalgaeParams {
            kc: 0.7 / 24.0,
            theta: 1.068,
            t_opt: 20.0,
            kappa1_s: 0.05,
            kappa2_s: 0.05,
            s_opt: 35.0,
            i_s: 1.2e6,
            k_e: 0.09,
            kd: 0.01 / 24.0,
            kr: 0.21 / 24.0,
            ma_max: 1500.0,
            z_max: 5.0,
            f_up_n: 720.0 / 24.0,
            f_up_p: 50.0 / 24.0,
            q0_n: 7.2,
            q0_p: 1.0,
            kn: 0.025,
            kq_n: 9.0,
            kp: 0.1,
            kq_p: 1.3,
            k_excretion: 0.09,
            dc: 3.0,
            nc: 0.1,
            pc: 0.01,
            area_fraction: 0.01,
        }
    }

    fn zero_ma_step(n: usize) -> MacroalgaeStep {
        MacroalgaeStep {
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
            quota_n: vec![50.0; n],
            quota_p: vec![5.0; n],
            biomass: vec![0.0; n],
        }
    }

    fn zero_phyto_step(n: usize) -> PhytoStep {
        PhytoStep {
            nutrient_lim: vec![0.0; n],
            temperature_lim: vec![0.0; n],
            light_lim: vec![0.0; n],
            growth: vec![0.0; n],
            respiration: vec![0.0; n],
            death: vec![0.0; n],
            death_formula: vec![DeathFormula::Simple; n],
            loss: vec![0.0; n],
            biomass: vec![0.0; n],
        }
    }

    fn zero_zoo_step(n: usize) -> ZooStep {
        ZooStep {
            grazing: vec![0.0; n],
            growth: vec![0.0; n],
            loss: vec![0.0; n],
            biomass: vec![0.0; n],
        }
    }

    fn nutrient_params() -> NutrientParams {
        NutrientParams {
            theta: 1.068,
            kc_nit: 0.05 / 24.0,
            k_nit: 2.0,
            knc_min: 0.075 / 24.0,
            kc_den: 0.09 / 24.0,
            k_den: 0.1,
            mu_on_sink: 0.041,
            nc_phy: 0.065,
            fon_phy: 0.5,
            kn_phy: 0.05,
            kn_ma: 0.025,
            kpc_min: 0.02 / 24.0,
            mu_op_sink: 0.05,
            pc_phy: 0.025,
            fop_phy: 0.5,
            f_fec: 0.4,
            f_pp: 0.6,
            k_ads: 0.002 / 24.0,
            k_des: 0.15 / 24.0,
            v_set: 0.05 / 24.0,
            k_resus: 0.3 / 24.0,
            q_max: 400.0,
            oc: 1.42,
            kdc: 0.18 / 24.0,
            k_bod: 0.5,
            sod: 2.0 / 24.0,
            roc_ma: 2.69,
            feed_nh4: 1.52,
            feed_no3: 4.17,
            feed_on: 45.8,
            feed_po4: 1.5,
            feed_op: 1.49,
            feed_cbod: 2.2,
        }
    }

    struct Fixture {
        nh4: Vec<Scalar>,
        no3: Vec<Scalar>,
        on: Vec<Scalar>,
        po4: Vec<Scalar>,
        op: Vec<Scalar>,
        pp: Vec<Scalar>,
        cbod: Vec<Scalar>,
        oxygen: Vec<Scalar>,
        spm: Vec<Scalar>,
        phy: Vec<Scalar>,
        zoo: Vec<Scalar>,
        ma: Vec<Scalar>,
        temperature: Vec<Scalar>,
        salinity: Vec<Scalar>,
        current_speed: Vec<Scalar>,
        depth: Vec<Scalar>,
        volumes: Vec<Scalar>,
        areas: Vec<Scalar>,
        phyto: PhytoStep,
        zoo_step: ZooStep,
        zoo_params: ZooParams,
        ma_step: MacroalgaeStep,
        ma_params: MacroalgaeParams,
        shell_step: CohortStep,
        shell_state: CohortState,
        shell_params: CohortParams,
        fish_step: CohortStep,
        fish_state: CohortState,
        fish_params: CohortParams,
        external: BTreeMap<&'static str, Vec<Scalar>>,
    }

    impl Fixture {
        fn new(n: usize) -> Self {
            Self {
                nh4: vec![0.02; n],
                no3: vec![0.4; n],
                on: vec![0.1; n],
                po4: vec![0.08; n],
                op: vec![0.02; n],
                pp: vec![0.05; n],
                cbod: vec![1.0; n],
                oxygen: vec![6.3; n],
                spm: vec![0.2; n],
                phy: vec![0.05; n],
                zoo: vec![0.05; n],
                ma: vec![20.0; n],
                temperature: vec![20.0; n],
                salinity: vec![34.0; n],
                current_speed: vec![0.04; n],
                depth: vec![5.0; n],
                volumes: vec![1e7; n],
                areas: vec![2e6; n],
                phyto: zero_phyto_step(n),
                zoo_step: zero_zoo_step(n),
                zoo_params: ZooParams {
                    eff: 0.5,
                    k_grz: 1.5 / 24.0,
                    k_pz: 0.5,
                    k_dz: 0.01 / 24.0,
                },
                ma_step: zero_ma_step(n),
                ma_params: ma_params(),
                shell_step: zero_cohort_step(n),
                shell_state: zero_cohort_state(n),
                shell_params: cohort_params(n),
                fish_step: zero_cohort_step(n),
                fish_state: zero_cohort_state(n),
                fish_params: cohort_params(n),
                external: BTreeMap::new(),
            }
        }

        fn inputs(&self) -> PoolInputs<'_> {
            PoolInputs {
                nh4: &self.nh4,
                no3: &self.no3,
                on: &self.on,
                po4: &self.po4,
                op: &self.op,
                pp: &self.pp,
                cbod: &self.cbod,
                oxygen: &self.oxygen,
                spm: &self.spm,
                phy: &self.phy,
                zoo: &self.zoo,
                ma: &self.ma,
                temperature: &self.temperature,
                salinity: &self.salinity,
                current_speed: &self.current_speed,
                depth: &self.depth,
                volumes: &self.volumes,
                areas: &self.areas,
                phyto: &self.phyto,
                zoo_step: &self.zoo_step,
                zoo_params: &self.zoo_params,
                ma_step: &self.ma_step,
                ma_params: &self.ma_params,
                shellfish: &self.shell_step,
                shellfish_state: &self.shell_state,
                shellfish_params: &self.shell_params,
                fish: &self.fish_step,
                fish_state: &self.fish_state,
                fish_params: &self.fish_params,
                external: &self.external,
            }
        }
    }

    fn find_update(updates: &[PoolUpdate], kind: VariableKind) -> &PoolUpdate {
        updates.iter().find(|u| u.kind == kind).unwrap()
    }

    #[test]
    fn test_all_pools_present() {
        let fixture = Fixture::new(1);
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();
        assert_eq!(updates.len(), 8);
    }

    #[test]
    fn test_nitrification_couples_pools() {
        // 硝化：NH4 汇 = NO3 源，DO 消耗 64/14 倍
        let fixture = Fixture::new(1);
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();

        let nh4 = find_update(&updates, VariableKind::Ammonium);
        let no3 = find_update(&updates, VariableKind::Nitrate);
        let oxy = find_update(&updates, VariableKind::DissolvedOxygen);

        let nh4_nit = nh4
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "nitrification")
            .unwrap()
            .rates[0];
        let no3_nit = no3
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "nitrification")
            .unwrap()
            .rates[0];
        let do_nit = oxy
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "nitrification")
            .unwrap()
            .rates[0];

        assert!(no3_nit > 0.0);
        assert!((nh4_nit + no3_nit).abs() < 1e-15);
        assert!((do_nit + (64.0 / 14.0) * no3_nit).abs() < 1e-15);
    }

    #[test]
    fn test_zero_population_zero_cohort_terms() {
        // 零种群：排泄/释放/呼吸贡献全为零
        let fixture = Fixture::new(1);
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();

        let nh4 = find_update(&updates, VariableKind::Ammonium);
        for label in ["sh_excretion", "f_excretion"] {
            let c = nh4
                .balance
                .contributions()
                .iter()
                .find(|c| c.label == label)
                .unwrap();
            assert_eq!(c.rates[0], 0.0, "{label}");
        }

        let on = find_update(&updates, VariableKind::OrganicN);
        for label in ["sh_release", "f_release"] {
            let c = on
                .balance
                .contributions()
                .iter()
                .find(|c| c.label == label)
                .unwrap();
            assert_eq!(c.rates[0], 0.0, "{label}");
        }
    }

    #[test]
    fn test_mineralization_moves_on_to_nh4() {
        let fixture = Fixture::new(1);
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();

        let nh4 = find_update(&updates, VariableKind::Ammonium);
        let on = find_update(&updates, VariableKind::OrganicN);
        let nh4_min = nh4
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "mineralization")
            .unwrap()
            .rates[0];
        let on_min = on
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "mineralization")
            .unwrap()
            .rates[0];
        assert!(nh4_min > 0.0);
        assert!((nh4_min + on_min).abs() < 1e-15);
    }

    #[test]
    fn test_external_input_contribution() {
        let mut fixture = Fixture::new(1);
        fixture.external.insert("NH4", vec![0.5]);
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();

        let nh4 = find_update(&updates, VariableKind::Ammonium);
        let ext = nh4
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "external_input")
            .unwrap()
            .rates[0];
        assert!((ext - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_nh4_floor_applied() {
        // 巨大吸收下 NH4 不为负
        let mut fixture = Fixture::new(1);
        fixture.phyto.growth = vec![100.0];
        fixture.phy = vec![10.0];
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();

        let nh4 = find_update(&updates, VariableKind::Ammonium);
        let next = nh4.balance.apply(&fixture.nh4, nh4.floor);
        assert!(next[0] >= 0.0);
    }

    #[test]
    fn test_oxygen_atmosphere_sign() {
        // 低于饱和时大气交换为正（复氧）
        let mut fixture = Fixture::new(1);
        fixture.oxygen = vec![2.0];
        let model = NutrientModel::new(nutrient_params());
        let updates = model.update_all(&fixture.inputs()).unwrap();
        let oxy = find_update(&updates, VariableKind::DissolvedOxygen);
        let atm = oxy
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "atmosphere")
            .unwrap()
            .rates[0];
        assert!(atm > 0.0);

        // 过饱和时为负（脱气）
        let mut fixture2 = Fixture::new(1);
        fixture2.oxygen = vec![20.0];
        let updates2 = model.update_all(&fixture2.inputs()).unwrap();
        let oxy2 = find_update(&updates2, VariableKind::DissolvedOxygen);
        let atm2 = oxy2
            .balance
            .contributions()
            .iter()
            .find(|c| c.label == "atmosphere")
            .unwrap()
            .rates[0];
        assert!(atm2 < 0.0);
    }

    #[test]
    fn test_settling_depends_on_depth() {
        // 浅水沉降更快
        let model = NutrientModel::new(nutrient_params());
        let mut shallow = Fixture::new(1);
        shallow.depth = vec![1.0];
        let mut deep = Fixture::new(1);
        deep.depth = vec![10.0];

        let get_set = |fixture: &Fixture| {
            let updates = model.update_all(&fixture.inputs()).unwrap();
            let pp = find_update(&updates, VariableKind::ParticulateP);
            -pp.balance
                .contributions()
                .iter()
                .find(|c| c.label == "set_resus")
                .unwrap()
                .rates[0]
        };
        assert!(get_set(&shallow) > get_set(&deep));
    }
}
