// crates/mb_physics/src/nutrients/mod.rs

//! 营养盐收支
//!
//! 每个营养盐池遵循同一契约：新浓度 = 旧浓度 + 各命名过程贡献的
//! 符号和（需要时按当地体积归一）。[`MassBalance`] 是通用的质量平衡
//! 累加器；各池只负责装配自己的过程项（见 [`pools`]）。
//!
//! 命名贡献同时供逐过程累计台账使用。

pub mod pools;

use mb_config::ParameterStore;
use mb_foundation::{MbResult, Scalar};
use serde::{Deserialize, Serialize};

pub use pools::{NutrientModel, PoolInputs, PoolUpdate};

// ============================================================
// 质量平衡累加器
// ============================================================

/// 一条命名过程贡献（逐分区速率，正为源、负为汇）
#[derive(Debug, Clone)]
pub struct Contribution {
    /// 过程名
    pub label: &'static str,
    /// 逐分区速率 [mg/L/步]
    pub rates: Vec<Scalar>,
}

/// 质量平衡累加器
///
/// 收集一个池在一个时间步内的全部命名贡献，`apply` 把符号和叠加到
/// 旧浓度上。
#[derive(Debug, Clone)]
pub struct MassBalance {
    n_zones: usize,
    contributions: Vec<Contribution>,
}

impl MassBalance {
    /// 创建累加器
    pub fn new(n_zones: usize) -> Self {
        Self {
            n_zones,
            contributions: Vec::new(),
        }
    }

    /// 记录一个源项
    pub fn source(&mut self, label: &'static str, rates: Vec<Scalar>) -> &mut Self {
        debug_assert_eq!(rates.len(), self.n_zones);
        self.contributions.push(Contribution { label, rates });
        self
    }

    /// 记录一个汇项（内部取负）
    pub fn sink(&mut self, label: &'static str, rates: Vec<Scalar>) -> &mut Self {
        let negated = rates.into_iter().map(|r| -r).collect();
        self.contributions.push(Contribution {
            label,
            rates: negated,
        });
        self
    }

    /// 全部命名贡献
    pub fn contributions(&self) -> &[Contribution] {
        &self.contributions
    }

    /// 应用到旧浓度，返回新浓度
    ///
    /// `floor` 为池的即时下限（参考行为对部分池保留非负/最小浓度）。
    pub fn apply(&self, current: &[Scalar], floor: Option<Scalar>) -> Vec<Scalar> {
        debug_assert_eq!(current.len(), self.n_zones);
        let mut next = current.to_vec();
        for contribution in &self.contributions {
            for (v, r) in next.iter_mut().zip(&contribution.rates) {
                *v += r;
            }
        }
        if let Some(floor) = floor {
            for v in &mut next {
                *v = v.max(floor);
            }
        }
        next
    }
}

// ============================================================
// 参数
// ============================================================

/// 营养盐过程参数（构造时一次性解析）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientParams {
    /// 温度底数 θ
    pub theta: Scalar,

    // 氮
    /// 硝化速率常数 [1/步]
    pub kc_nit: Scalar,
    /// 硝化氧半饱和常数 [mgO2/L]
    pub k_nit: Scalar,
    /// 有机氮矿化速率常数 [1/步]
    pub knc_min: Scalar,
    /// 反硝化速率常数 [1/步]
    pub kc_den: Scalar,
    /// 反硝化氧半饱和常数 [mgO2/L]
    pub k_den: Scalar,
    /// 有机氮沉降份额
    pub mu_on_sink: Scalar,
    /// 浮游植物氮碳比 [mgN/mgC]
    pub nc_phy: Scalar,
    /// 浮游植物死亡有机氮份额
    pub fon_phy: Scalar,
    /// 浮游植物氮吸收半饱和常数 [mgN/L]
    pub kn_phy: Scalar,
    /// 大型藻类氮吸收半饱和常数 [mgN/L]
    pub kn_ma: Scalar,

    // 磷
    /// 有机磷矿化速率常数 [1/步]
    pub kpc_min: Scalar,
    /// 有机磷沉降份额
    pub mu_op_sink: Scalar,
    /// 浮游植物磷碳比 [mgP/mgC]
    pub pc_phy: Scalar,
    /// 浮游植物死亡有机磷份额
    pub fop_phy: Scalar,
    /// 粪便含磷份额
    pub f_fec: Scalar,
    /// 粪便中颗粒态磷份额
    pub f_pp: Scalar,
    /// 吸附速率常数 [1/步]
    pub k_ads: Scalar,
    /// 解吸速率常数 [1/步]
    pub k_des: Scalar,
    /// 沉降速率常数 [m/步]
    pub v_set: Scalar,
    /// 再悬浮速率常数 [1/步]
    pub k_resus: Scalar,
    /// Langmuir 最大吸附容量 [mgP/kg]
    pub q_max: Scalar,

    // CBOD / 溶解氧
    /// 氧碳比 [mgO2/mgC]
    pub oc: Scalar,
    /// CBOD 氧化速率常数 [1/步]
    pub kdc: Scalar,
    /// CBOD 氧化半饱和常数 [mgO2/L]
    pub k_bod: Scalar,
    /// 沉积物耗氧 [mgO2/L/步·m]
    pub sod: Scalar,
    /// 大型藻类产氧碳比 [mgO2/mgC]
    pub roc_ma: Scalar,

    // 饲料淋溶系数 [mg/g]
    /// 铵
    pub feed_nh4: Scalar,
    /// 硝酸盐
    pub feed_no3: Scalar,
    /// 有机氮
    pub feed_on: Scalar,
    /// 磷酸盐
    pub feed_po4: Scalar,
    /// 有机磷
    pub feed_op: Scalar,
    /// CBOD
    pub feed_cbod: Scalar,
}

impl NutrientParams {
    /// 从参数仓库解析
    pub fn from_store(store: &ParameterStore) -> MbResult<Self> {
        Ok(Self {
            theta: store.scalar("K_T")?,
            kc_nit: store.scalar("KC_nit")?,
            k_nit: store.scalar("K_nit")?,
            knc_min: store.scalar("KNC_min")?,
            kc_den: store.scalar("KC_den")?,
            k_den: store.scalar("K_den")?,
            mu_on_sink: store.scalar("mu_ON_sink")?,
            nc_phy: store.scalar("NC_PHY")?,
            fon_phy: store.scalar("FON_PHY")?,
            kn_phy: store.scalar("KN_PHY")?,
            kn_ma: store.scalar("KN_MA")?,
            kpc_min: store.scalar("KPC_min")?,
            mu_op_sink: store.scalar("mu_OP_sink")?,
            pc_phy: store.scalar("PC_PHY")?,
            fop_phy: store.scalar("FOP_PHY")?,
            f_fec: store.scalar("f_fec")?,
            f_pp: store.scalar("f_PP")?,
            k_ads: store.scalar("K_ads")?,
            k_des: store.scalar("K_des")?,
            v_set: store.scalar("V_set")?,
            k_resus: store.scalar("K_resus")?,
            q_max: store.scalar("Q_max")?,
            oc: store.scalar("OC")?,
            kdc: store.scalar("KDC")?,
            k_bod: store.scalar("K_BOD")?,
            sod: store.scalar("SOD")?,
            roc_ma: store.scalar("ROC_MA")?,
            feed_nh4: store.scalar("FEED_NH3")?,
            feed_no3: store.scalar("FEED_NO3")?,
            feed_on: store.scalar("FEED_ON")?,
            feed_po4: store.scalar("FEED_PO4")?,
            feed_op: store.scalar("FEED_OP")?,
            feed_cbod: store.scalar("FEED_CBOD")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_balance_sums_signed() {
        let mut mb = MassBalance::new(2);
        mb.source("mineralization", vec![0.1, 0.2]);
        mb.sink("uptake", vec![0.05, 0.05]);

        let next = mb.apply(&[1.0, 1.0], None);
        assert!((next[0] - 1.05).abs() < 1e-12);
        assert!((next[1] - 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_mass_balance_floor() {
        let mut mb = MassBalance::new(1);
        mb.sink("uptake", vec![5.0]);
        let next = mb.apply(&[1.0], Some(0.0));
        assert_eq!(next[0], 0.0);
    }

    #[test]
    fn test_contributions_named() {
        let mut mb = MassBalance::new(1);
        mb.source("a", vec![1.0]);
        mb.sink("b", vec![2.0]);
        let labels: Vec<_> = mb.contributions().iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["a", "b"]);
        assert_eq!(mb.contributions()[1].rates[0], -2.0);
    }

    #[test]
    fn test_empty_balance_identity() {
        let mb = MassBalance::new(3);
        let next = mb.apply(&[1.0, 2.0, 3.0], None);
        assert_eq!(next, vec![1.0, 2.0, 3.0]);
    }
}
