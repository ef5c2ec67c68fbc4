// crates/mb_physics/src/process/mod.rs

//! 过程函数库
//!
//! 纯函数形式的限制函数与速率项，签名统一为
//! `(状态, 驱动, 参数) → 速率/因子`。限制函数的值域为 [0,1]，
//! 表达环境因子偏离生长理想条件的程度。
//!
//! 每个限制函数每步每组件只计算一次，结果放入当步上下文供所有
//! 依赖过程复用（见 [`crate::engine::context`]）。

use mb_foundation::Scalar;
use serde::{Deserialize, Serialize};

// ============================================================
// 温度限制
// ============================================================

/// 指数底形式温度限制 θ^(T − T_ref)
///
/// θ 略大于 1 时表现为经典的 Q10 型温度修正。
#[inline]
pub fn temperature_exponential(theta: Scalar, t: Scalar, t_ref: Scalar) -> Scalar {
    theta.powf(t - t_ref)
}

/// 非对称高斯温度限制
///
/// 低于最适温度用 κ₁，高于最适温度用 κ₂。
#[inline]
pub fn temperature_gaussian(
    t: Scalar,
    t_opt: Scalar,
    kappa_below: Scalar,
    kappa_above: Scalar,
) -> Scalar {
    let d = t - t_opt;
    if t <= t_opt {
        (-kappa_below * d * d).exp()
    } else {
        (-kappa_above * d * d).exp()
    }
}

/// 逻辑斯蒂温度限制（大型藻类生长用）
#[inline]
pub fn temperature_logistic(theta: Scalar, t: Scalar, t_opt: Scalar) -> Scalar {
    1.0 / (1.0 + (-theta * (t - t_opt) / 1.5).exp())
}

// ============================================================
// 光照限制
// ============================================================

/// 深度衰减的光照饱和限制（Steele 型）
///
/// 评估深度取 min(H/2, 5 m)；`f = (I/I_s)·e^(−K_E·z)`，结果为 `f·e^(1−f)`。
#[inline]
pub fn light_limitation(irradiance: Scalar, i_s: Scalar, k_e: Scalar, depth: Scalar) -> Scalar {
    let z = (depth / 2.0).min(5.0);
    let f = (irradiance / i_s) * (-k_e * z).exp();
    f * (1.0 - f).exp()
}

/// 大型藻类冠层积分光照限制
///
/// 对冠层深度 h 上的 Steele 响应积分：
/// `(e/(k·h)) · (exp(−(I/I_s)·e^(−k·h)) − exp(−I/I_s))`
#[inline]
pub fn canopy_light_limitation(
    irradiance: Scalar,
    i_s: Scalar,
    k_canopy: Scalar,
    canopy_depth: Scalar,
) -> Scalar {
    let kh = k_canopy * canopy_depth;
    if kh <= 0.0 {
        return 1.0;
    }
    let i_rel = irradiance / i_s;
    (std::f64::consts::E / kh) * ((-i_rel * (-kh).exp()).exp() - (-i_rel).exp())
}

// ============================================================
// 营养盐限制
// ============================================================

/// Michaelis-Menten 饱和项 s/(s+k)，底物截断非负
#[inline]
pub fn michaelis(substrate: Scalar, half_saturation: Scalar) -> Scalar {
    let s = substrate.max(0.0);
    if s + half_saturation <= 0.0 {
        0.0
    } else {
        s / (s + half_saturation)
    }
}

/// 氮磷共同限制
///
/// 氮限制项用 NH4+NO3 合并底物，磷限制项的半饱和常数已按溶解态
/// 比例折算；总体限制取二者较小者并截断到 [0,1]。
#[inline]
pub fn nutrient_colimitation(
    nh4: Scalar,
    no3: Scalar,
    po4: Scalar,
    kn: Scalar,
    kp_effective: Scalar,
) -> Scalar {
    let din = (nh4 + no3).max(0.0);
    let x_n = michaelis(din, kn).min(1.0);
    let x_p = michaelis(po4, kp_effective).min(1.0);
    x_n.min(x_p).clamp(0.0, 1.0)
}

/// 铵态氮偏好因子
///
/// 初级生产者在 NH4 与 NO3 之间的吸收分配；返回铵的份额 ∈ [0,1]。
#[inline]
pub fn ammonium_preference(nh4: Scalar, no3: Scalar, kn: Scalar) -> Scalar {
    let nh4 = nh4.max(0.0);
    let no3 = no3.max(0.0);
    let denom = (nh4 + kn) * (no3 + kn);
    if denom <= 0.0 {
        return 0.0;
    }
    let pn = (nh4 * no3) / denom + (nh4 * kn) / denom;
    pn.clamp(0.0, 1.0)
}

/// 空间限制（承载量惩罚） 1 − (B/B_max)²
#[inline]
pub fn space_limitation(biomass: Scalar, capacity: Scalar) -> Scalar {
    if capacity <= 0.0 {
        return 0.0;
    }
    let ratio = biomass / capacity;
    (1.0 - ratio * ratio).clamp(0.0, 1.0)
}

/// 非对称高斯盐度限制
#[inline]
pub fn salinity_limitation(
    s: Scalar,
    s_opt: Scalar,
    kappa_below: Scalar,
    kappa_above: Scalar,
) -> Scalar {
    temperature_gaussian(s, s_opt, kappa_below, kappa_above)
}

/// 细胞配额限制 min(1 − q0N/qN, 1 − q0P/qP)
///
/// 配额不高于下限时限制为 0。
#[inline]
pub fn quota_limitation(q_n: Scalar, q0_n: Scalar, q_p: Scalar, q0_p: Scalar) -> Scalar {
    if q_n <= q0_n || q_p <= q0_p {
        return 0.0;
    }
    let x_n = 1.0 - q0_n / q_n;
    let x_p = 1.0 - q0_p / q_p;
    x_n.min(x_p).clamp(0.0, 1.0)
}

// ============================================================
// 代谢温度效应
// ============================================================

/// 五参数 Arrhenius 耐受范围
///
/// 描述养殖种群代谢速率对温度的响应：基准 Arrhenius 项叠加
/// 低温/高温边界处的抑制。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThermalTolerance {
    /// 参考温度 [K]
    pub t_ref: Scalar,
    /// Arrhenius 温度 [K]
    pub t_a: Scalar,
    /// 低温边界速降 Arrhenius 温度 [K]
    pub t_al: Scalar,
    /// 高温边界速增 Arrhenius 温度 [K]
    pub t_ah: Scalar,
    /// 耐受范围下界 [K]
    pub t_l: Scalar,
    /// 耐受范围上界 [K]
    pub t_h: Scalar,
}

/// 代谢温度因子
///
/// `exp(T_A/T_ref − T_A/T) / (1 + exp(T_AL/T − T_AL/T_L) + exp(T_AH/T_H − T_AH/T))`
#[inline]
pub fn arrhenius_tolerance(t_k: Scalar, p: &ThermalTolerance) -> Scalar {
    if t_k <= 0.0 {
        return 0.0;
    }
    let base = (p.t_a / p.t_ref - p.t_a / t_k).exp();
    let low = (p.t_al / t_k - p.t_al / p.t_l).exp();
    let high = (p.t_ah / p.t_h - p.t_ah / t_k).exp();
    base / (1.0 + low + high)
}

// ============================================================
// 溶解氧
// ============================================================

/// 饱和溶解氧浓度 [mgO2/L]（APHA 经验式）
#[inline]
pub fn saturation_oxygen(t_c: Scalar, salinity: Scalar) -> Scalar {
    14.621 * (-0.0134 * t_c).exp() / (1.0 + 0.028 * salinity)
}

/// 复氧系数 [1/步]（O'Connor-Dobbins，20°C 基准 + 温度修正）
///
/// `KA_20 = 3.93·√v / min(5,H)^1.5 / 24`，`KA = KA_20 · 1.024^(T−20)`
#[inline]
pub fn reaeration_coefficient(velocity: Scalar, depth: Scalar, t_c: Scalar) -> Scalar {
    let h = depth.min(5.0).max(1e-6);
    let ka_20 = 3.93 * velocity.max(0.0).sqrt() / h.powf(1.5) / 24.0;
    ka_20 * 1.024_f64.powf(t_c - 20.0)
}
