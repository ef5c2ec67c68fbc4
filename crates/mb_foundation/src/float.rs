// crates/mb_foundation/src/float.rs

//! 数值安全运算
//!
//! 提供防止 NaN/Inf 污染计算域的基础运算：
//! - 安全除法（零分母返回零而非 NaN）
//! - 范围截断
//! - 分数幂的非负底数保护
//! - 接近实数的微小残差修正
//!
//! # 示例
//!
//! ```
//! use mb_foundation::float::{safe_div, surface_power};
//!
//! assert_eq!(safe_div(1.0, 0.0), 0.0);
//! assert!((surface_power(8.0) - 4.0).abs() < 1e-12);
//! ```

use crate::scalar::{Scalar, SAFE_DIV_EPSILON};

/// 安全除法
///
/// 分母绝对值低于阈值时返回 0，用于零体积、零种群等退化情形。
#[inline]
pub fn safe_div(numerator: Scalar, denominator: Scalar) -> Scalar {
    if denominator.abs() < SAFE_DIV_EPSILON {
        0.0
    } else {
        numerator / denominator
    }
}

/// 截断到闭区间 [min, max]
///
/// 对已在区间内的值是恒等操作。
#[inline]
pub fn clamp_range(value: Scalar, min: Scalar, max: Scalar) -> Scalar {
    value.max(min).min(max)
}

/// 微小残差修正
///
/// 分数幂运算在接近零的负底数上会产生微小的负残差或 NaN；
/// 若值与最近的有效实数的偏差小于容差则修正，否则原样返回。
#[inline]
pub fn real_residue(value: Scalar, tol: Scalar) -> Scalar {
    if value.is_nan() {
        return 0.0;
    }
    if value < 0.0 && value > -tol {
        0.0
    } else {
        value
    }
}

/// 表面积幂 V^(2/3)
///
/// 底数截断到非负，避免分数幂产生 NaN。
#[inline]
pub fn surface_power(volume: Scalar) -> Scalar {
    volume.max(0.0).powf(2.0 / 3.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(1.0, 0.0), 0.0);
        assert_eq!(safe_div(1.0, 1e-15), 0.0);
        assert!((safe_div(6.0, 2.0) - 3.0).abs() < 1e-12);
        assert!((safe_div(-6.0, 2.0) + 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_range() {
        assert_eq!(clamp_range(5.0, 0.0, 10.0), 5.0);
        assert_eq!(clamp_range(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(clamp_range(11.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_clamp_idempotent() {
        // 已在区间内的值截断后不变
        for v in [0.0, 2.5, 10.0] {
            assert_eq!(clamp_range(clamp_range(v, 0.0, 10.0), 0.0, 10.0), v);
        }
    }

    #[test]
    fn test_real_residue() {
        assert_eq!(real_residue(-1e-12, 1e-9), 0.0);
        assert_eq!(real_residue(f64::NAN, 1e-9), 0.0);
        assert!((real_residue(-1.0, 1e-9) + 1.0).abs() < 1e-12);
        assert!((real_residue(2.0, 1e-9) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_surface_power() {
        assert!((surface_power(8.0) - 4.0).abs() < 1e-12);
        assert_eq!(surface_power(0.0), 0.0);
        // 负体积不产生 NaN
        assert_eq!(surface_power(-1.0), 0.0);
    }
}
