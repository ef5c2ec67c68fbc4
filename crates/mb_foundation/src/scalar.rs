// crates/mb_foundation/src/scalar.rs

//! 统一标量类型与数值常量
//!
//! 箱式模型全程使用 f64；别名保留以便与其他内部项目共享代码风格。

/// 计算用标量类型
pub type Scalar = f64;

/// 浮点数相等性比较的默认容差
pub const DEFAULT_EPSILON: Scalar = 1e-12;

/// 安全除法的最小分母阈值
pub const SAFE_DIV_EPSILON: Scalar = 1e-12;

/// 浓度下限（防止对数/比值运算退化）
pub const MIN_CONCENTRATION: Scalar = 1e-12;

/// 最小水深 [m]
pub const MIN_DEPTH: Scalar = 0.1;

/// 摄氏-开尔文偏移
pub const KELVIN_OFFSET: Scalar = 273.15;

/// 立方米转升
pub const LITERS_PER_M3: Scalar = 1000.0;
