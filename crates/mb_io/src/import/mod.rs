// crates/mb_io/src/import/mod.rs

//! 数据导入
//!
//! - [`csv_table`]: 手写 CSV 解析（灵活列配置、注释/空行跳过、
//!   缺列即致命错误）
//! - [`dataset`]: 按运行配置装配完整的模拟输入数据集

pub mod csv_table;
pub mod dataset;
