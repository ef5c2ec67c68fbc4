// crates/mb_io/src/lib.rs

//! MariBio IO 层
//!
//! 提供数据输入输出功能：
//!
//! - [`import`]: CSV 表格导入（通量表、负荷表、驱动表、观测记录）
//!   与数据集装配
//! - [`output`]: 列式结果输出（每变量一个 时间 × 分区 CSV 矩阵，
//!   过程贡献台账，外海收支）
//!
//! 引擎本身不解释输出内容，只负责写出供下游分析使用。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod import;
pub mod output;

pub use import::csv_table::{CsvOptions, NamedMatrix};
pub use import::dataset::{load_dataset, load_observations};
pub use output::SeriesWriter;
