// crates/mb_io/src/output.rs

//! 列式结果输出
//!
//! 每个被追踪变量写一个稠密的 时间 × 分区 CSV 矩阵（行 = 时间步，
//! 列 = 分区），供下游绘图/评分离线使用；另写过程贡献台账与外海
//! 收支汇总。引擎不解释这些文件，只负责写出。

use mb_foundation::{MbError, MbResult};
use mb_physics::engine::SeriesRecorder;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// 时序结果写出器
#[derive(Debug, Clone)]
pub struct SeriesWriter {
    dir: PathBuf,
    zone_names: Vec<String>,
}

impl SeriesWriter {
    /// 创建写出器并确保输出目录存在
    pub fn new(dir: &Path, zone_names: Vec<String>) -> MbResult<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            MbError::io_with_source(format!("创建输出目录失败: {}", dir.display()), e)
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            zone_names,
        })
    }

    /// 写出全部变量时序
    ///
    /// `variables` 为空时写出记录器中的全部变量。
    pub fn write_series(
        &self,
        recorder: &SeriesRecorder,
        variables: &[String],
    ) -> MbResult<usize> {
        let names: Vec<String> = if variables.is_empty() {
            recorder.variable_names().map(str::to_string).collect()
        } else {
            variables.to_vec()
        };

        let mut written = 0;
        for name in &names {
            let series = recorder
                .series(name)
                .ok_or_else(|| MbError::invalid_input(format!("未记录的变量: {name}")))?;
            self.write_matrix(name, series)?;
            written += 1;
        }
        info!("已写出 {} 个变量时序到 {}", written, self.dir.display());
        Ok(written)
    }

    /// 写出单个变量的 时间 × 分区 矩阵
    fn write_matrix(&self, name: &str, series: &[Vec<f64>]) -> MbResult<()> {
        let mut content = String::new();
        content.push_str("step");
        for zone in &self.zone_names {
            let _ = write!(content, ",{zone}");
        }
        content.push('\n');

        for (step, row) in series.iter().enumerate() {
            let _ = write!(content, "{step}");
            for v in row {
                let _ = write!(content, ",{v}");
            }
            content.push('\n');
        }

        let path = self.dir.join(format!("{name}.csv"));
        std::fs::write(&path, content)
            .map_err(|e| MbError::io_with_source(format!("写出失败: {}", path.display()), e))
    }

    /// 写出过程贡献台账
    ///
    /// 格式: pool, process, 每分区一列累计质量 [mg]。
    pub fn write_contributions(&self, recorder: &SeriesRecorder) -> MbResult<()> {
        let mut content = String::new();
        content.push_str("pool,process");
        for zone in &self.zone_names {
            let _ = write!(content, ",{zone}");
        }
        content.push('\n');

        for (pool, processes) in recorder.contributions() {
            for (process, masses) in processes {
                let _ = write!(content, "{pool},{process}");
                for mass in masses {
                    let _ = write!(content, ",{mass}");
                }
                content.push('\n');
            }
        }

        let path = self.dir.join("contributions.csv");
        std::fs::write(&path, content)
            .map_err(|e| MbError::io_with_source(format!("写出失败: {}", path.display()), e))
    }

    /// 写出外海收支汇总
    ///
    /// 格式: substance, exported_mg, imported_mg, net_export_mg。
    pub fn write_boundary_budget(&self, recorder: &SeriesRecorder) -> MbResult<()> {
        let (exported, imported) = recorder.boundary_budget();
        let mut content = String::from("substance,exported_mg,imported_mg,net_export_mg\n");
        for (substance, out_mass) in exported {
            let in_mass = imported.get(substance).copied().unwrap_or(0.0);
            let _ = writeln!(
                content,
                "{substance},{out_mass},{in_mass},{}",
                out_mass - in_mass
            );
        }

        let path = self.dir.join("boundary_budget.csv");
        std::fs::write(&path, content)
            .map_err(|e| MbError::io_with_source(format!("写出失败: {}", path.display()), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mb_physics::transport::ExchangeReport;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("mb_io_test_{tag}_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_write_series_matrix() {
        let dir = temp_dir("series");
        let writer =
            SeriesWriter::new(&dir, vec!["Area1".into(), "Area2".into()]).unwrap();

        let mut recorder = SeriesRecorder::new();
        // 直接借用交换报告接口构造一些记录
        let mut report = ExchangeReport::default();
        report.exported.insert("NH4".into(), 10.0);
        recorder.record_exchange(&report);

        writer.write_boundary_budget(&recorder).unwrap();
        let content = std::fs::read_to_string(dir.join("boundary_budget.csv")).unwrap();
        assert!(content.contains("NH4,10,0,10"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unknown_variable_rejected() {
        let dir = temp_dir("unknown");
        let writer = SeriesWriter::new(&dir, vec!["Area1".into()]).unwrap();
        let recorder = SeriesRecorder::new();
        assert!(writer
            .write_series(&recorder, &["NOPE".to_string()])
            .is_err());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
