// crates/mb_physics/src/engine/recorder.rs

//! 时序记录与台账
//!
//! 为每个被追踪的变量维护稠密的 时间 × 分区 数组；同时累计：
//! - 逐池逐过程的贡献质量台账
//! - 与外海的进出质量收支
//!
//! 记录器只累积数据，落盘由 IO 层完成。

use mb_foundation::scalar::LITERS_PER_M3;
use mb_foundation::Scalar;
use std::collections::BTreeMap;

use crate::bio::cohort::CohortState;
use crate::nutrients::PoolUpdate;
use crate::state::{ModelState, VariableKind};
use crate::transport::ExchangeReport;

/// 时序记录器
#[derive(Debug, Clone, Default)]
pub struct SeriesRecorder {
    /// 变量名 → 逐步的逐分区行
    series: BTreeMap<String, Vec<Vec<Scalar>>>,
    /// 池名 → 过程名 → 逐分区累计质量 [mg]
    contributions: BTreeMap<String, BTreeMap<String, Vec<Scalar>>>,
    /// 物质 → 累计流出外海质量 [mg]
    exported: BTreeMap<String, Scalar>,
    /// 物质 → 累计从外海流入质量 [mg]
    imported: BTreeMap<String, Scalar>,
}

impl SeriesRecorder {
    /// 创建空记录器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一步的全部状态
    pub fn record_state(
        &mut self,
        state: &ModelState,
        shellfish: &CohortState,
        fish: &CohortState,
    ) {
        for kind in VariableKind::ALL {
            self.push_row(kind.name(), state.get(kind).to_vec());
        }
        self.push_row("N_SH", shellfish.population.clone());
        self.push_row("V_SH", shellfish.volume.clone());
        self.push_row("E_SH", shellfish.reserve.clone());
        self.push_row("E_R_SH", shellfish.repro.clone());
        self.push_row("N_F", fish.population.clone());
        self.push_row("V_F", fish.volume.clone());
        self.push_row("E_F", fish.reserve.clone());
        self.push_row("E_R_F", fish.repro.clone());
    }

    fn push_row(&mut self, name: &str, row: Vec<Scalar>) {
        self.series.entry(name.to_string()).or_default().push(row);
    }

    /// 累计逐过程贡献质量
    ///
    /// 贡献速率 [mg/L/步] × 体积 [L] 取绝对值后累加。
    pub fn record_contributions(&mut self, updates: &[PoolUpdate], volumes: &[Scalar]) {
        for update in updates {
            let pool = self
                .contributions
                .entry(update.kind.name().to_string())
                .or_default();
            for contribution in update.balance.contributions() {
                let entry = pool
                    .entry(contribution.label.to_string())
                    .or_insert_with(|| vec![0.0; volumes.len()]);
                for (acc, (rate, vol)) in
                    entry.iter_mut().zip(contribution.rates.iter().zip(volumes))
                {
                    *acc += (rate * vol * LITERS_PER_M3).abs();
                }
            }
        }
    }

    /// 累计外海收支
    pub fn record_exchange(&mut self, report: &ExchangeReport) {
        for (substance, mass) in &report.exported {
            *self.exported.entry(substance.clone()).or_insert(0.0) += mass;
        }
        for (substance, mass) in &report.imported {
            *self.imported.entry(substance.clone()).or_insert(0.0) += mass;
        }
    }

    /// 已记录的步数
    pub fn n_steps(&self) -> usize {
        self.series.values().map(|rows| rows.len()).max().unwrap_or(0)
    }

    /// 变量时序（时间 × 分区）
    pub fn series(&self, name: &str) -> Option<&[Vec<Scalar>]> {
        self.series.get(name).map(|rows| rows.as_slice())
    }

    /// 全部变量名
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|s| s.as_str())
    }

    /// 贡献台账
    pub fn contributions(&self) -> &BTreeMap<String, BTreeMap<String, Vec<Scalar>>> {
        &self.contributions
    }

    /// 外海收支（流出, 流入）
    pub fn boundary_budget(&self) -> (&BTreeMap<String, Scalar>, &BTreeMap<String, Scalar>) {
        (&self.exported, &self.imported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrients::MassBalance;

    #[test]
    fn test_record_contributions_accumulates_mass() {
        let mut recorder = SeriesRecorder::new();
        let mut mb = MassBalance::new(1);
        mb.source("mineralization", vec![0.5]);
        mb.sink("uptake", vec![0.2]);
        let updates = vec![PoolUpdate {
            kind: VariableKind::Ammonium,
            balance: mb,
            floor: None,
        }];

        recorder.record_contributions(&updates, &[2.0]);
        recorder.record_contributions(&updates, &[2.0]);

        let ledger = &recorder.contributions()["NH4"];
        // 0.5 mg/L × 2 m³ × 1000 L/m³ × 2 步 = 2000 mg
        assert!((ledger["mineralization"][0] - 2000.0).abs() < 1e-9);
        // 汇取绝对值累计
        assert!((ledger["uptake"][0] - 800.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_exchange() {
        let mut recorder = SeriesRecorder::new();
        let mut report = ExchangeReport::default();
        report.exported.insert("NH4".into(), 100.0);
        report.imported.insert("NH4".into(), 30.0);
        recorder.record_exchange(&report);
        recorder.record_exchange(&report);

        let (exported, imported) = recorder.boundary_budget();
        assert!((exported["NH4"] - 200.0).abs() < 1e-12);
        assert!((imported["NH4"] - 60.0).abs() < 1e-12);
    }
}
