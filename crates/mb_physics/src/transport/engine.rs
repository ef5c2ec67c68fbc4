// crates/mb_physics/src/transport/engine.rs

//! 输运引擎
//!
//! 在守恒交换矩阵之上提供体积追踪与融合输运步：
//!
//! ```text
//! new_conc = (old_conc * V_old + M(t) · old_conc) / V_new
//! ```
//!
//! 质量转移与稀释校正必须使用配对的体积快照一次完成，
//! 拆成"先转移再稀释"两步会破坏精确守恒。
//! 外海边界分量在输运前被外部浓度覆写，输运后再次钉住。

use mb_foundation::{MbError, MbResult, Scalar};
use mb_foundation::scalar::LITERS_PER_M3;
use std::collections::BTreeMap;

use crate::forcing::boundary::OuterSeaBoundary;
use crate::forcing::series::StepSeries;
use crate::zone::ZoneTopology;

use super::graph::ExchangeSeries;

/// 单步输运的边界收支报告
#[derive(Debug, Clone, Default)]
pub struct ExchangeReport {
    /// 物质 → 本步流出到外海的质量 [mg]
    pub exported: BTreeMap<String, Scalar>,
    /// 物质 → 本步从外海流入的质量 [mg]
    pub imported: BTreeMap<String, Scalar>,
}

/// 输运引擎
#[derive(Debug, Clone)]
pub struct TransportEngine {
    topology: ZoneTopology,
    series: ExchangeSeries,
    /// 河流名称 → 逐步流量 [m³/步]
    river_flow: BTreeMap<String, StepSeries>,
    boundary: OuterSeaBoundary,
}

impl TransportEngine {
    /// 创建输运引擎
    pub fn new(
        topology: ZoneTopology,
        series: ExchangeSeries,
        river_flow: BTreeMap<String, StepSeries>,
        boundary: OuterSeaBoundary,
    ) -> MbResult<Self> {
        if series.n_total() != topology.n_total() {
            return Err(MbError::config(format!(
                "交换图分区数 {} 与拓扑分区数 {} 不一致",
                series.n_total(),
                topology.n_total()
            )));
        }
        for river in river_flow.keys() {
            if !topology.river_inflow_index().contains_key(river) {
                return Err(MbError::config(format!("河流 {river} 未指定入流分区")));
            }
        }
        Ok(Self {
            topology,
            series,
            river_flow,
            boundary,
        })
    }

    /// 分区拓扑
    pub fn topology(&self) -> &ZoneTopology {
        &self.topology
    }

    /// 外海边界浓度提供者
    pub fn boundary(&self) -> &OuterSeaBoundary {
        &self.boundary
    }

    /// 可用时间步数
    pub fn horizon(&self) -> usize {
        self.series.horizon()
    }

    /// 指定时间步的交换矩阵
    pub fn matrix_at(&self, step: usize) -> MbResult<Vec<Vec<Scalar>>> {
        self.series.matrix_at(step)
    }

    /// 指定时间步的逐分区体积 [m³]（含边界分区）
    ///
    /// `volume(0)` 为初始体积；`volume(t)` (t≥1) 为初始体积加上第 t 步
    /// 的净流入（矩阵列和 + 指定分区的河流流量，在初始体积上积分一步）。
    /// 时间步超出预计算范围是致命配置错误。
    pub fn volume(&self, step: usize) -> MbResult<Vec<Scalar>> {
        let n_interior = self.topology.n_interior();
        let mut volumes = Vec::with_capacity(self.topology.n_total());

        if step == 0 {
            volumes.extend_from_slice(self.topology.initial_volumes());
            volumes.push(self.topology.boundary_volume());
            return Ok(volumes);
        }

        let mut net = self.series.net_inflow(step - 1)?;
        for (river, flow) in &self.river_flow {
            let zone = self.topology.river_inflow_index()[river];
            net[zone] += flow.at(step - 1);
        }

        for (i, v0) in self.topology.initial_volumes().iter().enumerate() {
            volumes.push(v0 + net[i]);
        }
        volumes.push(self.topology.boundary_volume() + net[n_interior]);
        Ok(volumes)
    }

    /// 内部分区体积 [m³]（不含边界分区）
    pub fn interior_volumes(&self, step: usize) -> MbResult<Vec<Scalar>> {
        let mut volumes = self.volume(step)?;
        volumes.truncate(self.topology.n_interior());
        Ok(volumes)
    }

    /// 对一组物质执行一个融合输运步
    ///
    /// `concentrations` 的每个向量长度为内部分区数；`step` 为目标时间步
    /// (≥1)：矩阵取数据索引 `step-1`，旧体积取 `volume(step-1)`，新体积取
    /// `volume(step)`。每个物质：
    /// 1. 外海分量以（已缩放的）边界浓度补齐
    /// 2. `new = (old*V_old + M·old) / V_new`
    /// 3. 外海分量重新钉住
    ///
    /// 返回本步的边界收支报告。
    pub fn exchange(
        &self,
        concentrations: &mut BTreeMap<String, Vec<Scalar>>,
        step: usize,
    ) -> MbResult<ExchangeReport> {
        if step == 0 {
            return Err(MbError::invalid_input("输运步编号从 1 开始"));
        }
        let matrix = self.series.matrix_at(step - 1)?;
        let v_old = self.volume(step - 1)?;
        let v_new = self.volume(step)?;

        let n_total = self.topology.n_total();
        let n_interior = self.topology.n_interior();
        let bd = self.topology.boundary_index();
        let mut report = ExchangeReport::default();

        for (substance, conc) in concentrations.iter_mut() {
            MbError::check_size("exchange concentrations", n_interior, conc.len())?;

            let boundary_conc = self.boundary.concentration(substance, step - 1);
            let mut full = Vec::with_capacity(n_total);
            full.extend_from_slice(conc);
            full.push(boundary_conc);

            // 边界收支：内部→外海 与 外海→内部 的质量 [mg]
            let mut exported = 0.0;
            let mut imported = 0.0;
            for i in 0..n_interior {
                exported += matrix[i][bd] * full[i] * LITERS_PER_M3;
                imported += matrix[bd][i] * boundary_conc * LITERS_PER_M3;
            }
            report.exported.insert(substance.clone(), exported);
            report.imported.insert(substance.clone(), imported);

            // 融合步：质量转移 + 稀释校正
            let mut new_conc = vec![0.0; n_total];
            for i in 0..n_total {
                let mut flux = 0.0;
                for j in 0..n_total {
                    flux += matrix[j][i] * full[j];
                }
                let v = v_new[i];
                new_conc[i] = if v > 0.0 {
                    (full[i] * v_old[i] + flux) / v
                } else {
                    0.0
                };
            }
            new_conc[bd] = boundary_conc;

            new_conc.truncate(n_interior);
            *conc = new_conc;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::graph::SignedFluxColumn;

    fn closed_two_zone_engine(flow: Scalar, steps: usize) -> TransportEngine {
        // 封闭双分区系统：A体积100，B体积50，A→B 每步 flow m³
        let topology = ZoneTopology::new(
            vec!["A".into(), "B".into()],
            vec![100.0, 50.0],
            vec![100.0, 50.0],
            "OuterSea",
            1e12,
        )
        .unwrap();
        let columns = vec![SignedFluxColumn {
            from: "A".into(),
            to: "B".into(),
            values: vec![flow; steps],
        }];
        let series = ExchangeSeries::from_signed_columns(&topology, &columns, 1, 1.0).unwrap();
        TransportEngine::new(topology, series, BTreeMap::new(), OuterSeaBoundary::new()).unwrap()
    }

    fn total_mass(conc: &[Scalar], volumes: &[Scalar]) -> Scalar {
        conc.iter().zip(volumes).map(|(c, v)| c * v).sum()
    }

    #[test]
    fn test_two_zone_mass_conservation() {
        // 规格场景: A 体积100 浓度1.0, B 体积50 浓度0.0, A→B 10/步,
        // 无反应、无边界 → 一步后总质量仍为 100
        let engine = closed_two_zone_engine(10.0, 4);
        let mut conc = BTreeMap::new();
        conc.insert("NH4".to_string(), vec![1.0, 0.0]);

        let v_before = engine.interior_volumes(0).unwrap();
        let mass_before = total_mass(&conc["NH4"], &v_before);
        assert!((mass_before - 100.0).abs() < 1e-9);

        engine.exchange(&mut conc, 1).unwrap();

        let v_after = engine.interior_volumes(1).unwrap();
        let mass_after = total_mass(&conc["NH4"], &v_after);
        assert!(
            (mass_after - 100.0).abs() < 1e-9,
            "mass after = {mass_after}"
        );

        // 浓度向均衡移动：携带水体的浓度不升，接收方从零上升
        let nh4 = &conc["NH4"];
        assert!(nh4[0] <= 1.0);
        assert!(nh4[1] > 0.0);
        assert!(nh4[1] < nh4[0]);
    }

    #[test]
    fn test_conservation_over_many_steps() {
        let engine = closed_two_zone_engine(5.0, 10);
        let mut conc = BTreeMap::new();
        conc.insert("NO3".to_string(), vec![2.0, 0.5]);

        let mass0 = total_mass(&conc["NO3"], &engine.interior_volumes(0).unwrap());
        for step in 1..10 {
            engine.exchange(&mut conc, step).unwrap();
            let mass = total_mass(&conc["NO3"], &engine.interior_volumes(step).unwrap());
            assert!((mass - mass0).abs() < 1e-8, "step {step}: mass = {mass}");
        }
    }

    #[test]
    fn test_single_zone_degeneracy() {
        // 单分区零交换：浓度不变
        let topology = ZoneTopology::new(
            vec!["A".into()],
            vec![100.0],
            vec![100.0],
            "OuterSea",
            1e12,
        )
        .unwrap();
        let series = ExchangeSeries::zero(2, 1, 8);
        let engine =
            TransportEngine::new(topology, series, BTreeMap::new(), OuterSeaBoundary::new())
                .unwrap();

        let mut conc = BTreeMap::new();
        conc.insert("DO".to_string(), vec![6.3]);
        engine.exchange(&mut conc, 1).unwrap();
        assert!((conc["DO"][0] - 6.3).abs() < 1e-12);
    }

    #[test]
    fn test_boundary_pinned() {
        // 带边界交换：内部浓度向边界浓度靠拢，边界不受内部影响
        let topology = ZoneTopology::new(
            vec!["A".into()],
            vec![100.0],
            vec![100.0],
            "OuterSea",
            1e12,
        )
        .unwrap();
        let columns = vec![SignedFluxColumn {
            from: "A".into(),
            to: "OuterSea".into(),
            values: vec![10.0, -10.0, 10.0, -10.0],
        }];
        let series = ExchangeSeries::from_signed_columns(&topology, &columns, 1, 1.0).unwrap();
        let boundary = OuterSeaBoundary::new()
            .with_series("NO3", vec![1.0; 4])
            .unwrap();
        let engine = TransportEngine::new(topology, series, BTreeMap::new(), boundary).unwrap();

        let mut conc = BTreeMap::new();
        conc.insert("NO3".to_string(), vec![0.0]);
        // 数据步0: A→外海 流出；数据步1: 外海→A 流入 10 m³ 浓度 1.0
        engine.exchange(&mut conc, 1).unwrap();
        assert_eq!(conc["NO3"][0], 0.0);
        engine.exchange(&mut conc, 2).unwrap();
        assert!(conc["NO3"][0] > 0.0);
    }

    #[test]
    fn test_exchange_report() {
        let topology = ZoneTopology::new(
            vec!["A".into()],
            vec![100.0],
            vec![100.0],
            "OuterSea",
            1e12,
        )
        .unwrap();
        let columns = vec![SignedFluxColumn {
            from: "A".into(),
            to: "OuterSea".into(),
            values: vec![10.0, 10.0],
        }];
        let series = ExchangeSeries::from_signed_columns(&topology, &columns, 1, 1.0).unwrap();
        let engine =
            TransportEngine::new(topology, series, BTreeMap::new(), OuterSeaBoundary::new())
                .unwrap();

        let mut conc = BTreeMap::new();
        conc.insert("NH4".to_string(), vec![2.0]);
        let report = engine.exchange(&mut conc, 1).unwrap();
        // 流出 10 m³ × 2.0 mg/L × 1000 L/m³ = 20000 mg
        assert!((report.exported["NH4"] - 20000.0).abs() < 1e-9);
        assert_eq!(report.imported["NH4"], 0.0);
    }

    #[test]
    fn test_volume_beyond_horizon_fatal() {
        let engine = closed_two_zone_engine(10.0, 4);
        assert!(engine.volume(4).is_ok());
        assert!(matches!(
            engine.volume(5),
            Err(MbError::BeyondHorizon { .. })
        ));
    }

    #[test]
    fn test_volume_with_river_inflow() {
        let mut config = mb_config::ZoneConfig {
            names: vec!["A".into(), "B".into()],
            areas: vec![100.0, 100.0],
            initial_volumes: vec![100.0, 50.0],
            boundary_name: "OuterSea".into(),
            boundary_volume: 1e12,
            river_inflow_zones: Default::default(),
        };
        config
            .river_inflow_zones
            .insert("River1".into(), "B".into());
        let topology = ZoneTopology::from_config(&config).unwrap();

        let series = ExchangeSeries::zero(3, 2, 4);
        let mut river_flow = BTreeMap::new();
        river_flow.insert("River1".to_string(), StepSeries::new(vec![5.0; 4]).unwrap());
        let engine =
            TransportEngine::new(topology, series, river_flow, OuterSeaBoundary::new()).unwrap();

        let volumes0 = engine.volume(0).unwrap();
        assert!((volumes0[1] - 50.0).abs() < 1e-12);
        let volumes1 = engine.volume(1).unwrap();
        assert!((volumes1[0] - 100.0).abs() < 1e-12);
        assert!((volumes1[1] - 55.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_river_rejected() {
        let topology = ZoneTopology::new(
            vec!["A".into()],
            vec![100.0],
            vec![100.0],
            "OuterSea",
            1e12,
        )
        .unwrap();
        let series = ExchangeSeries::zero(2, 1, 4);
        let mut river_flow = BTreeMap::new();
        river_flow.insert("RiverX".to_string(), StepSeries::new(vec![1.0]).unwrap());
        assert!(TransportEngine::new(
            topology,
            series,
            river_flow,
            OuterSeaBoundary::new()
        )
        .is_err());
    }
}
