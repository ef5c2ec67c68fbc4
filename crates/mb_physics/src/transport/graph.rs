// crates/mb_physics/src/transport/graph.rs

//! 交换图与交换矩阵
//!
//! 把原始成对通量观测聚合到声明的分区拓扑上，得到按模拟时间步采样的
//! 有向加权图。矩阵约定：
//! - `M[i][j]` (i≠j) 为 i→j 的交换流量 [m³/步]，非负
//! - 对角元 `M[i][i]` 为该行非对角元之和的相反数（自通量）
//! - 外海边界行不参与守恒约束（其浓度由外部固定）
//!
//! 这样 矩阵·浓度 直接给出净质量守恒的通量，任意不规则拓扑都是
//! 一次线性运算。

use mb_foundation::{MbError, MbResult, Scalar};
use serde::{Deserialize, Serialize};

use crate::forcing::series::StepSeries;
use crate::zone::ZoneTopology;

/// 一列带符号的原始通量观测
///
/// 正值表示 `from → to`，负值表示反向。
#[derive(Debug, Clone)]
pub struct SignedFluxColumn {
    /// 起点分区名
    pub from: String,
    /// 终点分区名
    pub to: String,
    /// 带符号通量序列 [m³/原始时间单位]
    pub values: Vec<Scalar>,
}

/// 有向交换边
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Edge {
    /// 起点分区索引
    from: usize,
    /// 终点分区索引
    to: usize,
    /// 逐时间步流量 [m³/步]，非负
    series: StepSeries,
}

/// 时间索引的交换图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSeries {
    /// 总分区数（含边界）
    n_total: usize,
    /// 边界分区索引
    boundary: usize,
    /// 有向边集合
    edges: Vec<Edge>,
    /// 可用时间步数
    horizon: usize,
}

impl ExchangeSeries {
    /// 从带符号通量列装配
    ///
    /// # 参数
    ///
    /// - `columns`: 原始成对通量列（可比模拟步更细）
    /// - `chunk`: 每个模拟步包含的原始观测数（块内求和聚合）
    /// - `coefficient`: 交换矩阵整体系数
    ///
    /// 每列拆为两条有向边：正部给 `from→to`，负部给 `to→from`。
    /// 引用未知分区的列是致命配置错误。
    pub fn from_signed_columns(
        topology: &ZoneTopology,
        columns: &[SignedFluxColumn],
        chunk: usize,
        coefficient: Scalar,
    ) -> MbResult<Self> {
        if columns.is_empty() {
            return Err(MbError::invalid_topology("交换图没有任何边"));
        }
        let mut edges = Vec::with_capacity(columns.len() * 2);
        let mut horizon = usize::MAX;

        for column in columns {
            let (i, j) = topology.check_edge(&column.from, &column.to)?;
            let forward: Vec<Scalar> = column
                .values
                .iter()
                .map(|q| q.max(0.0) * coefficient)
                .collect();
            let backward: Vec<Scalar> = column
                .values
                .iter()
                .map(|q| (-q).max(0.0) * coefficient)
                .collect();
            let forward = StepSeries::aggregate(&forward, chunk)?;
            let backward = StepSeries::aggregate(&backward, chunk)?;
            horizon = horizon.min(forward.len());
            edges.push(Edge {
                from: i,
                to: j,
                series: forward,
            });
            edges.push(Edge {
                from: j,
                to: i,
                series: backward,
            });
        }

        Ok(Self {
            n_total: topology.n_total(),
            boundary: topology.boundary_index(),
            edges,
            horizon,
        })
    }

    /// 直接从有向边序列构建（测试与程序化场景）
    ///
    /// `directed`: (起点索引, 终点索引, 逐步流量)。
    pub fn from_directed(
        n_total: usize,
        boundary: usize,
        directed: Vec<(usize, usize, Vec<Scalar>)>,
    ) -> MbResult<Self> {
        let mut edges = Vec::with_capacity(directed.len());
        let mut horizon = usize::MAX;
        for (from, to, values) in directed {
            MbError::check_index("edge from", from, n_total)?;
            MbError::check_index("edge to", to, n_total)?;
            let series = StepSeries::new(values)?;
            horizon = horizon.min(series.len());
            edges.push(Edge { from, to, series });
        }
        if edges.is_empty() {
            horizon = usize::MAX;
        }
        Ok(Self {
            n_total,
            boundary,
            edges,
            horizon,
        })
    }

    /// 无交换图（单分区退化情形）
    pub fn zero(n_total: usize, boundary: usize, horizon: usize) -> Self {
        Self {
            n_total,
            boundary,
            edges: Vec::new(),
            horizon,
        }
    }

    /// 总分区数
    pub fn n_total(&self) -> usize {
        self.n_total
    }

    /// 可用时间步数
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// 装配指定时间步的守恒交换矩阵
    ///
    /// 超出预计算范围的时间步是致命错误。
    pub fn matrix_at(&self, step: usize) -> MbResult<Vec<Vec<Scalar>>> {
        if step >= self.horizon {
            return Err(MbError::beyond_horizon(step, self.horizon));
        }

        let n = self.n_total;
        let mut matrix = vec![vec![0.0; n]; n];
        for edge in &self.edges {
            matrix[edge.from][edge.to] += edge.series.at_strict(step)?;
        }

        // 对角元平衡非对角元，保证矩阵·浓度净质量守恒；
        // 边界行除外，其浓度由外部固定
        for i in 0..n {
            if i == self.boundary {
                continue;
            }
            let outflow: Scalar = matrix[i].iter().sum();
            matrix[i][i] = -outflow;
        }

        Ok(matrix)
    }

    /// 指定时间步的逐分区净流入量 [m³/步]（矩阵列和）
    pub fn net_inflow(&self, step: usize) -> MbResult<Vec<Scalar>> {
        let matrix = self.matrix_at(step)?;
        let n = self.n_total;
        let mut net = vec![0.0; n];
        for row in &matrix {
            for (j, v) in row.iter().enumerate() {
                net[j] += v;
            }
        }
        Ok(net)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_zone_topology() -> ZoneTopology {
        ZoneTopology::new(
            vec!["Area1".into(), "Area2".into()],
            vec![1e6, 1e6],
            vec![100.0, 50.0],
            "OuterSea",
            1e12,
        )
        .unwrap()
    }

    #[test]
    fn test_signed_column_split() {
        let topo = two_zone_topology();
        let columns = vec![SignedFluxColumn {
            from: "Area1".into(),
            to: "Area2".into(),
            values: vec![10.0, -4.0],
        }];
        let series = ExchangeSeries::from_signed_columns(&topo, &columns, 1, 1.0).unwrap();

        let m0 = series.matrix_at(0).unwrap();
        assert!((m0[0][1] - 10.0).abs() < 1e-12);
        assert_eq!(m0[1][0], 0.0);

        let m1 = series.matrix_at(1).unwrap();
        assert_eq!(m1[0][1], 0.0);
        assert!((m1[1][0] - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_zone_fatal() {
        let topo = two_zone_topology();
        let columns = vec![SignedFluxColumn {
            from: "Area1".into(),
            to: "Area99".into(),
            values: vec![1.0],
        }];
        assert!(matches!(
            ExchangeSeries::from_signed_columns(&topo, &columns, 1, 1.0),
            Err(MbError::InvalidTopology { .. })
        ));
    }

    #[test]
    fn test_diagonal_balances_row() {
        let topo = two_zone_topology();
        let columns = vec![
            SignedFluxColumn {
                from: "Area1".into(),
                to: "Area2".into(),
                values: vec![10.0],
            },
            SignedFluxColumn {
                from: "Area2".into(),
                to: "OuterSea".into(),
                values: vec![3.0],
            },
        ];
        let series = ExchangeSeries::from_signed_columns(&topo, &columns, 1, 1.0).unwrap();
        let m = series.matrix_at(0).unwrap();

        // 非边界行行和为零
        for i in 0..2 {
            let row_sum: Scalar = m[i].iter().sum();
            assert!(row_sum.abs() < 1e-12, "row {i} sum = {row_sum}");
        }
        // 边界行不设守恒
        assert_eq!(m[2][2], 0.0);
    }

    #[test]
    fn test_coefficient_applied() {
        let topo = two_zone_topology();
        let columns = vec![SignedFluxColumn {
            from: "Area1".into(),
            to: "Area2".into(),
            values: vec![10.0],
        }];
        let series = ExchangeSeries::from_signed_columns(&topo, &columns, 1, 0.5).unwrap();
        let m = series.matrix_at(0).unwrap();
        assert!((m[0][1] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_aggregation_onto_step_grid() {
        let topo = two_zone_topology();
        // 4 个细分辨率观测，每 2 个聚合为一步
        let columns = vec![SignedFluxColumn {
            from: "Area1".into(),
            to: "Area2".into(),
            values: vec![1.0, 2.0, 3.0, 4.0],
        }];
        let series = ExchangeSeries::from_signed_columns(&topo, &columns, 2, 1.0).unwrap();
        assert_eq!(series.horizon(), 2);
        let m = series.matrix_at(0).unwrap();
        assert!((m[0][1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_beyond_horizon_fatal() {
        let topo = two_zone_topology();
        let columns = vec![SignedFluxColumn {
            from: "Area1".into(),
            to: "Area2".into(),
            values: vec![1.0],
        }];
        let series = ExchangeSeries::from_signed_columns(&topo, &columns, 1, 1.0).unwrap();
        assert!(matches!(
            series.matrix_at(1),
            Err(MbError::BeyondHorizon { .. })
        ));
    }

    #[test]
    fn test_net_inflow() {
        let series = ExchangeSeries::from_directed(3, 2, vec![(0, 1, vec![10.0])]).unwrap();
        let net = series.net_inflow(0).unwrap();
        // 分区0: 对角 -10；分区1: +10
        assert!((net[0] + 10.0).abs() < 1e-12);
        assert!((net[1] - 10.0).abs() < 1e-12);
        assert_eq!(net[2], 0.0);
    }
}
