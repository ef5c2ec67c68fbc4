// crates/mb_io/src/import/dataset.rs

//! 数据集装配
//!
//! 按运行配置把各 CSV 数据文件装配成 [`SimulationInputs`]：
//! - 交换通量表：列名 `"<起点>_to_<终点>"`，带符号，细分辨率按块聚合
//! - 河流流量表：每条配置河流一列，缺列即致命错误
//! - 外海浓度表：每物质一列
//! - 负荷表：河流为长表（date, Zone, 物质列），四类静态源为分区表
//! - 驱动表：每分区一列，行即时间步
//!
//! 所有缩放乘子在装配时应用。

use mb_config::RunConfig;
use mb_foundation::{MbError, MbResult, Scalar};
use mb_physics::engine::Observation;
use mb_physics::engine::SimulationInputs;
use mb_physics::forcing::boundary::OuterSeaBoundary;
use mb_physics::forcing::drivers::EnvironmentalDrivers;
use mb_physics::forcing::loads::{ExternalLoads, RiverLoadRecord, LOAD_SUBSTANCES};
use mb_physics::forcing::series::{StepSeries, ZonalSeries};
use mb_physics::transport::{ExchangeSeries, SignedFluxColumn, TransportEngine};
use mb_physics::zone::ZoneTopology;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

use super::csv_table::{CsvOptions, KeyedTable, NamedMatrix};

/// 装配完整的模拟输入数据集
pub fn load_dataset(config: &RunConfig) -> MbResult<SimulationInputs> {
    config.validate()?;
    let topology = ZoneTopology::from_config(&config.zones)?;
    let store = config.parameters.clone();

    let transport = load_transport(config, &topology)?;
    let drivers = load_drivers(config, &topology, &store)?;
    let loads = load_external_loads(config, &topology)?;

    info!(
        "数据集装配完成: {} 分区, 输运覆盖 {} 步",
        topology.n_interior(),
        transport.horizon()
    );

    Ok(SimulationInputs {
        transport,
        drivers,
        loads,
        store,
        harvest: config.harvest.clone(),
        n_steps: config.time.n_steps,
    })
}

/// 装配输运引擎
fn load_transport(config: &RunConfig, topology: &ZoneTopology) -> MbResult<TransportEngine> {
    // 交换通量：按列名 "<from>_to_<to>" 解析有向边
    let flux = NamedMatrix::load(&config.forcing.exchange, &CsvOptions::lenient())?;
    let mut columns = Vec::new();
    for header in flux.headers() {
        if let Some((from, to)) = header.split_once("_to_") {
            columns.push(SignedFluxColumn {
                from: from.to_string(),
                to: to.to_string(),
                values: flux.column(header)?.to_vec(),
            });
        }
    }
    if columns.is_empty() {
        return Err(MbError::invalid_topology(format!(
            "交换通量表没有任何 \"_to_\" 列: {}",
            config.forcing.exchange.display()
        )));
    }
    let series = ExchangeSeries::from_signed_columns(
        topology,
        &columns,
        config.time.exchange_chunk,
        config.scaling.exchange_coefficient,
    )?;

    // 河流流量：每条配置河流必须有同名列
    let mut river_flow = BTreeMap::new();
    if !config.zones.river_inflow_zones.is_empty() {
        let table = NamedMatrix::load(&config.forcing.river_flow, &CsvOptions::lenient())?;
        for river in config.zones.river_inflow_zones.keys() {
            let values = table.column(river)?.to_vec();
            river_flow.insert(river.clone(), StepSeries::new(values)?);
        }
    }

    // 外海边界浓度
    let sea = NamedMatrix::load(&config.forcing.outer_sea, &CsvOptions::lenient())?;
    let mut boundary = OuterSeaBoundary::new();
    for header in sea.headers() {
        if matches!(header.as_str(), "Time" | "time" | "timestep") {
            continue;
        }
        boundary = boundary.with_series(header, sea.column(header)?.to_vec())?;
    }
    let scaling: BTreeMap<String, Scalar> = config
        .scaling
        .outer_sea
        .iter()
        .map(|(k, v)| (k.clone(), *v))
        .collect();
    let boundary = boundary.with_scaling(scaling);

    TransportEngine::new(topology.clone(), series, river_flow, boundary)
}

/// 装配环境驱动
fn load_drivers(
    config: &RunConfig,
    topology: &ZoneTopology,
    store: &mb_config::ParameterStore,
) -> MbResult<EnvironmentalDrivers> {
    let temperature = load_zonal_series(&config.forcing.temperature, topology)?;
    let irradiance = load_zonal_series(&config.forcing.irradiance, topology)?;
    let salinity = load_zonal_series(&config.forcing.salinity, topology)?;
    // 特征流速来自参数仓库（复氧公式用）
    let current_speed = store.zonal("v")?;
    EnvironmentalDrivers::new(temperature, irradiance, salinity, current_speed)
}

/// 加载逐分区驱动表：每个内部分区一列
fn load_zonal_series(path: &Path, topology: &ZoneTopology) -> MbResult<ZonalSeries> {
    let matrix = NamedMatrix::load(path, &CsvOptions::lenient())?;
    let n = topology.n_interior();
    let mut zone_columns = Vec::with_capacity(n);
    for i in 0..n {
        zone_columns.push(matrix.column(topology.name(i))?);
    }
    let mut rows = Vec::with_capacity(matrix.n_rows());
    for row in 0..matrix.n_rows() {
        rows.push(zone_columns.iter().map(|c| c[row]).collect());
    }
    ZonalSeries::new(n, rows)
}

/// 装配外部负荷
fn load_external_loads(config: &RunConfig, topology: &ZoneTopology) -> MbResult<ExternalLoads> {
    let n = topology.n_interior();

    // 河流负荷：长表 (date, Zone, 物质列)
    let river_table = KeyedTable::load(&config.forcing.river_loads, &CsvOptions::lenient(), 2)?;
    let river_multipliers = config.scaling.loads.get("river");
    let river_records =
        assemble_river_records(&river_table, topology, river_multipliers, &config.forcing.river_loads)?;

    // 四类静态源
    let mut static_mass = vec![[0.0; 7]; n];
    let sources = [
        (&config.forcing.point_loads, "point_source"),
        (&config.forcing.groundwater_loads, "groundwater"),
        (&config.forcing.pond_loads, "pond"),
        (&config.forcing.atmosphere_loads, "atmosphere"),
    ];
    for (path, source) in sources {
        let table = KeyedTable::load(path, &CsvOptions::lenient(), 1)?;
        let multipliers = config.scaling.loads.get(source);
        accumulate_static_loads(&table, topology, multipliers, path, &mut static_mass)?;
    }

    ExternalLoads::new(n, river_records, static_mass)
}

/// 把长表河流负荷记录换算为逐步记录（乘子在此应用）
pub(crate) fn assemble_river_records(
    table: &KeyedTable,
    topology: &ZoneTopology,
    multipliers: Option<&BTreeMap<String, f64>>,
    path: &Path,
) -> MbResult<Vec<RiverLoadRecord>> {
    // 每个物质列都是必需的
    let mut column_idx = [0usize; 7];
    for (k, substance) in LOAD_SUBSTANCES.iter().enumerate() {
        column_idx[k] = table
            .column_index(substance)
            .ok_or_else(|| MbError::missing_column(*substance, path))?;
    }

    let step_map = key_steps(table.rows.iter().map(|(key, _)| {
        key.split('\t').next().unwrap_or("").to_string()
    }));

    let mut records = Vec::with_capacity(table.rows.len());
    for (key, values) in &table.rows {
        let mut parts = key.split('\t');
        let date = parts.next().unwrap_or("");
        let zone_name = parts.next().unwrap_or("");
        let zone = topology.index_of(zone_name).ok_or_else(|| {
            MbError::invalid_topology(format!("负荷记录引用未知分区: {zone_name}"))
        })?;
        if zone >= topology.n_interior() {
            warn!("负荷记录指向边界分区, 已忽略: {zone_name}");
            continue;
        }
        let step = step_map[date];

        let mut masses = [0.0; 7];
        for (k, substance) in LOAD_SUBSTANCES.iter().enumerate() {
            let multiplier = multipliers
                .and_then(|m| m.get(*substance))
                .copied()
                .unwrap_or(1.0);
            masses[k] = multiplier * values[column_idx[k]];
        }
        records.push(RiverLoadRecord { step, zone, masses });
    }
    Ok(records)
}

/// 把分区表静态负荷累加进合计矩阵（乘子在此应用）
pub(crate) fn accumulate_static_loads(
    table: &KeyedTable,
    topology: &ZoneTopology,
    multipliers: Option<&BTreeMap<String, f64>>,
    path: &Path,
    static_mass: &mut [[Scalar; 7]],
) -> MbResult<()> {
    let mut column_idx = [0usize; 7];
    for (k, substance) in LOAD_SUBSTANCES.iter().enumerate() {
        column_idx[k] = table
            .column_index(substance)
            .ok_or_else(|| MbError::missing_column(*substance, path))?;
    }

    for (zone_name, values) in &table.rows {
        let zone = topology.index_of(zone_name).ok_or_else(|| {
            MbError::invalid_topology(format!("负荷表引用未知分区: {zone_name}"))
        })?;
        if zone >= topology.n_interior() {
            continue;
        }
        for (k, substance) in LOAD_SUBSTANCES.iter().enumerate() {
            let multiplier = multipliers
                .and_then(|m| m.get(*substance))
                .copied()
                .unwrap_or(1.0);
            static_mass[zone][k] += multiplier * values[column_idx[k]];
        }
    }
    Ok(())
}

/// 把时间键（日期或步号）映射到 0 起的时间步索引
///
/// 全部可解析为数值时按数值排序，否则按字典序（ISO 日期适用）。
pub(crate) fn key_steps(keys: impl Iterator<Item = String>) -> BTreeMap<String, usize> {
    let mut unique: Vec<String> = Vec::new();
    for key in keys {
        if !unique.contains(&key) {
            unique.push(key);
        }
    }
    let all_numeric = unique.iter().all(|k| k.parse::<f64>().is_ok());
    if all_numeric {
        unique.sort_by(|a, b| {
            a.parse::<f64>()
                .unwrap()
                .partial_cmp(&b.parse::<f64>().unwrap())
                .unwrap()
        });
    } else {
        unique.sort();
    }
    unique
        .into_iter()
        .enumerate()
        .map(|(i, k)| (k, i))
        .collect()
}

/// 加载观测记录（目标函数用）
///
/// 表格式: Zone, timestep, variable, value
pub fn load_observations(config: &RunConfig) -> MbResult<Vec<Observation>> {
    let path = match &config.forcing.observations {
        Some(path) => path,
        None => return Ok(Vec::new()),
    };
    let topology = ZoneTopology::from_config(&config.zones)?;
    let table = KeyedTable::load(path, &CsvOptions::lenient(), 3)?;

    let mut observations = Vec::with_capacity(table.rows.len());
    for (key, values) in &table.rows {
        let mut parts = key.split('\t');
        let zone_name = parts.next().unwrap_or("");
        let step_str = parts.next().unwrap_or("");
        let variable = parts.next().unwrap_or("").to_string();

        let zone = topology.index_of(zone_name).ok_or_else(|| {
            MbError::invalid_topology(format!("观测记录引用未知分区: {zone_name}"))
        })?;
        let step: usize = step_str
            .parse()
            .map_err(|_| MbError::invalid_input(format!("观测时间步无效: {step_str}")))?;
        let value = values
            .first()
            .copied()
            .ok_or_else(|| MbError::invalid_input("观测记录缺少数值"))?;

        observations.push(Observation {
            zone,
            step,
            variable,
            value,
        });
    }
    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_topology() -> ZoneTopology {
        ZoneTopology::new(
            vec!["Area1".into(), "Area2".into()],
            vec![1e6, 1e6],
            vec![1e7, 1e7],
            "OuterSea",
            1e12,
        )
        .unwrap()
    }

    #[test]
    fn test_key_steps_dates() {
        let keys = vec![
            "2020-01-02".to_string(),
            "2020-01-01".to_string(),
            "2020-01-02".to_string(),
        ];
        let map = key_steps(keys.into_iter());
        assert_eq!(map["2020-01-01"], 0);
        assert_eq!(map["2020-01-02"], 1);
    }

    #[test]
    fn test_key_steps_numeric() {
        let keys = vec!["10".to_string(), "2".to_string(), "10".to_string()];
        let map = key_steps(keys.into_iter());
        // 数值排序，而非字典序
        assert_eq!(map["2"], 0);
        assert_eq!(map["10"], 1);
    }

    #[test]
    fn test_assemble_river_records() {
        let content = "date,Zone,NH4,NO3,ON,PO4,OP,CBOD,DO\n\
                       2020-01-01,Area1,10,20,0,0,0,0,0\n\
                       2020-01-02,Area2,5,0,0,0,0,0,0\n";
        let table = KeyedTable::parse_str(content, &CsvOptions::default(), 2, None).unwrap();
        let topology = test_topology();

        let mut multipliers = BTreeMap::new();
        multipliers.insert("NO3".to_string(), 5.0);

        let records = assemble_river_records(
            &table,
            &topology,
            Some(&multipliers),
            Path::new("test.csv"),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].step, 0);
        assert_eq!(records[0].zone, 0);
        assert!((records[0].masses[0] - 10.0).abs() < 1e-12);
        // NO3 乘子 5 倍
        assert!((records[0].masses[1] - 100.0).abs() < 1e-12);
        assert_eq!(records[1].step, 1);
        assert_eq!(records[1].zone, 1);
    }

    #[test]
    fn test_river_records_missing_substance_column_fatal() {
        let content = "date,Zone,NH4\n2020-01-01,Area1,10\n";
        let table = KeyedTable::parse_str(content, &CsvOptions::default(), 2, None).unwrap();
        let topology = test_topology();
        let result =
            assemble_river_records(&table, &topology, None, Path::new("test.csv"));
        assert!(matches!(result, Err(MbError::MissingColumn { .. })));
    }

    #[test]
    fn test_river_records_unknown_zone_fatal() {
        let content = "date,Zone,NH4,NO3,ON,PO4,OP,CBOD,DO\n2020-01-01,Area9,1,0,0,0,0,0,0\n";
        let table = KeyedTable::parse_str(content, &CsvOptions::default(), 2, None).unwrap();
        let topology = test_topology();
        let result =
            assemble_river_records(&table, &topology, None, Path::new("test.csv"));
        assert!(matches!(result, Err(MbError::InvalidTopology { .. })));
    }

    #[test]
    fn test_accumulate_static_loads() {
        let content = "Zone,NH4,NO3,ON,PO4,OP,CBOD,DO\nArea1,100,0,0,0,0,0,0\nArea2,50,0,0,0,0,0,0\n";
        let table = KeyedTable::parse_str(content, &CsvOptions::default(), 1, None).unwrap();
        let topology = test_topology();
        let mut static_mass = vec![[0.0; 7]; 2];

        // 两类源叠加
        accumulate_static_loads(&table, &topology, None, Path::new("a.csv"), &mut static_mass)
            .unwrap();
        let mut multipliers = BTreeMap::new();
        multipliers.insert("NH4".to_string(), 2.0);
        accumulate_static_loads(
            &table,
            &topology,
            Some(&multipliers),
            Path::new("b.csv"),
            &mut static_mass,
        )
        .unwrap();

        assert!((static_mass[0][0] - 300.0).abs() < 1e-12);
        assert!((static_mass[1][0] - 150.0).abs() < 1e-12);
    }
}
