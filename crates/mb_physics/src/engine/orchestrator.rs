// crates/mb_physics/src/engine/orchestrator.rs

//! 步序编排
//!
//! 每个时间步严格按以下次序推进：
//!
//! 1. 重新采样环境驱动；由当前体积更新水深
//! 2. 推进养殖种群能量学；应用收获/补苗事件
//! 3. 用 (2) 的牧食/清滤项推进浮游生物与大型藻类
//! 4. 由 (1)–(3) 的过程项加外部输入计算各营养盐池的输运前新值
//! 5. 对全部可输运池同时执行融合输运步（配对体积快照）
//! 6. 把所有状态变量截断到有效范围（静默）
//! 7. 提交状态、记录本步，丢弃逐步上下文
//!
//! 所有组件在构造时一次性解析所需参数；运行期不做按名查找。

use mb_config::{HarvestConfig, ParameterStore};
use mb_foundation::{MbError, MbResult, Scalar};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::bio::cohort::{CohortModel, CohortParams, CohortState};
use crate::bio::macroalgae::{MacroalgaeModel, MacroalgaeParams};
use crate::bio::plankton::{PhytoParams, ZooParams};
use crate::forcing::drivers::EnvironmentalDrivers;
use crate::forcing::loads::ExternalLoads;
use crate::nutrients::{NutrientModel, NutrientParams, PoolInputs};
use crate::state::{ModelState, VariableKind};
use crate::transport::TransportEngine;
use crate::zone::ZoneTopology;

use super::context::StepContext;
use super::recorder::SeriesRecorder;
use super::schedule::HarvestPlan;

/// 模拟装配输入
pub struct SimulationInputs {
    /// 输运引擎（含拓扑与边界）
    pub transport: TransportEngine,
    /// 环境驱动
    pub drivers: EnvironmentalDrivers,
    /// 外部负荷
    pub loads: ExternalLoads,
    /// 参数仓库（初始条件 + 过程参数）
    pub store: ParameterStore,
    /// 收获日程配置
    pub harvest: HarvestConfig,
    /// 总时间步数
    pub n_steps: usize,
}

/// 单步摘要
#[derive(Debug, Clone)]
pub struct StepRecord {
    /// 本步编号
    pub step: usize,
    /// 全域最低溶解氧 [mgO2/L]
    pub min_oxygen: Scalar,
    /// 浮游植物全域均值 [mgC/L]
    pub mean_phyto: Scalar,
}

/// 一条观测记录（目标函数用）
#[derive(Debug, Clone)]
pub struct Observation {
    /// 分区索引
    pub zone: usize,
    /// 时间步
    pub step: usize,
    /// 变量名
    pub variable: String,
    /// 观测值
    pub value: Scalar,
}

/// 模拟编排器
///
/// 拥有全部状态向量；其余组件在一步内按引用取用状态，步末缓存即随
/// 上下文失效。
pub struct Simulation {
    transport: TransportEngine,
    drivers: EnvironmentalDrivers,
    loads: ExternalLoads,
    store: ParameterStore,

    state: ModelState,
    shellfish: CohortModel,
    shellfish_state: CohortState,
    fish: CohortModel,
    fish_state: CohortState,
    phyto: PhytoParams,
    zooplankton: ZooParams,
    macroalgae: MacroalgaeModel,
    nutrients: NutrientModel,
    harvest: HarvestPlan,

    recorder: SeriesRecorder,
    n_steps: usize,
    current_step: usize,
}

impl Simulation {
    /// 装配模拟
    ///
    /// 校验输运/驱动数据覆盖完整时间轴；所有参数在此一次性解析。
    pub fn new(inputs: SimulationInputs) -> MbResult<Self> {
        let SimulationInputs {
            transport,
            drivers,
            loads,
            store,
            harvest,
            n_steps,
        } = inputs;

        let n_zones = transport.topology().n_interior();
        if store.n_zones() != n_zones {
            return Err(MbError::config(format!(
                "参数仓库分区数 {} 与拓扑分区数 {} 不一致",
                store.n_zones(),
                n_zones
            )));
        }
        if drivers.n_zones() != n_zones {
            return Err(MbError::config("驱动数据分区数与拓扑不一致"));
        }
        if transport.horizon() < n_steps {
            return Err(MbError::beyond_horizon(n_steps, transport.horizon()));
        }

        let state = ModelState::from_store(&store)?;
        let shellfish = CohortModel::new(CohortParams::shellfish_from_store(&store)?, n_zones)?;
        let shellfish_state =
            CohortState::from_store(&store, "N_SH", "V_SH", "E_SH", "E_R_SH")?;
        let fish = CohortModel::new(CohortParams::fish_from_store(&store)?, n_zones)?;
        let fish_state = CohortState::from_store(&store, "N_F", "V_F", "E_F", "E_R_F")?;
        let phyto = PhytoParams::from_store(&store)?;
        let zooplankton = ZooParams::from_store(&store)?;
        let macroalgae = MacroalgaeModel::new(
            MacroalgaeParams::from_store(&store)?,
            state.get(VariableKind::Macroalgae).to_vec(),
        );
        let nutrients = NutrientModel::new(NutrientParams::from_store(&store)?);
        let harvest = HarvestPlan::from_config(&harvest);

        info!(
            "模拟装配完成: {} 个内部分区, {} 个时间步",
            n_zones, n_steps
        );

        Ok(Self {
            transport,
            drivers,
            loads,
            store,
            state,
            shellfish,
            shellfish_state,
            fish,
            fish_state,
            phyto,
            zooplankton,
            macroalgae,
            nutrients,
            harvest,
            recorder: SeriesRecorder::new(),
            n_steps,
            current_step: 0,
        })
    }

    /// 分区拓扑
    pub fn topology(&self) -> &ZoneTopology {
        self.transport.topology()
    }

    /// 当前状态
    pub fn state(&self) -> &ModelState {
        &self.state
    }

    /// 贝类状态
    pub fn shellfish_state(&self) -> &CohortState {
        &self.shellfish_state
    }

    /// 鱼类状态
    pub fn fish_state(&self) -> &CohortState {
        &self.fish_state
    }

    /// 记录器
    pub fn recorder(&self) -> &SeriesRecorder {
        &self.recorder
    }

    /// 当前时间步
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// 总时间步数
    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    /// 推进一个时间步
    pub fn step(&mut self) -> MbResult<StepRecord> {
        let t = self.current_step;
        if t >= self.n_steps {
            return Err(MbError::internal(format!("时间轴已耗尽: step {t}")));
        }

        // (1) 驱动与几何
        let drivers = self.drivers.sample(t);
        let volumes = self.transport.interior_volumes(t)?;
        let depth = self.transport.topology().depths(&volumes);

        // 旧状态快照（显式格式：本步写入的值不再被读取）
        let phy_old = self.state.get(VariableKind::Phytoplankton).to_vec();
        let zoo_old = self.state.get(VariableKind::Zooplankton).to_vec();
        let ma_old = self.state.get(VariableKind::Macroalgae).to_vec();
        let qn_old = self.state.get(VariableKind::QuotaN).to_vec();
        let qp_old = self.state.get(VariableKind::QuotaP).to_vec();
        let nh4_old = self.state.get(VariableKind::Ammonium).to_vec();
        let no3_old = self.state.get(VariableKind::Nitrate).to_vec();
        let on_old = self.state.get(VariableKind::OrganicN).to_vec();
        let po4_old = self.state.get(VariableKind::Phosphate).to_vec();
        let op_old = self.state.get(VariableKind::OrganicP).to_vec();
        let pp_old = self.state.get(VariableKind::ParticulateP).to_vec();
        let cbod_old = self.state.get(VariableKind::Cbod).to_vec();
        let do_old = self.state.get(VariableKind::DissolvedOxygen).to_vec();
        let spm = self.state.get(VariableKind::Spm).to_vec();

        // (2) 养殖种群 + 收获事件
        let events = self.harvest.events_at(t);
        let food: Vec<Scalar> = phy_old.iter().zip(&zoo_old).map(|(p, z)| p + z).collect();
        let shellfish_step = self.shellfish.step(
            &mut self.shellfish_state,
            &drivers.temperature_k,
            &food,
            &phy_old,
            &volumes,
            events.shellfish_rate,
            events.shellfish_restock,
        )?;
        let fish_step = self.fish.step(
            &mut self.fish_state,
            &drivers.temperature_k,
            &food,
            &phy_old,
            &volumes,
            events.fish_rate,
            events.fish_restock,
        )?;

        // (3) 浮游生物与大型藻类（严格在种群之后，消费其清滤项）
        let grazing = self.zooplankton.grazing_rate(&phy_old);
        let phyto_step = self.phyto.step(
            &phy_old,
            &nh4_old,
            &no3_old,
            &po4_old,
            &drivers.temperature_c,
            &drivers.irradiance,
            &depth,
            &grazing,
            &shellfish_step.clearance_pressure,
        )?;
        let zoo_step = self.zooplankton.step(
            &zoo_old,
            &grazing,
            &shellfish_step.clearance_pressure,
        )?;
        let macroalgae_step = self.macroalgae.step(
            &ma_old,
            &qn_old,
            &qp_old,
            &nh4_old,
            &no3_old,
            &po4_old,
            &drivers.temperature_c,
            &drivers.salinity,
            &drivers.irradiance,
            events.macroalgae_fraction,
        )?;

        // (4) 营养盐池（上下文集中借出当步的所有计算结果）
        let external = self.loads.concentration_rates(t, &volumes)?;
        let ctx = StepContext {
            step: t,
            drivers,
            volumes,
            depth,
            shellfish: shellfish_step,
            fish: fish_step,
            phyto: phyto_step,
            zooplankton: zoo_step,
            macroalgae: macroalgae_step,
            external,
        };

        let pool_inputs = PoolInputs {
            nh4: &nh4_old,
            no3: &no3_old,
            on: &on_old,
            po4: &po4_old,
            op: &op_old,
            pp: &pp_old,
            cbod: &cbod_old,
            oxygen: &do_old,
            spm: &spm,
            phy: &phy_old,
            zoo: &zoo_old,
            ma: &ma_old,
            temperature: &ctx.drivers.temperature_c,
            salinity: &ctx.drivers.salinity,
            current_speed: &ctx.drivers.current_speed,
            depth: &ctx.depth,
            volumes: &ctx.volumes,
            areas: self.transport.topology().areas(),
            phyto: &ctx.phyto,
            zoo_step: &ctx.zooplankton,
            zoo_params: &self.zooplankton,
            ma_step: &ctx.macroalgae,
            ma_params: self.macroalgae.params(),
            shellfish: &ctx.shellfish,
            shellfish_state: &self.shellfish_state,
            shellfish_params: self.shellfish.params(),
            fish: &ctx.fish,
            fish_state: &self.fish_state,
            fish_params: self.fish.params(),
            external: &ctx.external,
        };
        let pool_updates = self.nutrients.update_all(&pool_inputs)?;

        let mut concentrations: BTreeMap<String, Vec<Scalar>> = BTreeMap::new();
        for update in &pool_updates {
            let old = self.state.get(update.kind);
            concentrations.insert(
                update.kind.name().to_string(),
                update.balance.apply(old, update.floor),
            );
        }
        concentrations.insert(
            VariableKind::Phytoplankton.name().to_string(),
            ctx.phyto.biomass.clone(),
        );
        concentrations.insert(
            VariableKind::Zooplankton.name().to_string(),
            ctx.zooplankton.biomass.clone(),
        );

        // (5) 融合输运步（配对体积快照，边界钉住）
        let report = self.transport.exchange(&mut concentrations, t + 1)?;

        // (6)-(7) 提交、截断、记录
        for (name, values) in concentrations {
            let kind = VariableKind::from_name(&name)
                .ok_or_else(|| MbError::internal(format!("未知输运变量: {name}")))?;
            self.state.commit(kind, values)?;
        }
        self.state
            .commit(VariableKind::Macroalgae, ctx.macroalgae.biomass.clone())?;
        self.state
            .commit(VariableKind::QuotaN, ctx.macroalgae.quota_n.clone())?;
        self.state
            .commit(VariableKind::QuotaP, ctx.macroalgae.quota_p.clone())?;
        self.state.clamp_all();

        self.recorder.record_contributions(&pool_updates, &ctx.volumes);
        self.recorder.record_exchange(&report);
        self.recorder
            .record_state(&self.state, &self.shellfish_state, &self.fish_state);

        let oxygen = self.state.get(VariableKind::DissolvedOxygen);
        let phyto = self.state.get(VariableKind::Phytoplankton);
        let record = StepRecord {
            step: t,
            min_oxygen: oxygen.iter().cloned().fold(f64::INFINITY, f64::min),
            mean_phyto: phyto.iter().sum::<Scalar>() / phyto.len() as Scalar,
        };

        debug!(
            "step {}: DO_min={:.3}, PHY_mean={:.4}",
            t, record.min_oxygen, record.mean_phyto
        );

        self.current_step += 1;
        Ok(record)
        // ctx 在此处随作用域丢弃 —— 逐步缓存自动失效
    }

    /// 推进全部时间步，结束后把终态回写参数仓库
    pub fn run(&mut self) -> MbResult<()> {
        let report_every = (self.n_steps / 20).max(1);
        while self.current_step < self.n_steps {
            let record = self.step()?;
            if (record.step + 1) % report_every == 0 {
                info!(
                    "进度 {}/{}: DO_min={:.3} mg/L, PHY_mean={:.4} mgC/L",
                    record.step + 1,
                    self.n_steps,
                    record.min_oxygen,
                    record.mean_phyto
                );
            }
        }
        self.state.write_back(&mut self.store)?;
        Ok(())
    }

    /// 运行结束后的参数仓库（含回写的终态）
    pub fn store(&self) -> &ParameterStore {
        &self.store
    }

    /// 目标函数标量
    ///
    /// 有观测记录时为匹配记录的平均绝对误差；否则为该变量全程
    /// 全分区均值。
    pub fn objective(&self, variable: &str, observations: &[Observation]) -> MbResult<Scalar> {
        let series = self
            .recorder
            .series(variable)
            .ok_or_else(|| MbError::invalid_input(format!("未记录的变量: {variable}")))?;

        let matched: Vec<&Observation> = observations
            .iter()
            .filter(|o| o.variable == variable && o.step < series.len())
            .collect();

        if matched.is_empty() {
            let mut sum = 0.0;
            let mut count = 0usize;
            for row in series {
                for v in row {
                    sum += v;
                    count += 1;
                }
            }
            if count == 0 {
                return Err(MbError::invalid_input("时序为空"));
            }
            return Ok(sum / count as Scalar);
        }

        let mut error = 0.0;
        let mut count = 0usize;
        for obs in matched {
            let row = &series[obs.step];
            if obs.zone < row.len() {
                error += (row[obs.zone] - obs.value).abs();
                count += 1;
            }
        }
        if count == 0 {
            return Err(MbError::invalid_input("没有可匹配的观测记录"));
        }
        Ok(error / count as Scalar)
    }
}
