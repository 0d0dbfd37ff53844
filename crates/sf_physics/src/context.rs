// crates/sf_physics/src/context.rs

//! 模拟上下文
//!
//! 以显式上下文对象取代进程级全局变量（单元数、河段数、工程配置）。
//! 所有核心调用都通过引用接收上下文。

use crate::element::{BedrockStore, NitrogenRecord};
use crate::parallel::{KernelMetrics, ParallelStrategy};
use crate::segment::RiverNitrogen;
use crate::state_layout::StateLayout;
use crate::watershed::Watershed;
use sf_config::{ConductivityAveraging, NitrogenMode, RoutingMode, SimulationConfig};
use sf_foundation::SfResult;

/// 通量核选项（从配置中提取的热路径参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelOptions {
    /// 导水率平均方式
    pub averaging: ConductivityAveraging,
    /// 河道演算模式
    pub river_mode: RoutingMode,
    /// 坡面演算模式
    pub surface_mode: RoutingMode,
    /// 陆面耦合
    pub land_surface: bool,
}

impl KernelOptions {
    /// 从配置提取
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            averaging: config.hydraulics.averaging,
            river_mode: config.hydraulics.river_mode,
            surface_mode: config.hydraulics.surface_mode,
            land_surface: config.capabilities.land_surface,
        }
    }
}

/// 模拟上下文
#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// 配置
    pub config: SimulationConfig,
    /// 流域
    pub watershed: Watershed,
    /// 状态向量布局
    pub layout: StateLayout,
    /// 并行策略
    pub strategy: ParallelStrategy,
    /// 评估指标
    pub metrics: KernelMetrics,
}

impl SimulationContext {
    /// 创建上下文
    ///
    /// 校验配置，计算状态布局，并为能力标志要求的可选记录补齐默认值。
    pub fn new(config: SimulationConfig, mut watershed: Watershed) -> SfResult<Self> {
        config.validate()?;

        let caps = config.capabilities;

        if caps.fractured_bedrock {
            for elem in watershed.elements.iter_mut() {
                elem.bedrock.get_or_insert_with(BedrockStore::default);
            }
        }

        match caps.nitrogen {
            NitrogenMode::Distributed => {
                for elem in watershed.elements.iter_mut() {
                    elem.nitrogen.get_or_insert_with(NitrogenRecord::default);
                }
                for river in watershed.rivers.iter_mut() {
                    river.nitrogen.get_or_insert_with(RiverNitrogen::default);
                }
            }
            NitrogenMode::Lumped => {
                watershed.lumped.get_or_insert_with(Default::default);
            }
            NitrogenMode::Disabled => {}
        }

        let layout = StateLayout::new(watershed.n_elements(), watershed.n_rivers(), &caps);

        log::debug!(
            "模拟上下文: {} 单元, {} 河段, 状态向量长度 {}",
            watershed.n_elements(),
            watershed.n_rivers(),
            layout.len()
        );

        Ok(Self {
            config,
            watershed,
            layout,
            strategy: ParallelStrategy::default(),
            metrics: KernelMetrics::default(),
        })
    }

    /// 设置并行策略
    pub fn with_strategy(mut self, strategy: ParallelStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// 通量核选项
    #[inline]
    pub fn kernel_options(&self) -> KernelOptions {
        KernelOptions::from_config(&self.config)
    }

    /// 对给定规模是否并行
    #[inline]
    pub fn use_parallel(&self, n: usize) -> bool {
        self.strategy
            .is_parallel(n, self.config.parallel.min_parallel_size)
    }

    /// 从当前单元/河段状态组装初始状态向量
    pub fn initial_state(&self) -> Vec<f64> {
        let mut y = vec![0.0; self.layout.len()];
        let ws = &self.watershed;

        // 长度由同一布局计算，不会失败
        if let Ok(view) = self.layout.view_mut(&mut y) {
            let blocks = view.split();
            for (i, elem) in ws.elements.iter().enumerate() {
                blocks.surf[i] = elem.ws.surf;
                blocks.unsat[i] = elem.ws.unsat;
                blocks.gw[i] = elem.ws.gw;
            }
            for (i, river) in ws.rivers.iter().enumerate() {
                blocks.riv_stage[i] = river.ws.stage;
                blocks.riv_gw[i] = river.ws.gw;
            }
            if let (Some(fu), Some(fg)) = (blocks.fbr_unsat, blocks.fbr_gw) {
                for (i, elem) in ws.elements.iter().enumerate() {
                    let b = elem.bedrock.unwrap_or_default();
                    fu[i] = b.unsat;
                    fg[i] = b.gw;
                }
            }
            if let (Some(sn), Some(mn)) = (blocks.surfn, blocks.sminn) {
                for (i, elem) in ws.elements.iter().enumerate() {
                    let n = elem.nitrogen.unwrap_or_default();
                    sn[i] = n.surfn;
                    mn[i] = n.sminn;
                }
            }
            if let (Some(st), Some(rb)) = (blocks.streamn, blocks.rivbedn) {
                for (i, river) in ws.rivers.iter().enumerate() {
                    let n = river.nitrogen.unwrap_or_default();
                    st[i] = n.streamn;
                    rb[i] = n.rivbedn;
                }
            }
            if let (Some(l), Some(lumped)) = (blocks.lumped_sminn, ws.lumped) {
                l[0] = lumped.sminn;
            }
        }

        y
    }
}
