// crates/sf_physics/src/rhs.rs

//! 右端项评估
//!
//! 外部求解器在每次内部迭代时调用 [`RhsEvaluator::compute_rhs`]：
//!
//! ```text
//! y ──load──> 单元/河段状态 ──lateral──> vertical ──river──> 通量 ──assemble──> dy
//! ```
//!
//! `y` 只读；单元/河段记录作为评估器的工作区，每次调用都完全重写。

use crate::context::{KernelOptions, SimulationContext};
use crate::element::WaterState;
use crate::lateral::lateral_flow;
use crate::parallel::for_each_mut;
use crate::river::river_flow;
use crate::segment::RiverState;
use crate::state_layout::{BlocksMut, StateBlock, StateView};
use crate::types::RiverFlowPath;
use crate::vertical::vertical_flow;
use crate::watershed::Watershed;
use sf_foundation::constants::DAYINSEC;
use sf_foundation::SfResult;
use std::time::Instant;

/// 右端项计算器
pub trait RhsEvaluator {
    /// 状态向量长度
    fn n_states(&self) -> usize;

    /// 计算 `dy = f(t, y)`
    fn compute_rhs(&mut self, t: f64, y: &[f64], dy: &mut [f64]) -> SfResult<()>;
}

/// 流域右端项
pub struct WatershedRhs<'a> {
    ctx: &'a mut SimulationContext,
}

impl<'a> WatershedRhs<'a> {
    /// 绑定上下文
    pub fn new(ctx: &'a mut SimulationContext) -> Self {
        Self { ctx }
    }

    /// 上下文
    pub fn context(&self) -> &SimulationContext {
        &*self.ctx
    }
}

impl RhsEvaluator for WatershedRhs<'_> {
    fn n_states(&self) -> usize {
        self.ctx.layout.len()
    }

    fn compute_rhs(&mut self, _t: f64, y: &[f64], dy: &mut [f64]) -> SfResult<()> {
        let start = Instant::now();
        let ctx = &mut *self.ctx;

        let view = ctx.layout.view(y)?;
        let out = ctx.layout.view_mut(dy)?;

        let opts = KernelOptions::from_config(&ctx.config);
        let parallel = ctx.strategy.is_parallel(
            ctx.watershed.n_elements(),
            ctx.config.parallel.min_parallel_size,
        );
        let dt = ctx.config.time.stepsize;
        let ws = &mut ctx.watershed;

        load_state(ws, &view, parallel);

        lateral_flow(&mut ws.elements, &opts, parallel);
        vertical_flow(&mut ws.elements, dt, &opts, parallel);
        river_flow(&mut ws.elements, &mut ws.rivers, &opts, parallel);

        assemble(ws, out.split());

        ctx.metrics.record(parallel, start.elapsed());
        Ok(())
    }
}

/// 把状态向量写入单元/河段记录
fn load_state(ws: &mut Watershed, view: &StateView<'_>, parallel: bool) {
    let (surf, unsat, gw) = (view.surf(), view.unsat(), view.gw());
    let fbr_unsat = view.block(StateBlock::FbrUnsat);
    let fbr_gw = view.block(StateBlock::FbrGw);

    for_each_mut(&mut ws.elements, parallel, |elem| {
        let i = elem.index.get();
        elem.ws = WaterState::from_storages(surf[i], unsat[i], gw[i]);
        if let Some(b) = elem.bedrock.as_mut() {
            if !fbr_unsat.is_empty() {
                b.unsat = fbr_unsat[i];
                b.gw = fbr_gw[i];
            }
        }
    });

    let (stage, riv_gw) = (view.riv_stage(), view.riv_gw());
    for river in ws.rivers.iter_mut() {
        let i = river.index.get();
        river.ws = RiverState {
            stage: stage[i],
            gw: riv_gw[i],
        };
    }
}

/// 由通量组装状态导数
fn assemble(ws: &Watershed, dy: BlocksMut<'_>) {
    for (i, elem) in ws.elements.iter().enumerate() {
        let wf = &elem.wf;
        let area = elem.topo.area;
        let porosity = elem.soil.porosity;

        dy.surf[i] = wf.pcpdrp - wf.infil - wf.edir_surf - wf.net_ovlflow(area);
        dy.unsat[i] = (wf.infil - wf.rechg - wf.edir_unsat - wf.ett_unsat) / porosity;
        dy.gw[i] = (wf.rechg - wf.edir_gw - wf.ett_gw - wf.net_subsurf(area)) / porosity;
    }

    for (i, river) in ws.rivers.iter().enumerate() {
        let wf = &river.wf;
        let area = river.topo.area;

        let chanl: f64 = RiverFlowPath::ALL
            .iter()
            .filter(|p| p.is_channel())
            .map(|&p| wf[p])
            .sum();
        dy.riv_stage[i] = -chanl / area;

        dy.riv_gw[i] = (-wf[RiverFlowPath::LeftAquif2Aquif]
            - wf[RiverFlowPath::RightAquif2Aquif]
            - wf[RiverFlowPath::DownAquif2Aquif]
            - wf[RiverFlowPath::UpAquif2Aquif]
            + wf[RiverFlowPath::ChanlLkg])
            / area
            / river.matl.porosity;
    }

    if let (Some(du), Some(dg)) = (dy.fbr_unsat, dy.fbr_gw) {
        for (i, elem) in ws.elements.iter().enumerate() {
            let b = elem.bedrock.unwrap_or_default();
            du[i] = b.dunsat_rate;
            dg[i] = b.dgw_rate;
        }
    }

    if let (Some(dsn), Some(dmn)) = (dy.surfn, dy.sminn) {
        for (i, elem) in ws.elements.iter().enumerate() {
            let n = elem.nitrogen.unwrap_or_default();
            dsn[i] = -n.surfn_to_sminn;
            dmn[i] = n.surfn_to_sminn + (n.ndep_to_sminn + n.nfix_to_sminn) / DAYINSEC
                + n.snksrc
                - n.sminn_leach;
        }
    }

    if let (Some(dst), Some(drb)) = (dy.streamn, dy.rivbedn) {
        for (i, river) in ws.rivers.iter().enumerate() {
            let n = river.nitrogen.unwrap_or_default();
            dst[i] = n.streamn_rate;
            drb[i] = n.rivbedn_rate;
        }
    }

    if let Some(dl) = dy.lumped_sminn {
        let n = ws.lumped.unwrap_or_default();
        dl[0] = (n.ndep_to_sminn + n.nfix_to_sminn) / DAYINSEC + n.snksrc - n.sminn_leach;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, LandCover, NitrogenRecord, Soil, Topo};
    use sf_config::{Capabilities, NitrogenMode, SimulationConfig};
    use sf_foundation::{EdgeNeighbor, ElemId};

    fn single(caps: Capabilities) -> SimulationContext {
        let elem = Element::new(
            ElemId(0),
            [EdgeNeighbor::Boundary; 3],
            Topo {
                area: 100.0,
                zmin: 0.0,
                zmax: 2.0,
                edge: [10.0; 3],
                nabr_dist: [5.0; 3],
            },
            Soil {
                depth: 2.0,
                ksath: 1e-5,
                ksatv: 5e-6,
                kinfv: 8e-6,
                kmacv: 5e-5,
                dinf: 0.1,
                dmac: 0.5,
                alpha: 2.0,
                beta: 1.5,
                porosity: 0.4,
                ..Default::default()
            },
            LandCover { rough: 0.05 },
        )
        .with_state(0.0, 0.3, 1.0)
        .with_nitrogen(NitrogenRecord {
            ndep_to_sminn: DAYINSEC * 1e-9,
            sminn_leach: 4e-10,
            ..Default::default()
        });

        let mut config = SimulationConfig::default();
        config.capabilities = caps;
        let ws = Watershed::new(vec![elem], Vec::new()).unwrap();
        SimulationContext::new(config, ws).unwrap()
    }

    #[test]
    fn test_state_size_checked() {
        let mut ctx = single(Capabilities::default());
        let mut rhs = WatershedRhs::new(&mut ctx);
        let y = vec![0.0; 2];
        let mut dy = vec![0.0; 3];
        assert!(rhs.compute_rhs(0.0, &y, &mut dy).is_err());
    }

    #[test]
    fn test_isolated_column_conserves_water() {
        let mut ctx = single(Capabilities::default());
        let y = ctx.initial_state();
        let mut dy = vec![0.0; y.len()];
        let mut rhs = WatershedRhs::new(&mut ctx);
        rhs.compute_rhs(0.0, &y, &mut dy).unwrap();

        // 无降水、无侧向交换：地表+土壤水量变化为零
        let porosity = 0.4;
        let total = dy[0] + porosity * (dy[1] + dy[2]);
        assert!(total.abs() < 1e-18);
        assert_eq!(ctx.metrics.total_calls, 1);
    }

    #[test]
    fn test_nitrogen_rates() {
        let caps = Capabilities {
            nitrogen: NitrogenMode::Distributed,
            ..Default::default()
        };
        let mut ctx = single(caps);
        let y = ctx.initial_state();
        assert_eq!(y.len(), 5);
        let mut dy = vec![0.0; y.len()];
        WatershedRhs::new(&mut ctx).compute_rhs(0.0, &y, &mut dy).unwrap();
        assert_eq!(dy[3], 0.0);
        assert!((dy[4] - (1e-9 - 4e-10)).abs() < 1e-20);
    }
}
