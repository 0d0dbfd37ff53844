// crates/sf_physics/src/river.rs

//! 河道通量核
//!
//! 三个阶段：
//!
//! 1. 逐河段（可并行，只读单元）：下游河道/河床含水层出流、两岸交换、河床渗漏，
//!    以及对应单元河段边的通量与诊断量，收集为 [`SegmentResult`]
//! 2. 串行写回：河段通量与单元边通量
//! 3. 串行下游累加：`UpChanl2Chanl` / `UpAquif2Aquif` 先清零，
//!    再由各上游河段的出流累加
//!
//! 多个上游河段汇入同一下游时，阶段 3 的串行累加保证无写冲突。

use crate::closures::{avg_h, eff_kh, overland_flow};
use crate::context::KernelOptions;
use crate::element::Element;
use crate::parallel::collect_indexed;
use crate::segment::{Material, RiverBc, RiverSegment, RiverState, RiverTopo, Shape};
use crate::types::{BankSide, Downstream, OutletCondition, RiverFlowPath, NUM_RIVFLOW};
use sf_config::{ConductivityAveraging, RoutingMode};
use sf_foundation::constants::{DEPRSTG, GRAV, RIVGRADMIN};
use sf_foundation::ElemId;

/// 单元河段边的写回记录
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeWrite {
    /// 单元
    pub elem: ElemId,
    /// 边序号
    pub edge: usize,
    /// 坡面出流（正值流出单元）
    pub ovlflow: f64,
    /// 地下出流（正值流出单元）
    pub subsurf: f64,
    /// Darcy 速度
    pub subvelo: f64,
    /// 输运距离
    pub subdist: f64,
    /// 过流断面积
    pub subarea: f64,
}

/// 单个河段阶段 1 的结果
#[derive(Debug, Clone, Default)]
pub struct SegmentResult {
    /// 通量（累加项为零）
    pub rivflow: [f64; NUM_RIVFLOW],
    /// 两岸单元边写回
    pub edges: [Option<EdgeWrite>; 2],
}

/// 河岸一侧交换量
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BankExchange {
    /// 河道→含水层通量
    pub flux: f64,
    /// Darcy 速度
    pub subvelo: f64,
    /// 过流断面积
    pub subarea: f64,
}

/// 计算所有河段通量并写回单元河段边
pub fn river_flow(
    elements: &mut [Element],
    rivers: &mut [RiverSegment],
    opts: &KernelOptions,
    parallel: bool,
) {
    let results: Vec<SegmentResult> = {
        let elems: &[Element] = elements;
        let rivs: &[RiverSegment] = rivers;
        collect_indexed(rivs.len(), parallel, |i| segment_flow(elems, rivs, i, opts))
    };

    let mut down_flows = Vec::with_capacity(results.len());
    for (river, result) in rivers.iter_mut().zip(results) {
        river.wf.rivflow = result.rivflow;
        for w in result.edges.into_iter().flatten() {
            let elem = &mut elements[w.elem.get()];
            elem.wf.ovlflow[w.edge] = w.ovlflow;
            elem.wf.subsurf[w.edge] = w.subsurf;
            elem.diag.subvelo[w.edge] = w.subvelo;
            elem.diag.subdist[w.edge] = w.subdist;
            elem.diag.subarea[w.edge] = w.subarea;
        }
        down_flows.push((
            river.down,
            river.wf[RiverFlowPath::DownChanl2Chanl],
            river.wf[RiverFlowPath::DownAquif2Aquif],
        ));
    }

    for (down, chanl, aquif) in down_flows {
        if let Downstream::Segment(d) = down {
            let target = &mut rivers[d.get()].wf;
            target[RiverFlowPath::UpChanl2Chanl] -= chanl;
            target[RiverFlowPath::UpAquif2Aquif] -= aquif;
        }
    }
}

/// 单元某侧的水平有效导水率
#[inline]
fn side_effk(elements: &[Element], side: Option<ElemId>) -> Option<f64> {
    side.map(|e| {
        let elem = &elements[e.get()];
        eff_kh(&elem.soil, elem.ws.gw)
    })
}

/// 河段的代表性导水率：存在的两岸取平均，无岸单元时取河床水平导水率
fn segment_effk(left: Option<f64>, right: Option<f64>, matl: &Material) -> f64 {
    match (left, right) {
        (Some(l), Some(r)) => 0.5 * (l + r),
        (Some(k), None) | (None, Some(k)) => k,
        (None, None) => matl.ksath,
    }
}

/// 阶段 1：单个河段
fn segment_flow(
    elements: &[Element],
    rivers: &[RiverSegment],
    i: usize,
    opts: &KernelOptions,
) -> SegmentResult {
    let river = &rivers[i];
    let mut result = SegmentResult::default();
    let rf = &mut result.rivflow;

    let effk_left = side_effk(elements, river.left);
    let effk_right = side_effk(elements, river.right);
    let effk = segment_effk(effk_left, effk_right, &river.matl);

    match river.down {
        Downstream::Segment(d) => {
            let down = &rivers[d.get()];
            rf[RiverFlowPath::DownChanl2Chanl.index()] =
                chan_flow_river_to_river(river, down, opts.river_mode);

            let effk_down = segment_effk(
                side_effk(elements, down.left),
                side_effk(elements, down.right),
                &down.matl,
            );
            rf[RiverFlowPath::DownAquif2Aquif.index()] =
                sub_flow_river_to_river(river, effk, down, effk_down, opts.averaging);
        }
        Downstream::Outlet(cond) => {
            rf[RiverFlowPath::DownChanl2Chanl.index()] =
                outlet_flux(cond, &river.ws, &river.topo, &river.shp, &river.matl, &river.bc);
            rf[RiverFlowPath::DownAquif2Aquif.index()] = 0.0;
        }
    }

    let sides = [
        (BankSide::Left, river.left, effk_left, river.topo.dist_left),
        (BankSide::Right, river.right, effk_right, river.topo.dist_right),
    ];

    for (slot, (side, elem_id, side_k, dist)) in result.edges.iter_mut().zip(sides) {
        let (Some(e), Some(k)) = (elem_id, side_k) else {
            continue;
        };
        let elem = &elements[e.get()];

        let surf = ovl_flow_elem_to_river(elem, river);
        let chanl = chan_flow_elem_to_river(elem, k, river, dist);
        let aquif = sub_flow_elem_to_river(elem, k, river, effk, dist, opts.averaging);

        rf[side.surf_path().index()] = surf;
        rf[side.aquif_chanl_path().index()] = chanl.flux;
        rf[side.aquif_aquif_path().index()] = aquif;

        if let Some(j) = elem.river_edge(river.index) {
            *slot = Some(EdgeWrite {
                elem: e,
                edge: j,
                ovlflow: -surf,
                subsurf: -(chanl.flux + aquif),
                subvelo: chanl.subvelo,
                subdist: elem.topo.nabr_dist[j],
                subarea: chanl.subarea,
            });
        }
    }

    rf[RiverFlowPath::ChanlLkg.index()] =
        chan_leak(&river.ws, &river.topo, &river.shp, &river.matl);

    result
}

/// 河道与岸边单元之间的坡面堰流 [m³/s]（正值由河道流向单元）
///
/// 堰顶取河岸与单元地表的较高者。水头较高一侧决定方向，
/// 低侧水头高于堰顶时为淹没堰，否则为自由堰；单元侧仅在积水超过洼地蓄水时出流。
pub fn ovl_flow_elem_to_river(elem: &Element, river: &RiverSegment) -> f64 {
    let zbank = river.topo.zmax.max(elem.topo.zmax);
    let elem_h = elem.surface_head();
    let rivseg_h = river.stage_head();
    let weir = |dh: f64, h: f64| {
        river.matl.cwr * 2.0 * (2.0 * GRAV).sqrt() * river.shp.length * dh.sqrt() * (h - zbank)
            / 3.0
    };

    if rivseg_h > elem_h {
        if elem_h > zbank {
            weir(rivseg_h - elem_h, rivseg_h)
        } else if zbank < rivseg_h {
            weir(rivseg_h - zbank, rivseg_h)
        } else {
            0.0
        }
    } else if elem.ws.surfh > DEPRSTG {
        if rivseg_h > zbank {
            -weir(elem_h - rivseg_h, elem_h)
        } else if zbank < elem_h {
            -weir(elem_h - zbank, elem_h)
        } else {
            0.0
        }
    } else {
        0.0
    }
}

/// 河段→下游河段河道流 [m³/s]
pub fn chan_flow_river_to_river(
    river: &RiverSegment,
    down: &RiverSegment,
    mode: RoutingMode,
) -> f64 {
    let cs = river.cross_section();
    let cs_down = down.cross_section();

    let avg_perim = 0.5 * (cs.perimeter + cs_down.perimeter);
    let avg_rough = 0.5 * (river.matl.rough + down.matl.rough);
    let distance = 0.5 * (river.shp.length + down.shp.length);

    let diff = match mode {
        RoutingMode::Kinematic => river.topo.zbed - down.topo.zbed,
        RoutingMode::Diffusive => river.stage_head() - down.stage_head(),
    };
    let grad = diff / distance;
    let sf = if grad > 0.0 { grad } else { RIVGRADMIN };

    let avg_area = 0.5 * (cs.area + cs_down.area);
    let hydr = if avg_perim > 0.0 { avg_area / avg_perim } else { 0.0 };

    overland_flow(hydr, grad, sf, cs.area, avg_rough)
}

/// 河床含水层→下游河床含水层 [m³/s]
pub fn sub_flow_river_to_river(
    river: &RiverSegment,
    effk: f64,
    down: &RiverSegment,
    effk_down: f64,
    averaging: ConductivityAveraging,
) -> f64 {
    let diff = river.groundwater_head() - down.groundwater_head();
    let h = avg_h(diff, river.ws.gw, down.ws.gw);
    let avg_wid = 0.5 * (river.shp.width + down.shp.width);
    let distance = 0.5 * (river.shp.length + down.shp.length);
    let grad = diff / distance;
    let k = averaging.mean(effk, effk_down);

    k * grad * h * avg_wid
}

/// 出口边界出流 [m³/s]
pub fn outlet_flux(
    cond: OutletCondition,
    ws: &RiverState,
    topo: &RiverTopo,
    shp: &Shape,
    matl: &Material,
    bc: &RiverBc,
) -> f64 {
    let cs = shp.at_stage(ws.stage);

    match cond {
        OutletCondition::Dirichlet => {
            let total_h = ws.gw + topo.zmin;
            let total_h_down = bc.head + topo.node_zmax - shp.depth;
            let grad = (total_h - total_h_down) / (0.5 * shp.length);
            // 摩阻坡降取绝对值，零梯度时回退到下限以免 0/0
            let sf = if grad != 0.0 { grad.abs() } else { RIVGRADMIN };
            overland_flow(cs.hydraulic_radius(), grad, sf, cs.area, matl.rough)
        }
        OutletCondition::Neumann => bc.flux,
        OutletCondition::ZeroDepthGradient => {
            let grad = (topo.zbed - (topo.node_zmax - shp.depth)) / (0.5 * shp.length);
            grad.max(0.0).sqrt() * cs.area * cs.hydraulic_radius().powf(2.0 / 3.0) / matl.rough
        }
        OutletCondition::CriticalDepth => cs.area * (GRAV * ws.stage.max(0.0)).sqrt(),
    }
}

/// 河道与单元含水层之间的交换 [m³/s]（正值由河道流向单元）
///
/// 过流高度取迎风侧：河道侧为水位，单元侧为高于河床的地下水位部分。
pub fn chan_flow_elem_to_river(
    elem: &Element,
    effk: f64,
    river: &RiverSegment,
    distance: f64,
) -> BankExchange {
    let zbed = river.topo.zbed;
    let zmin = elem.topo.zmin;
    let gw = elem.ws.gw;

    let diff = river.stage_head() - elem.groundwater_head();

    let elem_h = if zmin > zbed {
        gw
    } else if zmin + gw > zbed {
        zmin + gw - zbed
    } else {
        0.0
    };
    let h = avg_h(diff, river.ws.stage, elem_h);
    let grad = diff / distance;
    let k = 0.5 * (effk + river.matl.ksath);

    BankExchange {
        flux: river.shp.length * k * grad * h,
        subvelo: k * grad,
        subarea: h * river.shp.length,
    }
}

/// 河床含水层与单元含水层之间的交换 [m³/s]（正值由河床流向单元）
pub fn sub_flow_elem_to_river(
    elem: &Element,
    effk: f64,
    river: &RiverSegment,
    effk_riv: f64,
    distance: f64,
    averaging: ConductivityAveraging,
) -> f64 {
    let zbed = river.topo.zbed;
    let zmin = elem.topo.zmin;
    let gw = elem.ws.gw;

    let diff = river.groundwater_head() - elem.groundwater_head();

    let elem_h = if zmin > zbed {
        0.0
    } else if zmin + gw > zbed {
        zbed - zmin
    } else {
        gw
    };
    let h = avg_h(diff, river.ws.gw, elem_h);
    let grad = diff / distance;
    let k = averaging.mean(effk, effk_riv);

    river.shp.length * k * grad * h
}

/// 河道→河床含水层渗漏 [m³/s]（正值向下）
pub fn chan_leak(ws: &RiverState, topo: &RiverTopo, shp: &Shape, matl: &Material) -> f64 {
    let diff = if topo.zbed - (ws.gw + topo.zmin) > 0.0 {
        ws.stage
    } else {
        ws.stage + topo.zbed - (ws.gw + topo.zmin)
    };

    matl.ksatv * shp.width * shp.length * diff / matl.bedthick
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{LandCover, Soil, Topo};
    use crate::types::ChannelShape;
    use sf_foundation::{EdgeNeighbor, RiverId};

    fn segment(i: usize, down: Downstream, zbed: f64, stage: f64) -> RiverSegment {
        RiverSegment::new(
            RiverId(i),
            None,
            None,
            down,
            Shape::new(ChannelShape::Rectangle, 2.0, 4.0, 100.0),
            RiverTopo {
                zmin: zbed - 5.0,
                zmax: zbed + 2.0,
                zbed,
                node_zmax: zbed + 2.0,
                dist_left: 10.0,
                dist_right: 10.0,
                area: 400.0,
            },
            Material {
                rough: 0.04,
                cwr: 0.6,
                ksath: 1e-4,
                ksatv: 1e-6,
                bedthick: 0.5,
                porosity: 0.3,
            },
        )
        .with_state(stage, 4.0)
    }

    fn bank(zmax: f64, surf: f64, gw: f64) -> Element {
        Element::new(
            ElemId(0),
            [EdgeNeighbor::River(RiverId(0)), EdgeNeighbor::Boundary, EdgeNeighbor::Boundary],
            Topo {
                area: 500.0,
                zmin: zmax - 3.0,
                zmax,
                edge: [100.0, 30.0, 30.0],
                nabr_dist: [10.0, 10.0, 10.0],
            },
            Soil {
                depth: 3.0,
                ksath: 1e-5,
                ..Default::default()
            },
            LandCover { rough: 0.05 },
        )
        .with_state(surf, 0.5, gw)
    }

    #[test]
    fn test_weir_zero_below_bank() {
        let river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 1.0);
        let elem = bank(11.5, 0.1, 2.0);
        assert_eq!(ovl_flow_elem_to_river(&elem, &river), 0.0);
    }

    #[test]
    fn test_weir_direction() {
        let river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 1.0);
        // 单元积水高于堰顶，自由堰流入河道
        let elem = bank(12.0, 0.2, 2.0);
        assert!(ovl_flow_elem_to_river(&elem, &river) < 0.0);

        // 河水漫溢，流向单元
        let flood = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 2.5);
        let dry = bank(12.0, 0.0, 2.0);
        assert!(ovl_flow_elem_to_river(&dry, &flood) > 0.0);
    }

    #[test]
    fn test_weir_symmetry() {
        // 淹没堰：交换两侧水头，通量等值反号
        let river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 2.3);
        let elem = bank(12.0, 0.1, 2.0);
        let forward = ovl_flow_elem_to_river(&elem, &river);

        let river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 2.1);
        let elem = bank(12.0, 0.3, 2.0);
        let backward = ovl_flow_elem_to_river(&elem, &river);

        assert!(forward > 0.0);
        assert!((forward + backward).abs() < 1e-9 * forward.abs());
    }

    #[test]
    fn test_weir_requires_ponding_above_depression_storage() {
        let river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 0.5);
        let mut elem = bank(12.0, 0.0, 2.0);
        // 地表高于河水但无积水
        elem.ws.surfh = 0.5 * DEPRSTG;
        assert_eq!(ovl_flow_elem_to_river(&elem, &river), 0.0);
    }

    #[test]
    fn test_critical_depth_outlet() {
        let river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 1.0);
        let q = outlet_flux(
            OutletCondition::CriticalDepth,
            &river.ws,
            &river.topo,
            &river.shp,
            &river.matl,
            &river.bc,
        );
        assert!((q - 4.0 * (GRAV * 1.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_neumann_outlet() {
        let river = segment(0, Downstream::Outlet(OutletCondition::Neumann), 10.0, 1.0)
            .with_bc(RiverBc { head: 0.0, flux: -0.25 });
        let q = outlet_flux(
            OutletCondition::Neumann,
            &river.ws,
            &river.topo,
            &river.shp,
            &river.matl,
            &river.bc,
        );
        assert_eq!(q, -0.25);
    }

    #[test]
    fn test_chan_leak_disconnected_uses_stage() {
        let mut river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 1.0);
        river.ws.gw = 1.0; // 含水层顶 6 m < 河床 10 m
        let q = chan_leak(&river.ws, &river.topo, &river.shp, &river.matl);
        assert!((q - 1e-6 * 4.0 * 100.0 * 1.0 / 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_downstream_accumulation() {
        let mut rivers = vec![
            segment(0, Downstream::Segment(RiverId(2)), 12.0, 1.0),
            segment(1, Downstream::Segment(RiverId(2)), 12.0, 1.0),
            segment(2, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 1.0),
        ];
        let mut elements: Vec<Element> = Vec::new();
        let opts = KernelOptions::default();
        river_flow(&mut elements, &mut rivers, &opts, false);

        let out0 = rivers[0].wf[RiverFlowPath::DownChanl2Chanl];
        let out1 = rivers[1].wf[RiverFlowPath::DownChanl2Chanl];
        assert!(out0 > 0.0);
        let up = rivers[2].wf[RiverFlowPath::UpChanl2Chanl];
        assert!((up + out0 + out1).abs() < 1e-12);

        // 第二次评估不累积上一次的结果
        river_flow(&mut elements, &mut rivers, &opts, false);
        assert!((rivers[2].wf[RiverFlowPath::UpChanl2Chanl] - up).abs() < 1e-12);
    }

    #[test]
    fn test_bank_edge_written_with_opposite_sign() {
        let mut elements = vec![bank(12.0, 0.3, 2.9)];
        let mut river = segment(0, Downstream::Outlet(OutletCondition::CriticalDepth), 10.0, 0.5);
        river.left = Some(ElemId(0));
        let mut rivers = vec![river];

        river_flow(&mut elements, &mut rivers, &KernelOptions::default(), false);

        let wf = &rivers[0].wf;
        assert!(wf[RiverFlowPath::LeftSurf2Chanl] < 0.0);
        assert_eq!(wf[RiverFlowPath::RightSurf2Chanl], 0.0);
        assert_eq!(elements[0].wf.ovlflow[0], -wf[RiverFlowPath::LeftSurf2Chanl]);
        assert_eq!(
            elements[0].wf.subsurf[0],
            -(wf[RiverFlowPath::LeftAquif2Chanl] + wf[RiverFlowPath::LeftAquif2Aquif])
        );
        assert_eq!(elements[0].diag.subdist[0], 10.0);

        // 重复写入同一条边不改变结果
        let once = (
            elements[0].wf.subsurf[0],
            elements[0].diag.subvelo[0],
            elements[0].diag.subarea[0],
        );
        river_flow(&mut elements, &mut rivers, &KernelOptions::default(), false);
        let twice = (
            elements[0].wf.subsurf[0],
            elements[0].diag.subvelo[0],
            elements[0].diag.subarea[0],
        );
        assert_eq!(once, twice);
    }
}
