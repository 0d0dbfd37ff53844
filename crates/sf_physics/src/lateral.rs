// crates/sf_physics/src/lateral.rs

//! 单元间侧向通量
//!
//! 对每条"单元-单元"边计算地下水 Darcy 流和坡面 Manning 流。
//! 流域边界边通量为零；河段边由河道核写入，此处不触碰。
//!
//! 计算分两步：只读地收集每个单元三条边的结果，再逐单元写回。
//! 两侧单元分别计算同一条边，通量反对称。

use crate::closures::{avg_h, avg_h_surf, eff_kh, overland_flow};
use crate::context::KernelOptions;
use crate::element::Element;
use crate::parallel::collect_indexed;
use sf_config::RoutingMode;
use sf_foundation::constants::GRADMIN;
use sf_foundation::{EdgeNeighbor, NUM_EDGE};

/// 单条边的计算结果
#[derive(Debug, Clone, Copy, Default)]
struct EdgeFlux {
    subsurf: f64,
    ovlflow: f64,
    subvelo: f64,
    subdist: f64,
    subarea: f64,
}

/// 计算所有单元间边通量
pub fn lateral_flow(elements: &mut [Element], opts: &KernelOptions, parallel: bool) {
    let updates: Vec<[Option<EdgeFlux>; NUM_EDGE]> = {
        let elems: &[Element] = elements;
        collect_indexed(elems.len(), parallel, |i| {
            let elem = &elems[i];
            let mut out = [None; NUM_EDGE];
            for (j, slot) in out.iter_mut().enumerate() {
                *slot = match elem.nabr[j] {
                    EdgeNeighbor::Element(k) => Some(edge_flux(elem, &elems[k.get()], j, opts)),
                    EdgeNeighbor::Boundary => Some(EdgeFlux::default()),
                    EdgeNeighbor::River(_) => None,
                };
            }
            out
        })
    };

    for (elem, edges) in elements.iter_mut().zip(updates) {
        for (j, edge) in edges.iter().enumerate() {
            if let Some(e) = edge {
                elem.wf.subsurf[j] = e.subsurf;
                elem.wf.ovlflow[j] = e.ovlflow;
                elem.diag.subvelo[j] = e.subvelo;
                elem.diag.subdist[j] = e.subdist;
                elem.diag.subarea[j] = e.subarea;
            }
        }
    }
}

/// 单元 `elem` 第 `j` 条边流向邻居 `nabr` 的通量（正值流出）
fn edge_flux(elem: &Element, nabr: &Element, j: usize, opts: &KernelOptions) -> EdgeFlux {
    let edge = elem.topo.edge[j];
    let dist = elem.topo.nabr_dist[j];

    // 地下水
    let diff = elem.groundwater_head() - nabr.groundwater_head();
    let h = avg_h(diff, elem.ws.gw, nabr.ws.gw);
    let grad = diff / dist;
    let k = opts
        .averaging
        .mean(eff_kh(&elem.soil, elem.ws.gw), eff_kh(&nabr.soil, nabr.ws.gw));
    let subsurf = k * grad * h * edge;

    // 坡面
    let diff = match opts.surface_mode {
        RoutingMode::Kinematic => elem.topo.zmax - nabr.topo.zmax,
        RoutingMode::Diffusive => elem.surface_head() - nabr.surface_head(),
    };
    let hs = avg_h_surf(diff, elem.ws.surfh, nabr.ws.surfh);
    let sgrad = diff / dist;
    let sf = sgrad.abs().max(GRADMIN);
    let rough = 0.5 * (elem.lc.rough + nabr.lc.rough);
    let ovlflow = overland_flow(hs, sgrad, sf, hs * edge, rough);

    EdgeFlux {
        subsurf,
        ovlflow,
        subvelo: k * grad,
        subdist: dist,
        subarea: h * edge,
    }
}
