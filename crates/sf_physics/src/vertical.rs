// crates/sf_physics/src/vertical.rs

//! 垂向通量：入渗与补给
//!
//! 每个单元独立计算，数据并行。大孔隙状态在每次评估中重新分类并写回
//! `ps.macpore_status`，补给计算紧接着读取同一次评估的分类结果。

use crate::closures::{avg_kv, eff_kinf, kr_func, macropore_status, psi};
use crate::context::KernelOptions;
use crate::element::{Element, LandSurfaceState, PhysState, Soil, Topo, WaterFlux, WaterState};
use crate::parallel::for_each_mut;
use crate::types::MacroporeRegime;
use sf_config::ConductivityAveraging;
use sf_foundation::constants::{DEPRSTG, PSIMIN, SATMIN};

/// 对所有单元计算入渗与补给
///
/// `dt` 为宏步长，地表蓄水按 `surf / dt` 折算为可用施加速率。
pub fn vertical_flow(elements: &mut [Element], dt: f64, opts: &KernelOptions, parallel: bool) {
    for_each_mut(elements, parallel, |elem| {
        let lsm = if opts.land_surface { elem.lsm.as_ref() } else { None };

        elem.wf.infil = infiltration(
            &elem.ws,
            &elem.wf,
            &elem.topo,
            &elem.soil,
            &mut elem.ps,
            lsm,
            dt,
            opts.land_surface,
        );

        elem.wf.rechg = recharge(&elem.ws, &elem.wf, &elem.ps, &elem.soil, opts.averaging);
    });
}

/// 入渗速率 [m/s]
///
/// 结果不超过施加速率 `pcpdrp + surf/dt`，并按地表湿润比例缩放；
/// 陆面耦合开启时再乘以冻土折减系数。土柱已饱和时为零。
#[allow(clippy::too_many_arguments)]
pub fn infiltration(
    ws: &WaterState,
    wf: &WaterFlux,
    topo: &Topo,
    soil: &Soil,
    ps: &mut PhysState,
    lsm: Option<&LandSurfaceState>,
    dt: f64,
    land_surface: bool,
) -> f64 {
    if ws.unsat + ws.gw > soil.depth {
        return 0.0;
    }

    let applrate = wf.pcpdrp + ws.surf / dt;
    let wetfrac = (ws.surfh / DEPRSTG).clamp(0.0, 1.0);

    let mut infil = if ws.gw > soil.depth - soil.dinf {
        // 地下水进入入渗层：按饱和处理
        let grad = saturated_gradient(ws, topo, soil.dinf);

        let satn = 1.0;
        let kr = kr_func(soil.alpha, soil.beta, satn);

        ps.macpore_status = if soil.areafh == 0.0 {
            MacroporeRegime::MatrixControlled
        } else {
            macropore_status(soil, grad, kr, applrate)
        };

        let kinf = if grad < 0.0 {
            // 向上流动时大孔隙完全参与
            soil.kmacv * soil.areafh + soil.kinfv * (1.0 - soil.areafh)
        } else {
            eff_kinf(soil, kr, satn, ps.macpore_status)
        };

        kinf * grad
    } else {
        let deficit = soil.depth - ws.gw;
        let satn = match lsm {
            Some(l) => l.saturation(),
            None => ws.unsat / deficit,
        }
        .clamp(SATMIN, 1.0);

        let psi_u = psi(satn, soil.alpha, soil.beta).max(PSIMIN);
        let h_u = psi_u + topo.zmax - 0.5 * soil.dinf;
        let mut grad = (0.5 * ws.surfh + topo.zmax - h_u) / (0.5 * (ws.surfh + soil.dinf));
        if ws.surfh < 0.0 && grad > 0.0 {
            grad = 0.0;
        }

        let kr = kr_func(soil.alpha, soil.beta, satn);

        ps.macpore_status = if soil.areafh == 0.0 {
            MacroporeRegime::MatrixControlled
        } else {
            macropore_status(soil, grad, kr, applrate)
        };

        let kinf = eff_kinf(soil, kr, satn, ps.macpore_status);
        (kinf * grad).max(0.0)
    };

    infil = infil.min(applrate) * wetfrac;

    if land_surface {
        infil *= ps.fcr;
    }

    infil
}

/// 入渗层饱和时的水力梯度
///
/// 地表水头为负时不向下驱动；正梯度下限为 1。
#[inline]
fn saturated_gradient(ws: &WaterState, topo: &Topo, dinf: f64) -> f64 {
    let grad = (ws.surfh + topo.zmax - (ws.gw + topo.zmin)) / dinf;
    if ws.surfh < 0.0 && grad > 0.0 {
        0.0
    } else if grad > 0.0 && grad < 1.0 {
        1.0
    } else {
        grad
    }
}

/// 补给速率 [m/s]（正值向下）
///
/// 地下水位进入入渗层时补给等于入渗。非饱和带为空时不向下补给，
/// 地下水为空时不向上补给。
pub fn recharge(
    ws: &WaterState,
    wf: &WaterFlux,
    ps: &PhysState,
    soil: &Soil,
    averaging: ConductivityAveraging,
) -> f64 {
    if ws.gw > soil.depth - soil.dinf {
        return wf.infil;
    }

    let deficit = soil.depth - ws.gw;
    let satn = (ws.unsat / deficit).clamp(SATMIN, 1.0);

    let kr = kr_func(soil.alpha, soil.beta, satn);
    let psi_u = psi(satn, soil.alpha, soil.beta);

    let grad = (0.5 * deficit + psi_u) / (0.5 * (deficit + ws.gw));
    let kavg = avg_kv(soil, deficit, ws.gw, ps.macpore_status, kr, averaging);

    let rechg = kavg * grad;

    if (rechg > 0.0 && ws.unsat <= 0.0) || (rechg < 0.0 && ws.gw <= 0.0) {
        0.0
    } else {
        rechg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soil() -> Soil {
        Soil {
            depth: 2.0,
            ksath: 1e-5,
            ksatv: 5e-6,
            kinfv: 8e-6,
            kmach: 1e-4,
            kmacv: 5e-5,
            dinf: 0.1,
            dmac: 0.5,
            alpha: 2.0,
            beta: 1.5,
            porosity: 0.4,
            areafh: 0.01,
            areafv: 0.01,
        }
    }

    fn topo() -> Topo {
        Topo {
            area: 100.0,
            zmin: 0.0,
            zmax: 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_saturated_column_no_infiltration() {
        let ws = WaterState::from_storages(0.1, 1.0, 1.5);
        let wf = WaterFlux { pcpdrp: 1e-5, ..Default::default() };
        let mut ps = PhysState::default();
        let infil = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, None, 60.0, false);
        assert_eq!(infil, 0.0);
    }

    #[test]
    fn test_dry_surface_no_infiltration() {
        // 无积水时湿润比例为零
        let ws = WaterState::from_storages(0.0, 0.2, 1.0);
        let wf = WaterFlux { pcpdrp: 1e-5, ..Default::default() };
        let mut ps = PhysState::default();
        let infil = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, None, 60.0, false);
        assert_eq!(infil, 0.0);
    }

    #[test]
    fn test_infiltration_bounded_by_application() {
        let ws = WaterState::from_storages(0.01, 0.2, 1.0);
        let wf = WaterFlux { pcpdrp: 1e-3, ..Default::default() };
        let mut ps = PhysState::default();
        let dt = 60.0;
        let infil = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, None, dt, false);
        assert!(infil > 0.0);
        assert!(infil <= wf.pcpdrp + ws.surf / dt);
    }

    #[test]
    fn test_saturated_gradient_floor_and_clamp() {
        let t = topo();
        // (0.01 + 2 - 1.95) / 0.1 = 0.6，抬升到 1
        let ws = WaterState::from_storages(0.01, 0.0, 1.95);
        assert_eq!(saturated_gradient(&ws, &t, 0.1), 1.0);

        // (0.05 + 2 - 1.91) / 0.1 = 1.4，保持不变
        let ws = WaterState::from_storages(0.05, 0.0, 1.91);
        assert!((saturated_gradient(&ws, &t, 0.1) - 1.4).abs() < 1e-12);

        // 地表水头为负且梯度为正：截断为零
        let ws = WaterState { surf: -0.01, unsat: 0.0, gw: 1.95, surfh: -0.01 };
        assert_eq!(saturated_gradient(&ws, &t, 0.1), 0.0);

        // 地下水头高于地表：负梯度原样返回
        let high = Topo { zmin: 0.5, ..t };
        let ws = WaterState::from_storages(0.01, 0.0, 1.95);
        assert!((saturated_gradient(&ws, &high, 0.1) + 4.4).abs() < 1e-12);
    }

    #[test]
    fn test_macropore_zone_gradient_floor() {
        // 地下水进入入渗层，梯度 0.6 抬升到 1，kr(1) = 1
        let s = soil();
        let ws = WaterState::from_storages(0.01, 0.0, 1.95);
        let wf = WaterFlux { pcpdrp: 1e-3, ..Default::default() };
        let mut ps = PhysState::default();
        let infil = infiltration(&ws, &wf, &topo(), &s, &mut ps, None, 60.0, false);

        assert_eq!(ps.macpore_status, MacroporeRegime::MacroporeControlled);
        // 8e-6 × 0.99 + 5e-5 × 0.01
        assert!((infil - 8.42e-6).abs() < 1e-15);
    }

    #[test]
    fn test_macropore_zone_upward_flow() {
        // 地下水头 2.45 m 高于地表 2.01 m，梯度 -4.4
        let s = soil();
        let t = Topo { zmin: 0.5, ..topo() };
        let ws = WaterState::from_storages(0.01, 0.0, 1.95);
        let wf = WaterFlux::default();
        let mut ps = PhysState::default();
        // 施加速率 1e-8 很小，分类为基质控制，但向上流动仍用大孔隙加权导水率
        let infil = infiltration(&ws, &wf, &t, &s, &mut ps, None, 1e6, false);

        assert_eq!(ps.macpore_status, MacroporeRegime::MatrixControlled);
        let expected = -(s.kmacv * s.areafh + s.kinfv * (1.0 - s.areafh)) * 4.4;
        assert!((infil - expected).abs() < 1e-15);
        assert!((infil + 3.7048e-5).abs() < 1e-15);
    }

    #[test]
    fn test_frozen_soil_factor() {
        let ws = WaterState::from_storages(0.01, 0.2, 1.0);
        let wf = WaterFlux { pcpdrp: 1e-3, ..Default::default() };
        let mut ps = PhysState { fcr: 0.5, ..Default::default() };
        let free = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, None, 60.0, false);
        let frozen = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, None, 60.0, true);
        assert!((frozen - 0.5 * free).abs() < 1e-18);
    }

    #[test]
    fn test_no_macropore_area_is_matrix() {
        let ws = WaterState::from_storages(0.05, 0.2, 1.0);
        let wf = WaterFlux { pcpdrp: 1.0, ..Default::default() };
        let mut ps = PhysState {
            macpore_status: MacroporeRegime::MacroporeControlled,
            ..Default::default()
        };
        let s = Soil { areafh: 0.0, ..soil() };
        infiltration(&ws, &wf, &topo(), &s, &mut ps, None, 60.0, false);
        assert_eq!(ps.macpore_status, MacroporeRegime::MatrixControlled);
    }

    #[test]
    fn test_land_surface_saturation_used() {
        let ws = WaterState::from_storages(0.05, 0.2, 1.0);
        let wf = WaterFlux { pcpdrp: 1e-3, ..Default::default() };
        let wet = LandSurfaceState { sh2o_top: 0.4, smcmin: 0.05, smcmax: 0.4 };
        let dry = LandSurfaceState { sh2o_top: 0.1, smcmin: 0.05, smcmax: 0.4 };
        let mut ps = PhysState::default();
        let i_wet = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, Some(&wet), 60.0, false);
        let i_dry = infiltration(&ws, &wf, &topo(), &soil(), &mut ps, Some(&dry), 60.0, false);
        assert!(i_dry >= i_wet);
    }

    #[test]
    fn test_recharge_equals_infiltration_near_surface() {
        let ws = WaterState::from_storages(0.0, 0.0, 1.95);
        let wf = WaterFlux { infil: 3e-6, ..Default::default() };
        let r = recharge(&ws, &wf, &PhysState::default(), &soil(), ConductivityAveraging::Arithmetic);
        assert_eq!(r, 3e-6);
    }

    #[test]
    fn test_recharge_sign_guards() {
        let s = soil();
        // 非饱和带为空：不向下补给
        let ws = WaterState::from_storages(0.0, 0.0, 1.0);
        let r = recharge(&ws, &WaterFlux::default(), &PhysState::default(), &s, ConductivityAveraging::Arithmetic);
        assert!(r <= 0.0);

        // 地下水为空：不向上补给
        let ws = WaterState::from_storages(0.0, 1.5, 0.0);
        let r = recharge(&ws, &WaterFlux::default(), &PhysState::default(), &s, ConductivityAveraging::Arithmetic);
        assert!(r >= 0.0);
    }

    #[test]
    fn test_wet_unsat_drains_downward() {
        let ws = WaterState::from_storages(0.0, 0.9, 1.0);
        let r = recharge(&ws, &WaterFlux::default(), &PhysState::default(), &soil(), ConductivityAveraging::Harmonic);
        assert!(r > 0.0);
    }
}
