// crates/sf_physics/src/closures.rs

//! 本构关系
//!
//! 无状态纯函数，将饱和度、水头、水深映射为导水率、毛管压力和大孔隙状态。
//! 位于热路径，全部 `#[inline]`。
//!
//! # 调用约定
//!
//! - [`psi`] 的定义域为 `satn ∈ (0, 1]`，调用方需先截断到 `SATMIN`
//! - 大孔隙状态不跨调用缓存，每次状态变化后重新分类

use crate::element::Soil;
use crate::types::MacroporeRegime;
use sf_config::ConductivityAveraging;
use sf_foundation::constants::{ALPHA_CRACK, BETA_CRACK, DEPRSTG};

/// van Genuchten 毛管压力水头 [m]（非正）
#[inline]
pub fn psi(satn: f64, alpha: f64, beta: f64) -> f64 {
    -((1.0 / satn).powf(beta / (beta - 1.0)) - 1.0).powf(1.0 / beta) / alpha
}

/// Mualem–van Genuchten 相对导水率
///
/// `satn ∈ [0, 1]` 时返回值在 `[0, 1]` 内。α 不参与计算，保留以与 [`psi`] 对称。
#[inline]
pub fn kr_func(_alpha: f64, beta: f64, satn: f64) -> f64 {
    let m = (beta - 1.0) / beta;
    let t = 1.0 - (1.0 - satn.powf(beta / (beta - 1.0))).powf(m);
    satn.sqrt() * t * t
}

/// 大孔隙状态分类
///
/// 梯度仅在比较时下限截断为 1。
#[inline]
pub fn macropore_status(soil: &Soil, dh_by_dz: f64, kr: f64, applrate: f64) -> MacroporeRegime {
    let grad = dh_by_dz.max(1.0);

    if applrate <= grad * soil.kinfv * kr {
        MacroporeRegime::MatrixControlled
    } else {
        let kmax = grad * (soil.kmacv * soil.areafh + soil.kinfv * (1.0 - soil.areafh) * kr);
        if applrate < kmax {
            MacroporeRegime::ApplicationControlled
        } else {
            MacroporeRegime::MacroporeControlled
        }
    }
}

/// 入渗层有效导水率
///
/// 施加控制状态下，大孔隙项用固定的裂隙形状参数缩放，表示裂隙流加速。
#[inline]
pub fn eff_kinf(soil: &Soil, kr: f64, satn: f64, regime: MacroporeRegime) -> f64 {
    match regime {
        MacroporeRegime::MatrixControlled => soil.kinfv * kr,
        MacroporeRegime::ApplicationControlled => {
            soil.kinfv * (1.0 - soil.areafh) * kr
                + soil.kmacv * soil.areafh * kr_func(ALPHA_CRACK, BETA_CRACK, satn)
        }
        MacroporeRegime::MacroporeControlled => {
            soil.kinfv * (1.0 - soil.areafh) * kr + soil.kmacv * soil.areafh
        }
    }
}

/// 垂向有效导水率
#[inline]
pub fn eff_kv(soil: &Soil, kr: f64, regime: MacroporeRegime) -> f64 {
    match regime {
        MacroporeRegime::MatrixControlled => soil.ksatv * kr,
        MacroporeRegime::ApplicationControlled => {
            soil.ksatv * (1.0 - soil.areafh) * kr + soil.kmacv * soil.areafh * kr
        }
        MacroporeRegime::MacroporeControlled => {
            soil.ksatv * (1.0 - soil.areafh) * kr + soil.kmacv * soil.areafh
        }
    }
}

/// 三层厚度加权垂向导水率（大孔隙层 / 大孔隙下基质 / 饱和带）
pub fn avg_kv(
    soil: &Soil,
    deficit: f64,
    gw: f64,
    regime: MacroporeRegime,
    kr: f64,
    averaging: ConductivityAveraging,
) -> f64 {
    let k1 = eff_kv(soil, kr, regime);
    let k3 = soil.ksatv;

    let layers = if deficit > soil.dmac {
        [
            (k1, soil.dmac),
            (kr * soil.ksatv, deficit - soil.dmac),
            (k3, gw),
        ]
    } else {
        [
            (k1, deficit),
            (
                soil.kmacv * soil.areafh + soil.ksatv * (1.0 - soil.areafh),
                soil.dmac - deficit,
            ),
            (k3, gw - (soil.dmac - deficit)),
        ]
    };

    averaging.weighted(&layers)
}

/// 水平有效导水率
///
/// 地下水位进入大孔隙层时，按厚度混合大孔隙与基质导水率。
#[inline]
pub fn eff_kh(soil: &Soil, gw: f64) -> f64 {
    let gw = gw.max(0.0);

    if soil.areafv > 0.0 && gw > soil.depth - soil.dmac {
        let k1 = soil.kmach * soil.areafv + soil.ksath * (1.0 - soil.areafv);
        let k2 = soil.ksath;
        let d1 = if gw > soil.depth {
            soil.dmac
        } else {
            gw - (soil.depth - soil.dmac)
        };
        let d2 = soil.depth - soil.dmac;
        (k1 * d1 + k2 * d2) / (d1 + d2)
    } else {
        soil.ksath
    }
}

/// 两值导水率平均
#[inline]
pub fn average_conductivity(k1: f64, k2: f64, mode: ConductivityAveraging) -> f64 {
    mode.mean(k1, k2)
}

/// 迎风过流水深（地下水 / 河道）
///
/// `diff > 0` 取本侧，否则取邻侧，负值截断为零。
#[inline]
pub fn avg_h(diff: f64, h: f64, h_nabr: f64) -> f64 {
    let upwind = if diff > 0.0 { h } else { h_nabr };
    upwind.max(0.0)
}

/// 迎风坡面过流水深，扣除洼地蓄水
#[inline]
pub fn avg_h_surf(diff: f64, hsurf: f64, hnabr: f64) -> f64 {
    let upwind = if diff > 0.0 { hsurf } else { hnabr };
    if upwind > DEPRSTG {
        upwind - DEPRSTG
    } else {
        0.0
    }
}

/// Manning 公式
///
/// `Q = A · h^(2/3) · grad / (√sf · n)`，`grad` 保留符号，`sf` 为正的摩阻坡降。
#[inline]
pub fn overland_flow(avg_h: f64, grad: f64, sf: f64, crossa: f64, rough: f64) -> f64 {
    crossa * avg_h.powf(2.0 / 3.0) * grad / (sf.sqrt() * rough)
}
