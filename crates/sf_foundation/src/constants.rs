// crates/sf_foundation/src/constants.rs

//! 水文物理常数与数值阈值
//!
//! 本构关系和通量核中使用的所有固定常数集中于此，
//! 取代散落的预处理宏。

/// 重力加速度 [m/s²]
pub const GRAV: f64 = 9.80665;

/// 洼地蓄水深度阈值 [m]
///
/// 地表积水低于此值时不产生坡面流，入渗湿润比例按此线性渐变。
pub const DEPRSTG: f64 = 1e-4;

/// 最小饱和度，用于 van Genuchten 关系避免 satn→0 奇异
pub const SATMIN: f64 = 0.1;

/// 毛管压力下限 [m]
pub const PSIMIN: f64 = -70.0;

/// 河道等效宽度计算中的最小水深 [m]
pub const RIVDPTHMIN: f64 = 0.05;

/// 河道摩阻坡降下限
pub const RIVGRADMIN: f64 = 0.05;

/// 坡面摩阻坡降下限
pub const GRADMIN: f64 = 5e-8;

/// 一天的秒数
pub const DAYINSEC: f64 = 86_400.0;

/// 一年的天数（spin-up 周期换算）
pub const DAYS_IN_YEAR: f64 = 365.0;

/// Spin-up 稳态判据：土壤碳年均变化率容差 [gC m⁻² yr⁻¹]
pub const SPINUP_TOLERANCE: f64 = 0.5;

/// 裂隙流形状参数 α（应用控制状态下大孔隙相对导水率）
pub const ALPHA_CRACK: f64 = 10.0;

/// 裂隙流形状参数 β
pub const BETA_CRACK: f64 = 2.0;

/// 将秒数换算为年数
#[inline]
pub fn seconds_to_years(seconds: f64) -> f64 {
    seconds / DAYINSEC / DAYS_IN_YEAR
}
