// crates/sf_config/src/simulation_config.rs

//! SimulationConfig - 流域模拟配置
//!
//! 所有字段均带 serde 默认值，JSON 中缺省的项使用默认配置。

use serde::{Deserialize, Serialize};
use sf_foundation::constants::{seconds_to_years, DAYINSEC, SPINUP_TOLERANCE};
use std::path::Path;

use crate::error::ConfigError;
use crate::modes::{ConductivityAveraging, NitrogenMode, RoutingMode};

/// 流域模拟配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// 能力标志（取代编译期特性开关）
    #[serde(default)]
    pub capabilities: Capabilities,

    /// 水力学选项
    #[serde(default)]
    pub hydraulics: HydraulicsConfig,

    /// 外部求解器容差与步长界限
    #[serde(default)]
    pub solver: SolverTolerances,

    /// 时间控制（一个强迫周期）
    #[serde(default)]
    pub time: TimeConfig,

    /// Spin-up 控制
    #[serde(default)]
    pub spinup: SpinupConfig,

    /// 并行配置
    #[serde(default)]
    pub parallel: ParallelConfig,
}

/// 能力标志
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// 陆面能量平衡耦合（冻土折减、表层含水量）
    #[serde(default)]
    pub land_surface: bool,

    /// 氮素输运模式
    #[serde(default)]
    pub nitrogen: NitrogenMode,

    /// 裂隙基岩层
    #[serde(default)]
    pub fractured_bedrock: bool,

    /// 生物地球化学日步长（spin-up 需要）
    #[serde(default)]
    pub biogeochemistry: bool,
}

/// 水力学选项
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HydraulicsConfig {
    /// 导水率平均方式
    #[serde(default)]
    pub averaging: ConductivityAveraging,

    /// 河道演算模式
    #[serde(default)]
    pub river_mode: RoutingMode,

    /// 坡面演算模式
    #[serde(default)]
    pub surface_mode: RoutingMode,
}

/// 外部求解器参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverTolerances {
    /// 绝对容差
    #[serde(default = "default_abstol")]
    pub abstol: f64,

    /// 相对容差
    #[serde(default = "default_reltol")]
    pub reltol: f64,

    /// 初始步长 [s]
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,

    /// 最小步长 [s]
    #[serde(default = "default_min_step")]
    pub min_step: f64,

    /// 最大步长 [s]
    #[serde(default = "default_max_step")]
    pub max_step: f64,

    /// 单次调用最大内部步数
    #[serde(default = "default_max_internal_steps")]
    pub max_internal_steps: usize,
}

fn default_abstol() -> f64 { 1e-4 }
fn default_reltol() -> f64 { 1e-3 }
fn default_initial_step() -> f64 { 1.0 }
fn default_min_step() -> f64 { 1e-6 }
fn default_max_step() -> f64 { 600.0 }
fn default_max_internal_steps() -> usize { 100_000 }

impl Default for SolverTolerances {
    fn default() -> Self {
        Self {
            abstol: default_abstol(),
            reltol: default_reltol(),
            initial_step: default_initial_step(),
            min_step: default_min_step(),
            max_step: default_max_step(),
            max_internal_steps: default_max_internal_steps(),
        }
    }
}

/// 时间控制
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 起始时间 [s]
    #[serde(default)]
    pub start_time: f64,

    /// 结束时间 [s]
    #[serde(default = "default_end_time")]
    pub end_time: f64,

    /// 宏步长（两次 summary 之间）[s]
    #[serde(default = "default_stepsize")]
    pub stepsize: f64,
}

fn default_end_time() -> f64 { 365.0 * DAYINSEC }
fn default_stepsize() -> f64 { 3600.0 }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            start_time: 0.0,
            end_time: default_end_time(),
            stepsize: default_stepsize(),
        }
    }
}

impl TimeConfig {
    /// 宏步数 `nstep`
    pub fn nstep(&self) -> usize {
        ((self.end_time - self.start_time) / self.stepsize).ceil().max(0.0) as usize
    }

    /// 各宏步的输出时刻 `tout[0..=nstep]`，末端对齐 `end_time`
    pub fn tout(&self) -> Vec<f64> {
        let n = self.nstep();
        (0..=n)
            .map(|i| (self.start_time + i as f64 * self.stepsize).min(self.end_time))
            .collect()
    }

    /// 强迫周期长度 [年]
    pub fn cycle_years(&self) -> f64 {
        seconds_to_years(self.end_time - self.start_time)
    }
}

/// Spin-up 控制
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpinupConfig {
    /// 最大 spin-up 年数（安全上限）
    #[serde(default = "default_max_spin_years")]
    pub max_spin_years: f64,

    /// 稳态容差 [gC m⁻² yr⁻¹]
    #[serde(default = "default_spinup_tolerance")]
    pub tolerance: f64,
}

fn default_max_spin_years() -> f64 { 500.0 }
fn default_spinup_tolerance() -> f64 { SPINUP_TOLERANCE }

impl Default for SpinupConfig {
    fn default() -> Self {
        Self {
            max_spin_years: default_max_spin_years(),
            tolerance: default_spinup_tolerance(),
        }
    }
}

/// 并行配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelConfig {
    /// 最小并行规模（低于此值串行执行）
    #[serde(default = "default_min_parallel_size")]
    pub min_parallel_size: usize,
}

fn default_min_parallel_size() -> usize { 512 }

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            min_parallel_size: default_min_parallel_size(),
        }
    }
}

impl SimulationConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: SimulationConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.solver;
        if s.abstol <= 0.0 {
            return Err(ConfigError::invalid("solver.abstol", s.abstol, "必须为正"));
        }
        if s.reltol <= 0.0 {
            return Err(ConfigError::invalid("solver.reltol", s.reltol, "必须为正"));
        }
        if s.min_step <= 0.0 || s.min_step > s.max_step {
            return Err(ConfigError::invalid(
                "solver.min_step",
                s.min_step,
                "必须为正且不大于 max_step",
            ));
        }
        if s.initial_step <= 0.0 {
            return Err(ConfigError::invalid("solver.initial_step", s.initial_step, "必须为正"));
        }
        if s.max_internal_steps == 0 {
            return Err(ConfigError::invalid("solver.max_internal_steps", 0, "必须为正"));
        }

        let t = &self.time;
        if t.stepsize <= 0.0 {
            return Err(ConfigError::invalid("time.stepsize", t.stepsize, "必须为正"));
        }
        if t.end_time <= t.start_time {
            return Err(ConfigError::invalid("time.end_time", t.end_time, "必须大于 start_time"));
        }

        if self.capabilities.biogeochemistry {
            if self.spinup.max_spin_years <= 0.0 {
                return Err(ConfigError::invalid(
                    "spinup.max_spin_years",
                    self.spinup.max_spin_years,
                    "必须为正",
                ));
            }
            if self.spinup.tolerance <= 0.0 {
                return Err(ConfigError::invalid(
                    "spinup.tolerance",
                    self.spinup.tolerance,
                    "必须为正",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.hydraulics.averaging, ConductivityAveraging::Arithmetic);
        assert_eq!(config.capabilities.nitrogen, NitrogenMode::Disabled);
    }

    #[test]
    fn test_invalid_tolerance() {
        let mut config = SimulationConfig::default();
        config.solver.reltol = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_step_bounds() {
        let mut config = SimulationConfig::default();
        config.solver.min_step = 1000.0;
        config.solver.max_step = 10.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_spinup_only_checked_with_bgc() {
        let mut config = SimulationConfig::default();
        config.spinup.max_spin_years = 0.0;
        assert!(config.validate().is_ok());
        config.capabilities.biogeochemistry = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tout_and_cycle() {
        let time = TimeConfig {
            start_time: 0.0,
            end_time: 10.0 * DAYINSEC,
            stepsize: DAYINSEC,
        };
        assert_eq!(time.nstep(), 10);
        let tout = time.tout();
        assert_eq!(tout.len(), 11);
        assert!((tout[10] - 10.0 * DAYINSEC).abs() < 1e-9);
        assert!((time.cycle_years() - 10.0 / 365.0).abs() < 1e-12);
    }

    #[test]
    fn test_tout_last_interval_truncated() {
        let time = TimeConfig {
            start_time: 0.0,
            end_time: 2.5,
            stepsize: 1.0,
        };
        assert_eq!(time.tout(), vec![0.0, 1.0, 2.0, 2.5]);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "hydraulics": { "averaging": "harmonic", "river_mode": "kinematic" } }"#;
        let config: SimulationConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.hydraulics.averaging, ConductivityAveraging::Harmonic);
        assert_eq!(config.hydraulics.river_mode, RoutingMode::Kinematic);
        assert_eq!(config.hydraulics.surface_mode, RoutingMode::Diffusive);
        assert!((config.solver.reltol - 1e-3).abs() < 1e-15);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watershed.json");

        let mut config = SimulationConfig::default();
        config.capabilities.nitrogen = NitrogenMode::Lumped;
        config.capabilities.land_surface = true;
        config.save_to_file(&path).unwrap();

        let loaded = SimulationConfig::from_file(&path).unwrap();
        assert_eq!(loaded.capabilities, config.capabilities);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{ "time": { "stepsize": 0.0 } }"#).unwrap();
        assert!(matches!(
            SimulationConfig::from_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
