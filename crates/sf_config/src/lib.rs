// crates/sf_config/src/lib.rs

//! ShedFlow Config Layer
//!
//! 配置层，以运行时能力标志取代编译期特性开关，
//! 同一个二进制即可支持陆面耦合、氮素输运、裂隙基岩等全部组合。
//!
//! # 模块概览
//!
//! - [`modes`]: 导水率平均方式、河道/坡面演算模式、氮素模式
//! - [`simulation_config`]: SimulationConfig 及各子配置
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! sf_workflow  ─> 驱动求解器与 spin-up
//! sf_physics   ─> 读取 SimulationConfig（经 SimulationContext 传入）
//! sf_config    ─> 本层
//! sf_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod modes;
pub mod simulation_config;

// 重导出核心类型
pub use error::ConfigError;
pub use modes::{ConductivityAveraging, NitrogenMode, RoutingMode};
pub use simulation_config::{
    Capabilities, HydraulicsConfig, ParallelConfig, SimulationConfig, SolverTolerances,
    SpinupConfig, TimeConfig,
};
