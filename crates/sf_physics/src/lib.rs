// crates/sf_physics/src/lib.rs

//! 流域物理核心
//!
//! 提供三棱柱单元 + 河网耦合的半离散通量计算，包括：
//! - 本构关系 (closures) - 土壤水势、相对导水率、大孔隙状态
//! - 单元与河段数据模型 (element, segment, watershed)
//! - 通量核 (vertical, lateral, river)
//! - 状态向量布局与右端项 (state_layout, rhs)
//! - 宏步后的质量平衡对账 (mass_balance)
//! - 外部求解器接口 (solver) 与强迫数据 (forcing)
//!
//! # 数据流
//!
//! ```text
//! forcing ──> Watershed ──> WatershedRhs::compute_rhs ──> OdeSolver::step ──> summary
//! ```
//!
//! # 并行
//!
//! 单元循环和河段循环通过 rayon 数据并行；所有跨对象写入（河段写单元边、
//! 下游累加）都在并行收集结束后串行执行，见 [`parallel`]。

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod closures;
pub mod context;
pub mod element;
pub mod forcing;
pub mod geometry;
pub mod lateral;
pub mod mass_balance;
pub mod parallel;
pub mod rhs;
pub mod river;
pub mod segment;
pub mod solver;
pub mod state_layout;
pub mod types;
pub mod vertical;
pub mod watershed;

// 重导出常用类型
pub use context::{KernelOptions, SimulationContext};
pub use element::{
    BedrockStore, Element, LandCover, LandSurfaceState, LumpedNitrogen, NitrogenRecord,
    PhysState, Soil, SpinupStat, Topo, WaterFlux, WaterState,
};
pub use forcing::{ExtrapolationMode, ForcingProvider, TimeSeries, TimeSeriesForcing};
pub use geometry::{cross_section, section_quantity, CrossSection};
pub use mass_balance::{mass_balance, summary};
pub use parallel::{KernelMetrics, ParallelStrategy};
pub use rhs::{RhsEvaluator, WatershedRhs};
pub use segment::{Material, RiverBc, RiverNitrogen, RiverSegment, RiverState, RiverTopo, Shape};
pub use solver::{check_solver_flag, AdaptiveHeunSolver, OdeSolver, StepOutcome};
pub use state_layout::{StateBlock, StateLayout, StateView, StateViewMut};
pub use types::{
    BankSide, ChannelShape, Downstream, MacroporeRegime, OutletCondition, RiverFlowPath,
    SectionQuantity,
};
pub use watershed::Watershed;

/// Prelude 模块
pub mod prelude {
    pub use crate::context::SimulationContext;
    pub use crate::element::Element;
    pub use crate::forcing::{ForcingProvider, TimeSeries, TimeSeriesForcing};
    pub use crate::rhs::{RhsEvaluator, WatershedRhs};
    pub use crate::segment::RiverSegment;
    pub use crate::solver::{AdaptiveHeunSolver, OdeSolver, StepOutcome};
    pub use crate::watershed::Watershed;
    pub use sf_foundation::prelude::*;
}
