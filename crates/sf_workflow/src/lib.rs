// crates/sf_workflow/src/lib.rs

//! ShedFlow 工作流模块
//!
//! 在物理核心之上组织时间推进。
//!
//! # 模块结构
//!
//! - [`driver`]: 宏步驱动（强迫 → 求解器 → 对账 → 日步 BGC）
//! - [`spinup`]: 生物地球化学 spin-up 稳态控制
//! - [`events`]: 事件系统
//! - [`error`]: 错误类型
//!
//! # 示例
//!
//! ```rust,ignore
//! use sf_workflow::{SpinupController, StepDriver};
//! use sf_physics::{AdaptiveHeunSolver, SimulationContext, TimeSeriesForcing};
//!
//! let mut ctx = SimulationContext::new(config, watershed)?;
//! let mut y = ctx.initial_state();
//! let mut solver = AdaptiveHeunSolver::new(ctx.config.solver);
//! let mut driver = StepDriver::new(TimeSeriesForcing::new()).with_bgc(bgc);
//!
//! let report = SpinupController::new().run(&mut ctx, &mut driver, &mut solver, &mut y)?;
//! ```

#![warn(missing_docs)]

pub mod driver;
pub mod error;
pub mod events;
pub mod spinup;

// 重导出核心类型
pub use driver::{BgcDailyStep, StepDriver};
pub use error::{WorkflowError, WorkflowResult};
pub use events::{EventDispatcher, EventListener, FnListener, LoggingListener, SpinupEvent};
pub use spinup::{check_steady_state, SpinupController, SpinupReport, SpinupState};
