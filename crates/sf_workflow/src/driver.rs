// crates/sf_workflow/src/driver.rs

//! 宏步驱动
//!
//! 一个宏步 `[t0, t1]`：
//!
//! ```text
//! forcing.apply(t0) ──> solver.step(t0 → t1) ──> check_solver_flag ──> summary ──> [日步 BGC]
//! ```

use crate::error::{WorkflowError, WorkflowResult};
use sf_foundation::constants::DAYINSEC;
use sf_foundation::SfResult;
use sf_physics::solver::check_solver_flag;
use sf_physics::{summary, ForcingProvider, OdeSolver, SimulationContext, StepOutcome, Watershed, WatershedRhs};

/// 生物地球化学日步长
///
/// 每跨过一个日边界调用一次，负责更新氮库速率，
/// 并把当日土壤碳/总碳累加到单元的 spin-up 统计量。
pub trait BgcDailyStep: Send {
    /// 在时刻 `t`（日边界之后）执行日步
    fn daily_step(&mut self, t: f64, watershed: &mut Watershed) -> SfResult<()>;
}

/// 宏步驱动器
pub struct StepDriver {
    forcing: Box<dyn ForcingProvider>,
    bgc: Option<Box<dyn BgcDailyStep>>,
    steps_completed: usize,
}

impl StepDriver {
    /// 以强迫提供者创建
    pub fn new(forcing: impl ForcingProvider + 'static) -> Self {
        Self {
            forcing: Box::new(forcing),
            bgc: None,
            steps_completed: 0,
        }
    }

    /// 挂接日步 BGC
    pub fn with_bgc(mut self, bgc: impl BgcDailyStep + 'static) -> Self {
        self.bgc = Some(Box::new(bgc));
        self
    }

    /// 是否挂接了 BGC
    pub fn has_bgc(&self) -> bool {
        self.bgc.is_some()
    }

    /// 已完成的宏步数
    pub fn steps_completed(&self) -> usize {
        self.steps_completed
    }

    /// 推进一个宏步
    ///
    /// # 错误
    ///
    /// - 求解器返回负状态码时返回 [`WorkflowError::SolverFailed`]
    /// - 强迫、对账或 BGC 失败时返回 [`WorkflowError::Physics`]
    pub fn advance(
        &mut self,
        ctx: &mut SimulationContext,
        solver: &mut dyn OdeSolver,
        y: &mut [f64],
        t0: f64,
        t1: f64,
    ) -> WorkflowResult<StepOutcome> {
        self.forcing.apply(t0, &mut ctx.watershed)?;

        let outcome = {
            let mut rhs = WatershedRhs::new(ctx);
            solver.step(&mut rhs, t0, t1, y)
        };

        if !check_solver_flag(outcome.status) {
            return Err(WorkflowError::SolverFailed {
                status: outcome.status,
                time: outcome.t_reached,
            });
        }

        summary(ctx, y, t1 - t0)?;

        if let Some(bgc) = self.bgc.as_mut() {
            if crosses_day_boundary(t0, t1) {
                bgc.daily_step(t1, &mut ctx.watershed)?;
            }
        }

        self.steps_completed += 1;
        tracing::trace!(
            "宏步 {} 完成: t = {} s, {} 个内部步",
            self.steps_completed,
            t1,
            outcome.steps_taken
        );

        Ok(outcome)
    }
}

impl std::fmt::Debug for StepDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDriver")
            .field("forcing", &self.forcing.name())
            .field("has_bgc", &self.has_bgc())
            .field("steps_completed", &self.steps_completed)
            .finish()
    }
}

/// `(t0, t1]` 是否包含日边界
#[inline]
fn crosses_day_boundary(t0: f64, t1: f64) -> bool {
    (t1 / DAYINSEC).floor() > (t0 / DAYINSEC).floor()
}
