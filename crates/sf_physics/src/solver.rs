// crates/sf_physics/src/solver.rs

//! 外部 ODE 求解器接口
//!
//! 流域状态方程是刚性系统，生产中由外部隐式积分器推进。
//! 本模块定义驱动层与积分器之间的契约，并提供一个显式
//! Euler/Heun 嵌入对作为参考实现，供测试和小算例使用。

use crate::rhs::RhsEvaluator;
use sf_config::SolverTolerances;

/// 求解器状态码
pub mod status {
    /// 到达输出时刻
    pub const SUCCESS: i32 = 0;
    /// 内部步数超过上限
    pub const TOO_MUCH_WORK: i32 = -1;
    /// 误差检验在最小步长下仍失败
    pub const ERR_FAILURE: i32 = -3;
    /// 右端项评估失败
    pub const RHS_FAILURE: i32 = -8;
}

/// 单次推进的结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// 状态码，负值表示失败
    pub status: i32,
    /// 实际到达的时刻 [s]
    pub t_reached: f64,
    /// 接受的内部步数
    pub steps_taken: usize,
    /// 最后一个接受步的步长 [s]
    pub last_step_size: f64,
}

impl StepOutcome {
    /// 是否成功
    #[inline]
    pub fn success(&self) -> bool {
        self.status >= 0
    }
}

/// 检查求解器返回码，失败时记录错误
pub fn check_solver_flag(status: i32) -> bool {
    if status < 0 {
        log::error!("求解器返回失败状态 {}", status);
        false
    } else {
        true
    }
}

/// ODE 求解器
pub trait OdeSolver {
    /// 名称
    fn name(&self) -> &str;

    /// 设置容差与步长界限（每个 spin-up 循环开始前重置）
    fn set_parameters(&mut self, params: &SolverTolerances);

    /// 从 `t` 推进到 `t_out`，原地更新 `y`
    fn step(
        &mut self,
        rhs: &mut dyn RhsEvaluator,
        t: f64,
        t_out: f64,
        y: &mut [f64],
    ) -> StepOutcome;
}

/// 自适应 Heun 求解器（Euler/Heun 嵌入对）
#[derive(Debug, Clone)]
pub struct AdaptiveHeunSolver {
    params: SolverTolerances,
    h: f64,
    k1: Vec<f64>,
    k2: Vec<f64>,
    y_euler: Vec<f64>,
}

impl AdaptiveHeunSolver {
    /// 以给定参数创建
    pub fn new(params: SolverTolerances) -> Self {
        Self {
            h: params.initial_step,
            params,
            k1: Vec::new(),
            k2: Vec::new(),
            y_euler: Vec::new(),
        }
    }

    /// 当前建议步长
    pub fn current_step(&self) -> f64 {
        self.h
    }

    fn outcome(status: i32, t: f64, steps: usize, last: f64) -> StepOutcome {
        StepOutcome {
            status,
            t_reached: t,
            steps_taken: steps,
            last_step_size: last,
        }
    }
}

impl Default for AdaptiveHeunSolver {
    fn default() -> Self {
        Self::new(SolverTolerances::default())
    }
}

impl OdeSolver for AdaptiveHeunSolver {
    fn name(&self) -> &str {
        "AdaptiveHeun"
    }

    fn set_parameters(&mut self, params: &SolverTolerances) {
        self.params = *params;
        self.h = params.initial_step;
    }

    fn step(
        &mut self,
        rhs: &mut dyn RhsEvaluator,
        t: f64,
        t_out: f64,
        y: &mut [f64],
    ) -> StepOutcome {
        let n = y.len();
        if n != rhs.n_states() {
            log::error!("状态向量长度 {} 与右端项 {} 不一致", n, rhs.n_states());
            return Self::outcome(status::RHS_FAILURE, t, 0, 0.0);
        }

        self.k1.resize(n, 0.0);
        self.k2.resize(n, 0.0);
        self.y_euler.resize(n, 0.0);

        let SolverTolerances {
            abstol,
            reltol,
            min_step,
            max_step,
            max_internal_steps,
            ..
        } = self.params;

        let mut t_cur = t;
        let mut steps = 0;
        let mut last = 0.0;
        let eps = 1e-12 * t_out.abs().max(1.0);

        while t_out - t_cur > eps {
            if steps >= max_internal_steps {
                log::warn!("内部步数达到上限 {} (t = {})", max_internal_steps, t_cur);
                return Self::outcome(status::TOO_MUCH_WORK, t_cur, steps, last);
            }

            let remaining = t_out - t_cur;
            let h = self.h.min(max_step).min(remaining);

            if rhs.compute_rhs(t_cur, y, &mut self.k1).is_err() {
                return Self::outcome(status::RHS_FAILURE, t_cur, steps, last);
            }
            for i in 0..n {
                self.y_euler[i] = y[i] + h * self.k1[i];
            }
            if rhs.compute_rhs(t_cur + h, &self.y_euler, &mut self.k2).is_err() {
                return Self::outcome(status::RHS_FAILURE, t_cur, steps, last);
            }

            let mut err: f64 = 0.0;
            for i in 0..n {
                let y_heun = y[i] + 0.5 * h * (self.k1[i] + self.k2[i]);
                let scale = abstol + reltol * y_heun.abs();
                err = err.max((y_heun - self.y_euler[i]).abs() / scale);
            }

            let factor = if !err.is_finite() {
                0.2
            } else if err == 0.0 {
                5.0
            } else {
                (0.9 / err.sqrt()).clamp(0.2, 5.0)
            };

            if err.is_finite() && err <= 1.0 {
                for i in 0..n {
                    y[i] += 0.5 * h * (self.k1[i] + self.k2[i]);
                }
                t_cur += h;
                steps += 1;
                last = h;

                // 被输出时刻截断的步不缩小建议步长
                let proposed = (h * factor).clamp(min_step, max_step);
                self.h = if h < remaining { proposed } else { self.h.max(proposed) };
            } else {
                if h <= min_step {
                    log::warn!("最小步长 {} 下误差检验失败 (t = {})", min_step, t_cur);
                    return Self::outcome(status::ERR_FAILURE, t_cur, steps, last);
                }
                self.h = (h * factor).max(min_step);
            }
        }

        Self::outcome(status::SUCCESS, t_cur, steps, last)
    }
}
