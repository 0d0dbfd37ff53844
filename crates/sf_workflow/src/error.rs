// crates/sf_workflow/src/error.rs

//! 工作流错误类型

use sf_config::ConfigError;
use sf_foundation::SfError;
use thiserror::Error;

/// 工作流错误
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 外部求解器返回失败状态
    #[error("求解器失败: status={status}, t={time}s")]
    SolverFailed {
        /// 状态码
        status: i32,
        /// 失败时刻 [s]
        time: f64,
    },

    /// 物理层错误
    #[error("物理层错误: {0}")]
    Physics(#[from] SfError),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl WorkflowError {
    /// 是否为配置类错误（致命，不可重试）
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) => true,
            Self::Physics(e) => e.is_configuration(),
            Self::SolverFailed { .. } => false,
        }
    }
}

/// 工作流结果类型
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_failure_display() {
        let err = WorkflowError::SolverFailed {
            status: -3,
            time: 7200.0,
        };
        assert!(err.to_string().contains("-3"));
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_config_is_fatal() {
        let err: WorkflowError = ConfigError::invalid("solver.reltol", -1.0, "必须为正").into();
        assert!(err.is_configuration());
    }
}
