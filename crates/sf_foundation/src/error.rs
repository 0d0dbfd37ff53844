// crates/sf_foundation/src/error.rs

//! 错误处理模块，定义统一错误类型
//!
//! 提供 `SfError` 枚举和 `SfResult` 类型别名。
//!
//! # 错误分类
//!
//! 1. **配置/单位错误**: 未定义的河道断面阶数、出口边界代码、大孔隙状态、
//!    通量类型、演算模式。这类错误表示构建与配置不匹配，不可在局部恢复，
//!    在模型构建阶段即返回，由调用方以非零状态退出。
//! 2. **尺寸/拓扑错误**: 状态向量长度、邻接关系不一致。
//!
//! 求解器失败不在这里：它由工作流层按状态码报告。
//!
//! 数值边界情况（负的开方参数、零湿周、零饱和度）不是错误，
//! 由各本构函数在局部钳位处理。
//!
//! # 示例
//!
//! ```
//! use sf_foundation::error::{SfError, SfResult};
//!
//! fn parse_order(code: i32) -> SfResult<()> {
//!     Err(SfError::UnknownChannelShape { code })
//! }
//! assert!(parse_order(7).unwrap_err().to_string().contains('7'));
//! ```

use thiserror::Error;

/// 统一结果类型
pub type SfResult<T> = Result<T, SfError>;

/// ShedFlow 错误类型
#[derive(Error, Debug)]
pub enum SfError {
    // ========================================================================
    // 配置/单位错误（致命）
    // ========================================================================
    /// 未定义的河道断面阶数
    #[error("河道断面阶数 ({code}) 未定义")]
    UnknownChannelShape {
        /// 原始阶数代码
        code: i32,
    },

    /// 未定义的出口边界条件代码
    #[error("河道出口边界条件类型 ({code}) 无法识别")]
    UnknownOutletCondition {
        /// 原始边界代码
        code: i32,
    },

    /// 未定义的大孔隙状态代码
    #[error("大孔隙状态 ({code}) 未定义")]
    UnknownMacroporeRegime {
        /// 原始状态代码
        code: i32,
    },

    /// 未定义的通量类型选择器
    #[error("通量类型选择器 ({code}) 未定义")]
    UnknownFluxType {
        /// 原始选择器代码
        code: i32,
    },

    /// 未定义的演算模式代码
    #[error("演算模式 ({code}) 未定义")]
    UnknownRoutingMode {
        /// 原始模式代码
        code: i32,
    },

    /// 配置错误
    #[error("配置错误: {message}")]
    Config {
        /// 具体错误信息
        message: String,
    },

    /// 配置值无效
    #[error("配置值无效: {key}={value}, 原因: {reason}")]
    InvalidConfig {
        /// 配置键名
        key: String,
        /// 配置值
        value: String,
        /// 无效原因说明
        reason: String,
    },

    // ========================================================================
    // 尺寸/拓扑错误
    // ========================================================================
    /// 数组大小不匹配
    #[error("数组大小不匹配: {name} 期望{expected}, 实际{actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望大小
        expected: usize,
        /// 实际大小
        actual: usize,
    },

    /// 索引越界
    #[error("索引越界: {index_type} 索引 {index} 超出范围 0..{len}")]
    IndexOutOfBounds {
        /// 索引类别描述
        index_type: &'static str,
        /// 访问的索引
        index: usize,
        /// 上界（长度）
        len: usize,
    },

    /// 无效网格拓扑
    #[error("无效的网格拓扑: {message}")]
    InvalidMesh {
        /// 具体错误信息
        message: String,
    },

    /// 数据超出范围
    #[error("数据超出范围: {field}={value}, 期望范围=[{min}, {max}]")]
    OutOfRange {
        /// 字段名
        field: &'static str,
        /// 实际值
        value: f64,
        /// 最小允许值
        min: f64,
        /// 最大允许值
        max: f64,
    },
}

// ========================================================================
// 便捷构造方法
// ========================================================================

impl SfError {
    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 配置值无效
    pub fn invalid_config(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 数组大小不匹配
    pub fn size_mismatch(name: &'static str, expected: usize, actual: usize) -> Self {
        Self::SizeMismatch {
            name,
            expected,
            actual,
        }
    }

    /// 索引越界
    pub fn index_out_of_bounds(index_type: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds {
            index_type,
            index,
            len,
        }
    }

    /// 无效网格
    pub fn invalid_mesh(message: impl Into<String>) -> Self {
        Self::InvalidMesh {
            message: message.into(),
        }
    }

    /// 数据超出范围
    pub fn out_of_range(field: &'static str, value: f64, min: f64, max: f64) -> Self {
        Self::OutOfRange {
            field,
            value,
            min,
            max,
        }
    }

    /// 是否为致命的配置/单位错误
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownChannelShape { .. }
                | Self::UnknownOutletCondition { .. }
                | Self::UnknownMacroporeRegime { .. }
                | Self::UnknownFluxType { .. }
                | Self::UnknownRoutingMode { .. }
                | Self::Config { .. }
                | Self::InvalidConfig { .. }
        )
    }
}

// ========================================================================
// 验证辅助方法
// ========================================================================

impl SfError {
    /// 检查数组大小是否匹配
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> SfResult<()> {
        if expected != actual {
            Err(Self::size_mismatch(name, expected, actual))
        } else {
            Ok(())
        }
    }

    /// 检查索引是否在范围内
    #[inline]
    pub fn check_index(index_type: &'static str, index: usize, len: usize) -> SfResult<()> {
        if index >= len {
            Err(Self::index_out_of_bounds(index_type, index, len))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SfError::config("缺少河段");
        assert!(err.to_string().contains("配置错误"));
    }

    #[test]
    fn test_unknown_codes_name_value() {
        let err = SfError::UnknownOutletCondition { code: -9 };
        assert!(err.to_string().contains("-9"));
        assert!(err.is_configuration());

        let err = SfError::UnknownMacroporeRegime { code: 4 };
        assert!(err.to_string().contains('4'));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_check_helpers() {
        assert!(SfError::check_size("y", 10, 10).is_ok());
        assert!(SfError::check_size("y", 10, 9).is_err());
        assert!(SfError::check_index("River", 3, 3).is_err());
    }

    #[test]
    fn test_routing_mode_is_configuration() {
        let err = SfError::UnknownRoutingMode { code: 3 };
        assert!(err.to_string().contains("演算模式"));
        assert!(err.is_configuration());
    }
}
