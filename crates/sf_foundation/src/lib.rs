// crates/sf_foundation/src/lib.rs

//! ShedFlow Foundation Layer
//!
//! 基础层，提供整个流域模型共享的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `SfError` / `SfResult`
//! - [`constants`]: 水文物理常数与数值阈值
//! - [`index`]: 单元/河段强类型索引与邻接关系解码
//!
//! # 设计原则
//!
//! 1. **最小依赖**: 仅依赖 serde 和 thiserror
//! 2. **类型安全**: 单元索引与河段索引在编译期区分
//! 3. **无全局可变状态**: 常数均为 `const`
//!
//! # 示例
//!
//! ```
//! use sf_foundation::index::{EdgeNeighbor, ElemId, RiverId};
//!
//! assert_eq!(EdgeNeighbor::from_raw(3), EdgeNeighbor::Element(ElemId::from_one_based(3)));
//! assert_eq!(EdgeNeighbor::from_raw(-2), EdgeNeighbor::River(RiverId::from_one_based(2)));
//! assert_eq!(EdgeNeighbor::from_raw(0), EdgeNeighbor::Boundary);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod error;
pub mod index;

// 重导出常用类型
pub use error::{SfError, SfResult};
pub use index::{EdgeNeighbor, ElemId, RiverId, NUM_EDGE};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::constants::*;
    pub use crate::error::{SfError, SfResult};
    pub use crate::index::{EdgeNeighbor, ElemId, RiverId, NUM_EDGE};
}
