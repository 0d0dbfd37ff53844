// crates/sf_foundation/src/index.rs

//! 强类型索引系统
//!
//! 网格输入采用 1 起始的带符号邻接编码：
//!
//! ```text
//! nabr > 0  -> 相邻三角单元 (nabr - 1)
//! nabr < 0  -> 相邻河段 (-nabr - 1)
//! nabr == 0 -> 流域边界 / 无邻居
//! ```
//!
//! 本模块把这种编码解码为 [`EdgeNeighbor`]，并用 [`ElemId`] / [`RiverId`]
//! 在编译期区分两类索引，避免偏移量算错。

use serde::{Deserialize, Serialize};
use std::fmt;

/// 三角单元的边数
pub const NUM_EDGE: usize = 3;

/// 单元（三棱柱）索引，0 起始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElemId(pub usize);

/// 河段索引，0 起始
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RiverId(pub usize);

impl ElemId {
    /// 从 1 起始的输入编号创建
    #[inline]
    pub const fn from_one_based(id: usize) -> Self {
        Self(id - 1)
    }

    /// 0 起始的数组下标
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// 1 起始的输入编号
    #[inline]
    pub const fn one_based(self) -> usize {
        self.0 + 1
    }
}

impl RiverId {
    /// 从 1 起始的输入编号创建
    #[inline]
    pub const fn from_one_based(id: usize) -> Self {
        Self(id - 1)
    }

    /// 0 起始的数组下标
    #[inline]
    pub const fn get(self) -> usize {
        self.0
    }

    /// 1 起始的输入编号
    #[inline]
    pub const fn one_based(self) -> usize {
        self.0 + 1
    }

    /// 单元邻接数组中代表本河段的带符号编码
    #[inline]
    pub fn as_neighbor_code(self) -> i64 {
        -(self.one_based() as i64)
    }
}

impl fmt::Display for ElemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Elem#{}", self.one_based())
    }
}

impl fmt::Display for RiverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "River#{}", self.one_based())
    }
}

/// 单元一条边的邻接对象
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgeNeighbor {
    /// 另一个三角单元
    Element(ElemId),
    /// 河段
    River(RiverId),
    /// 流域边界（无邻居）
    #[default]
    Boundary,
}

impl EdgeNeighbor {
    /// 解码带符号的 1 起始编号
    #[inline]
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::Boundary,
            r if r > 0 => Self::Element(ElemId(r as usize - 1)),
            r => Self::River(RiverId((-r) as usize - 1)),
        }
    }

    /// 编码回带符号的 1 起始编号
    #[inline]
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Boundary => 0,
            Self::Element(e) => e.one_based() as i64,
            Self::River(r) => r.as_neighbor_code(),
        }
    }

    /// 是否与指定河段相邻
    #[inline]
    pub fn is_river(self, river: RiverId) -> bool {
        matches!(self, Self::River(r) if r == river)
    }
}
