// crates/sf_physics/src/state_layout.rs

//! 扁平状态向量布局
//!
//! 外部求解器持有一个扁平 `[f64]` 状态向量。本模块根据单元/河段数量和
//! 能力标志一次性计算各命名块的偏移，之后所有访问都通过
//! [`StateView`] / [`StateViewMut`] 的命名切片完成，不再手写偏移运算。
//!
//! # 块顺序
//!
//! ```text
//! surf | unsat | gw | riv_stage | riv_gw | [fbr_unsat | fbr_gw]
//!      | [surfn | sminn | streamn | rivbedn]   (分布式氮)
//!      | [lumped_sminn]                         (集总氮，长度 1)
//! ```

use sf_config::{Capabilities, NitrogenMode};
use sf_foundation::{SfError, SfResult};
use std::ops::Range;

/// 状态块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateBlock {
    /// 地表蓄水
    Surf,
    /// 非饱和带蓄水
    Unsat,
    /// 地下水
    Gw,
    /// 河道水位
    RivStage,
    /// 河床含水层
    RivGw,
    /// 基岩非饱和带
    FbrUnsat,
    /// 基岩地下水
    FbrGw,
    /// 地表氮
    SurfN,
    /// 土壤氮
    SminN,
    /// 河水氮
    StreamN,
    /// 河床氮
    RivbedN,
    /// 集总土壤氮
    LumpedSminN,
}

const NUM_BLOCKS: usize = 12;

impl StateBlock {
    /// 全部块，按存储顺序
    pub const ALL: [StateBlock; NUM_BLOCKS] = [
        Self::Surf,
        Self::Unsat,
        Self::Gw,
        Self::RivStage,
        Self::RivGw,
        Self::FbrUnsat,
        Self::FbrGw,
        Self::SurfN,
        Self::SminN,
        Self::StreamN,
        Self::RivbedN,
        Self::LumpedSminN,
    ];

    #[inline]
    const fn slot(self) -> usize {
        self as usize
    }

    fn enabled(self, caps: &Capabilities) -> bool {
        match self {
            Self::Surf | Self::Unsat | Self::Gw | Self::RivStage | Self::RivGw => true,
            Self::FbrUnsat | Self::FbrGw => caps.fractured_bedrock,
            Self::SurfN | Self::SminN | Self::StreamN | Self::RivbedN => {
                caps.nitrogen == NitrogenMode::Distributed
            }
            Self::LumpedSminN => caps.nitrogen == NitrogenMode::Lumped,
        }
    }

    fn size(self, n_elem: usize, n_river: usize) -> usize {
        match self {
            Self::Surf
            | Self::Unsat
            | Self::Gw
            | Self::FbrUnsat
            | Self::FbrGw
            | Self::SurfN
            | Self::SminN => n_elem,
            Self::RivStage | Self::RivGw | Self::StreamN | Self::RivbedN => n_river,
            Self::LumpedSminN => 1,
        }
    }
}

/// 状态向量布局
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateLayout {
    n_elem: usize,
    n_river: usize,
    ranges: [Option<Range<usize>>; NUM_BLOCKS],
    len: usize,
}

impl StateLayout {
    /// 根据规模与能力标志计算布局
    pub fn new(n_elem: usize, n_river: usize, caps: &Capabilities) -> Self {
        let mut ranges: [Option<Range<usize>>; NUM_BLOCKS] = Default::default();
        let mut offset = 0;

        for block in StateBlock::ALL {
            if block.enabled(caps) {
                let size = block.size(n_elem, n_river);
                ranges[block.slot()] = Some(offset..offset + size);
                offset += size;
            }
        }

        Self {
            n_elem,
            n_river,
            ranges,
            len: offset,
        }
    }

    /// 状态向量总长度
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 单元数
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.n_elem
    }

    /// 河段数
    #[inline]
    pub fn n_rivers(&self) -> usize {
        self.n_river
    }

    /// 块的区间（未启用时为 None）
    #[inline]
    pub fn range(&self, block: StateBlock) -> Option<Range<usize>> {
        self.ranges[block.slot()].clone()
    }

    /// 块是否启用
    #[inline]
    pub fn has(&self, block: StateBlock) -> bool {
        self.ranges[block.slot()].is_some()
    }

    /// 检查向量长度
    pub fn check(&self, y: &[f64]) -> SfResult<()> {
        SfError::check_size("state vector", self.len, y.len())
    }

    /// 创建只读视图
    pub fn view<'a>(&'a self, y: &'a [f64]) -> SfResult<StateView<'a>> {
        self.check(y)?;
        Ok(StateView { layout: self, data: y })
    }

    /// 创建可变视图
    pub fn view_mut<'a>(&'a self, y: &'a mut [f64]) -> SfResult<StateViewMut<'a>> {
        self.check(y)?;
        Ok(StateViewMut { layout: self, data: y })
    }
}

/// 状态向量只读视图
#[derive(Debug, Clone, Copy)]
pub struct StateView<'a> {
    layout: &'a StateLayout,
    data: &'a [f64],
}

impl<'a> StateView<'a> {
    /// 命名块切片，未启用时为空切片
    #[inline]
    pub fn block(&self, block: StateBlock) -> &'a [f64] {
        let data: &'a [f64] = self.data;
        match &self.layout.ranges[block.slot()] {
            Some(r) => &data[r.clone()],
            None => &[],
        }
    }

    /// 地表蓄水
    #[inline]
    pub fn surf(&self) -> &'a [f64] {
        self.block(StateBlock::Surf)
    }

    /// 非饱和带蓄水
    #[inline]
    pub fn unsat(&self) -> &'a [f64] {
        self.block(StateBlock::Unsat)
    }

    /// 地下水
    #[inline]
    pub fn gw(&self) -> &'a [f64] {
        self.block(StateBlock::Gw)
    }

    /// 河道水位
    #[inline]
    pub fn riv_stage(&self) -> &'a [f64] {
        self.block(StateBlock::RivStage)
    }

    /// 河床含水层
    #[inline]
    pub fn riv_gw(&self) -> &'a [f64] {
        self.block(StateBlock::RivGw)
    }

    /// 底层数据
    #[inline]
    pub fn as_slice(&self) -> &'a [f64] {
        self.data
    }
}

/// 状态向量可变视图
#[derive(Debug)]
pub struct StateViewMut<'a> {
    layout: &'a StateLayout,
    data: &'a mut [f64],
}

/// 同时可变借用的全部块
#[derive(Debug)]
pub struct BlocksMut<'a> {
    /// 地表蓄水
    pub surf: &'a mut [f64],
    /// 非饱和带
    pub unsat: &'a mut [f64],
    /// 地下水
    pub gw: &'a mut [f64],
    /// 河道水位
    pub riv_stage: &'a mut [f64],
    /// 河床含水层
    pub riv_gw: &'a mut [f64],
    /// 基岩非饱和带
    pub fbr_unsat: Option<&'a mut [f64]>,
    /// 基岩地下水
    pub fbr_gw: Option<&'a mut [f64]>,
    /// 地表氮
    pub surfn: Option<&'a mut [f64]>,
    /// 土壤氮
    pub sminn: Option<&'a mut [f64]>,
    /// 河水氮
    pub streamn: Option<&'a mut [f64]>,
    /// 河床氮
    pub rivbedn: Option<&'a mut [f64]>,
    /// 集总土壤氮
    pub lumped_sminn: Option<&'a mut [f64]>,
}

impl<'a> StateViewMut<'a> {
    /// 命名块可变切片，未启用时为空切片
    #[inline]
    pub fn block_mut(&mut self, block: StateBlock) -> &mut [f64] {
        match &self.layout.ranges[block.slot()] {
            Some(r) => &mut self.data[r.clone()],
            None => &mut [],
        }
    }

    /// 只读视图
    #[inline]
    pub fn as_view(&self) -> StateView<'_> {
        StateView {
            layout: self.layout,
            data: &*self.data,
        }
    }

    /// 拆分为互不重叠的命名块
    pub fn split(self) -> BlocksMut<'a> {
        let mut parts: [Option<&'a mut [f64]>; NUM_BLOCKS] = Default::default();
        let mut rest: &'a mut [f64] = self.data;

        for block in StateBlock::ALL {
            if let Some(r) = &self.layout.ranges[block.slot()] {
                let (head, tail) = std::mem::take(&mut rest).split_at_mut(r.len());
                parts[block.slot()] = Some(head);
                rest = tail;
            }
        }

        let mut take = |b: StateBlock| parts[b.slot()].take();

        BlocksMut {
            surf: take(StateBlock::Surf).unwrap_or_default(),
            unsat: take(StateBlock::Unsat).unwrap_or_default(),
            gw: take(StateBlock::Gw).unwrap_or_default(),
            riv_stage: take(StateBlock::RivStage).unwrap_or_default(),
            riv_gw: take(StateBlock::RivGw).unwrap_or_default(),
            fbr_unsat: take(StateBlock::FbrUnsat),
            fbr_gw: take(StateBlock::FbrGw),
            surfn: take(StateBlock::SurfN),
            sminn: take(StateBlock::SminN),
            streamn: take(StateBlock::StreamN),
            rivbedn: take(StateBlock::RivbedN),
            lumped_sminn: take(StateBlock::LumpedSminN),
        }
    }
}
