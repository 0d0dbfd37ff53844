// crates/sf_physics/src/watershed.rs

//! 流域容器：单元数组与河段数组
//!
//! 构建时一次性校验拓扑，之后在整个运行期内不再改变结构。

use crate::element::{Element, LumpedNitrogen};
use crate::segment::RiverSegment;
use crate::types::Downstream;
use serde::{Deserialize, Serialize};
use sf_foundation::{EdgeNeighbor, SfError, SfResult};

/// 流域
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Watershed {
    /// 单元
    pub elements: Vec<Element>,
    /// 河段
    pub rivers: Vec<RiverSegment>,
    /// 集总氮库
    pub lumped: Option<LumpedNitrogen>,
}

impl Watershed {
    /// 创建并校验拓扑
    ///
    /// # 错误
    ///
    /// - 索引与位置不一致
    /// - 邻居、左右岸或下游编号越界
    /// - 单元某条边标记为河段邻居，但该河段的左右岸均不是此单元
    /// - 河段左右岸单元没有指向该河段的边
    pub fn new(elements: Vec<Element>, rivers: Vec<RiverSegment>) -> SfResult<Self> {
        let n_elem = elements.len();
        let n_river = rivers.len();

        for (i, elem) in elements.iter().enumerate() {
            if elem.index.get() != i {
                return Err(SfError::invalid_mesh(format!(
                    "单元索引 {} 位于位置 {}",
                    elem.index, i
                )));
            }
            if elem.topo.area <= 0.0 {
                return Err(SfError::out_of_range("elem.topo.area", elem.topo.area, 0.0, f64::MAX));
            }
            for nabr in elem.nabr {
                match nabr {
                    EdgeNeighbor::Element(e) => SfError::check_index("Element", e.get(), n_elem)?,
                    EdgeNeighbor::River(r) => {
                        SfError::check_index("River", r.get(), n_river)?;
                        let river = &rivers[r.get()];
                        if river.left != Some(elem.index) && river.right != Some(elem.index) {
                            return Err(SfError::invalid_mesh(format!(
                                "{} 的边指向 {}，但该河段两岸均不是此单元",
                                elem.index, r
                            )));
                        }
                    }
                    EdgeNeighbor::Boundary => {}
                }
            }
        }

        for (i, river) in rivers.iter().enumerate() {
            if river.index.get() != i {
                return Err(SfError::invalid_mesh(format!(
                    "河段索引 {} 位于位置 {}",
                    river.index, i
                )));
            }
            for side in [river.left, river.right].into_iter().flatten() {
                SfError::check_index("Element", side.get(), n_elem)?;
                if elements[side.get()].river_edge(river.index).is_none() {
                    return Err(SfError::invalid_mesh(format!(
                        "{} 的岸边单元 {} 没有指向该河段的边",
                        river.index, side
                    )));
                }
            }
            if let Downstream::Segment(down) = river.down {
                SfError::check_index("River", down.get(), n_river)?;
                if down == river.index {
                    return Err(SfError::invalid_mesh(format!("{} 的下游指向自身", river.index)));
                }
            }
            if river.topo.area <= 0.0 {
                return Err(SfError::out_of_range("river.topo.area", river.topo.area, 0.0, f64::MAX));
            }
        }

        log::debug!("流域拓扑校验通过: {} 个单元, {} 个河段", n_elem, n_river);

        Ok(Self {
            elements,
            rivers,
            lumped: None,
        })
    }

    /// 附加集总氮库
    pub fn with_lumped_nitrogen(mut self, lumped: LumpedNitrogen) -> Self {
        self.lumped = Some(lumped);
        self
    }

    /// 单元数
    #[inline]
    pub fn n_elements(&self) -> usize {
        self.elements.len()
    }

    /// 河段数
    #[inline]
    pub fn n_rivers(&self) -> usize {
        self.rivers.len()
    }
}
