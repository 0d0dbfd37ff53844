// crates/sf_physics/src/segment.rs

//! 河段记录

use crate::geometry::{cross_section, CrossSection};
use crate::types::{ChannelShape, Downstream, RiverFlowPath, NUM_RIVFLOW};
use serde::{Deserialize, Serialize};
use sf_foundation::{ElemId, RiverId};
use std::ops::{Index, IndexMut};

/// 河道断面参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    /// 河床深度 [m]
    pub depth: f64,
    /// 断面形状
    pub shape: ChannelShape,
    /// 形状系数（矩形即河宽）
    pub coeff: f64,
    /// 河段长度 [m]
    pub length: f64,
    /// 满槽等效宽度 [m]
    pub width: f64,
}

impl Shape {
    /// 创建断面参数，等效宽度按满槽深度计算
    pub fn new(shape: ChannelShape, depth: f64, coeff: f64, length: f64) -> Self {
        Self {
            depth,
            shape,
            coeff,
            length,
            width: cross_section(shape, depth, coeff).width,
        }
    }

    /// 给定水位下的断面要素
    #[inline]
    pub fn at_stage(&self, stage: f64) -> CrossSection {
        cross_section(self.shape, stage, self.coeff)
    }
}

/// 河段高程与距离
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverTopo {
    /// 河床含水层底高程 [m]
    pub zmin: f64,
    /// 河岸高程 [m]
    pub zmax: f64,
    /// 河床高程 [m]
    pub zbed: f64,
    /// 出口节点地表高程 [m]
    pub node_zmax: f64,
    /// 至左岸单元距离 [m]
    pub dist_left: f64,
    /// 至右岸单元距离 [m]
    pub dist_right: f64,
    /// 河段平面面积 [m²]
    pub area: f64,
}

/// 河段材料参数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Material {
    /// Manning 糙率
    pub rough: f64,
    /// 堰流系数
    pub cwr: f64,
    /// 河床水平导水率 [m/s]
    pub ksath: f64,
    /// 河床垂向导水率 [m/s]
    pub ksatv: f64,
    /// 河床沉积层厚度 [m]
    pub bedthick: f64,
    /// 河床含水层孔隙度
    pub porosity: f64,
}

/// 河段水量状态 [m]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverState {
    /// 河道水位（自河床起算）
    pub stage: f64,
    /// 河床含水层水位（自含水层底起算）
    pub gw: f64,
}

/// 河段通量 [m³/s]，按 [`RiverFlowPath`] 索引
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverFlux {
    /// 各路径通量
    pub rivflow: [f64; NUM_RIVFLOW],
}

impl Index<RiverFlowPath> for RiverFlux {
    type Output = f64;

    #[inline]
    fn index(&self, path: RiverFlowPath) -> &f64 {
        &self.rivflow[path.index()]
    }
}

impl IndexMut<RiverFlowPath> for RiverFlux {
    #[inline]
    fn index_mut(&mut self, path: RiverFlowPath) -> &mut f64 {
        &mut self.rivflow[path.index()]
    }
}

/// 出口边界值
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverBc {
    /// Dirichlet 水头 [m]
    pub head: f64,
    /// Neumann 流量 [m³/s]
    pub flux: f64,
}

/// 河段氮库
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RiverNitrogen {
    /// 河水氮 [kgN]
    pub streamn: f64,
    /// 河床氮 [kgN]
    pub rivbedn: f64,
    /// 河水氮变化率（输运模块给定）[kgN/s]
    pub streamn_rate: f64,
    /// 河床氮变化率（输运模块给定）[kgN/s]
    pub rivbedn_rate: f64,
}

/// 河段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiverSegment {
    /// 河段索引
    pub index: RiverId,
    /// 左岸单元
    pub left: Option<ElemId>,
    /// 右岸单元
    pub right: Option<ElemId>,
    /// 下游去向
    pub down: Downstream,
    /// 断面
    pub shp: Shape,
    /// 拓扑
    pub topo: RiverTopo,
    /// 材料
    pub matl: Material,
    /// 当前状态
    pub ws: RiverState,
    /// 上一次 summary 时的状态
    pub ws0: RiverState,
    /// 通量
    pub wf: RiverFlux,
    /// 出口边界值
    pub bc: RiverBc,
    /// 氮素记录
    pub nitrogen: Option<RiverNitrogen>,
}

impl RiverSegment {
    /// 创建河段
    pub fn new(
        index: RiverId,
        left: Option<ElemId>,
        right: Option<ElemId>,
        down: Downstream,
        shp: Shape,
        topo: RiverTopo,
        matl: Material,
    ) -> Self {
        Self {
            index,
            left,
            right,
            down,
            shp,
            topo,
            matl,
            ws: RiverState::default(),
            ws0: RiverState::default(),
            wf: RiverFlux::default(),
            bc: RiverBc::default(),
            nitrogen: None,
        }
    }

    /// 设置初始状态（同时作为 ws0）
    pub fn with_state(mut self, stage: f64, gw: f64) -> Self {
        self.ws = RiverState { stage, gw };
        self.ws0 = self.ws;
        self
    }

    /// 设置出口边界值
    pub fn with_bc(mut self, bc: RiverBc) -> Self {
        self.bc = bc;
        self
    }

    /// 附加氮素记录
    pub fn with_nitrogen(mut self, nitrogen: RiverNitrogen) -> Self {
        self.nitrogen = Some(nitrogen);
        self
    }

    /// 河道总水头 `zbed + stage`
    #[inline]
    pub fn stage_head(&self) -> f64 {
        self.topo.zbed + self.ws.stage
    }

    /// 河床含水层总水头 `zmin + gw`
    #[inline]
    pub fn groundwater_head(&self) -> f64 {
        self.topo.zmin + self.ws.gw
    }

    /// 当前水位下的断面要素
    #[inline]
    pub fn cross_section(&self) -> CrossSection {
        self.shp.at_stage(self.ws.stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flux_index_by_path() {
        let mut wf = RiverFlux::default();
        wf[RiverFlowPath::ChanlLkg] = 2.5;
        assert_eq!(wf.rivflow[6], 2.5);
        assert_eq!(wf[RiverFlowPath::ChanlLkg], 2.5);
    }

    #[test]
    fn test_shape_width_from_geometry() {
        let shp = Shape::new(ChannelShape::Rectangle, 2.0, 8.0, 100.0);
        assert_eq!(shp.width, 8.0);
        assert_eq!(shp.at_stage(0.5).area, 4.0);
    }
}
