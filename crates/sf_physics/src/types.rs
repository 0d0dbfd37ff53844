// crates/sf_physics/src/types.rs

//! 物理层枚举类型
//!
//! 输入文件中的整数代码在构建阶段通过 `TryFrom<i32>` 解析为穷尽枚举，
//! 未知代码立即返回配置错误，因此通量核中不存在"未定义状态"分支。

use serde::{Deserialize, Serialize};
use sf_foundation::{RiverId, SfError};

/// 大孔隙控制状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MacroporeRegime {
    /// 基质控制：施加速率不超过基质入渗能力
    #[default]
    MatrixControlled,
    /// 施加控制：大孔隙部分激活
    ApplicationControlled,
    /// 大孔隙控制：大孔隙满负荷
    MacroporeControlled,
}

impl MacroporeRegime {
    /// 整数代码
    pub fn code(self) -> i32 {
        match self {
            Self::MatrixControlled => 1,
            Self::ApplicationControlled => 2,
            Self::MacroporeControlled => 3,
        }
    }
}

impl TryFrom<i32> for MacroporeRegime {
    type Error = SfError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::MatrixControlled),
            2 => Ok(Self::ApplicationControlled),
            3 => Ok(Self::MacroporeControlled),
            _ => Err(SfError::UnknownMacroporeRegime { code }),
        }
    }
}

/// 河道断面形状（幂律阶数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelShape {
    /// 矩形，系数为河宽
    Rectangle,
    /// 三角形
    Triangle,
    /// 二次抛物线
    Quadratic,
    /// 三次曲线
    Cubic,
}

impl ChannelShape {
    /// 幂律阶数 (1..=4)
    pub fn order(self) -> i32 {
        match self {
            Self::Rectangle => 1,
            Self::Triangle => 2,
            Self::Quadratic => 3,
            Self::Cubic => 4,
        }
    }
}

impl TryFrom<i32> for ChannelShape {
    type Error = SfError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Rectangle),
            2 => Ok(Self::Triangle),
            3 => Ok(Self::Quadratic),
            4 => Ok(Self::Cubic),
            _ => Err(SfError::UnknownChannelShape { code }),
        }
    }
}

/// 断面要素选择器（通量类型）
///
/// 代码 1 等效宽度，2 过水面积，3 湿周。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionQuantity {
    /// 等效宽度
    Width,
    /// 过水面积
    Area,
    /// 湿周
    Perimeter,
}

impl TryFrom<i32> for SectionQuantity {
    type Error = SfError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            1 => Ok(Self::Width),
            2 => Ok(Self::Area),
            3 => Ok(Self::Perimeter),
            _ => Err(SfError::UnknownFluxType { code }),
        }
    }
}

/// 河道出口边界条件
///
/// 输入编码为非正的 `down` 值：-1 Dirichlet，-2 Neumann，
/// -3 零水深梯度，-4 临界水深。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutletCondition {
    /// 给定水头
    Dirichlet,
    /// 给定流量
    Neumann,
    /// 零水深梯度（运动波近似）
    ZeroDepthGradient,
    /// 临界水深（Froude = 1）
    CriticalDepth,
}

impl OutletCondition {
    /// 输入代码
    pub fn code(self) -> i32 {
        match self {
            Self::Dirichlet => -1,
            Self::Neumann => -2,
            Self::ZeroDepthGradient => -3,
            Self::CriticalDepth => -4,
        }
    }
}

impl TryFrom<i32> for OutletCondition {
    type Error = SfError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            -1 => Ok(Self::Dirichlet),
            -2 => Ok(Self::Neumann),
            -3 => Ok(Self::ZeroDepthGradient),
            -4 => Ok(Self::CriticalDepth),
            _ => Err(SfError::UnknownOutletCondition { code }),
        }
    }
}

/// 下游去向：下游河段或出口边界，二者恰居其一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Downstream {
    /// 下游河段
    Segment(RiverId),
    /// 出口边界
    Outlet(OutletCondition),
}

impl Downstream {
    /// 解码输入的 `down` 字段（正值为 1 起始的河段编号）
    pub fn from_raw(down: i32) -> Result<Self, SfError> {
        if down > 0 {
            Ok(Self::Segment(RiverId::from_one_based(down as usize)))
        } else {
            OutletCondition::try_from(down).map(Self::Outlet)
        }
    }

    /// 下游河段（若有）
    #[inline]
    pub fn segment(self) -> Option<RiverId> {
        match self {
            Self::Segment(id) => Some(id),
            Self::Outlet(_) => None,
        }
    }
}

/// 河段通量路径数
pub const NUM_RIVFLOW: usize = 11;

/// 河段通量路径
///
/// 前 7 项（至 `ChanlLkg`）作用于河道水位，其余作用于河床含水层。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(usize)]
pub enum RiverFlowPath {
    /// 上游河道入流（累加项）
    UpChanl2Chanl = 0,
    /// 向下游河道出流
    DownChanl2Chanl = 1,
    /// 左岸坡面入河
    LeftSurf2Chanl = 2,
    /// 右岸坡面入河
    RightSurf2Chanl = 3,
    /// 左岸含水层与河道交换
    LeftAquif2Chanl = 4,
    /// 右岸含水层与河道交换
    RightAquif2Chanl = 5,
    /// 河床渗漏
    ChanlLkg = 6,
    /// 左岸含水层与河床含水层交换
    LeftAquif2Aquif = 7,
    /// 右岸含水层与河床含水层交换
    RightAquif2Aquif = 8,
    /// 向下游河床含水层出流
    DownAquif2Aquif = 9,
    /// 上游河床含水层入流（累加项）
    UpAquif2Aquif = 10,
}

impl RiverFlowPath {
    /// 全部路径，按索引顺序
    pub const ALL: [RiverFlowPath; NUM_RIVFLOW] = [
        Self::UpChanl2Chanl,
        Self::DownChanl2Chanl,
        Self::LeftSurf2Chanl,
        Self::RightSurf2Chanl,
        Self::LeftAquif2Chanl,
        Self::RightAquif2Chanl,
        Self::ChanlLkg,
        Self::LeftAquif2Aquif,
        Self::RightAquif2Aquif,
        Self::DownAquif2Aquif,
        Self::UpAquif2Aquif,
    ];

    /// 数组下标
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// 是否作用于河道水位
    #[inline]
    pub const fn is_channel(self) -> bool {
        (self as usize) <= (Self::ChanlLkg as usize)
    }
}

/// 河岸侧
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankSide {
    /// 左岸
    Left,
    /// 右岸
    Right,
}

impl BankSide {
    /// 坡面入河路径
    pub fn surf_path(self) -> RiverFlowPath {
        match self {
            Self::Left => RiverFlowPath::LeftSurf2Chanl,
            Self::Right => RiverFlowPath::RightSurf2Chanl,
        }
    }

    /// 含水层入河路径
    pub fn aquif_chanl_path(self) -> RiverFlowPath {
        match self {
            Self::Left => RiverFlowPath::LeftAquif2Chanl,
            Self::Right => RiverFlowPath::RightAquif2Chanl,
        }
    }

    /// 含水层-河床含水层路径
    pub fn aquif_aquif_path(self) -> RiverFlowPath {
        match self {
            Self::Left => RiverFlowPath::LeftAquif2Aquif,
            Self::Right => RiverFlowPath::RightAquif2Aquif,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macropore_codes() {
        for regime in [
            MacroporeRegime::MatrixControlled,
            MacroporeRegime::ApplicationControlled,
            MacroporeRegime::MacroporeControlled,
        ] {
            assert_eq!(MacroporeRegime::try_from(regime.code()).unwrap(), regime);
        }
        assert!(matches!(
            MacroporeRegime::try_from(0),
            Err(SfError::UnknownMacroporeRegime { code: 0 })
        ));
    }

    #[test]
    fn test_channel_shape_codes() {
        assert_eq!(ChannelShape::try_from(1).unwrap(), ChannelShape::Rectangle);
        assert_eq!(ChannelShape::try_from(4).unwrap(), ChannelShape::Cubic);
        let err = ChannelShape::try_from(5).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains('5'));
    }

    #[test]
    fn test_section_quantity_codes() {
        assert_eq!(SectionQuantity::try_from(2).unwrap(), SectionQuantity::Area);
        let err = SectionQuantity::try_from(7).unwrap_err();
        assert!(matches!(err, SfError::UnknownFluxType { code: 7 }));
        assert!(err.is_configuration());
    }

    #[test]
    fn test_downstream_decode() {
        assert_eq!(
            Downstream::from_raw(3).unwrap(),
            Downstream::Segment(RiverId(2))
        );
        assert_eq!(
            Downstream::from_raw(-4).unwrap(),
            Downstream::Outlet(OutletCondition::CriticalDepth)
        );
        assert!(matches!(
            Downstream::from_raw(-7),
            Err(SfError::UnknownOutletCondition { code: -7 })
        ));
        assert!(Downstream::from_raw(0).is_err());
    }

    #[test]
    fn test_flow_path_order() {
        for (i, path) in RiverFlowPath::ALL.iter().enumerate() {
            assert_eq!(path.index(), i);
        }
        assert!(RiverFlowPath::ChanlLkg.is_channel());
        assert!(!RiverFlowPath::LeftAquif2Aquif.is_channel());
    }
}
