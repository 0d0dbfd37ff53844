// crates/sf_physics/src/element.rs

//! 三棱柱单元记录
//!
//! 每个网格三角形对应一个 [`Element`]，包含拓扑、土壤参数、水量状态、
//! 通量累加器以及可选的扩展记录（陆面耦合、裂隙基岩、氮素）。
//! 可选记录取代编译期条件字段，由能力标志决定是否存在。

use crate::types::MacroporeRegime;
use serde::{Deserialize, Serialize};
use sf_foundation::{EdgeNeighbor, ElemId, NUM_EDGE};

/// 单元拓扑与高程
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Topo {
    /// 面积 [m²]
    pub area: f64,
    /// 含水层底高程 [m]
    pub zmin: f64,
    /// 地表高程 [m]
    pub zmax: f64,
    /// 各边长度 [m]
    pub edge: [f64; NUM_EDGE],
    /// 至各邻居形心的距离 [m]
    pub nabr_dist: [f64; NUM_EDGE],
}

/// 土壤水力参数
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Soil {
    /// 土层厚度 [m]
    pub depth: f64,
    /// 水平饱和导水率 [m/s]
    pub ksath: f64,
    /// 垂向饱和导水率 [m/s]
    pub ksatv: f64,
    /// 入渗层垂向导水率 [m/s]
    pub kinfv: f64,
    /// 大孔隙水平导水率 [m/s]
    pub kmach: f64,
    /// 大孔隙垂向导水率 [m/s]
    pub kmacv: f64,
    /// 入渗层厚度 [m]
    pub dinf: f64,
    /// 大孔隙深度 [m]
    pub dmac: f64,
    /// van Genuchten α [1/m]
    pub alpha: f64,
    /// van Genuchten β
    pub beta: f64,
    /// 有效孔隙度
    pub porosity: f64,
    /// 水平方向大孔隙面积比（垂向流）
    pub areafh: f64,
    /// 垂向大孔隙面积比（水平流）
    pub areafv: f64,
}

/// 土地覆被
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandCover {
    /// 坡面 Manning 糙率
    pub rough: f64,
}

/// 水量状态 [m]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterState {
    /// 地表蓄水
    pub surf: f64,
    /// 非饱和带蓄水
    pub unsat: f64,
    /// 地下水位（自含水层底起算）
    pub gw: f64,
    /// 地表水头（截断为非负）
    pub surfh: f64,
}

impl WaterState {
    /// 由状态向量中的三个蓄量构造，地表水头截断为非负
    #[inline]
    pub fn from_storages(surf: f64, unsat: f64, gw: f64) -> Self {
        Self {
            surf,
            unsat,
            gw,
            surfh: surf.max(0.0),
        }
    }
}

/// 水通量 [m/s]，边通量为体积通量 [m³/s]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WaterFlux {
    /// 穿透降水
    pub pcpdrp: f64,
    /// 入渗
    pub infil: f64,
    /// 补给
    pub rechg: f64,
    /// 各边坡面出流（正值流出）
    pub ovlflow: [f64; NUM_EDGE],
    /// 各边地下出流（正值流出）
    pub subsurf: [f64; NUM_EDGE],
    /// 地表直接蒸发
    pub edir_surf: f64,
    /// 非饱和带直接蒸发
    pub edir_unsat: f64,
    /// 地下水直接蒸发
    pub edir_gw: f64,
    /// 非饱和带蒸腾
    pub ett_unsat: f64,
    /// 地下水蒸腾
    pub ett_gw: f64,
    /// 地下径流（陆面耦合时输出）
    pub runoff2: f64,
}

impl WaterFlux {
    /// 地下边通量之和除以面积
    #[inline]
    pub fn net_subsurf(&self, area: f64) -> f64 {
        self.subsurf.iter().map(|q| q / area).sum()
    }

    /// 坡面边通量之和除以面积
    #[inline]
    pub fn net_ovlflow(&self, area: f64) -> f64 {
        self.ovlflow.iter().map(|q| q / area).sum()
    }
}

/// 物理状态
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysState {
    /// 本次评估的大孔隙状态（每次重新计算，不跨调用缓存）
    pub macpore_status: MacroporeRegime,
    /// 冻土入渗折减系数
    pub fcr: f64,
}

impl Default for PhysState {
    fn default() -> Self {
        Self {
            macpore_status: MacroporeRegime::MatrixControlled,
            fcr: 1.0,
        }
    }
}

/// 逐边地下流诊断量（溶质输运用）
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EdgeDiagnostics {
    /// Darcy 速度 [m/s]
    pub subvelo: [f64; NUM_EDGE],
    /// 输运距离 [m]
    pub subdist: [f64; NUM_EDGE],
    /// 过流断面积 [m²]
    pub subarea: [f64; NUM_EDGE],
}

/// 陆面模型提供的表层土壤水分
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandSurfaceState {
    /// 表层液态含水量 [m³/m³]
    pub sh2o_top: f64,
    /// 残余含水量
    pub smcmin: f64,
    /// 饱和含水量
    pub smcmax: f64,
}

impl LandSurfaceState {
    /// 表层有效饱和度
    #[inline]
    pub fn saturation(&self) -> f64 {
        (self.sh2o_top - self.smcmin) / (self.smcmax - self.smcmin)
    }
}

/// 裂隙基岩层蓄量与外部给定的变化率
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BedrockStore {
    /// 基岩非饱和蓄水 [m]
    pub unsat: f64,
    /// 基岩地下水位 [m]
    pub gw: f64,
    /// 非饱和蓄量变化率 [m/s]
    pub dunsat_rate: f64,
    /// 地下水变化率 [m/s]
    pub dgw_rate: f64,
}

/// 单元氮库与输运记账
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NitrogenRecord {
    /// 地表矿质氮 [kgN/m²]
    pub surfn: f64,
    /// 土壤矿质氮 [kgN/m²]
    pub sminn: f64,
    /// 上一步地表氮
    pub surfn0: f64,
    /// 上一步土壤氮
    pub sminn0: f64,
    /// 沉降输入 [kgN m⁻² d⁻¹]
    pub ndep_to_sminn: f64,
    /// 固氮输入 [kgN m⁻² d⁻¹]
    pub nfix_to_sminn: f64,
    /// 溶质输运源汇项 [kgN m⁻² s⁻¹]
    pub snksrc: f64,
    /// 地表氮随入渗进入土壤的速率 [kgN m⁻² s⁻¹]
    pub surfn_to_sminn: f64,
    /// 土壤氮淋失速率 [kgN m⁻² s⁻¹]
    pub sminn_leach: f64,
    /// 累计淋失量 [kgN/m²]
    pub nleached_snk: f64,
}

/// 集总式（全流域）氮库
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LumpedNitrogen {
    /// 土壤矿质氮 [kgN/m²]
    pub sminn: f64,
    /// 上一步土壤氮
    pub sminn0: f64,
    /// 沉降输入 [kgN m⁻² d⁻¹]
    pub ndep_to_sminn: f64,
    /// 固氮输入 [kgN m⁻² d⁻¹]
    pub nfix_to_sminn: f64,
    /// 溶质输运源汇项 [kgN m⁻² s⁻¹]
    pub snksrc: f64,
    /// 淋失速率 [kgN m⁻² s⁻¹]
    pub sminn_leach: f64,
    /// 累计淋失量 [kgN/m²]
    pub nleached_snk: f64,
}

/// Spin-up 统计量
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SpinupStat {
    /// 土壤碳累加（周期结束后为日均值）
    pub soilc: f64,
    /// 总碳累加
    pub totalc: f64,
    /// 上一周期的土壤碳日均值
    pub soilc_prev: f64,
    /// 是否达到稳态
    pub steady: bool,
}

impl SpinupStat {
    /// 周期开始时清零累加器
    #[inline]
    pub fn reset(&mut self) {
        self.soilc = 0.0;
        self.totalc = 0.0;
    }
}

/// 三棱柱单元
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    /// 单元索引
    pub index: ElemId,
    /// 各边邻居
    pub nabr: [EdgeNeighbor; NUM_EDGE],
    /// 拓扑
    pub topo: Topo,
    /// 土壤
    pub soil: Soil,
    /// 土地覆被
    pub lc: LandCover,
    /// 当前水量状态
    pub ws: WaterState,
    /// 上一次 summary 时的状态
    pub ws0: WaterState,
    /// 水通量
    pub wf: WaterFlux,
    /// 物理状态
    pub ps: PhysState,
    /// 逐边诊断
    pub diag: EdgeDiagnostics,
    /// 陆面耦合记录
    pub lsm: Option<LandSurfaceState>,
    /// 裂隙基岩记录
    pub bedrock: Option<BedrockStore>,
    /// 氮素记录（分布式模式）
    pub nitrogen: Option<NitrogenRecord>,
    /// Spin-up 统计
    pub spinup: SpinupStat,
}

impl Element {
    /// 创建单元，状态与通量初始化为零
    pub fn new(
        index: ElemId,
        nabr: [EdgeNeighbor; NUM_EDGE],
        topo: Topo,
        soil: Soil,
        lc: LandCover,
    ) -> Self {
        Self {
            index,
            nabr,
            topo,
            soil,
            lc,
            ws: WaterState::default(),
            ws0: WaterState::default(),
            wf: WaterFlux::default(),
            ps: PhysState::default(),
            diag: EdgeDiagnostics::default(),
            lsm: None,
            bedrock: None,
            nitrogen: None,
            spinup: SpinupStat::default(),
        }
    }

    /// 设置初始水量状态（同时作为 ws0）
    pub fn with_state(mut self, surf: f64, unsat: f64, gw: f64) -> Self {
        self.ws = WaterState::from_storages(surf, unsat, gw);
        self.ws0 = self.ws;
        self
    }

    /// 附加陆面耦合记录
    pub fn with_land_surface(mut self, lsm: LandSurfaceState) -> Self {
        self.lsm = Some(lsm);
        self
    }

    /// 附加裂隙基岩记录
    pub fn with_bedrock(mut self, bedrock: BedrockStore) -> Self {
        self.bedrock = Some(bedrock);
        self
    }

    /// 附加氮素记录
    pub fn with_nitrogen(mut self, nitrogen: NitrogenRecord) -> Self {
        self.nitrogen = Some(nitrogen);
        self
    }

    /// 地表总水头 `zmax + surfh`
    #[inline]
    pub fn surface_head(&self) -> f64 {
        self.topo.zmax + self.ws.surfh
    }

    /// 地下水总水头 `zmin + gw`
    #[inline]
    pub fn groundwater_head(&self) -> f64 {
        self.topo.zmin + self.ws.gw
    }

    /// 与指定河段相邻的边
    #[inline]
    pub fn river_edge(&self, river: sf_foundation::RiverId) -> Option<usize> {
        self.nabr.iter().position(|n| n.is_river(river))
    }
}
