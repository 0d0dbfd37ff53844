// crates/sf_physics/src/forcing.rs

//! 强迫数据
//!
//! 每个宏步开始前由驱动层调用 [`ForcingProvider::apply`]，
//! 把穿透降水写入单元 `wf.pcpdrp`，把出口边界值写入河段 `bc`。
//! 求解器内部的 RHS 评估只读取这些值，不再查询强迫。

use crate::watershed::Watershed;
use serde::{Deserialize, Serialize};
use sf_foundation::{ElemId, RiverId, SfError, SfResult};

/// 外推模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrapolationMode {
    /// 超出范围时返回边界值
    #[default]
    Clamp,
    /// 用首/末两点的斜率延伸
    Linear,
    /// 周期重复（spin-up 循环同一强迫周期）
    Cyclic,
}

/// 查找游标，由调用方持有以加速单调推进的查询
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeSeriesCursor {
    /// 上次命中的区间
    pub last_index: usize,
}

/// 分段线性时间序列
///
/// 反序列化经过 [`TimeSeries::new`] 的同一组检查，非空且时间严格递增。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TimeSeriesData", into = "TimeSeriesData")]
pub struct TimeSeries {
    times: Vec<f64>,
    values: Vec<f64>,
    extrap_mode: ExtrapolationMode,
}

/// 序列化形式
#[derive(Serialize, Deserialize)]
struct TimeSeriesData {
    times: Vec<f64>,
    values: Vec<f64>,
    #[serde(default)]
    extrap_mode: ExtrapolationMode,
}

impl TryFrom<TimeSeriesData> for TimeSeries {
    type Error = SfError;

    fn try_from(data: TimeSeriesData) -> Result<Self, Self::Error> {
        Ok(Self::new(data.times, data.values)?.with_extrapolation(data.extrap_mode))
    }
}

impl From<TimeSeries> for TimeSeriesData {
    fn from(series: TimeSeries) -> Self {
        Self {
            times: series.times,
            values: series.values,
            extrap_mode: series.extrap_mode,
        }
    }
}

impl TimeSeries {
    /// 创建时间序列
    ///
    /// # 错误
    ///
    /// - 长度不一致或为空
    /// - 时间不严格递增
    pub fn new(times: Vec<f64>, values: Vec<f64>) -> SfResult<Self> {
        SfError::check_size("TimeSeries.values", times.len(), values.len())?;
        if times.is_empty() {
            return Err(SfError::config("时间序列不能为空"));
        }
        if let Some(i) = times.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SfError::invalid_config(
                "TimeSeries.times",
                format!("times[{}]={}", i + 1, times[i + 1]),
                "时间必须严格递增",
            ));
        }

        Ok(Self {
            times,
            values,
            extrap_mode: ExtrapolationMode::Clamp,
        })
    }

    /// 从 (时间, 值) 点对创建
    pub fn from_points(points: Vec<(f64, f64)>) -> SfResult<Self> {
        let (times, values) = points.into_iter().unzip();
        Self::new(times, values)
    }

    /// 常值序列
    pub fn constant(value: f64) -> Self {
        Self {
            times: vec![0.0],
            values: vec![value],
            extrap_mode: ExtrapolationMode::Clamp,
        }
    }

    /// 设置外推模式
    pub fn with_extrapolation(mut self, mode: ExtrapolationMode) -> Self {
        self.extrap_mode = mode;
        self
    }

    /// 外推模式
    pub fn extrapolation_mode(&self) -> ExtrapolationMode {
        self.extrap_mode
    }

    /// 时间范围
    pub fn time_range(&self) -> (f64, f64) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// 数据点数
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// 是否为空（构造保证非空）
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// 插值
    pub fn get_value(&self, t: f64) -> f64 {
        let mut cursor = TimeSeriesCursor::default();
        self.get_value_with_cursor(t, &mut cursor)
    }

    /// 带游标插值
    pub fn get_value_with_cursor(&self, t: f64, cursor: &mut TimeSeriesCursor) -> f64 {
        let (t_start, t_end) = self.time_range();
        let n = self.times.len();

        if t >= t_start && t <= t_end {
            return self.interpolate(t, cursor);
        }

        match self.extrap_mode {
            ExtrapolationMode::Clamp => {
                if t < t_start {
                    self.values[0]
                } else {
                    self.values[n - 1]
                }
            }
            ExtrapolationMode::Cyclic => {
                let duration = t_end - t_start;
                if duration < 1e-12 {
                    return self.values[0];
                }
                let offset = (t - t_start).rem_euclid(duration);
                self.interpolate(t_start + offset, cursor)
            }
            ExtrapolationMode::Linear => {
                if n < 2 {
                    return self.values[0];
                }
                if t < t_start {
                    let slope = (self.values[1] - self.values[0]) / (self.times[1] - t_start);
                    self.values[0] + slope * (t - t_start)
                } else {
                    let slope =
                        (self.values[n - 1] - self.values[n - 2]) / (t_end - self.times[n - 2]);
                    self.values[n - 1] + slope * (t - t_end)
                }
            }
        }
    }

    fn interpolate(&self, t: f64, cursor: &mut TimeSeriesCursor) -> f64 {
        let n = self.times.len();

        let mut idx = cursor.last_index;
        if idx >= n - 1 || t < self.times[idx] {
            // 回退时重新二分定位
            idx = self.times.partition_point(|&x| x <= t).saturating_sub(1);
        }
        while idx < n - 1 && t >= self.times[idx + 1] {
            idx += 1;
        }
        cursor.last_index = idx;

        if idx >= n - 1 {
            return self.values[n - 1];
        }

        let (t0, t1) = (self.times[idx], self.times[idx + 1]);
        let (v0, v1) = (self.values[idx], self.values[idx + 1]);
        v0 + (t - t0) / (t1 - t0) * (v1 - v0)
    }
}

/// 强迫提供者
pub trait ForcingProvider: Send {
    /// 名称
    fn name(&self) -> &str;

    /// 把时刻 `t` 的强迫写入流域
    fn apply(&mut self, t: f64, watershed: &mut Watershed) -> SfResult<()>;
}

#[derive(Debug, Clone)]
struct Binding<I> {
    target: I,
    series: TimeSeries,
    cursor: TimeSeriesCursor,
}

impl<I> Binding<I> {
    fn new(target: I, series: TimeSeries) -> Self {
        Self {
            target,
            series,
            cursor: TimeSeriesCursor::default(),
        }
    }

    fn value(&mut self, t: f64) -> f64 {
        self.series.get_value_with_cursor(t, &mut self.cursor)
    }
}

/// 基于时间序列的强迫
///
/// 单独绑定的单元优先于全流域统一序列。
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesForcing {
    uniform_throughfall: Option<Binding<()>>,
    throughfall: Vec<Binding<ElemId>>,
    river_head: Vec<Binding<RiverId>>,
    river_flux: Vec<Binding<RiverId>>,
}

impl TimeSeriesForcing {
    /// 空强迫
    pub fn new() -> Self {
        Self::default()
    }

    /// 全流域统一穿透降水 [m/s]
    pub fn with_uniform_throughfall(mut self, series: TimeSeries) -> Self {
        self.uniform_throughfall = Some(Binding::new((), series));
        self
    }

    /// 单元穿透降水 [m/s]
    pub fn with_throughfall(mut self, elem: ElemId, series: TimeSeries) -> Self {
        self.throughfall.push(Binding::new(elem, series));
        self
    }

    /// 出口 Dirichlet 水头 [m]
    pub fn with_river_head(mut self, river: RiverId, series: TimeSeries) -> Self {
        self.river_head.push(Binding::new(river, series));
        self
    }

    /// 出口 Neumann 流量 [m³/s]
    pub fn with_river_flux(mut self, river: RiverId, series: TimeSeries) -> Self {
        self.river_flux.push(Binding::new(river, series));
        self
    }
}

impl ForcingProvider for TimeSeriesForcing {
    fn name(&self) -> &str {
        "TimeSeriesForcing"
    }

    fn apply(&mut self, t: f64, watershed: &mut Watershed) -> SfResult<()> {
        let n_elem = watershed.n_elements();
        let n_river = watershed.n_rivers();

        if let Some(b) = self.uniform_throughfall.as_mut() {
            let v = b.value(t);
            for elem in watershed.elements.iter_mut() {
                elem.wf.pcpdrp = v;
            }
        }

        for b in self.throughfall.iter_mut() {
            SfError::check_index("Element", b.target.get(), n_elem)?;
            let v = b.value(t);
            watershed.elements[b.target.get()].wf.pcpdrp = v;
        }

        for b in self.river_head.iter_mut() {
            SfError::check_index("River", b.target.get(), n_river)?;
            let v = b.value(t);
            watershed.rivers[b.target.get()].bc.head = v;
        }

        for b in self.river_flux.iter_mut() {
            SfError::check_index("River", b.target.get(), n_river)?;
            let v = b.value(t);
            watershed.rivers[b.target.get()].bc.flux = v;
        }

        Ok(())
    }
}
