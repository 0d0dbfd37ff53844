// crates/sf_physics/src/parallel.rs

//! 并行执行策略
//!
//! 单元与河段循环均为按索引划分的数据并行：
//! - 串行（小规模问题）
//! - 收集后应用：先并行计算并收集结果，后串行写回共享位置
//!
//! 河段→单元的边写入与下游累加始终在收集完成之后串行进行。

use rayon::prelude::*;
use std::time::Duration;

/// 并行策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParallelStrategy {
    /// 串行执行
    Sequential,
    /// 收集后应用：并行计算 → 收集结果 → 串行写回
    CollectThenApply,
    /// 根据规模自动选择
    #[default]
    Auto,
}

impl ParallelStrategy {
    /// 对给定规模是否并行执行
    #[inline]
    pub fn is_parallel(self, n: usize, min_parallel_size: usize) -> bool {
        match self {
            Self::Sequential => false,
            Self::CollectThenApply => true,
            Self::Auto => n >= min_parallel_size,
        }
    }
}

/// RHS 评估性能指标
#[derive(Debug, Clone, Default)]
pub struct KernelMetrics {
    /// 总评估次数
    pub total_calls: usize,
    /// 并行评估次数
    pub parallel_calls: usize,
    /// 串行评估次数
    pub sequential_calls: usize,
    /// 累计耗时
    pub total_duration: Duration,
}

impl KernelMetrics {
    /// 记录一次评估
    pub fn record(&mut self, is_parallel: bool, duration: Duration) {
        self.total_calls += 1;
        self.total_duration += duration;
        if is_parallel {
            self.parallel_calls += 1;
        } else {
            self.sequential_calls += 1;
        }
    }

    /// 重置
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// 平均每次评估耗时
    pub fn avg_time_per_call(&self) -> Duration {
        if self.total_calls > 0 {
            self.total_duration / self.total_calls as u32
        } else {
            Duration::ZERO
        }
    }
}

/// 对每个元素原地执行 `f`
pub(crate) fn for_each_mut<T, F>(items: &mut [T], parallel: bool, f: F)
where
    T: Send,
    F: Fn(&mut T) + Sync + Send,
{
    if parallel {
        items.par_iter_mut().for_each(f);
    } else {
        items.iter_mut().for_each(f);
    }
}

/// 按索引计算并收集结果（只读阶段）
pub(crate) fn collect_indexed<R, F>(n: usize, parallel: bool, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    if parallel {
        (0..n).into_par_iter().map(f).collect()
    } else {
        (0..n).map(f).collect()
    }
}
