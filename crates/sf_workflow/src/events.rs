// crates/sf_workflow/src/events.rs

//! 事件系统模块
//!
//! Spin-up 进度以事件形式分发，日志只是其中一个监听器。

use parking_lot::RwLock;
use sf_foundation::ElemId;
use std::sync::Arc;

/// Spin-up 事件
#[derive(Debug, Clone, PartialEq)]
pub enum SpinupEvent {
    /// 循环开始
    CycleStarted {
        /// 循环序号（1 起始）
        cycle: usize,
        /// 开始前已累计的 spin-up 年数
        spin_years: f64,
    },
    /// 单元稳态检查结果
    ElementChecked {
        /// 单元
        elem: ElemId,
        /// 上一周期土壤碳日均值
        soilc_prev: f64,
        /// 本周期土壤碳日均值
        soilc: f64,
        /// 年变化率
        rate: f64,
        /// 是否稳态
        steady: bool,
    },
    /// 循环结束
    CycleCompleted {
        /// 循环序号
        cycle: usize,
        /// 累计 spin-up 年数
        spin_years: f64,
        /// 稳态单元数
        steady_count: usize,
        /// 单元总数
        n_elements: usize,
    },
    /// 全部单元达到稳态
    Converged {
        /// 累计 spin-up 年数
        spin_years: f64,
        /// 循环数
        cycles: usize,
    },
    /// 达到最大 spin-up 年数仍未稳态
    LimitReached {
        /// 累计 spin-up 年数
        spin_years: f64,
        /// 稳态单元数
        steady_count: usize,
        /// 单元总数
        n_elements: usize,
    },
}

impl SpinupEvent {
    /// 获取事件名称
    pub fn name(&self) -> &'static str {
        match self {
            Self::CycleStarted { .. } => "CycleStarted",
            Self::ElementChecked { .. } => "ElementChecked",
            Self::CycleCompleted { .. } => "CycleCompleted",
            Self::Converged { .. } => "Converged",
            Self::LimitReached { .. } => "LimitReached",
        }
    }

    /// 是否为终止事件
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Converged { .. } | Self::LimitReached { .. })
    }
}

/// 事件监听器trait
pub trait EventListener: Send + Sync {
    /// 处理事件
    fn on_event(&self, event: &SpinupEvent);

    /// 获取监听器名称 (用于调试)
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// 函数式事件监听器
pub struct FnListener<F>
where
    F: Fn(&SpinupEvent) + Send + Sync,
{
    name: String,
    handler: F,
}

impl<F> FnListener<F>
where
    F: Fn(&SpinupEvent) + Send + Sync,
{
    /// 创建函数式监听器
    pub fn new(name: impl Into<String>, handler: F) -> Self {
        Self {
            name: name.into(),
            handler,
        }
    }
}

impl<F> EventListener for FnListener<F>
where
    F: Fn(&SpinupEvent) + Send + Sync,
{
    fn on_event(&self, event: &SpinupEvent) {
        (self.handler)(event);
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// 日志事件监听器
///
/// 循环进度与收敛用 `info`，达到上限用 `warn`，逐单元报告用 `debug`。
pub struct LoggingListener {
    prefix: String,
}

impl LoggingListener {
    /// 创建日志监听器
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl EventListener for LoggingListener {
    fn on_event(&self, event: &SpinupEvent) {
        match event {
            SpinupEvent::CycleStarted { cycle, spin_years } => {
                tracing::info!("{}: spin-up 循环 {} 开始 (已累计 {:.2} 年)", self.prefix, cycle, spin_years);
            }
            SpinupEvent::ElementChecked {
                elem,
                soilc_prev,
                soilc,
                rate,
                steady,
            } => {
                tracing::debug!(
                    "{}: {} soilc_prev = {:.6} soilc = {:.6} pdif = {:.6} steady = {}",
                    self.prefix,
                    elem,
                    soilc_prev,
                    soilc,
                    rate,
                    steady
                );
            }
            SpinupEvent::CycleCompleted {
                steady_count,
                n_elements,
                ..
            } => {
                tracing::info!(
                    "{}: {} 个单元稳态, 剩余 {} 个",
                    self.prefix,
                    steady_count,
                    n_elements - steady_count
                );
            }
            SpinupEvent::Converged { spin_years, cycles } => {
                tracing::info!(
                    "{}: 全部单元在 {:.2} 年 ({} 个循环) 后达到稳态",
                    self.prefix,
                    spin_years,
                    cycles
                );
            }
            SpinupEvent::LimitReached {
                spin_years,
                steady_count,
                n_elements,
            } => {
                tracing::warn!(
                    "{}: 达到最大 spin-up 年数 {:.2}, 仅 {}/{} 个单元稳态",
                    self.prefix,
                    spin_years,
                    steady_count,
                    n_elements
                );
            }
        }
    }

    fn name(&self) -> &str {
        "LoggingListener"
    }
}

/// 事件分发器
#[derive(Default)]
pub struct EventDispatcher {
    listeners: RwLock<Vec<Arc<dyn EventListener>>>,
}

impl EventDispatcher {
    /// 创建新的事件分发器
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// 添加监听器
    pub fn add_listener(&self, listener: Arc<dyn EventListener>) {
        let name = listener.name().to_string();
        self.listeners.write().push(listener);
        tracing::debug!("Added event listener: {}", name);
    }

    /// 添加函数式监听器
    pub fn add_fn_listener<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&SpinupEvent) + Send + Sync + 'static,
    {
        let listener = Arc::new(FnListener::new(name, handler));
        self.add_listener(listener);
    }

    /// 移除监听器
    pub fn remove_listener(&self, listener: &Arc<dyn EventListener>) {
        self.listeners
            .write()
            .retain(|l| !Arc::ptr_eq(l, listener));
    }

    /// 清除所有监听器
    pub fn clear(&self) {
        self.listeners.write().clear();
    }

    /// 分发事件
    pub fn emit(&self, event: SpinupEvent) {
        let listeners = self.listeners.read();

        tracing::trace!("Emitting event: {}", event.name());

        for listener in listeners.iter() {
            listener.on_event(&event);
        }
    }

    /// 获取监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_event_dispatcher() {
        let dispatcher = EventDispatcher::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();

        dispatcher.add_fn_listener("test", move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        dispatcher.add_listener(Arc::new(LoggingListener::new("spinup")));

        dispatcher.emit(SpinupEvent::CycleStarted {
            cycle: 1,
            spin_years: 0.0,
        });
        dispatcher.emit(SpinupEvent::Converged {
            spin_years: 2.0,
            cycles: 2,
        });

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(dispatcher.listener_count(), 2);
    }

    #[test]
    fn test_remove_listener() {
        let dispatcher = EventDispatcher::new();
        let listener: Arc<dyn EventListener> = Arc::new(LoggingListener::new("x"));
        dispatcher.add_listener(listener.clone());
        dispatcher.remove_listener(&listener);
        assert_eq!(dispatcher.listener_count(), 0);
    }

    #[test]
    fn test_terminal_events() {
        let event = SpinupEvent::LimitReached {
            spin_years: 500.0,
            steady_count: 3,
            n_elements: 4,
        };
        assert!(event.is_terminal());
        assert_eq!(event.name(), "LimitReached");
        assert!(!SpinupEvent::CycleStarted { cycle: 1, spin_years: 0.0 }.is_terminal());
    }
}
