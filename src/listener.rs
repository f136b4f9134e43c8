//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 状态变更监听
//!
//! 熔断器在每次状态变更后向监听器发送 [`StateChangeEvent`]。
//! 监听器在熔断器内部锁释放之后调用，可以安全地读取熔断器状态。

use crate::constants::DEFAULT_EVENT_HISTORY;
use crate::error::CircuitState;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{info, warn};

/// 状态变更事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChangeEvent {
    /// 熔断器名称
    pub name: String,
    /// 原状态
    pub from: CircuitState,
    /// 新状态
    pub to: CircuitState,
    /// 变更后的失败计数
    pub failure_count: u64,
    /// 变更后的成功计数
    pub success_count: u64,
    /// 变更时间
    pub at: DateTime<Utc>,
}

/// 状态变更监听器
pub trait StateListener: Send + Sync {
    /// 状态变更时调用
    fn on_state_change(&self, event: &StateChangeEvent);
}

/// 将状态变更写入 tracing 日志
///
/// 熔断器打开时输出 warn，其余变更输出 info。熔断器自身只在 debug 级别记录状态变更。
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl StateListener for TracingListener {
    fn on_state_change(&self, event: &StateChangeEvent) {
        match event.to {
            CircuitState::Open => warn!(
                breaker = %event.name,
                from = %event.from,
                to = %event.to,
                failure_count = event.failure_count,
                "熔断器打开，后续请求将被拒绝"
            ),
            CircuitState::HalfOpen => info!(
                breaker = %event.name,
                from = %event.from,
                to = %event.to,
                "熔断器半开，开始探测恢复"
            ),
            CircuitState::Closed => info!(
                breaker = %event.name,
                from = %event.from,
                to = %event.to,
                success_count = event.success_count,
                "熔断器关闭，服务已恢复"
            ),
        }
    }
}

/// 在内存中保留最近的状态变更事件
pub struct RecordingListener {
    events: Mutex<VecDeque<StateChangeEvent>>,
    capacity: usize,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_HISTORY)
    }

    /// 指定保留的事件数量，超出时丢弃最旧的事件
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(capacity.min(DEFAULT_EVENT_HISTORY))),
            capacity: capacity.max(1),
        }
    }

    /// 按发生顺序返回所有事件
    pub fn events(&self) -> Vec<StateChangeEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// 返回指定熔断器的状态序列（不含初始状态）
    pub fn transitions_for(&self, name: &str) -> Vec<CircuitState> {
        self.events
            .lock()
            .iter()
            .filter(|event| event.name == name)
            .map(|event| event.to)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Default for RecordingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl StateListener for RecordingListener {
    fn on_state_change(&self, event: &StateChangeEvent) {
        let mut events = self.events.lock();
        if events.len() == self.capacity {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}
