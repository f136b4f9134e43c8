//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 熔断器实现
//!
//! 提供熔断器功能，支持三状态转换和自动恢复。
//!
//! # 特性
//!
//! - **三状态**: Closed（关闭）、Open（打开）、HalfOpen（半开）
//! - **自动熔断**: 连续失败次数达到阈值自动熔断
//! - **惰性恢复**: 不使用后台定时器，冷却时间在下一次调用时检查
//! - **失败分类**: 通过 `is_failure` 判定错误是否计入失败
//! - **线程安全**: 所有可变状态由一把互斥锁保护，锁不会跨越 `.await`
//! - **统计信息**: 提供详细的统计信息
//!
//! 半开状态下所有调用都会被放行作为探测调用，不限制并发探测数量。

use crate::config::CircuitBreakerConfig;
use crate::error::{
    CallError, CircuitBreakerStats, CircuitState, CircuitronError, FailureSource, ServiceUnavailable,
};
use crate::listener::{StateChangeEvent, StateListener};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

/// 受锁保护的熔断器状态
#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    failure_count: u64,
    success_count: u64,
    /// 最后一次计数失败的时刻，同时是冷却窗口的起点
    last_failure_time: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    last_state_change: Option<DateTime<Utc>>,
}

impl BreakerInner {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            success_count: 0,
            last_failure_time: None,
            last_failure_at: None,
            last_state_change: Some(Utc::now()),
        }
    }
}

/// 熔断器
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
    /// 总调用次数
    total_calls: AtomicU64,
    /// 被拒绝的调用次数
    rejected_calls: AtomicU64,
    listeners: Vec<Arc<dyn StateListener>>,
}

impl CircuitBreaker {
    /// 创建新的熔断器
    ///
    /// 配置不合法（名称为空、阈值为0）时返回错误。
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::circuit_breaker::CircuitBreaker;
    /// use circuitron::config::CircuitBreakerConfig;
    /// use std::time::Duration;
    ///
    /// let config = CircuitBreakerConfig::new("database")
    ///     .failure_threshold(5)
    ///     .success_threshold(2)
    ///     .timeout(Duration::from_secs(30));
    /// let breaker = CircuitBreaker::new(config).unwrap();
    /// assert!(breaker.is_closed());
    /// ```
    pub fn new(config: CircuitBreakerConfig) -> Result<Self, CircuitronError> {
        config.validate()?;

        info!(
            breaker = %config.name,
            failure_threshold = config.failure_threshold,
            success_threshold = config.success_threshold,
            timeout = ?config.timeout,
            "创建熔断器"
        );

        Ok(Self {
            config,
            inner: Mutex::new(BreakerInner::new()),
            total_calls: AtomicU64::new(0),
            rejected_calls: AtomicU64::new(0),
            listeners: Vec::new(),
        })
    }

    /// 添加状态变更监听器
    pub fn with_listener(mut self, listener: Arc<dyn StateListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// 批量添加状态变更监听器
    pub fn with_listeners<I>(mut self, listeners: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn StateListener>>,
    {
        self.listeners.extend(listeners);
        self
    }

    /// 执行异步操作，自动处理熔断逻辑
    ///
    /// # 返回
    /// - `Ok(T)`: 操作成功
    /// - `Err(CallError::Rejected)`: 熔断器打开，操作未执行
    /// - `Err(CallError::Operation)`: 操作自身的错误，原样返回
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::circuit_breaker::CircuitBreaker;
    /// use circuitron::config::CircuitBreakerConfig;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let breaker = CircuitBreaker::new(CircuitBreakerConfig::new("pastor-api")).unwrap();
    ///
    /// let result = breaker
    ///     .execute(|| async { Ok::<_, std::io::Error>(42) })
    ///     .await;
    /// assert_eq!(result.unwrap(), 42);
    /// # }
    /// ```
    pub async fn execute<F, Fut, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureSource,
    {
        self.execute_with(|err: &E| self.counts_as_failure(err), operation)
            .await
    }

    /// 执行异步操作，使用本次调用提供的判定函数代替配置中的 `is_failure`
    ///
    /// 错误类型不要求实现 `std::error::Error`，
    /// 适用于 `Box<dyn Error + Send + Sync>`、`anyhow::Error` 等错误类型。
    ///
    /// # 示例
    /// ```rust
    /// use circuitron::circuit_breaker::CircuitBreaker;
    /// use circuitron::config::CircuitBreakerConfig;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let breaker = CircuitBreaker::new(CircuitBreakerConfig::new("upstream")).unwrap();
    ///
    /// let result = breaker
    ///     .execute_with(
    ///         |_err: &Box<dyn std::error::Error + Send + Sync>| true,
    ///         || async { Err::<(), _>("connection reset".into()) },
    ///     )
    ///     .await;
    /// assert!(!result.unwrap_err().is_rejected());
    /// assert_eq!(breaker.stats().failure_count, 1);
    /// # }
    /// ```
    pub async fn execute_with<C, F, Fut, T, E>(
        &self,
        is_failure: C,
        operation: F,
    ) -> Result<T, CallError<E>>
    where
        C: FnOnce(&E) -> bool,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.try_acquire()?;

        // 锁已释放，操作可以任意时长地挂起
        let result = operation().await;

        self.record(result, is_failure)
    }

    /// 执行同步操作，语义与 [`CircuitBreaker::execute`] 相同
    pub fn execute_sync<F, T, E>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Result<T, E>,
        E: FailureSource,
    {
        self.execute_sync_with(|err: &E| self.counts_as_failure(err), operation)
    }

    /// 执行同步操作，语义与 [`CircuitBreaker::execute_with`] 相同
    pub fn execute_sync_with<C, F, T, E>(
        &self,
        is_failure: C,
        operation: F,
    ) -> Result<T, CallError<E>>
    where
        C: FnOnce(&E) -> bool,
        F: FnOnce() -> Result<T, E>,
    {
        self.try_acquire()?;
        self.record(operation(), is_failure)
    }

    fn counts_as_failure<E: FailureSource>(&self, err: &E) -> bool {
        (self.config.is_failure)(err.failure_source())
    }

    /// 检查是否允许调用
    ///
    /// 打开状态下冷却时间已到时切换到半开状态并放行本次调用。
    fn try_acquire(&self) -> Result<(), ServiceUnavailable> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);

        let event = {
            let mut inner = self.inner.lock();
            let state = inner.state;

            match state {
                CircuitState::Closed | CircuitState::HalfOpen => None,
                CircuitState::Open => {
                    let cooled_down = inner
                        .last_failure_time
                        .map(|t| t.elapsed() >= self.config.timeout)
                        .unwrap_or(true);

                    if !cooled_down {
                        drop(inner);
                        self.rejected_calls.fetch_add(1, Ordering::Relaxed);
                        warn!(breaker = %self.config.name, "熔断器打开，拒绝请求");
                        return Err(ServiceUnavailable::new(self.config.name.clone()));
                    }

                    Some(self.transition(&mut inner, CircuitState::HalfOpen))
                }
            }
        };

        self.notify(event);
        Ok(())
    }

    /// 根据操作结果更新状态
    fn record<T, E, C>(&self, result: Result<T, E>, is_failure: C) -> Result<T, CallError<E>>
    where
        C: FnOnce(&E) -> bool,
    {
        match result {
            Ok(value) => {
                self.on_success();
                Ok(value)
            }
            Err(err) => {
                if is_failure(&err) {
                    self.on_failure();
                } else {
                    trace!(breaker = %self.config.name, "错误不计入失败");
                }
                Err(CallError::Operation(err))
            }
        }
    }

    /// 操作成功时的处理
    fn on_success(&self) {
        let event = {
            let mut inner = self.inner.lock();
            let state = inner.state;

            match state {
                CircuitState::Closed => {
                    // 成功会清除尚未达到阈值的失败
                    inner.failure_count = 0;
                    trace!(breaker = %self.config.name, "操作成功（关闭状态）");
                    None
                }
                CircuitState::HalfOpen => {
                    inner.success_count += 1;

                    if inner.success_count >= self.config.success_threshold {
                        Some(self.transition(&mut inner, CircuitState::Closed))
                    } else {
                        trace!(
                            breaker = %self.config.name,
                            "操作成功（半开状态）: {}/{}",
                            inner.success_count,
                            self.config.success_threshold
                        );
                        None
                    }
                }
                CircuitState::Open => {
                    // 其他探测调用已重新打开熔断器
                    trace!(breaker = %self.config.name, "熔断器打开状态下收到成功响应");
                    None
                }
            }
        };

        self.notify(event);
    }

    /// 操作失败时的处理
    fn on_failure(&self) {
        let event = {
            let mut inner = self.inner.lock();

            inner.failure_count += 1;
            inner.last_failure_time = Some(Instant::now());
            inner.last_failure_at = Some(Utc::now());
            let state = inner.state;

            match state {
                CircuitState::Closed => {
                    if inner.failure_count >= self.config.failure_threshold {
                        Some(self.transition(&mut inner, CircuitState::Open))
                    } else {
                        trace!(
                            breaker = %self.config.name,
                            "操作失败（关闭状态）: {}/{}",
                            inner.failure_count,
                            self.config.failure_threshold
                        );
                        None
                    }
                }
                // 半开状态下任何一次失败都会重新打开熔断器
                CircuitState::HalfOpen => Some(self.transition(&mut inner, CircuitState::Open)),
                CircuitState::Open => {
                    trace!(breaker = %self.config.name, "熔断器打开状态下收到失败响应，刷新冷却时间");
                    None
                }
            }
        };

        self.notify(event);
    }

    /// 切换状态，返回需要通知的事件
    ///
    /// 调用方持有锁；事件在锁释放后通过 [`CircuitBreaker::notify`] 发送。
    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) -> StateChangeEvent {
        let from = inner.state;
        inner.state = to;
        let now = Utc::now();
        inner.last_state_change = Some(now);

        match to {
            CircuitState::Closed => {
                inner.failure_count = 0;
                inner.success_count = 0;
            }
            CircuitState::HalfOpen | CircuitState::Open => {
                inner.success_count = 0;
            }
        }

        // info/warn 级别的状态变更日志由 TracingListener 输出
        debug!(
            breaker = %self.config.name,
            failure_count = inner.failure_count,
            "熔断器状态变更: {} -> {}",
            from,
            to
        );

        StateChangeEvent {
            name: self.config.name.clone(),
            from,
            to,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            at: now,
        }
    }

    fn notify(&self, event: Option<StateChangeEvent>) {
        if let Some(event) = event {
            for listener in &self.listeners {
                listener.on_state_change(&event);
            }
        }
    }

    /// 检查熔断器是否打开
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// 检查熔断器是否半开
    pub fn is_half_open(&self) -> bool {
        self.state() == CircuitState::HalfOpen
    }

    /// 检查熔断器是否关闭
    pub fn is_closed(&self) -> bool {
        self.state() == CircuitState::Closed
    }

    /// 获取当前状态
    ///
    /// 只读快照：冷却时间已到的打开状态仍报告为 `Open`，直到下一次调用。
    pub fn state(&self) -> CircuitState {
        self.inner.lock().state
    }

    /// 距离允许探测调用的剩余时间
    ///
    /// 仅在打开状态且冷却未结束时返回 `Some`。
    pub fn retry_after(&self) -> Option<Duration> {
        let inner = self.inner.lock();
        if inner.state != CircuitState::Open {
            return None;
        }

        let elapsed = inner.last_failure_time?.elapsed();
        self.config
            .timeout
            .checked_sub(elapsed)
            .filter(|remaining| !remaining.is_zero())
    }

    /// 重置熔断器到关闭状态
    pub fn reset(&self) {
        let event = {
            let mut inner = self.inner.lock();
            let from = inner.state;
            *inner = BreakerInner::new();
            self.total_calls.store(0, Ordering::Relaxed);
            self.rejected_calls.store(0, Ordering::Relaxed);
            info!(breaker = %self.config.name, "重置熔断器");

            (from != CircuitState::Closed).then(|| StateChangeEvent {
                name: self.config.name.clone(),
                from,
                to: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                at: inner.last_state_change.unwrap_or_else(Utc::now),
            })
        };

        self.notify(event);
    }

    /// 获取统计信息
    pub fn stats(&self) -> CircuitBreakerStats {
        let inner = self.inner.lock();

        CircuitBreakerStats {
            name: self.config.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            total_calls: self.total_calls.load(Ordering::Relaxed),
            rejected_calls: self.rejected_calls.load(Ordering::Relaxed),
            last_failure_time: inner.last_failure_at,
            last_state_change: inner.last_state_change,
        }
    }

    /// 获取名称
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// 获取配置
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("config", &self.config)
            .field("inner", &*self.inner.lock())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
