//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 监控和追踪模块
//!
//! # 功能
//!
//! - `telemetry` 特性：初始化 tracing 订阅者（支持 `RUST_LOG`）
//! - `monitoring` 特性：Prometheus 指标，作为状态监听器接入熔断器
//!
//! # 示例
//!
//! ```rust,ignore
//! use circuitron::prelude::*;
//! use circuitron::telemetry::BreakerMetrics;
//! use std::sync::Arc;
//!
//! let metrics = Arc::new(BreakerMetrics::new().unwrap());
//! let registry = BreakerRegistry::new().with_listener(metrics.clone());
//!
//! // 定期同步快照并导出
//! metrics.observe(&registry.snapshot());
//! println!("{}", metrics.gather().unwrap());
//! ```

use crate::error::CircuitronError;
#[cfg(feature = "telemetry")]
use tracing::info;

/// 遥测配置
#[cfg(feature = "telemetry")]
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// 服务名称
    pub service_name: String,
    /// 未设置 `RUST_LOG` 时使用的日志级别过滤
    pub level: String,
    /// 是否输出日志目标模块
    pub with_target: bool,
}

#[cfg(feature = "telemetry")]
impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "circuitron".to_string(),
            level: "info".to_string(),
            with_target: true,
        }
    }
}

#[cfg(feature = "telemetry")]
impl TelemetryConfig {
    /// 创建新的配置
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// 设置日志级别过滤
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// 设置是否输出日志目标模块
    pub fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }
}

/// 初始化 tracing 订阅者
///
/// `RUST_LOG` 优先于配置中的级别。重复初始化返回错误。
#[cfg(feature = "telemetry")]
pub fn init_tracing(config: &TelemetryConfig) -> Result<(), CircuitronError> {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .try_init()
        .map_err(|e| CircuitronError::ConfigError(format!("初始化日志失败: {}", e)))?;

    info!(service = %config.service_name, "日志系统初始化完成");
    Ok(())
}

#[cfg(feature = "monitoring")]
pub use metrics::BreakerMetrics;

#[cfg(feature = "monitoring")]
mod metrics {
    use super::CircuitronError;
    use crate::error::{CircuitBreakerStats, CircuitState};
    use crate::listener::{StateChangeEvent, StateListener};
    use prometheus::{Encoder, IntCounterVec, IntGaugeVec, Opts, Registry, TextEncoder};

    /// 熔断器指标
    ///
    /// 作为 [`StateListener`] 统计状态变更次数，
    /// 并通过 [`BreakerMetrics::observe`] 同步统计快照。
    #[derive(Clone)]
    pub struct BreakerMetrics {
        /// 状态变更次数（标签：breaker, to）
        pub state_transitions: IntCounterVec,
        /// 当前状态（0 关闭，1 打开，2 半开）
        pub state: IntGaugeVec,
        /// 当前失败计数
        pub failure_count: IntGaugeVec,
        /// 被拒绝的调用数
        pub rejected_calls: IntGaugeVec,
        registry: Registry,
    }

    fn metrics_error(err: prometheus::Error) -> CircuitronError {
        CircuitronError::MetricsError(err.to_string())
    }

    fn state_value(state: CircuitState) -> i64 {
        match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }

    impl BreakerMetrics {
        /// 创建并注册所有指标
        pub fn new() -> Result<Self, CircuitronError> {
            let registry = Registry::new();

            let state_transitions = IntCounterVec::new(
                Opts::new(
                    "circuitron_state_transitions_total",
                    "Total number of circuit breaker state transitions",
                ),
                &["breaker", "to"],
            )
            .map_err(metrics_error)?;

            let state = IntGaugeVec::new(
                Opts::new(
                    "circuitron_state",
                    "Circuit breaker state (0 closed, 1 open, 2 half-open)",
                ),
                &["breaker"],
            )
            .map_err(metrics_error)?;

            let failure_count = IntGaugeVec::new(
                Opts::new("circuitron_failure_count", "Counted failures in the current window"),
                &["breaker"],
            )
            .map_err(metrics_error)?;

            let rejected_calls = IntGaugeVec::new(
                Opts::new("circuitron_rejected_calls", "Calls rejected while the breaker was open"),
                &["breaker"],
            )
            .map_err(metrics_error)?;

            registry
                .register(Box::new(state_transitions.clone()))
                .map_err(metrics_error)?;
            registry.register(Box::new(state.clone())).map_err(metrics_error)?;
            registry
                .register(Box::new(failure_count.clone()))
                .map_err(metrics_error)?;
            registry
                .register(Box::new(rejected_calls.clone()))
                .map_err(metrics_error)?;

            Ok(Self {
                state_transitions,
                state,
                failure_count,
                rejected_calls,
                registry,
            })
        }

        /// 同步统计快照
        pub fn observe(&self, stats: &[CircuitBreakerStats]) {
            for s in stats {
                let name = s.name.as_str();
                self.state.with_label_values(&[name]).set(state_value(s.state));
                self.failure_count
                    .with_label_values(&[name])
                    .set(s.failure_count as i64);
                self.rejected_calls
                    .with_label_values(&[name])
                    .set(s.rejected_calls as i64);
            }
        }

        /// 以文本格式导出所有指标
        pub fn gather(&self) -> Result<String, CircuitronError> {
            let encoder = TextEncoder::new();
            let mut buffer = Vec::new();
            encoder
                .encode(&self.registry.gather(), &mut buffer)
                .map_err(metrics_error)?;
            String::from_utf8(buffer).map_err(|e| CircuitronError::MetricsError(e.to_string()))
        }

        /// 获取指标注册表
        pub fn registry(&self) -> &Registry {
            &self.registry
        }
    }

    impl StateListener for BreakerMetrics {
        fn on_state_change(&self, event: &StateChangeEvent) {
            self.state_transitions
                .with_label_values(&[event.name.as_str(), event.to.as_str()])
                .inc();
            self.state
                .with_label_values(&[event.name.as_str()])
                .set(state_value(event.to));
            self.failure_count
                .with_label_values(&[event.name.as_str()])
                .set(event.failure_count as i64);
        }
    }

}
