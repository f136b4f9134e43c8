//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 错误类型定义
//!
//! 使用thiserror定义所有错误类型。

use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// Circuitron 错误类型
#[derive(Error, Debug)]
pub enum CircuitronError {
    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// 熔断器打开，请求被拒绝
    #[error(transparent)]
    ServiceUnavailable(#[from] ServiceUnavailable),

    /// IO错误
    #[error("IO错误: {0}")]
    IoError(#[from] std::io::Error),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    SerdeError(#[from] serde_json::Error),

    /// YAML解析错误
    #[error("YAML解析错误: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML解析错误
    #[error("TOML解析错误: {0}")]
    TomlError(#[from] toml::de::Error),

    /// 指标错误
    #[error("指标错误: {0}")]
    MetricsError(String),
}

/// 快速失败错误
///
/// 熔断器处于打开状态且冷却时间未到时返回，不计入失败次数。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("服务不可用: 熔断器 '{name}' 已打开，请求被拒绝")]
pub struct ServiceUnavailable {
    /// 熔断器名称
    pub name: String,
}

impl ServiceUnavailable {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// 经熔断器执行操作的错误
///
/// `Rejected` 表示熔断器拒绝了调用，操作未被执行；
/// `Operation` 原样携带操作自身返回的错误。
#[derive(Error, Debug)]
pub enum CallError<E> {
    /// 熔断器打开，操作未执行
    #[error(transparent)]
    Rejected(#[from] ServiceUnavailable),

    /// 操作自身的错误
    #[error(transparent)]
    Operation(E),
}

impl<E> CallError<E> {
    /// 是否为快速失败
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallError::Rejected(_))
    }

    /// 获取操作错误的引用
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            CallError::Operation(e) => Some(e),
            CallError::Rejected(_) => None,
        }
    }

    /// 取出操作错误
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            CallError::Operation(e) => Some(e),
            CallError::Rejected(_) => None,
        }
    }

    /// 转换操作错误，拒绝错误保持不变
    pub fn map_operation<F, E2>(self, f: F) -> CallError<E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            CallError::Operation(e) => CallError::Operation(f(e)),
            CallError::Rejected(r) => CallError::Rejected(r),
        }
    }

    /// 合并为单一错误类型
    ///
    /// 适用于调用方的错误类型能够表达熔断拒绝的场景。
    pub fn flatten(self) -> E
    where
        E: From<ServiceUnavailable>,
    {
        match self {
            CallError::Operation(e) => e,
            CallError::Rejected(r) => E::from(r),
        }
    }
}

/// 可交给失败判定函数检查的操作错误
///
/// 所有实现了 `std::error::Error` 的类型都自动实现此 trait。
/// 装箱错误使用 [`BoxedError`] 包装。
pub trait FailureSource {
    /// 以 `dyn Error` 形式暴露错误，供判定函数 `downcast_ref`
    fn failure_source(&self) -> &(dyn StdError + 'static);
}

impl<E> FailureSource for E
where
    E: StdError + 'static,
{
    fn failure_source(&self) -> &(dyn StdError + 'static) {
        self
    }
}

/// 装箱的操作错误
///
/// `Box<dyn Error + Send + Sync>` 本身没有实现 `std::error::Error`，
/// 包装后即可经过熔断器执行。判定函数看到的是内部错误，
/// 因此 `downcast_ref` 仍然作用于原始错误类型。
///
/// # 示例
/// ```rust
/// use circuitron::error::BoxedError;
/// use circuitron::{CircuitBreaker, CircuitBreakerConfig};
///
/// # #[tokio::main]
/// # async fn main() {
/// let breaker = CircuitBreaker::new(CircuitBreakerConfig::new("http").failure_threshold(1)).unwrap();
/// let result = breaker
///     .execute(|| async { Err::<(), _>(BoxedError::from("connection reset")) })
///     .await;
/// assert!(!result.unwrap_err().is_rejected());
/// assert!(breaker.is_open());
/// # }
/// ```
pub struct BoxedError(pub Box<dyn StdError + Send + Sync>);

impl BoxedError {
    /// 取出内部错误
    pub fn into_inner(self) -> Box<dyn StdError + Send + Sync> {
        self.0
    }
}

impl FailureSource for BoxedError {
    fn failure_source(&self) -> &(dyn StdError + 'static) {
        &*self.0
    }
}

impl From<Box<dyn StdError + Send + Sync>> for BoxedError {
    fn from(err: Box<dyn StdError + Send + Sync>) -> Self {
        Self(err)
    }
}

impl From<&str> for BoxedError {
    fn from(message: &str) -> Self {
        Self(message.into())
    }
}

impl From<String> for BoxedError {
    fn from(message: String) -> Self {
        Self(message.into())
    }
}

impl fmt::Debug for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for BoxedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// 熔断器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// 关闭状态（正常）
    Closed,
    /// 打开状态（熔断）
    Open,
    /// 半开状态（探测）
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 熔断器统计信息
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CircuitBreakerStats {
    /// 熔断器名称
    pub name: String,
    /// 当前状态
    pub state: CircuitState,
    /// 失败次数
    pub failure_count: u64,
    /// 半开状态下的连续成功次数
    pub success_count: u64,
    /// 总调用次数（含被拒绝的调用）
    pub total_calls: u64,
    /// 被拒绝的调用次数
    pub rejected_calls: u64,
    /// 最后失败时间
    pub last_failure_time: Option<chrono::DateTime<chrono::Utc>>,
    /// 最后状态变更时间
    pub last_state_change: Option<chrono::DateTime<chrono::Utc>>,
}
