//! 测试通用工具模块
//!
//! 提供测试中常用的工具函数和辅助结构。

#![allow(dead_code)]

use circuitron::{CallError, CircuitBreaker, CircuitBreakerConfig};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 初始化测试日志
///
/// 输出经测试框架捕获，只有失败的测试才会打印。`RUST_LOG` 可覆盖默认级别。
pub fn init_test_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("circuitron=debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// 模拟依赖返回的错误
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    /// 依赖不可用，计入失败
    #[error("依赖不可用: {0}")]
    Unavailable(String),
    /// 业务校验错误，不应计入失败
    #[error("校验失败: {0}")]
    Validation(String),
}

/// 只把 `Unavailable` 计为失败的配置
pub fn validation_aware_config(name: &str) -> CircuitBreakerConfig {
    init_test_tracing();
    CircuitBreakerConfig::new(name).is_failure(|err| {
        !matches!(
            err.downcast_ref::<DependencyError>(),
            Some(DependencyError::Validation(_))
        )
    })
}

/// 创建测试用熔断器
pub fn create_breaker(
    name: &str,
    failure_threshold: u64,
    success_threshold: u64,
    timeout: Duration,
) -> Arc<CircuitBreaker> {
    init_test_tracing();
    let config = CircuitBreakerConfig::new(name)
        .failure_threshold(failure_threshold)
        .success_threshold(success_threshold)
        .timeout(timeout);
    Arc::new(CircuitBreaker::new(config).expect("valid test config"))
}

/// 记录调用次数的模拟依赖
#[derive(Debug, Default)]
pub struct MockDependency {
    calls: AtomicU64,
}

impl MockDependency {
    pub fn new() -> Arc<Self> {
        init_test_tracing();
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn ok(&self) -> Result<&'static str, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("ok")
    }

    pub async fn fail(&self) -> Result<&'static str, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DependencyError::Unavailable("connection refused".to_string()))
    }

    pub async fn invalid(&self) -> Result<&'static str, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(DependencyError::Validation("missing field".to_string()))
    }

    /// 挂起一段时间后返回结果，用于模拟慢调用
    pub async fn slow(&self, delay: Duration, succeed: bool) -> Result<&'static str, DependencyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(delay).await;
        if succeed {
            Ok("slow ok")
        } else {
            Err(DependencyError::Unavailable("timeout".to_string()))
        }
    }
}

/// 经熔断器调用一次失败的依赖
pub async fn call_fail(
    breaker: &CircuitBreaker,
    dependency: &MockDependency,
) -> Result<&'static str, CallError<DependencyError>> {
    breaker.execute(|| dependency.fail()).await
}

/// 经熔断器调用一次成功的依赖
pub async fn call_ok(
    breaker: &CircuitBreaker,
    dependency: &MockDependency,
) -> Result<&'static str, CallError<DependencyError>> {
    breaker.execute(|| dependency.ok()).await
}
