//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! 调用包装
//!
//! 把一个函数与熔断器绑定，调用点无需每次手动获取熔断器再调用 `execute`。
//! 包装本身不持有任何额外状态。

use crate::circuit_breaker::CircuitBreaker;
use crate::error::{CallError, FailureSource};
use std::future::Future;
use std::sync::Arc;

/// 经熔断器保护的函数
pub struct Guarded<F> {
    breaker: Arc<CircuitBreaker>,
    operation: F,
}

/// 将函数与熔断器绑定
///
/// # 示例
/// ```rust
/// use circuitron::circuit_breaker::CircuitBreaker;
/// use circuitron::config::CircuitBreakerConfig;
/// use circuitron::guard::wrap;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() {
/// let breaker = Arc::new(CircuitBreaker::new(CircuitBreakerConfig::new("churches")).unwrap());
/// let find_church = wrap(breaker, |id: u64| async move {
///     Ok::<_, std::io::Error>(format!("church-{}", id))
/// });
///
/// assert_eq!(find_church.call_with(7).await.unwrap(), "church-7");
/// # }
/// ```
pub fn wrap<F>(breaker: Arc<CircuitBreaker>, operation: F) -> Guarded<F> {
    Guarded { breaker, operation }
}

/// 将同步函数与熔断器绑定，返回普通闭包
pub fn wrap_sync<F, T, E>(
    breaker: Arc<CircuitBreaker>,
    operation: F,
) -> impl Fn() -> Result<T, CallError<E>>
where
    F: Fn() -> Result<T, E>,
    E: FailureSource,
{
    move || breaker.execute_sync(&operation)
}

impl<F> Guarded<F> {
    /// 执行无参数的异步函数
    pub async fn call<Fut, T, E>(&self) -> Result<T, CallError<E>>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureSource,
    {
        self.breaker.execute(|| (self.operation)()).await
    }

    /// 执行单参数的异步函数
    pub async fn call_with<A, Fut, T, E>(&self, arg: A) -> Result<T, CallError<E>>
    where
        F: Fn(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: FailureSource,
    {
        self.breaker.execute(|| (self.operation)(arg)).await
    }

    /// 执行无参数的同步函数
    pub fn call_sync<T, E>(&self) -> Result<T, CallError<E>>
    where
        F: Fn() -> Result<T, E>,
        E: FailureSource,
    {
        self.breaker.execute_sync(&self.operation)
    }

    /// 获取绑定的熔断器
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

impl<F: Clone> Clone for Guarded<F> {
    fn clone(&self) -> Self {
        Self {
            breaker: self.breaker.clone(),
            operation: self.operation.clone(),
        }
    }
}

impl<F> std::fmt::Debug for Guarded<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guarded")
            .field("breaker", &self.breaker.name())
            .finish_non_exhaustive()
    }
}
