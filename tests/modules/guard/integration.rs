//! 调用包装模块集成测试
//!
//! 测试包装后的函数与注册表、熔断器的配合

use crate::common::*;
use circuitron::{wrap, wrap_sync, BreakerRegistry, CircuitBreakerConfig, CircuitState};
use std::sync::Arc;
use std::time::Duration;

/// 通过注册表一步获取熔断器并包装函数
#[tokio::test]
async fn test_registry_wrap() {
    let registry = BreakerRegistry::new();
    let dependency = MockDependency::new();

    let guarded = {
        let dependency = dependency.clone();
        registry
            .wrap(
                CircuitBreakerConfig::new("pastors").failure_threshold(2),
                move || {
                    let dependency = dependency.clone();
                    async move { dependency.fail().await }
                },
            )
            .unwrap()
    };

    guarded.call().await.unwrap_err();
    guarded.call().await.unwrap_err();

    assert_eq!(registry.get("pastors").unwrap().state(), CircuitState::Open);
    assert!(guarded.call().await.unwrap_err().is_rejected());
    assert_eq!(dependency.calls(), 2);
}

/// 包装带参数的函数，恢复后正常返回结果
#[tokio::test(start_paused = true)]
async fn test_wrap_with_argument_recovers() {
    let breaker = create_breaker("churches", 1, 1, Duration::from_millis(200));
    let healthy = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let find_church = {
        let healthy = healthy.clone();
        wrap(breaker.clone(), move |id: u64| {
            let healthy = healthy.clone();
            async move {
                if healthy.load(std::sync::atomic::Ordering::SeqCst) {
                    Ok(format!("church-{}", id))
                } else {
                    Err(DependencyError::Unavailable("db down".to_string()))
                }
            }
        })
    };

    assert!(!find_church.call_with(1).await.unwrap_err().is_rejected());
    assert!(find_church.call_with(2).await.unwrap_err().is_rejected());

    healthy.store(true, std::sync::atomic::Ordering::SeqCst);
    tokio::time::advance(Duration::from_millis(200)).await;

    assert_eq!(find_church.call_with(3).await.unwrap(), "church-3");
    assert!(breaker.is_closed());
}

/// 同步包装与异步调用共享同一个熔断器
#[tokio::test]
async fn test_wrap_sync_and_async_share_breaker() {
    let breaker = create_breaker("i18n", 2, 1, Duration::from_secs(60));
    let dependency = MockDependency::new();

    let load_table = wrap_sync(breaker.clone(), || {
        Err::<(), _>(DependencyError::Unavailable("file locked".to_string()))
    });

    load_table().unwrap_err();
    call_fail(&breaker, &dependency).await.unwrap_err();

    assert!(breaker.is_open());
    assert!(load_table().unwrap_err().is_rejected());
}
