//! 熔断-冷却-探测-恢复的完整流程
//!
//! 配置：失败阈值3，成功阈值2，冷却时间1000ms

use crate::common::*;
use circuitron::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RecordingListener};
use std::sync::Arc;
use std::time::Duration;

fn scenario_breaker(listener: Arc<RecordingListener>) -> CircuitBreaker {
    init_test_tracing();
    let config = CircuitBreakerConfig::new("member-directory")
        .failure_threshold(3)
        .success_threshold(2)
        .timeout(Duration::from_millis(1000));
    CircuitBreaker::new(config).unwrap().with_listener(listener)
}

/// 三次失败熔断，第四次被拒绝，等待1100ms后两次成功探测恢复
#[tokio::test(start_paused = true)]
async fn test_full_recovery_cycle() {
    let listener = Arc::new(RecordingListener::new());
    let breaker = scenario_breaker(listener.clone());
    let dependency = MockDependency::new();

    // 第1~3次调用失败
    for _ in 0..3 {
        let err = call_fail(&breaker, &dependency).await.unwrap_err();
        assert!(!err.is_rejected());
    }
    assert_eq!(breaker.state(), CircuitState::Open);

    // 第4次立即调用被拒绝，依赖未被调用
    let err = call_ok(&breaker, &dependency).await.unwrap_err();
    assert!(err.is_rejected());
    assert!(err.to_string().contains("member-directory"));
    assert_eq!(dependency.calls(), 3);

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // 第5次调用作为探测被执行
    assert_eq!(call_ok(&breaker, &dependency).await.unwrap(), "ok");
    assert_eq!(dependency.calls(), 4);
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    // 第6次调用成功，熔断器关闭
    assert_eq!(call_ok(&breaker, &dependency).await.unwrap(), "ok");
    let stats = breaker.stats();
    assert_eq!(stats.state, CircuitState::Closed);
    assert_eq!(stats.failure_count, 0);
    assert_eq!(stats.success_count, 0);
    assert_eq!(stats.total_calls, 6);
    assert_eq!(stats.rejected_calls, 1);

    assert_eq!(
        listener.transitions_for("member-directory"),
        vec![CircuitState::Open, CircuitState::HalfOpen, CircuitState::Closed]
    );
}

/// 探测失败后重新打开，需要再等待完整的冷却时间
#[tokio::test(start_paused = true)]
async fn test_failed_trial_restarts_cooldown() {
    let listener = Arc::new(RecordingListener::new());
    let breaker = scenario_breaker(listener.clone());
    let dependency = MockDependency::new();

    for _ in 0..3 {
        call_fail(&breaker, &dependency).await.unwrap_err();
    }

    tokio::time::sleep(Duration::from_millis(1100)).await;

    // 探测失败
    let err = call_fail(&breaker, &dependency).await.unwrap_err();
    assert!(!err.is_rejected());
    assert_eq!(breaker.state(), CircuitState::Open);

    // 距离上次失败不足1000ms，仍然拒绝
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert!(call_ok(&breaker, &dependency).await.unwrap_err().is_rejected());
    assert_eq!(dependency.calls(), 4);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(call_ok(&breaker, &dependency).await.is_ok());
    assert_eq!(breaker.state(), CircuitState::HalfOpen);

    assert_eq!(
        listener.transitions_for("member-directory"),
        vec![
            CircuitState::Open,
            CircuitState::HalfOpen,
            CircuitState::Open,
            CircuitState::HalfOpen
        ]
    );
}

/// 半开状态下成功次数不足时，一次失败清空成功计数
#[tokio::test(start_paused = true)]
async fn test_partial_recovery_then_failure() {
    let breaker = scenario_breaker(Arc::new(RecordingListener::new()));
    let dependency = MockDependency::new();

    for _ in 0..3 {
        call_fail(&breaker, &dependency).await.unwrap_err();
    }
    tokio::time::sleep(Duration::from_millis(1000)).await;

    call_ok(&breaker, &dependency).await.unwrap();
    assert_eq!(breaker.stats().success_count, 1);

    call_fail(&breaker, &dependency).await.unwrap_err();
    let stats = breaker.stats();
    assert_eq!(stats.state, CircuitState::Open);
    assert_eq!(stats.success_count, 0);
}
