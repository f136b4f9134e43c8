//! 多个调用点共享一个依赖的端到端流程

use crate::common::*;
use circuitron::{BreakerRegistry, CircuitState, RecordingListener, RegistryConfig};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const REGISTRY_YAML: &str = r#"
defaults:
  failure_threshold: 3
  success_threshold: 2
  timeout_ms: 1000
breakers:
  notification-gateway:
    failure_threshold: 2
"#;

/// 两个包装函数指向同一个命名熔断器，共享熔断与恢复
#[tokio::test(start_paused = true)]
async fn test_wrapped_call_sites_trip_and_recover_together() {
    let listener = Arc::new(RecordingListener::new());
    let config = RegistryConfig::from_yaml_str(REGISTRY_YAML).unwrap();
    let registry = BreakerRegistry::with_config(config).with_listener(listener.clone());
    let healthy = Arc::new(AtomicBool::new(false));

    let breaker = registry.get_or_create_named("notification-gateway").unwrap();
    assert_eq!(breaker.config().failure_threshold, 2);
    assert_eq!(breaker.config().timeout, Duration::from_millis(1000));

    let send_email = {
        let healthy = healthy.clone();
        circuitron::wrap(breaker.clone(), move |to: &'static str| {
            let healthy = healthy.clone();
            async move {
                if healthy.load(Ordering::SeqCst) {
                    Ok(format!("email:{}", to))
                } else {
                    Err(DependencyError::Unavailable("smtp down".to_string()))
                }
            }
        })
    };
    let send_sms = {
        let healthy = healthy.clone();
        let breaker = registry.get_or_create_named("notification-gateway").unwrap();
        assert!(Arc::ptr_eq(&breaker, send_email.breaker()));
        circuitron::wrap(breaker, move |to: &'static str| {
            let healthy = healthy.clone();
            async move {
                if healthy.load(Ordering::SeqCst) {
                    Ok(format!("sms:{}", to))
                } else {
                    Err(DependencyError::Unavailable("gateway down".to_string()))
                }
            }
        })
    };

    // 每个调用点各失败一次，合计达到阈值
    send_email.call_with("pastor@example.org").await.unwrap_err();
    send_sms.call_with("+100").await.unwrap_err();
    assert_eq!(breaker.state(), CircuitState::Open);

    assert!(send_email.call_with("elder@example.org").await.unwrap_err().is_rejected());
    assert!(send_sms.call_with("+200").await.unwrap_err().is_rejected());

    healthy.store(true, Ordering::SeqCst);
    tokio::time::advance(Duration::from_millis(1000)).await;

    assert_eq!(send_sms.call_with("+300").await.unwrap(), "sms:+300");
    assert_eq!(
        send_email.call_with("deacon@example.org").await.unwrap(),
        "email:deacon@example.org"
    );
    assert!(breaker.is_closed());

    let stats = registry.snapshot();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].rejected_calls, 2);
    assert_eq!(stats[0].total_calls, 6);

    assert_eq!(
        listener.transitions_for("notification-gateway"),
        vec![CircuitState::Open, CircuitState::HalfOpen, CircuitState::Closed]
    );
}

/// 一个依赖熔断时其他依赖继续正常服务
#[tokio::test(start_paused = true)]
async fn test_failing_dependency_does_not_affect_others() {
    let config = RegistryConfig::from_yaml_str(REGISTRY_YAML).unwrap();
    let registry = BreakerRegistry::with_config(config);
    let broken = MockDependency::new();
    let healthy = MockDependency::new();

    let analytics = registry.get_or_create_named("analytics").unwrap();
    let members = registry.get_or_create_named("members").unwrap();
    assert_eq!(analytics.config().failure_threshold, 3);

    for _ in 0..3 {
        call_fail(&analytics, &broken).await.unwrap_err();
        call_ok(&members, &healthy).await.unwrap();
    }

    assert!(analytics.is_open());
    assert!(members.is_closed());
    assert_eq!(registry.names(), vec!["analytics".to_string(), "members".to_string()]);
    assert_eq!(healthy.calls(), 3);
}
