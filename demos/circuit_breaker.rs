//! 熔断器示例
//!
//! 本示例演示 BreakerRegistry、wrap 和状态监听器的使用方式。
//!
//! 运行方式: `cargo run --example circuit_breaker`

use circuitron::prelude::*;
use circuitron::RecordingListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 模拟的外部服务错误
#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("连接被拒绝")]
    ConnectionRefused,
    #[error("请求参数无效: {0}")]
    BadRequest(String),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "telemetry")]
    circuitron::init_tracing(&circuitron::TelemetryConfig::new("circuit-breaker-demo"))?;

    println!("=== 熔断器示例 ===\n");

    let history = Arc::new(RecordingListener::new());
    let registry = BreakerRegistry::new()
        .with_listener(Arc::new(TracingListener))
        .with_listener(history.clone());

    // 参数错误不计入失败
    let config = CircuitBreakerConfig::new("directory-api")
        .failure_threshold(3)
        .success_threshold(2)
        .timeout(Duration::from_millis(500))
        .is_failure(|err| !matches!(err.downcast_ref::<ApiError>(), Some(ApiError::BadRequest(_))));

    let healthy = Arc::new(AtomicBool::new(false));
    let lookup = {
        let healthy = healthy.clone();
        registry.wrap(config, move |id: u32| {
            let healthy = healthy.clone();
            async move {
                if id == 0 {
                    return Err(ApiError::BadRequest("id 不能为 0".to_string()));
                }
                if healthy.load(Ordering::SeqCst) {
                    Ok(format!("member-{}", id))
                } else {
                    Err(ApiError::ConnectionRefused)
                }
            }
        })?
    };

    println!("--- 依赖故障 ---\n");
    for id in 0..6 {
        match lookup.call_with(id).await {
            Ok(member) => println!("  请求 {}: 成功 {}", id, member),
            Err(CallError::Rejected(e)) => println!("  请求 {}: 快速失败 ({})", id, e),
            Err(CallError::Operation(e)) => println!("  请求 {}: 依赖错误 ({})", id, e),
        }
    }

    let breaker = lookup.breaker();
    if let Some(wait) = breaker.retry_after() {
        println!("\n  熔断器已打开，{}ms 后允许探测", wait.as_millis());
    }

    println!("\n--- 依赖恢复 ---\n");
    healthy.store(true, Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(600)).await;

    for id in 10..13 {
        match lookup.call_with(id).await {
            Ok(member) => println!("  请求 {}: 成功 {} (状态: {})", id, member, breaker.state()),
            Err(e) => println!("  请求 {}: 失败 {}", id, e),
        }
    }

    println!("\n--- 状态变更记录 ---\n");
    for event in history.events() {
        println!("  {}: {} -> {}", event.name, event.from, event.to);
    }

    println!("\n--- 统计快照 ---\n");
    for stats in registry.snapshot() {
        println!("  {}", serde_json::to_string(&stats)?);
    }

    println!("\n=== 示例完成 ===");
    Ok(())
}
