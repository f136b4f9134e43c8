//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Circuitron - Named Circuit Breakers
//!
//! Guards calls to unreliable dependencies (database, external APIs,
//! third-party services) with three-state circuit breakers that share failure
//! accounting through a registry keyed by name.
//!
//! # API Layers
//!
//! ## Prelude (Quick Start)
//!
//! Use `use circuitron::prelude::*;` to import all commonly used types.
//!
//! ## Core API
//!
//! - [`CircuitBreaker`] - State machine guarding one dependency
//! - [`BreakerRegistry`] - Shared store of named breakers
//! - [`wrap`] - Bind a function to a breaker
//! - [`CallError`] - Fast-fail rejection or the operation's own error
//!
//! ## Extensions (feature-gated)
//!
//! - Tracing subscriber bootstrap (requires `telemetry` feature)
//! - Prometheus metrics listener (requires `monitoring` feature)
//!
//! # Examples
//!
//! ```rust
//! use circuitron::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = BreakerRegistry::new();
//!     let breaker = registry
//!         .get_or_create(
//!             CircuitBreakerConfig::new("database")
//!                 .failure_threshold(3)
//!                 .timeout(Duration::from_secs(10)),
//!         )
//!         .unwrap();
//!
//!     let result = breaker
//!         .execute(|| async { Ok::<_, std::io::Error>("row") })
//!         .await;
//!     assert_eq!(result.unwrap(), "row");
//! }
//! ```
//!
//! # Features
//!
//! - **Three states**: Closed, Open, HalfOpen with lazy cooldown evaluation
//! - **Failure classification**: Only errors accepted by `is_failure` count
//! - **Shared registry**: Identity-stable breakers per dependency name
//! - **Observers**: State change events for logging and metrics
//! - **File configuration**: Defaults and per-breaker overrides from YAML, TOML or JSON

pub mod prelude;

pub mod circuit_breaker;
pub mod config;
pub mod constants;
pub mod error;
pub mod guard;
pub mod listener;
pub mod registry;
#[cfg(any(feature = "telemetry", feature = "monitoring"))]
pub mod telemetry;

// 重新导出常用类型
pub use circuit_breaker::CircuitBreaker;
pub use config::{BreakerSettings, CircuitBreakerConfig, FailurePredicate, RegistryConfig};
pub use error::{
    BoxedError, CallError, CircuitBreakerStats, CircuitState, CircuitronError, FailureSource,
    ServiceUnavailable,
};
pub use guard::{wrap, wrap_sync, Guarded};
pub use listener::{RecordingListener, StateChangeEvent, StateListener, TracingListener};
pub use registry::BreakerRegistry;
#[cfg(feature = "monitoring")]
pub use telemetry::BreakerMetrics;
#[cfg(feature = "telemetry")]
pub use telemetry::{init_tracing, TelemetryConfig};
