//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Prelude module - Commonly used types for quick imports
//!
//! This module re-exports the most commonly used types from Circuitron,
//! allowing users to import them with a single `use circuitron::prelude::*;`
//! statement instead of importing each type individually.

// Core types - always available
pub use crate::circuit_breaker::CircuitBreaker;
pub use crate::config::{CircuitBreakerConfig, RegistryConfig};
pub use crate::error::{
    BoxedError, CallError, CircuitState, CircuitronError, FailureSource, ServiceUnavailable,
};
pub use crate::registry::BreakerRegistry;

// Wrapping helpers
pub use crate::guard::{wrap, wrap_sync, Guarded};

// Observers
pub use crate::listener::{StateChangeEvent, StateListener, TracingListener};

// Feature-gated exports
#[cfg(feature = "monitoring")]
pub use crate::telemetry::BreakerMetrics;

#[cfg(feature = "telemetry")]
pub use crate::telemetry::{init_tracing, TelemetryConfig};
