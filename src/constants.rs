//! Copyright (c) 2026, Kirky.X
//!
//! MIT License
//!
//! Centralized configuration constants for Circuitron.
//!
//! All default values used by the breaker and the registry are defined here.

// ============================================================================
// Circuit Breaker Constants
// ============================================================================

/// Default failure threshold for circuit breaker.
///
/// The circuit breaker transitions to open state after this many consecutive
/// counted failures.
pub const DEFAULT_FAILURE_THRESHOLD: u64 = 5;

/// Default success threshold for circuit breaker half-open state.
///
/// The circuit breaker transitions to closed state after this many successful
/// trial calls in half-open state.
pub const DEFAULT_SUCCESS_THRESHOLD: u64 = 2;

/// Default cooldown for circuit breaker (30 seconds).
///
/// How long the circuit breaker remains open before a trial call is admitted.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

// ============================================================================
// Observer Constants
// ============================================================================

/// Default number of state change events kept by a recording listener.
pub const DEFAULT_EVENT_HISTORY: usize = 256;
