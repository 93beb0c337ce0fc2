//! Application layer - orchestration of domain logic.
//!
//! This layer coordinates the domain logic and manages the runtime behavior:
//! - Policy registry (which actions are throttled, and how)
//! - Decision engine (one atomic increment, one classification)
//! - Admission gate (failure posture, circuit breaker, retry-after)
//!
//! ## Ports
//!
//! The application layer defines ports (traits) that infrastructure
//! adapters must implement. This keeps the application layer independent
//! from infrastructure details.

pub mod circuit_breaker;
pub mod config;
pub mod engine;
pub mod gate;
pub mod metrics;
pub mod ports;
pub mod registry;
