//! Domain layer - pure business logic with no external dependencies.
//!
//! This layer contains the core concepts and invariants of admission control:
//! - Subjects, verification tiers and action types
//! - Per-action policies with tiered ceilings
//! - Fixed counting windows and counter records
//! - Escalation from counts to outcomes
//!
//! All types in this layer are pure and easily testable.

pub mod action;
pub mod decision;
pub mod escalation;
pub mod policy;
pub mod subject;
pub mod window;
