//! Application layer containing the core business logic orchestration.
//!
//! This module defines the `WorkflowEngine`, the single write path for
//! project state. Every mutation goes through `advance`, which validates the
//! move, applies the patch, and persists the result as one atomic unit.

pub mod engine;
