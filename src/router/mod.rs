//! # Router Module
//!
//! Implements the admission-control and routing stage of the crawl frontier.
//!
//! ## Overview
//!
//! The router module provides the main `Router` struct and the worker task
//! that drives it. Every candidate URL passes through two steps: admission
//! (the metadata rule tree decides whether the URL stays in the pipeline)
//! and partitioning (the surviving URL is assigned the partition key that
//! determines which downstream worker owns it).
//!
//! ## Key Components
//!
//! - **Router**: the per-item orchestrator; one item in, one definite
//!   outcome out
//! - **RouteOutcome**: `Routed`, `Rejected` or `Dropped` — per-item failures
//!   never escape as errors
//! - **Router Task**: a Tokio task that consumes items from a channel and
//!   routes them concurrently under a semaphore bound

mod core;
mod worker;

pub use core::{RouteOutcome, Router};
pub use worker::spawn_router_task;
