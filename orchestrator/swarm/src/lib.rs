// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `swarm-review-swarm`: Swarm Orchestration Crate
//!
//! Fans a review target out to several reviewer units, waits for them
//! through the coordination store and merges their findings into one
//! report.
//!
//! ## Crate Layout
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `SwarmError`, `SessionStatusView` |
//! | [`application`] | Application | `SessionManager`, `ResultAggregator`, `SwarmDispatcher` |
//! | [`presentation`] | Presentation | axum router for the REST surface |
//!
//! ## Key Concepts
//!
//! - **Swarm**: one session reviewing a single target with several
//!   reviewer disciplines in parallel.
//! - **Unit**: one reviewer's extract → analyze → parse run. Units never
//!   fail the swarm; a crash or error becomes a `failed` result.
//! - **Fan-in**: the dispatcher polls the per-session progress set instead of
//!   joining unit tasks, so late units are left behind when the timeout hits.

pub mod application;
pub mod domain;
pub mod presentation;

pub use domain::*;
