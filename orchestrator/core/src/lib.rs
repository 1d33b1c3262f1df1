// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Swarm Review Core
//!
//! Data model, coordination store, code extraction and per-reviewer analysis
//! for the swarm review engine.
//!
//! # Architecture
//!
//! - **Layer:** Core System
//! - **Purpose:** Everything a single reviewer unit needs; session
//!   orchestration lives in `swarm-review-swarm`

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use domain::*;
