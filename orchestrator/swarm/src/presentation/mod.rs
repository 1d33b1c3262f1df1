// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Presentation Layer (`swarm-review-swarm`)
//!
//! HTTP surface that translates requests into dispatcher calls. No review
//! logic lives here.
//!
//! | Module | Transport | Description |
//! |--------|-----------|-------------|
//! | [`api`] | HTTP (Axum) | Review trigger, status polling and health |

pub mod api;

pub use api::{app, AppState};
