// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Swarm Domain Layer
//!
//! Types owned by the orchestration side of the engine. No I/O dependencies.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`error`] | `SwarmError` |
//! | [`status`] | `SessionStatusView`, `ReviewerProgress` |

pub mod error;
pub mod status;

pub use error::*;
pub use status::*;
