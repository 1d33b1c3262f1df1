// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Coordination store: key layout over a [`StoreBackend`](crate::domain::repository::StoreBackend)
//! and the in-memory backend.

pub mod coordination;
pub mod memory;

pub use coordination::{CoordinationStore, DEFAULT_SESSION_TTL};
pub use memory::InMemoryStoreBackend;
