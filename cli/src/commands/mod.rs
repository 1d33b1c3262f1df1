// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Command implementations for the swarm-review CLI

pub mod config;
pub mod review;

pub use self::config::ConfigCommand;
pub use self::review::ReviewCommand;
