// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod aggregator;
pub mod dispatcher;
pub mod session_manager;
pub mod similarity;

pub use aggregator::ResultAggregator;
pub use dispatcher::SwarmDispatcher;
pub use session_manager::SessionManager;
pub use similarity::{similarity_ratio, title_similarity};
