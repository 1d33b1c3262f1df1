// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod response_parser;
pub mod review_executor;

pub use response_parser::parse_findings;
pub use review_executor::{LlmReviewExecutor, ReviewExecutor};
