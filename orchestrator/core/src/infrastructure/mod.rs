// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod event_bus;
pub mod extraction;
pub mod github;
pub mod llm;
pub mod store;

pub use event_bus::EventBus;
pub use extraction::{CodeExtractor, ExtractedCode, ExtractionError, ExtractionLimits};
pub use store::{CoordinationStore, InMemoryStoreBackend};
