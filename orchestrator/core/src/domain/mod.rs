// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # Domain Layer
//!
//! Pure data model and ports of the swarm review engine. No I/O here.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`finding`] | `ReviewFinding`, `Severity` |
//! | [`reviewer`] | `ReviewerResult`, `ReviewerStatus` |
//! | [`session`] | `SwarmSession`, `SwarmStatus`, `SessionId`, `ReviewTarget` |
//! | [`report`] | `UnifiedReport` |
//! | [`profile`] | `ReviewerProfile`, `ReviewerRegistry` |
//! | [`events`] | `CoordinationPublisher`, `MessageType` |
//! | [`repository`] | `StoreBackend`, `StoreError` |
//! | [`llm`] | `LLMProvider` |
//! | [`config`] | `SwarmConfigManifest` |

pub mod config;
pub mod events;
pub mod finding;
pub mod llm;
pub mod profile;
pub mod report;
pub mod repository;
pub mod reviewer;
pub mod session;
