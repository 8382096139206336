//! # Audio Module
//!
//! Per-guild playback orchestration for Quaver.
//!
//! Each guild gets its own [`session::GuildSession`]: a queue, at most one
//! voice connection and the state machine that chains track after track. All
//! mutation for one guild is serialized through the session's lock, so a user
//! command and the engine's end-of-track notification can never advance
//! playback concurrently. Guilds are fully independent of each other; the
//! [`registry::SessionRegistry`] map is the only shared structure.
//!
//! The streaming engine itself is behind the [`engine::StreamingEngine`]
//! trait: songbird in production, an in-memory double in tests.

pub mod connection;
pub mod engine;
pub mod queue;
pub mod registry;
pub mod session;
pub mod track;

#[cfg(test)]
pub mod testkit;
