//! Memory Match (workspace facade crate).
//!
//! Re-exports the member crates under `memory_match::{core,adapter,types}`
//! and hosts the [`session::GameSession`] that the binary drives.

pub use memory_match_adapter as adapter;
pub use memory_match_core as core;
pub use memory_match_types as types;

pub mod session;
