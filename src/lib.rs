//! Claude Bridge - Stream event protocol engine for Claude Code sessions.

pub mod classify;
pub mod config;
pub mod display;
pub mod protocol;
pub mod transport;
