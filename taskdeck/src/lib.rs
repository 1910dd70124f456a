//! Taskdeck -- personal task tracker client library.

pub mod config;
pub mod tasks;
pub mod transport;
