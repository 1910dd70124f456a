//! Taskdeck server library.
//!
//! Exposes the task API server for use in tests and embedding.
//! The server authenticates each request to an owner and serves that
//! owner's tasks from a pluggable [`store::TaskStore`].

pub mod config;
pub mod identity;
pub mod server;
pub mod store;
