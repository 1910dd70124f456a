//! Shared task model and HTTP API contract for Taskdeck.

pub mod api;
pub mod task;
