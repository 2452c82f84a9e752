// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `RealExecutorBackend`, which tests replace with a fake implementation.
//! - [`command`] runs external transforms through the platform shell using
//!   `tokio::process::Command`.
//! - [`builtin`] holds the in-process actions (clean, copy, sprite, html,
//!   rev).

pub mod backend;
pub mod builtin;
pub mod command;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use builtin::{run_builtin, BuiltinError};
