//! CLI commands

pub mod config;
pub mod fetch;
pub mod stream;
