//! Infant activity ledger CLI library.
//!
//! This crate provides the `bc` command-line interface on top of
//! [`bc_db::Tracker`].

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
