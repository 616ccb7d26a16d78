//! Shared utilities for op-ofctl
//!
//! # Modules
//!
//! - `config`: environment-file loading and typed setting accessors

pub mod config;

pub use config::{get_config, get_config_bool, get_config_int, get_config_opt, load_environment};
