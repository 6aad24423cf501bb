//! # freshfeed common library
//!
//! Shared code for the freshfeed services:
//! - Error type used across crate boundaries
//! - Configuration loading (environment, TOML, compiled defaults)
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
