//! Adab Common - Shared configuration, logging and error types for the Adab bot.
//!
//! This crate provides:
//! - Configuration types and loading (file, `.env`, environment)
//! - Error types and context helpers
//! - Logging setup

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, ObservabilityConfig, TelegramConfig};
pub use error::{Error, Result};
