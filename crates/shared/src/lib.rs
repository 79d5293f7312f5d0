//! Shared types, errors, and configuration for Cartsplit.
//!
//! This crate provides common types used across all other crates:
//! - Minor-unit precision and rounding for monetary amounts
//! - Typed IDs for type-safe entity references
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, LoggingConfig, SettlementConfig};
pub use error::{AppError, AppResult};
