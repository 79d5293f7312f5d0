//! Core business logic for Cartsplit.
//!
//! This crate contains pure business logic with ZERO storage or process
//! dependencies. Every operation reads an input value and returns a new one.
//!
//! # Modules
//!
//! - `settlement` - Balance aggregation and debt-settlement planning
//! - `split` - Bill splitting, bills, and shopping items
//! - `error` - Validation errors shared by both

pub mod error;
pub mod settlement;
pub mod split;

pub use error::ValidationError;
