//! Data access for Cartsplit.
//!
//! This crate provides:
//! - Repository traits that consumers of the core take as explicit inputs
//! - In-memory implementations, safe to share across threads

pub mod repositories;

pub use repositories::{InMemoryPaymentRepository, NewPayment, PaymentRepository, StoreError};
