//! Repository implementations.

pub mod payment;

pub use payment::{InMemoryPaymentRepository, NewPayment, PaymentRepository, StoreError};
