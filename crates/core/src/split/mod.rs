//! Bill splitting, bills, and shopping items.
//!
//! Everything here produces amounts that sum exactly to the total they
//! were split from, and payments that feed the settlement pipeline.

pub mod allocation;
pub mod bill;
pub mod item;

#[cfg(test)]
mod allocation_props;

pub use allocation::{BillSplitter, split_by_shares, split_equally};
pub use bill::{Bill, BillParticipant, BillStatus, CreateBillInput, SplitRequest, SplitType};
pub use item::{Item, ItemCategory, ItemStatus, Priority, calculate_total, purchase_obligations};
