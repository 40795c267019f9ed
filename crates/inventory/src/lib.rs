//! Inventory domain model.
//!
//! Items, users and the audit trail of item changes, as pure data plus input
//! validation (no IO, no HTTP, no storage).

pub mod change;
pub mod item;
pub mod user;

pub use change::{Change, ItemColumn, UserHistory};
pub use item::{Item, ItemUpdate, NewItem};
pub use user::{NewUser, User};
