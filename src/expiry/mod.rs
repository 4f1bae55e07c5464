//! Order expiry: auto-refund of orders left Pending too long.
//!
//! [`ExpiryScheduler`] tracks pending orders by path. [`ExpiryWatcher`]
//! keeps it in step with the store through a live query and, every poll
//! interval, hands due orders to [`crate::services::OrderService::expire`].
//! The claim inside `expire` makes each refund happen at most once even
//! when an admin resolves the same order concurrently.

pub mod scheduler;
pub mod watcher;

pub use scheduler::ExpiryScheduler;
pub use watcher::{ExpiryWatcher, TickReport};
