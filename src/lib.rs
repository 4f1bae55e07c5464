//! topup-console - back office for a mobile top-up and rewards app
//!
//! Admin-side rules over a realtime document store: resolving diamond
//! orders and deposits exactly once, auto-refunding orders that stay
//! pending too long, keeping the dashboard figures live, and paging
//! through users, orders and deposits.

pub mod config;
pub mod expiry;
pub mod interfaces;
pub mod ledger;
pub mod models;
pub mod pagination;
pub mod projectors;
pub mod services;
pub mod storage;
pub mod utils;
