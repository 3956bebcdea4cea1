//! Route modules for the API server
//!
//! - transactions: create, list, stats, get, update, delete

pub mod transactions;
