//! Shared-expense ledger: users, equal-split expenses and per-user net
//! balances, served as a small JSON API.

pub mod balance;
pub mod config;
pub mod error;
pub mod exchange;
pub mod ids;
pub mod routes;
pub mod schemas;
pub mod store;

pub use error::{LedgerError, Result};
