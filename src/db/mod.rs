//! Database module for flarewatch.
//!
//! Provides SQLite storage for the monitor state snapshot.

mod store;

pub use store::*;
