//! Monitor state: latency history, incident ledger and transition detection.

mod aggregator;
mod incidents;
mod series;

pub use aggregator::*;
pub use incidents::*;
pub use series::*;
