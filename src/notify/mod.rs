//! Notification pipeline: grace-period debounce, message rendering and
//! channel delivery.

mod decider;
mod deliver;
mod format;

pub use decider::*;
pub use deliver::*;
pub use format::*;
