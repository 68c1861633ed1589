//! Schema module - Configuration types for networks and evolutionary runs.

mod association;
mod evolution;
mod network;

pub use association::*;
pub use evolution::*;
pub use network::*;
