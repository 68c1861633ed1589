//! Compute module - Network dynamics, stimulation and evolutionary search.

mod lif;
mod protocol;

pub mod evolution;

pub use lif::*;
pub use protocol::*;
