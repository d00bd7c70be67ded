//! Live model of a ledger's vertex graph and the feeds that drive it.

pub mod feed;
pub mod tangle;
pub mod util;
