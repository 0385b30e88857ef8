//! Fee resolution, swap encoding and the authorization flow. Nothing in here
//! talks to a node.

pub mod authorization;
pub mod eth;
pub mod events;
pub mod fee;
pub mod pool;
pub mod swap;
