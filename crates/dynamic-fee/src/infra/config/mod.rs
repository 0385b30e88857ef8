use crate::{
    domain::{eth::Address, fee::Schedule, pool::Pool},
    preview::Verification,
    swapper::{Contracts, Timing},
};

pub mod file;

/// Everything the client needs to know about the pool it works with.
#[derive(Clone, Debug)]
pub struct Config {
    pub chain_id: u64,
    /// The dynamic fee hook, `None` if it is not deployed yet.
    pub hook: Option<Address>,
    pub contracts: Contracts,
    pub pool: Pool,
    /// Configured fee schedule, `None` if it should be read from the hook.
    pub schedule: Option<Schedule>,
    pub verification: Verification,
    pub timing: Timing,
}
