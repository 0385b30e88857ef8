//! Contract bindings for the Uniswap V4 dynamic fee swap client.
//!
//! Bindings are generated with [`alloy::sol!`] from the subset of each
//! contract's interface that the client actually calls.
pub mod alloy;
