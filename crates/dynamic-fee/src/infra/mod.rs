pub mod cli;
pub mod config;
pub mod ledger;
pub mod observe;
pub mod subscription;
