pub mod domain;
pub mod infra;
pub mod preview;
mod run;
pub mod swapper;
pub mod traits;

pub use self::run::{run, start};
