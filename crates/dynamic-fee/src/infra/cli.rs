//! CLI arguments for the `dynamic-fee` binary.

use {
    crate::domain::pool,
    clap::{Parser, Subcommand, ValueEnum},
    std::{
        fmt::{self, Display, Formatter},
        net::SocketAddr,
        path::PathBuf,
        time::Duration,
    },
    url::Url,
};

/// Preview fees of, swap through and watch a dynamic fee pool
#[derive(Parser)]
#[command(version)]
pub struct Args {
    /// The log filter.
    #[arg(long, env, default_value = "info,dynamic_fee=debug")]
    pub log: String,

    /// Emit logs as JSON lines.
    #[arg(long, env)]
    pub use_json_logs: bool,

    /// The node RPC endpoint.
    #[arg(long, env, default_value = "http://localhost:8545")]
    pub node_url: Url,

    /// Path to the pool configuration file. This file should be in TOML
    /// format.
    #[arg(long, env)]
    pub config: PathBuf,

    /// Hex encoded private key of the swapping account. Only needed for
    /// `swap`.
    #[arg(long, env, hide_env_values = true)]
    pub private_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Display for Args {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            log,
            use_json_logs,
            node_url,
            config,
            private_key,
            command,
        } = self;

        writeln!(f, "log: {log}")?;
        writeln!(f, "use_json_logs: {use_json_logs}")?;
        writeln!(f, "node_url: {node_url}")?;
        writeln!(f, "config: {}", config.display())?;
        let private_key = private_key.as_ref().map(|_| "SECRET");
        writeln!(f, "private_key: {private_key:?}")?;
        writeln!(f, "command: {command:?}")?;
        Ok(())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Preview the fee tier a swap of the given size falls into.
    Quote {
        /// Swap size as a decimal amount of the input token.
        #[arg(long)]
        amount: String,

        #[arg(long, value_enum, default_value_t = Direction::ZeroForOne)]
        direction: Direction,

        /// Also ask the deployed hook what it would charge.
        #[arg(long)]
        onchain: bool,
    },
    /// Print the fee schedule, verified against the hook if one is deployed.
    Tiers,
    /// Swap through the Universal Router, approving first where needed.
    Swap {
        /// Decimal amount of the input token to sell.
        #[arg(long)]
        amount: String,

        #[arg(long, value_enum)]
        direction: Direction,

        /// Least decimal amount of the output token to accept.
        #[arg(long, default_value = "0")]
        min_amount_out: String,
    },
    /// Follow the fees the hook applies to swaps in the pool.
    Watch {
        /// How often to poll the node for new events.
        #[arg(long, env, default_value = "4s", value_parser = humantime::parse_duration)]
        poll_interval: Duration,

        /// Serve prometheus metrics on this address.
        #[arg(long, env)]
        metrics_address: Option<SocketAddr>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    ZeroForOne,
    OneForZero,
}

impl From<Direction> for pool::Direction {
    fn from(value: Direction) -> Self {
        match value {
            Direction::ZeroForOne => Self::ZeroForOne,
            Direction::OneForZero => Self::OneForZero,
        }
    }
}
