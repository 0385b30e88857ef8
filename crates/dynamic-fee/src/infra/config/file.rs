use {
    crate::{
        domain::{
            authorization::DisplayDelays,
            eth::{self, Address},
            fee::{self, Monotonicity, Schedule},
            pool::{self, Currency, Pool},
        },
        preview::Verification,
        swapper::{Contracts, Timing},
    },
    anyhow::{Context, Result},
    contracts::alloy::{Permit2, UniversalRouter},
    serde::Deserialize,
    std::{path::Path, time::Duration},
    tokio::fs,
};

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct Config {
    /// Chain the pool lives on. Has to match the node's chain.
    chain_id: u64,

    /// The dynamic fee hook. The zero address marks a hook that is not
    /// deployed yet, in which case previews only use the configured tiers
    /// and swaps are disabled.
    #[serde(default)]
    hook: Address,

    /// Permission registry. Defaults to the canonical deployment of the
    /// chain.
    permit2: Option<Address>,

    /// Router swaps are executed through. Defaults to the canonical
    /// deployment of the chain.
    universal_router: Option<Address>,

    pool: PoolConfig,

    #[serde(default)]
    fee_tiers: FeeTiersConfig,

    #[serde(default)]
    timing: TimingConfig,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PoolConfig {
    currency0: Address,

    #[serde(default = "default_decimals")]
    currency0_decimals: u8,

    currency1: Address,

    #[serde(default = "default_decimals")]
    currency1_decimals: u8,

    /// Pool fee as part of the pool key. Dynamic fee pools use the dynamic
    /// fee flag.
    #[serde(default = "default_pool_fee")]
    fee: u32,

    #[serde(default = "default_tick_spacing")]
    tick_spacing: i32,

    /// Hooks address of the pool key. Defaults to `hook`.
    hooks: Option<Address>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct FeeTiersConfig {
    /// Whether fees grow or shrink with swap size. Inferred from the tiers
    /// if omitted.
    direction: Option<DirectionConfig>,

    #[serde(default)]
    verification: VerificationConfig,

    /// Tiers in ascending threshold order. Without any, the tiers are read
    /// from the hook.
    #[serde(default, rename = "tier")]
    tiers: Vec<TierConfig>,
}

#[derive(Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum DirectionConfig {
    Increasing,
    Decreasing,
}

impl From<DirectionConfig> for Monotonicity {
    fn from(value: DirectionConfig) -> Self {
        match value {
            DirectionConfig::Increasing => Self::Increasing,
            DirectionConfig::Decreasing => Self::Decreasing,
        }
    }
}

#[derive(Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum VerificationConfig {
    Off,
    #[default]
    Warn,
    Enforce,
}

impl From<VerificationConfig> for Verification {
    fn from(value: VerificationConfig) -> Self {
        match value {
            VerificationConfig::Off => Self::Off,
            VerificationConfig::Warn => Self::Warn,
            VerificationConfig::Enforce => Self::Enforce,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct TierConfig {
    /// Fee in hundredths of a basis point.
    fee: u32,

    label: String,

    /// Smallest swap size of the tier as a decimal amount with 18 decimals,
    /// e.g. "0.001".
    threshold: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct TimingConfig {
    /// How long a confirmed swap is shown before the flow resets.
    #[serde(with = "humantime_serde", default = "default_success_display")]
    success_display: Duration,

    /// How long a failure is shown before the flow resets.
    #[serde(with = "humantime_serde", default = "default_error_display")]
    error_display: Duration,

    #[serde(with = "humantime_serde", default = "default_swap_deadline")]
    swap_deadline: Duration,

    #[serde(with = "humantime_serde", default = "default_permit_expiration")]
    permit_expiration: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            success_display: default_success_display(),
            error_display: default_error_display(),
            swap_deadline: default_swap_deadline(),
            permit_expiration: default_permit_expiration(),
        }
    }
}

impl From<TimingConfig> for Timing {
    fn from(value: TimingConfig) -> Self {
        Self {
            display: DisplayDelays {
                success: value.success_display,
                error: value.error_display,
            },
            swap_deadline: value.swap_deadline,
            permit_expiration: value.permit_expiration,
        }
    }
}

fn default_decimals() -> u8 {
    eth::DEFAULT_DECIMALS
}

fn default_pool_fee() -> u32 {
    pool::DYNAMIC_FEE_FLAG
}

fn default_tick_spacing() -> i32 {
    60
}

fn default_success_display() -> Duration {
    Timing::default().display.success
}

fn default_error_display() -> Duration {
    Timing::default().display.error
}

fn default_swap_deadline() -> Duration {
    Timing::default().swap_deadline
}

fn default_permit_expiration() -> Duration {
    Timing::default().permit_expiration
}

/// Load the pool configuration from a TOML file.
pub async fn load_path(path: &Path) -> Result<super::Config> {
    let data = fs::read_to_string(path)
        .await
        .with_context(|| format!("I/O error while reading {path:?}"))?;
    load_string(&data).with_context(|| format!("invalid configuration in {path:?}"))
}

/// Load the pool configuration from a TOML string.
pub fn load_string(data: &str) -> Result<super::Config> {
    let config = toml::de::from_str::<Config>(data).context("TOML syntax error")?;
    config.try_into()
}

impl TryFrom<Config> for super::Config {
    type Error = anyhow::Error;

    fn try_from(config: Config) -> Result<Self> {
        let chain_id = config.chain_id;
        let hook = (!config.hook.is_zero()).then_some(config.hook);
        let permit2 = config
            .permit2
            .or_else(|| Permit2::deployment(chain_id))
            .with_context(|| format!("no Permit2 deployment known for chain {chain_id}"))?;
        let router = config
            .universal_router
            .or_else(|| UniversalRouter::deployment(chain_id))
            .with_context(|| format!("no Universal Router deployment known for chain {chain_id}"))?;

        let hooks = config.pool.hooks.unwrap_or(config.hook);
        if hook.is_some_and(|hook| hook != hooks) {
            tracing::warn!(%hooks, "pool key does not use the configured hook");
        }
        let pool = Pool::new(
            Currency {
                address: config.pool.currency0,
                decimals: config.pool.currency0_decimals,
            },
            Currency {
                address: config.pool.currency1,
                decimals: config.pool.currency1_decimals,
            },
            config.pool.fee,
            config.pool.tick_spacing,
            hooks,
        )
        .context("invalid pool")?;
        if !pool.is_dynamic() {
            tracing::warn!("pool does not use the dynamic fee flag, the hook cannot set its fee");
        }

        Ok(Self {
            chain_id,
            hook,
            contracts: Contracts { permit2, router },
            pool,
            schedule: schedule(&config.fee_tiers)?,
            verification: config.fee_tiers.verification.into(),
            timing: config.timing.into(),
        })
    }
}

fn schedule(config: &FeeTiersConfig) -> Result<Option<Schedule>> {
    if config.tiers.is_empty() {
        return Ok(None);
    }
    let tiers = config
        .tiers
        .iter()
        .map(|tier| {
            let threshold = eth::parse_amount_strict(&tier.threshold, fee::SIZE_DECIMALS)
                .with_context(|| format!("threshold of fee tier {:?}", tier.label))?;
            Ok(fee::Tier {
                fee: tier.fee,
                label: tier.label.clone(),
                threshold,
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let monotonicity = match config.direction {
        Some(direction) => direction.into(),
        None => {
            let fees = tiers.iter().map(|tier| tier.fee).collect::<Vec<_>>();
            Monotonicity::infer(&fees)
                .context("fee tiers neither consistently increase nor decrease")?
        }
    };
    Schedule::new(tiers, monotonicity)
        .map(Some)
        .context("invalid fee tiers")
}
