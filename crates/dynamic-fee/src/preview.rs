//! Fee previews and the fee schedule they are based on.

use {
    crate::{
        domain::{
            eth::U256,
            fee::{Schedule, Tier},
        },
        infra::observe,
        traits::FeeOracle,
    },
    anyhow::{Context, Result, anyhow, bail},
};

/// What to do with a configured fee schedule when a hook is deployed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Verification {
    /// Trust the configured schedule without asking the hook.
    Off,
    /// Compare with the hook and prefer the hook's schedule if they differ.
    #[default]
    Warn,
    /// Refuse to start if the configured schedule differs from the hook's.
    Enforce,
}

/// Settles on the fee schedule to preview with.
///
/// `oracle` is `None` if no hook is deployed. Without a configured schedule
/// the hook's schedule is used as is.
pub async fn schedule(
    local: Option<Schedule>,
    oracle: Option<&dyn FeeOracle>,
    verification: Verification,
) -> Result<Schedule> {
    let oracle = match (oracle, &local, verification) {
        (Some(_), Some(_), Verification::Off) => None,
        (oracle, _, _) => oracle,
    };
    let Some(oracle) = oracle else {
        return match local {
            Some(local) => {
                if verification != Verification::Off {
                    tracing::warn!("no hook deployed, fee tiers are not verified");
                }
                Ok(local)
            }
            None => bail!("no fee tiers configured and no hook deployed to read them from"),
        };
    };

    let onchain = fetch(oracle).await;
    match (local, onchain) {
        (None, onchain) => onchain,
        (Some(local), Err(err)) if verification == Verification::Warn => {
            tracing::warn!(?err, "could not read fee tiers from the hook, using configured");
            Ok(local)
        }
        (Some(_), Err(err)) => Err(err),
        (Some(local), Ok(onchain)) => match local.verify(&onchain) {
            Ok(()) => Ok(local),
            Err(mismatch) if verification == Verification::Enforce => {
                Err(anyhow!(mismatch).context("configured fee tiers do not match the hook"))
            }
            Err(mismatch) => {
                tracing::warn!(
                    %mismatch,
                    "configured fee tiers differ from the hook, using the hook's"
                );
                Ok(onchain)
            }
        },
    }
}

async fn fetch(oracle: &dyn FeeOracle) -> Result<Schedule> {
    let (fees, boundaries) = oracle
        .fee_tiers()
        .await
        .context("failed to read fee tiers from the hook")?;
    Schedule::from_onchain(&fees, &boundaries).context("hook reported an invalid fee schedule")
}

/// The fee a swap of `amount` is expected to pay.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quote {
    pub amount: U256,
    pub tier: Tier,
    /// What the hook itself charges, if it was asked.
    pub onchain_fee: Option<u32>,
}

impl Quote {
    /// Whether the hook disagrees with the preview.
    pub fn diverges(&self) -> bool {
        self.onchain_fee.is_some_and(|fee| fee != self.tier.fee)
    }
}

pub async fn quote(
    schedule: &Schedule,
    oracle: Option<&dyn FeeOracle>,
    amount: U256,
) -> Result<Quote> {
    let tier = schedule.resolve(amount).clone();
    observe::resolved(amount, &tier);
    let onchain_fee = match oracle {
        Some(oracle) => Some(
            oracle
                .fee_for_size(amount)
                .await
                .context("failed to read fee from the hook")?,
        ),
        None => None,
    };
    let quote = Quote {
        amount,
        tier,
        onchain_fee,
    };
    if let Some(onchain) = quote.onchain_fee.filter(|_| quote.diverges()) {
        observe::preview_diverges(amount, quote.tier.fee, onchain);
    }
    Ok(quote)
}
