//! Trait definitions for the chain boundary.
//!
//! The swap flow and fee previews only talk to the chain through these so
//! they can be unit tested with mocks.

use {
    crate::domain::{
        authorization::PermitAllowance,
        eth::{Address, TxHash, U256},
        swap::Instruction,
    },
    anyhow::Result,
};

/// Allowance reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LedgerRead: Send + Sync {
    /// ERC20 allowance `owner` granted to `spender` for `token`.
    async fn token_allowance(&self, owner: Address, token: Address, spender: Address)
    -> Result<U256>;

    /// Delegated allowance `owner` granted to `spender` through the
    /// permission registry, including its expiration.
    async fn permit_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<PermitAllowance>;
}

/// Transaction submission.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait LedgerWrite: Send + Sync {
    /// Signs and broadcasts `instruction`. Returns once the node accepted the
    /// transaction.
    async fn submit(&self, instruction: &Instruction) -> Result<TxHash>;

    /// Waits for `tx` to be mined. Fails if it reverted.
    async fn confirm(&self, tx: TxHash) -> Result<()>;
}

/// Read access to the dynamic fee hook.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FeeOracle: Send + Sync {
    /// Fees and tier boundaries as reported by `getFeeTiers`.
    async fn fee_tiers(&self) -> Result<(Vec<u32>, Vec<U256>)>;

    /// The fee the hook charges for a swap of `size`.
    async fn fee_for_size(&self, size: U256) -> Result<u32>;
}
