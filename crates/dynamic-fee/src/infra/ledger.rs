//! Chain access through an alloy provider.

use {
    crate::{
        domain::{
            authorization::PermitAllowance,
            eth::{Address, TxHash, U256},
            swap::Instruction,
        },
        traits::{FeeOracle, LedgerRead, LedgerWrite},
    },
    alloy::{
        network::{ReceiptResponse, TransactionBuilder},
        providers::{PendingTransactionBuilder, Provider},
        rpc::types::TransactionRequest,
    },
    anyhow::{Context, Result, ensure},
    contracts::alloy::{DynamicFeeHook, ERC20, Permit2},
    ethrpc::{
        AlloyProvider,
        alloy::errors::{ContractErrorExt, ErrorKind},
    },
};

/// Reads allowances and sends transactions of the provider's wallet.
#[derive(Clone)]
pub struct Ledger {
    provider: AlloyProvider,
    permit2: Permit2::Instance,
}

impl Ledger {
    pub fn new(provider: AlloyProvider, permit2: Address) -> Self {
        Self {
            permit2: Permit2::Instance::new(permit2, provider.clone()),
            provider,
        }
    }
}

fn contract_error(err: alloy::contract::Error, call: &'static str) -> anyhow::Error {
    match err.kind() {
        ErrorKind::Node => tracing::warn!(?err, call, "node error"),
        ErrorKind::Contract => tracing::debug!(?err, call, "contract error"),
    }
    anyhow::Error::from(err).context(call)
}

#[async_trait::async_trait]
impl LedgerRead for Ledger {
    async fn token_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<U256> {
        ERC20::Instance::new(token, self.provider.clone())
            .allowance(owner, spender)
            .call()
            .await
            .map_err(|err| contract_error(err, "allowance"))
    }

    async fn permit_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<PermitAllowance> {
        let allowance = self
            .permit2
            .allowance(owner, token, spender)
            .call()
            .await
            .map_err(|err| contract_error(err, "permit2 allowance"))?;
        Ok(PermitAllowance {
            amount: U256::from(allowance.amount),
            expiration: allowance.expiration.to::<u64>(),
            nonce: allowance.nonce.to::<u64>(),
        })
    }
}

#[async_trait::async_trait]
impl LedgerWrite for Ledger {
    async fn submit(&self, instruction: &Instruction) -> Result<TxHash> {
        let (to, value, calldata) = instruction.encode();
        let tx = TransactionRequest::default()
            .with_to(to)
            .with_value(value)
            .with_input(calldata);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|err| contract_error(err.into(), "send transaction"))?;
        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, tx: TxHash) -> Result<()> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx)
            .get_receipt()
            .await
            .with_context(|| format!("waiting for {tx}"))?;
        ensure!(receipt.status(), "transaction {tx} reverted");
        Ok(())
    }
}

/// Reads from the deployed dynamic fee hook.
pub struct Hook(DynamicFeeHook::Instance);

impl Hook {
    pub fn new(address: Address, provider: AlloyProvider) -> Self {
        Self(DynamicFeeHook::Instance::new(address, provider))
    }
}

#[async_trait::async_trait]
impl FeeOracle for Hook {
    async fn fee_tiers(&self) -> Result<(Vec<u32>, Vec<U256>)> {
        let tiers = self
            .0
            .getFeeTiers()
            .call()
            .await
            .map_err(|err| contract_error(err, "getFeeTiers"))?;
        let fees = tiers.fees.iter().map(|fee| fee.to::<u32>()).collect();
        Ok((fees, tiers.thresholds.to_vec()))
    }

    async fn fee_for_size(&self, size: U256) -> Result<u32> {
        let fee = self
            .0
            .getFeeForSize(size)
            .call()
            .await
            .map_err(|err| contract_error(err, "getFeeForSize"))?;
        Ok(fee.to::<u32>())
    }
}
