pub mod errors;

#[cfg(any(test, feature = "test-util"))]
use alloy::providers::mock;
use {
    crate::AlloyProvider,
    alloy::{
        network::{EthereumWallet, TxSigner},
        primitives::Signature,
        providers::{Provider, ProviderBuilder},
        rpc::client::ClientBuilder,
    },
    url::Url,
};

/// Creates a read-only provider for the node at `url`.
pub fn provider(url: &Url) -> AlloyProvider {
    let rpc = ClientBuilder::default().http(url.clone());
    ProviderBuilder::new().connect_client(rpc).erased()
}

/// Creates a provider that signs and sends transactions with `signer`.
///
/// Nonce, gas and chain id are filled in by the provider's recommended
/// fillers.
pub fn provider_with_signer(
    url: &Url,
    signer: Box<dyn TxSigner<Signature> + Send + Sync + 'static>,
) -> AlloyProvider {
    let rpc = ClientBuilder::default().http(url.clone());
    let wallet = EthereumWallet::new(signer);

    ProviderBuilder::new()
        .wallet(wallet)
        .connect_client(rpc)
        .erased()
}

/// Creates a provider that answers requests from the given [`mock::Asserter`]
/// in the order responses were pushed.
#[cfg(any(test, feature = "test-util"))]
pub fn mocked_provider(asserter: mock::Asserter) -> AlloyProvider {
    ProviderBuilder::new()
        .connect_mocked_client(asserter)
        .erased()
}
