use alloy::network::EthereumWallet;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use forerun_core::config::ChainConfig;
use tracing::info;

/// Long-lived wallet-attached connection used for lookups and race
/// submissions. The subscription task owns its own connection separately and
/// replaces it wholesale on reconnect.
#[derive(Clone)]
pub struct NodeClient {
    pub provider: DynProvider,
    pub chain_id: u64,
}

impl NodeClient {
    pub async fn connect(cfg: &ChainConfig, signer: PrivateKeySigner) -> Result<Self> {
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new()
            .wallet(wallet)
            .connect(&cfg.rpc_ws)
            .await?
            .erased();
        let chain_id = provider.get_chain_id().await?;
        info!(chain_id, "node client connected");
        Ok(Self { provider, chain_id })
    }
}
