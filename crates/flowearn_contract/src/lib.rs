use std::sync::Arc;

use anyhow::bail;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, Middleware, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, H160, U256},
};

mod abi {

    use ethers::prelude::abigen;

    abigen!(FlowEarn, "./contract/FlowEarn.json");
}
pub use abi::*;

pub type ReadClient = Provider<Http>;
pub type SignerClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Contract handle that can only issue view calls
pub type ReadContract = FlowEarn<ReadClient>;
/// Contract handle whose calls are signed by a local wallet
pub type SignerContract = FlowEarn<SignerClient>;

pub fn parse_address(address: &str) -> anyhow::Result<H160> {
    let res = address.parse()?;
    Ok(res)
}

pub fn get_contract(rpc_url: &str, contract_address: Address) -> anyhow::Result<ReadContract> {
    let provider = Provider::<Http>::try_from(rpc_url)?;
    let client = Arc::new(provider);
    let contract = FlowEarn::new(contract_address, client);

    Ok(contract)
}

/// Connect a wallet to the contract.
///
/// The provider is asked for its chain id so a key configured for one network is never used to
/// sign transactions on another.
pub async fn get_signing_contract(
    rpc_url: &str,
    contract_address: Address,
    wallet: LocalWallet,
) -> anyhow::Result<SignerContract> {
    let provider = Provider::<Http>::try_from(rpc_url)?;

    let chain_id = wallet.chain_id();
    let remote_chain_id = provider.get_chainid().await?;
    if remote_chain_id != U256::from(chain_id) {
        bail!("rpc endpoint is on chain {remote_chain_id}, expected {chain_id}");
    }

    let client = Arc::new(SignerMiddleware::new(provider, wallet));
    let contract = FlowEarn::new(contract_address, client);

    Ok(contract)
}

pub fn parse_wallet(private_key: &str, chain_id: u64) -> anyhow::Result<LocalWallet> {
    let wallet: LocalWallet = private_key.trim().parse()?;
    Ok(wallet.with_chain_id(chain_id))
}
