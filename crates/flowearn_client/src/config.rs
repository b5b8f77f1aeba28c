use std::{convert::Infallible, fmt, str::FromStr};

use clap::Args;
use ethers::types::{Address, TxHash};

use crate::projection::DEFAULT_DECIMALS;

pub const DEFAULT_RPC_URL: &str = "https://testnet.evm.nodes.onflow.org";
pub const DEFAULT_CONTRACT: &str = "0x52573FDC1af65AB4d09C9fEe193E9775e1676FE2";
/// Flow EVM testnet
pub const DEFAULT_CHAIN_ID: u64 = 545;
pub const DEFAULT_EXPLORER_URL: &str = "https://evm-testnet.flowscan.io";

/// Network, contract and wallet settings. Every flag can also be set through the environment or
/// a `.env` file.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// JSON-RPC endpoint of the network the board is deployed on
    #[arg(long, env = "FLOWEARN_RPC_URL", default_value = DEFAULT_RPC_URL)]
    pub rpc_url: String,

    /// Address of the task board contract
    #[arg(long, env = "FLOWEARN_CONTRACT", default_value = DEFAULT_CONTRACT, value_parser = parse_address)]
    pub contract: Address,

    #[arg(long, env = "FLOWEARN_CHAIN_ID", default_value_t = DEFAULT_CHAIN_ID)]
    pub chain_id: u64,

    /// Hex private key used to sign transactions. Without it the wallet stays disconnected.
    #[arg(long, env = "FLOWEARN_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<PrivateKey>,

    /// Block explorer used for transaction links
    #[arg(long, env = "FLOWEARN_EXPLORER_URL", default_value = DEFAULT_EXPLORER_URL)]
    pub explorer_url: String,

    /// Decimals of the reward currency
    #[arg(long, env = "FLOWEARN_DECIMALS", default_value_t = DEFAULT_DECIMALS)]
    pub decimals: u32,

    /// Symbol shown next to rewards
    #[arg(long, env = "FLOWEARN_SYMBOL", default_value = "FLOW")]
    pub symbol: String,
}

impl Config {
    pub fn explorer_tx_url(&self, tx_hash: &TxHash) -> String {
        format!("{}/tx/{tx_hash:?}", self.explorer_url.trim_end_matches('/'))
    }
}

fn parse_address(s: &str) -> Result<Address, String> {
    flowearn_contract::parse_address(s).map_err(|err| format!("invalid address {s:?}: {err}"))
}

/// Private key that never shows up in logs
#[derive(Clone)]
pub struct PrivateKey(String);

impl PrivateKey {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl FromStr for PrivateKey {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(PrivateKey(s.to_owned()))
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}
