use crate::contracts::ContractAddresses;
use crate::instructions::utils::Address;
use anyhow::{format_err, Context, Result};
use configparser::ini::Ini;
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "client_config.ini";
pub const BSC_TESTNET_CHAIN_ID: u64 = 97;
pub const BSC_TESTNET_RPC: &str = "https://data-seed-prebsc-1-s1.binance.org:8545";
pub const DEFAULT_ERROR_DISPLAY_SECS: u64 = 5;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1000;

const SECTION: &str = "Global";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub read_rpc_url: String,
    pub wallet_rpc_url: String,
    pub chain_id: u64,
    pub token_contract: Address,
    pub staking_contract: Address,
    pub api_base_url: String,
    pub store_url: String,
    pub store_api_key: String,
    pub error_display_secs: u64,
    pub receipt_poll_ms: u64,
}

impl ClientConfig {
    pub fn contract_addresses(&self) -> ContractAddresses {
        ContractAddresses {
            token: self.token_contract,
            staking: self.staking_contract,
        }
    }

    pub fn error_display(&self) -> Duration {
        Duration::from_secs(self.error_display_secs)
    }

    pub fn receipt_poll(&self) -> Duration {
        Duration::from_millis(self.receipt_poll_ms)
    }
}

pub fn load_cfg(path: &str) -> Result<ClientConfig> {
    let mut config = Ini::new();
    config
        .load(path)
        .map_err(|e| format_err!("failed to load {}: {}", path, e))?;
    parse_cfg(&config)
}

pub fn parse_cfg_str(contents: &str) -> Result<ClientConfig> {
    let mut config = Ini::new();
    config
        .read(contents.to_string())
        .map_err(|e| format_err!("failed to parse config: {}", e))?;
    parse_cfg(&config)
}

fn required(config: &Ini, key: &str) -> Result<String> {
    match config.get(SECTION, key) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(format_err!("{} must not be empty", key)),
    }
}

fn optional_u64(config: &Ini, key: &str, default: u64) -> Result<u64> {
    Ok(config
        .getuint(SECTION, key)
        .map_err(|e| format_err!("{}: {}", key, e))?
        .unwrap_or(default))
}

fn parse_cfg(config: &Ini) -> Result<ClientConfig> {
    let read_rpc_url = config
        .get(SECTION, "read_rpc_url")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| BSC_TESTNET_RPC.to_string());
    let wallet_rpc_url = required(config, "wallet_rpc_url")?;
    let chain_id = optional_u64(config, "chain_id", BSC_TESTNET_CHAIN_ID)?;

    let token_contract = required(config, "token_contract")?
        .parse::<Address>()
        .context("token_contract")?;
    let staking_contract = required(config, "staking_contract")?
        .parse::<Address>()
        .context("staking_contract")?;

    let api_base_url = required(config, "api_base_url")?;
    let store_url = required(config, "store_url")?;
    let store_api_key = required(config, "store_api_key")?;

    let error_display_secs =
        optional_u64(config, "error_display_secs", DEFAULT_ERROR_DISPLAY_SECS)?;
    let receipt_poll_ms = optional_u64(config, "receipt_poll_ms", DEFAULT_RECEIPT_POLL_MS)?;

    Ok(ClientConfig {
        read_rpc_url,
        wallet_rpc_url,
        chain_id,
        token_contract,
        staking_contract,
        api_base_url,
        store_url,
        store_api_key,
        error_display_secs,
        receipt_poll_ms,
    })
}
