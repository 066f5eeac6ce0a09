//! Contract handles over the token and staking contracts.
//!
//! Reads go through a public endpoint that never prompts the user; writes go
//! through the wallet endpoint, which signs with the connected account.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::instructions::rpc::{send_txn, wait_for_receipt, RpcClient, TxHash, TxReceipt};
use crate::instructions::staking_instructions::*;
use crate::instructions::utils::Address;
use crate::states::{FeeInfo, StakingHistory};
use crate::units::U256;
use log::{info, warn};
use std::time::Duration;

pub trait ContractReader {
    fn staking_address(&self) -> Address;
    fn native_balance(&self, owner: &Address) -> Result<U256>;
    fn token_balance(&self, owner: &Address) -> Result<U256>;
    fn allowance(&self, owner: &Address, spender: &Address) -> Result<U256>;
    fn fee_info(&self) -> Result<FeeInfo>;
    fn minimum_staking_period(&self) -> Result<U256>;
    fn staking_history(&self, user: &Address) -> Result<StakingHistory>;
}

pub trait ContractWriter {
    fn approve(&self, spender: &Address, amount: U256) -> Result<TxHash>;
    fn stake(&self, amount: U256, fee: U256) -> Result<TxHash>;
    fn withdraw(&self, stake_id: u64, fee: U256) -> Result<TxHash>;
    fn emergency_withdraw(&self, stake_id: u64, fee: U256) -> Result<TxHash>;
    fn claim_rewards(&self) -> Result<TxHash>;
    /// Block until `tx` is mined.
    fn wait(&self, tx: &TxHash) -> Result<TxReceipt>;
}

/// Published contract addresses of the target chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub token: Address,
    pub staking: Address,
}

/// Read-only handles bound to the public endpoint.
pub struct RpcContracts {
    rpc: RpcClient,
    addresses: ContractAddresses,
}

impl RpcContracts {
    pub fn new(rpc: RpcClient, addresses: ContractAddresses) -> Self {
        RpcContracts { rpc, addresses }
    }
}

impl ContractReader for RpcContracts {
    fn staking_address(&self) -> Address {
        self.addresses.staking
    }

    fn native_balance(&self, owner: &Address) -> Result<U256> {
        self.rpc.get_balance(owner)
    }

    fn token_balance(&self, owner: &Address) -> Result<U256> {
        decode_uint(&self.rpc.call(&balance_of_instr(self.addresses.token, owner))?)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Result<U256> {
        decode_uint(
            &self
                .rpc
                .call(&allowance_instr(self.addresses.token, owner, spender))?,
        )
    }

    fn fee_info(&self) -> Result<FeeInfo> {
        decode_fee_info(&self.rpc.call(&fee_info_instr(self.addresses.staking))?)
    }

    fn minimum_staking_period(&self) -> Result<U256> {
        decode_uint(
            &self
                .rpc
                .call(&minimum_staking_period_instr(self.addresses.staking))?,
        )
    }

    fn staking_history(&self, user: &Address) -> Result<StakingHistory> {
        decode_staking_history(
            &self
                .rpc
                .call(&staking_history_instr(self.addresses.staking, user))?,
        )
    }
}

/// Write-capable handles: same contracts, submitted through the user's wallet.
pub struct WalletContracts {
    rpc: RpcClient,
    from: Address,
    addresses: ContractAddresses,
    receipt_poll: Duration,
}

impl WalletContracts {
    pub fn new(
        rpc: RpcClient,
        from: Address,
        addresses: ContractAddresses,
        receipt_poll: Duration,
    ) -> Self {
        WalletContracts {
            rpc,
            from,
            addresses,
            receipt_poll,
        }
    }

    fn submit(&self, tx: TxRequest) -> Result<TxHash> {
        send_txn(&self.rpc, &self.from, &tx)
    }
}

impl ContractWriter for WalletContracts {
    fn approve(&self, spender: &Address, amount: U256) -> Result<TxHash> {
        self.submit(approve_instr(self.addresses.token, spender, amount))
    }

    fn stake(&self, amount: U256, fee: U256) -> Result<TxHash> {
        self.submit(stake_instr(self.addresses.staking, amount, fee))
    }

    fn withdraw(&self, stake_id: u64, fee: U256) -> Result<TxHash> {
        self.submit(withdraw_instr(self.addresses.staking, stake_id, fee))
    }

    fn emergency_withdraw(&self, stake_id: u64, fee: U256) -> Result<TxHash> {
        self.submit(emergency_withdraw_instr(self.addresses.staking, stake_id, fee))
    }

    fn claim_rewards(&self) -> Result<TxHash> {
        self.submit(claim_rewards_instr(self.addresses.staking))
    }

    fn wait(&self, tx: &TxHash) -> Result<TxReceipt> {
        wait_for_receipt(&self.rpc, tx, self.receipt_poll)
    }
}

/// Build read and write handles for `wallet` from the configured endpoints.
///
/// Handles always target the configured chain's addresses; a wallet on a
/// different chain is only reported.
pub fn connect_contracts(
    config: &ClientConfig,
    wallet: Address,
) -> (RpcContracts, WalletContracts) {
    let addresses = config.contract_addresses();
    let wallet_rpc = RpcClient::new(config.wallet_rpc_url.clone());
    match wallet_rpc.chain_id() {
        Ok(chain_id) if chain_id != config.chain_id => warn!(
            "wallet is on chain {}, contracts are on chain {}",
            chain_id, config.chain_id
        ),
        Ok(_) => {}
        Err(e) => warn!("could not read wallet chain id: {}", e),
    }
    info!(
        "contracts (chain {}): token {} staking {}",
        config.chain_id, addresses.token, addresses.staking
    );

    let read = RpcContracts::new(RpcClient::new(config.read_rpc_url.clone()), addresses);
    let write = WalletContracts::new(wallet_rpc, wallet, addresses, config.receipt_poll());
    (read, write)
}

/// The wallet's connected account: the first one it exposes.
pub fn wallet_account(config: &ClientConfig) -> Result<Option<Address>> {
    let accounts = RpcClient::new(config.wallet_rpc_url.clone()).accounts()?;
    Ok(accounts.into_iter().next())
}

/// Like `wallet_account`, but an unreachable wallet counts as not connected.
pub fn connected_account(config: &ClientConfig) -> Option<Address> {
    wallet_account(config).unwrap_or_else(|e| {
        warn!("could not read wallet accounts: {}", e);
        None
    })
}
