//! Wallet session over the token and staking contracts.
//!
//! Mutating actions share one protocol: validate, submit, log as pending,
//! wait for the receipt, mark the log confirmed, reload the snapshot. The
//! on-chain action is authoritative; log persistence failures are only
//! reported in the process log.

use crate::contracts::{ContractReader, ContractWriter};
use crate::error::{ClientError, Result};
use crate::instructions::rpc::{TxHash, TxReceipt};
use crate::instructions::utils::Address;
use crate::services::StakeLogStore;
use crate::states::{
    NewStakeLog, StakeAction, StakeLogStatus, StakeLogUpdate, UserStakingData, WalletState,
};
use crate::units::{format_ether, parse_positive_amount, U256};
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Read handles on the public endpoint and write handles on the user's wallet.
pub struct ContractHandles<R, W> {
    pub read: R,
    pub write: W,
}

/// Result of an allowance query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Allowance {
    Amount(U256),
    /// No wallet session or no contract handles.
    Unavailable,
    ReadFailed(String),
}

pub struct WalletController<R, W, L> {
    state: Mutex<WalletState>,
    data: Mutex<UserStakingData>,
    contracts: Option<ContractHandles<R, W>>,
    logs: L,
    in_flight: AtomicBool,
    error_display: Duration,
}

/// Held for the duration of one load or action; clears `loading` on drop.
struct FlightGuard<'a> {
    in_flight: &'a AtomicBool,
    state: &'a Mutex<WalletState>,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.state.lock().loading = false;
        self.in_flight.store(false, Ordering::Release);
    }
}

fn parse_stake_id(stake_id: &str) -> Result<u64> {
    stake_id
        .trim()
        .parse::<u64>()
        .map_err(|_| ClientError::InvalidStakeId(stake_id.to_string()))
}

impl<R, W, L> WalletController<R, W, L>
where
    R: ContractReader,
    W: ContractWriter,
    L: StakeLogStore,
{
    pub fn new(logs: L, error_display: Duration) -> Self {
        WalletController {
            state: Mutex::new(WalletState::default()),
            data: Mutex::new(UserStakingData::default()),
            contracts: None,
            logs,
            in_flight: AtomicBool::new(false),
            error_display,
        }
    }

    pub fn wallet_state(&self) -> WalletState {
        self.state.lock().clone()
    }

    pub fn user_data(&self) -> UserStakingData {
        self.data.lock().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error().map(str::to_string)
    }

    pub fn has_contracts(&self) -> bool {
        self.contracts.is_some()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.state.lock().set_error(message, self.error_display);
    }

    /// Rebuild the session for a newly connected wallet and load its snapshot.
    pub fn on_wallet_connected(&mut self, address: Address, read: R, write: W) -> Result<()> {
        *self.state.get_mut() = WalletState::connected(address);
        *self.data.get_mut() = UserStakingData::empty(address);
        self.contracts = Some(ContractHandles { read, write });
        self.refresh()
    }

    pub fn on_wallet_disconnected(&mut self) {
        *self.state.get_mut() = WalletState::default();
        *self.data.get_mut() = UserStakingData::default();
        self.contracts = None;
    }

    /// Reload the snapshot outside of any action.
    pub fn refresh(&self) -> Result<()> {
        let _guard = self.begin()?;
        self.load_user_data()
    }

    fn begin(&self) -> Result<FlightGuard<'_>> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            warn!("rejected wallet action: another one is in flight");
            self.set_error(ClientError::ActionInFlight.to_string());
            return Err(ClientError::ActionInFlight);
        }
        self.state.lock().loading = true;
        Ok(FlightGuard {
            in_flight: &self.in_flight,
            state: &self.state,
        })
    }

    fn session(&self) -> Result<(&ContractHandles<R, W>, Address)> {
        match (&self.contracts, self.state.lock().address) {
            (Some(handles), Some(address)) => Ok((handles, address)),
            _ => Err(ClientError::ContractsUnavailable),
        }
    }

    fn fail<T>(&self, context: &str, err: ClientError) -> Result<T> {
        error!("{}: {}", context, err);
        self.set_error(format!("{}: {}", context, err));
        Err(err)
    }

    /// Replace the snapshot with a fresh read. On failure the snapshot is
    /// reset to zeroes and the error is recorded.
    fn load_user_data(&self) -> Result<()> {
        let (handles, address) = self.session()?;
        match read_snapshot(&handles.read, address) {
            Ok(snapshot) => {
                debug!(
                    "snapshot for {}: staked {} pending {} stakes {}",
                    address,
                    format_ether(snapshot.staked_amount),
                    format_ether(snapshot.pending_rewards),
                    snapshot.stakes.len()
                );
                *self.data.lock() = snapshot;
                Ok(())
            }
            Err(e) => {
                *self.data.lock() = UserStakingData::empty(address);
                self.fail("Data loading error", e)
            }
        }
    }

    fn record_pending(&self, wallet: &Address, action: StakeAction, hash: &TxHash, amount: String) {
        let saved = self.logs.find_user_by_wallet(wallet).and_then(|user| match user {
            Some(user) => self
                .logs
                .add_stake_log(&NewStakeLog {
                    user_id: user.id,
                    transaction_hash: hash.clone(),
                    amount,
                    action_type: action,
                    status: StakeLogStatus::Pending,
                })
                .map(|_| true),
            None => Ok(false),
        });
        match saved {
            Ok(true) => info!("{} log saved for {}", action, hash),
            Ok(false) => debug!("no user row for {}, {} log skipped", wallet, action),
            Err(e) => warn!("error saving {} log for {}: {}", action, hash, e),
        }
    }

    fn record_confirmed(&self, action: StakeAction, receipt: &TxReceipt) {
        let update = StakeLogUpdate::confirmed(receipt);
        if let Err(e) = self
            .logs
            .update_stake_log_status(&receipt.transaction_hash, &update)
        {
            warn!(
                "error updating {} log for {}: {}",
                action, receipt.transaction_hash, e
            );
        }
    }

    /// Submit, log, wait, log, reload.
    fn run_logged<F>(&self, action: StakeAction, amount: String, submit: F) -> Result<TxReceipt>
    where
        F: FnOnce(&W) -> Result<TxHash>,
    {
        let (handles, address) = self.session()?;
        let hash = submit(&handles.write)?;
        info!("{} transaction sent: {}", action, hash);
        self.record_pending(&address, action, &hash, amount);

        let receipt = handles.write.wait(&hash)?;
        info!("{} transaction confirmed: {}", action, receipt.transaction_hash);
        self.record_confirmed(action, &receipt);

        // Reload failures are already recorded and do not undo the action.
        let _ = self.load_user_data();
        Ok(receipt)
    }

    /// Allow the staking contract to move `amount` tokens.
    pub fn approve_tokens(&self, amount: &str) -> Result<TxReceipt> {
        const CONTEXT: &str = "Token approval failed";
        let value = match self.session().and_then(|_| parse_positive_amount(amount)) {
            Ok(value) => value,
            Err(e) => return self.fail(CONTEXT, e),
        };
        let _guard = self.begin()?;
        let result = self.session().and_then(|(handles, _)| {
            let hash = handles
                .write
                .approve(&handles.read.staking_address(), value)?;
            info!("approve transaction sent: {}", hash);
            let receipt = handles.write.wait(&hash)?;
            let _ = self.load_user_data();
            Ok(receipt)
        });
        result.or_else(|e| self.fail(CONTEXT, e))
    }

    pub fn stake_tokens(&self, amount: &str) -> Result<TxReceipt> {
        const CONTEXT: &str = "Stake failed";
        let value = match self.session().and_then(|_| parse_positive_amount(amount)) {
            Ok(value) => value,
            Err(e) => return self.fail(CONTEXT, e),
        };
        let _guard = self.begin()?;
        let fee = self.data.lock().staking_fee();
        self.run_logged(StakeAction::Stake, amount.trim().to_string(), |w| {
            w.stake(value, fee)
        })
        .or_else(|e| self.fail(CONTEXT, e))
    }

    pub fn claim_rewards(&self) -> Result<TxReceipt> {
        const CONTEXT: &str = "Claiming rewards failed";
        if let Err(e) = self.session() {
            return self.fail(CONTEXT, e);
        }
        let _guard = self.begin()?;
        self.run_logged(StakeAction::ClaimRewards, "0".to_string(), |w| {
            w.claim_rewards()
        })
        .or_else(|e| self.fail(CONTEXT, e))
    }

    /// Withdraw a matured stake. The cached native balance must cover the
    /// unstaking fee; nothing is submitted otherwise.
    pub fn unstake_tokens(&self, stake_id: &str) -> Result<TxReceipt> {
        const CONTEXT: &str = "Unstake failed";
        let id = match self.session().and_then(|_| parse_stake_id(stake_id)) {
            Ok(id) => id,
            Err(e) => return self.fail(CONTEXT, e),
        };
        let _guard = self.begin()?;
        let (fee, available, amount) = {
            let data = self.data.lock();
            (
                data.unstaking_fee(),
                data.native_balance,
                stake_amount_display(&data, id),
            )
        };
        if available < fee {
            return self.fail(
                CONTEXT,
                ClientError::InsufficientFee {
                    required: format_ether(fee),
                    available: format_ether(available),
                },
            );
        }
        self.run_logged(StakeAction::Unstake, amount, |w| w.withdraw(id, fee))
            .or_else(|e| self.fail(CONTEXT, e))
    }

    /// Withdraw a stake before its minimum period, forfeiting rewards.
    pub fn emergency_withdraw(&self, stake_id: &str) -> Result<TxReceipt> {
        const CONTEXT: &str = "Emergency withdraw failed";
        let id = match self.session().and_then(|_| parse_stake_id(stake_id)) {
            Ok(id) => id,
            Err(e) => return self.fail(CONTEXT, e),
        };
        let _guard = self.begin()?;
        let (fee, amount) = {
            let data = self.data.lock();
            (data.unstaking_fee(), stake_amount_display(&data, id))
        };
        self.run_logged(StakeAction::EmergencyWithdraw, amount, |w| {
            w.emergency_withdraw(id, fee)
        })
        .or_else(|e| self.fail(CONTEXT, e))
    }

    pub fn allowance(&self) -> Allowance {
        let Ok((handles, owner)) = self.session() else {
            return Allowance::Unavailable;
        };
        match handles
            .read
            .allowance(&owner, &handles.read.staking_address())
        {
            Ok(amount) => Allowance::Amount(amount),
            Err(e) => {
                error!("allowance check failed: {}", e);
                Allowance::ReadFailed(e.to_string())
            }
        }
    }
}

fn stake_amount_display(data: &UserStakingData, stake_id: u64) -> String {
    data.stake_by_id(stake_id)
        .map_or_else(|| "0".to_string(), |s| format_ether(s.amount))
}

/// Read every piece of the snapshot from the read-only handles.
pub fn read_snapshot<R: ContractReader>(read: &R, address: Address) -> Result<UserStakingData> {
    let native_balance = read.native_balance(&address)?;
    let fee_info = read.fee_info()?;
    let minimum_staking_period = read.minimum_staking_period()?;
    let token_balance = read.token_balance(&address)?;
    let history = read.staking_history(&address)?;

    Ok(UserStakingData {
        address,
        token_balance,
        staked_amount: history.total_staked,
        total_claimed: history.total_claimed,
        pending_rewards: history.current_rewards,
        native_balance,
        fee_info: Some(fee_info),
        minimum_staking_period,
        stakes: history.stakes,
    })
}
