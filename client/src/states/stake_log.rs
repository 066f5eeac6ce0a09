use crate::instructions::rpc::{TxHash, TxReceipt};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeAction {
    Stake,
    Unstake,
    ClaimRewards,
    EmergencyWithdraw,
}

impl fmt::Display for StakeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StakeAction::Stake => "stake",
            StakeAction::Unstake => "unstake",
            StakeAction::ClaimRewards => "claim_rewards",
            StakeAction::EmergencyWithdraw => "emergency_withdraw",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeLogStatus {
    Pending,
    Confirmed,
}

/// A row of the users table; only the id is needed to attach logs.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub wallet_address: String,
}

/// Pending log written right after a transaction is submitted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewStakeLog {
    pub user_id: String,
    pub transaction_hash: TxHash,
    /// Display units, e.g. `"10"`.
    pub amount: String,
    pub action_type: StakeAction,
    pub status: StakeLogStatus,
}

/// Patch applied once the transaction is mined.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StakeLogUpdate {
    pub status: StakeLogStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
}

impl StakeLogUpdate {
    pub fn confirmed(receipt: &TxReceipt) -> Self {
        StakeLogUpdate {
            status: StakeLogStatus::Confirmed,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used.map(|g| g.to_string()),
            gas_price: receipt.gas_price.map(|g| g.to_string()),
        }
    }
}
