use crate::instructions::utils::Address;
use crate::units::{format_ether, U256};
use serde_json::{json, Value};

/// Fee schedule reported by `getBNBFeeInfo()`, in native base units.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeInfo {
    pub staking_fee: U256,
    pub unstaking_fee: U256,
    pub fee_recipient: Address,
    pub total_fees_collected: U256,
    pub max_fee: U256,
}

/// One deposit tracked by the staking contract.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Stake {
    pub amount: U256,
    pub timestamp: U256,
    pub reward_debt: U256,
    pub is_active: bool,
    pub stake_id: U256,
}

/// Raw return value of `getUserStakingHistory(address)`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StakingHistory {
    pub total_staked: U256,
    pub total_claimed: U256,
    pub current_rewards: U256,
    pub active_stake_count: U256,
    pub stakes: Vec<Stake>,
}

/// Point-in-time view of a user's on-chain position.
///
/// Always rebuilt wholesale from the contracts; nothing patches it in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UserStakingData {
    pub address: Address,
    pub token_balance: U256,
    pub staked_amount: U256,
    pub total_claimed: U256,
    pub pending_rewards: U256,
    pub native_balance: U256,
    pub fee_info: Option<FeeInfo>,
    pub minimum_staking_period: U256,
    pub stakes: Vec<Stake>,
}

impl UserStakingData {
    /// Zero-valued snapshot used before the first load and after a failed one.
    pub fn empty(address: Address) -> Self {
        UserStakingData {
            address,
            ..Default::default()
        }
    }

    pub fn staking_fee(&self) -> U256 {
        self.fee_info.as_ref().map_or(U256::zero(), |f| f.staking_fee)
    }

    pub fn unstaking_fee(&self) -> U256 {
        self.fee_info.as_ref().map_or(U256::zero(), |f| f.unstaking_fee)
    }

    pub fn stake_by_id(&self, stake_id: u64) -> Option<&Stake> {
        let id = U256::from(stake_id);
        self.stakes.iter().find(|s| s.stake_id == id)
    }

    /// Display form of every field, for printing.
    pub fn to_display_json(&self) -> Value {
        json!({
            "address": self.address,
            "tokenBalance": format_ether(self.token_balance),
            "stakedAmount": format_ether(self.staked_amount),
            "totalClaimed": format_ether(self.total_claimed),
            "pendingRewards": format_ether(self.pending_rewards),
            "bnbBalance": format_ether(self.native_balance),
            "feeInfo": self.fee_info.as_ref().map(|f| json!({
                "stakingFeeBNB": f.staking_fee.to_string(),
                "unstakingFeeBNB": f.unstaking_fee.to_string(),
                "feeRecipient": f.fee_recipient,
                "totalBNBFeesCollected": f.total_fees_collected.to_string(),
                "maxFeeBNB": f.max_fee.to_string(),
            })),
            "minimumStakingPeriod": self.minimum_staking_period.to_string(),
            "stakes": self.stakes.iter().map(|s| json!({
                "stakeId": s.stake_id.to_string(),
                "amount": format_ether(s.amount),
                "timestamp": s.timestamp.to_string(),
                "rewardDebt": format_ether(s.reward_debt),
                "isActive": s.is_active,
            })).collect::<Vec<_>>(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_displays_zeroes() {
        let data = UserStakingData::empty(Address([1; 20]));
        let view = data.to_display_json();
        assert_eq!(view["stakedAmount"], "0");
        assert_eq!(view["bnbBalance"], "0");
        assert!(view["feeInfo"].is_null());
        assert_eq!(data.unstaking_fee(), U256::zero());
    }

    #[test]
    fn finds_stake_by_id() {
        let mut data = UserStakingData::empty(Address::default());
        data.stakes.push(Stake {
            amount: U256::exp10(18),
            stake_id: U256::from(4u64),
            is_active: true,
            ..Default::default()
        });
        assert_eq!(data.stake_by_id(4).map(|s| s.amount), Some(U256::exp10(18)));
        assert!(data.stake_by_id(5).is_none());
    }
}
