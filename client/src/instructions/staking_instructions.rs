use crate::error::{ClientError, Result};
use crate::instructions::utils::{
    encode_address, encode_call, encode_u256, read_address, read_bool, read_u256, read_usize,
    Address, WORD,
};
use crate::states::{FeeInfo, Stake, StakingHistory};
use crate::units::U256;

/// Words per `Stake` tuple: amount, timestamp, rewardDebt, isActive, stakeId.
const STAKE_TUPLE_WORDS: usize = 5;

/// A contract call, either for `eth_call` or `eth_sendTransaction`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxRequest {
    pub to: Address,
    pub data: Vec<u8>,
    pub value: U256,
}

impl TxRequest {
    fn call(to: Address, data: Vec<u8>) -> Self {
        TxRequest {
            to,
            data,
            value: U256::zero(),
        }
    }

    fn payable(to: Address, data: Vec<u8>, value: U256) -> Self {
        TxRequest { to, data, value }
    }
}

pub fn balance_of_instr(token: Address, owner: &Address) -> TxRequest {
    TxRequest::call(token, encode_call("balanceOf(address)", &[encode_address(owner)]))
}

pub fn allowance_instr(token: Address, owner: &Address, spender: &Address) -> TxRequest {
    TxRequest::call(
        token,
        encode_call(
            "allowance(address,address)",
            &[encode_address(owner), encode_address(spender)],
        ),
    )
}

pub fn approve_instr(token: Address, spender: &Address, amount: U256) -> TxRequest {
    TxRequest::call(
        token,
        encode_call(
            "approve(address,uint256)",
            &[encode_address(spender), encode_u256(amount)],
        ),
    )
}

pub fn stake_instr(staking: Address, amount: U256, fee: U256) -> TxRequest {
    TxRequest::payable(
        staking,
        encode_call("stake(uint256)", &[encode_u256(amount)]),
        fee,
    )
}

pub fn withdraw_instr(staking: Address, stake_id: u64, fee: U256) -> TxRequest {
    TxRequest::payable(
        staking,
        encode_call("withdraw(uint256)", &[encode_u256(U256::from(stake_id))]),
        fee,
    )
}

pub fn emergency_withdraw_instr(staking: Address, stake_id: u64, fee: U256) -> TxRequest {
    TxRequest::payable(
        staking,
        encode_call(
            "emergencyWithdraw(uint256)",
            &[encode_u256(U256::from(stake_id))],
        ),
        fee,
    )
}

pub fn claim_rewards_instr(staking: Address) -> TxRequest {
    TxRequest::call(staking, encode_call("claimRewards()", &[]))
}

pub fn fee_info_instr(staking: Address) -> TxRequest {
    TxRequest::call(staking, encode_call("getBNBFeeInfo()", &[]))
}

pub fn minimum_staking_period_instr(staking: Address) -> TxRequest {
    TxRequest::call(staking, encode_call("minimumStakingPeriod()", &[]))
}

pub fn staking_history_instr(staking: Address, user: &Address) -> TxRequest {
    TxRequest::call(
        staking,
        encode_call("getUserStakingHistory(address)", &[encode_address(user)]),
    )
}

pub fn decode_uint(data: &[u8]) -> Result<U256> {
    read_u256(data, 0, 0)
}

/// `getBNBFeeInfo()` returns `(stakingFee, unstakingFee, feeRecipient, totalFeesCollected, maxFee)`.
pub fn decode_fee_info(data: &[u8]) -> Result<FeeInfo> {
    Ok(FeeInfo {
        staking_fee: read_u256(data, 0, 0)?,
        unstaking_fee: read_u256(data, 0, 1)?,
        fee_recipient: read_address(data, 0, 2)?,
        total_fees_collected: read_u256(data, 0, 3)?,
        max_fee: read_u256(data, 0, 4)?,
    })
}

/// `getUserStakingHistory(address)` returns four static words followed by the
/// offset of a dynamic array of static `Stake` tuples.
pub fn decode_staking_history(data: &[u8]) -> Result<StakingHistory> {
    let total_staked = read_u256(data, 0, 0)?;
    let total_claimed = read_u256(data, 0, 1)?;
    let current_rewards = read_u256(data, 0, 2)?;
    let active_stake_count = read_u256(data, 0, 3)?;

    let array_offset = read_usize(data, 0, 4)?;
    let len = read_usize(data, array_offset, 0)?;
    let items = array_offset + WORD;
    let needed = len
        .checked_mul(STAKE_TUPLE_WORDS * WORD)
        .and_then(|n| n.checked_add(items))
        .ok_or_else(|| ClientError::Abi("stake array length overflow".to_string()))?;
    if needed > data.len() {
        return Err(ClientError::Abi(format!(
            "stake array of {} entries needs {} bytes, got {}",
            len,
            needed,
            data.len()
        )));
    }

    let mut stakes = Vec::with_capacity(len);
    for i in 0..len {
        let base = items + i * STAKE_TUPLE_WORDS * WORD;
        stakes.push(Stake {
            amount: read_u256(data, base, 0)?,
            timestamp: read_u256(data, base, 1)?,
            reward_debt: read_u256(data, base, 2)?,
            is_active: read_bool(data, base, 3)?,
            stake_id: read_u256(data, base, 4)?,
        });
    }

    Ok(StakingHistory {
        total_staked,
        total_claimed,
        current_rewards,
        active_stake_count,
        stakes,
    })
}
