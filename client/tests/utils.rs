// In-memory stand-ins for the chain, the log store and the link backend

#![allow(dead_code)]

use stake_link_client::contracts::{ContractReader, ContractWriter};
use stake_link_client::controllers::WalletController;
use stake_link_client::instructions::rpc::{TxHash, TxReceipt};
use stake_link_client::instructions::utils::Address;
use stake_link_client::notify::Notifier;
use stake_link_client::services::{InitiateResponse, SocialApi, StakeLogStore, StatusResponse};
use stake_link_client::states::{
    FeeInfo, NewStakeLog, Stake, StakeLogUpdate, StakingHistory, UserRecord,
};
use stake_link_client::units::U256;
use stake_link_client::{ClientError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

pub const WALLET: Address = Address([0x5a; 20]);
pub const STAKING: Address = Address([0xbb; 20]);
pub const FEE_RECIPIENT: Address = Address([0xfe; 20]);

pub fn ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

pub fn milli_ether(n: u64) -> U256 {
    U256::from(n) * U256::exp10(15)
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Approve(Address, U256),
    Stake(U256, U256),
    Withdraw(u64, U256),
    EmergencyWithdraw(u64, U256),
    Claim,
}

#[derive(Default)]
pub struct ChainState {
    pub native_balance: U256,
    pub token_balance: U256,
    pub allowance: U256,
    pub fee_info: FeeInfo,
    pub minimum_staking_period: U256,
    pub history: StakingHistory,
    pub next_stake_id: u64,
    pub block: u64,
    pub submitted: Vec<Call>,
    pub pending: HashMap<TxHash, Call>,
    pub history_reads: usize,
    pub fail_reads: bool,
    pub fail_allowance: bool,
    pub reject_submit: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakeChain(pub Rc<RefCell<ChainState>>);

impl FakeChain {
    pub fn funded() -> Self {
        let chain = FakeChain::default();
        {
            let mut s = chain.0.borrow_mut();
            s.native_balance = ether(1);
            s.token_balance = ether(100);
            s.fee_info = FeeInfo {
                staking_fee: milli_ether(1),
                unstaking_fee: milli_ether(2),
                fee_recipient: FEE_RECIPIENT,
                total_fees_collected: U256::zero(),
                max_fee: milli_ether(10),
            };
            s.minimum_staking_period = U256::from(86_400u64);
            s.block = 1_000;
        }
        chain
    }

    pub fn state(&self) -> std::cell::RefMut<'_, ChainState> {
        self.0.borrow_mut()
    }

    pub fn reader(&self) -> FakeReader {
        FakeReader(self.clone())
    }

    pub fn writer(&self) -> FakeWriter {
        FakeWriter(self.clone())
    }

    pub fn add_stake(&self, amount: U256) -> u64 {
        let mut s = self.state();
        let id = s.next_stake_id;
        s.next_stake_id += 1;
        s.history.total_staked = s.history.total_staked + amount;
        s.history.active_stake_count = s.history.active_stake_count + U256::one();
        s.history.stakes.push(Stake {
            amount,
            timestamp: U256::from(1_700_000_000u64 + id),
            reward_debt: U256::zero(),
            is_active: true,
            stake_id: U256::from(id),
        });
        id
    }

    fn remove_stake(s: &mut ChainState, id: u64) {
        if let Some(pos) = s
            .history
            .stakes
            .iter()
            .position(|st| st.stake_id == U256::from(id))
        {
            let stake = s.history.stakes.remove(pos);
            s.history.total_staked = s.history.total_staked - stake.amount;
            s.history.active_stake_count = s.history.active_stake_count - U256::one();
            s.token_balance = s.token_balance + stake.amount;
        }
    }
}

pub struct FakeReader(pub FakeChain);

impl ContractReader for FakeReader {
    fn staking_address(&self) -> Address {
        STAKING
    }

    fn native_balance(&self, _owner: &Address) -> Result<U256> {
        let s = self.0.state();
        if s.fail_reads {
            return Err(ClientError::Rpc {
                code: -32000,
                message: "header not found".to_string(),
            });
        }
        Ok(s.native_balance)
    }

    fn token_balance(&self, _owner: &Address) -> Result<U256> {
        Ok(self.0.state().token_balance)
    }

    fn allowance(&self, _owner: &Address, _spender: &Address) -> Result<U256> {
        let s = self.0.state();
        if s.fail_allowance {
            return Err(ClientError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            });
        }
        Ok(s.allowance)
    }

    fn fee_info(&self) -> Result<FeeInfo> {
        Ok(self.0.state().fee_info.clone())
    }

    fn minimum_staking_period(&self) -> Result<U256> {
        Ok(self.0.state().minimum_staking_period)
    }

    fn staking_history(&self, _user: &Address) -> Result<StakingHistory> {
        let mut s = self.0.state();
        s.history_reads += 1;
        Ok(s.history.clone())
    }
}

pub struct FakeWriter(pub FakeChain);

impl FakeWriter {
    fn submit(&self, call: Call) -> Result<TxHash> {
        let mut s = self.0.state();
        if let Some(message) = s.reject_submit.clone() {
            return Err(ClientError::Rpc {
                code: 4001,
                message,
            });
        }
        s.submitted.push(call.clone());
        let hash = format!("0x{:064x}", s.submitted.len());
        s.pending.insert(hash.clone(), call);
        Ok(hash)
    }
}

impl ContractWriter for FakeWriter {
    fn approve(&self, spender: &Address, amount: U256) -> Result<TxHash> {
        self.submit(Call::Approve(*spender, amount))
    }

    fn stake(&self, amount: U256, fee: U256) -> Result<TxHash> {
        self.submit(Call::Stake(amount, fee))
    }

    fn withdraw(&self, stake_id: u64, fee: U256) -> Result<TxHash> {
        self.submit(Call::Withdraw(stake_id, fee))
    }

    fn emergency_withdraw(&self, stake_id: u64, fee: U256) -> Result<TxHash> {
        self.submit(Call::EmergencyWithdraw(stake_id, fee))
    }

    fn claim_rewards(&self) -> Result<TxHash> {
        self.submit(Call::Claim)
    }

    fn wait(&self, tx: &TxHash) -> Result<TxReceipt> {
        let call = self
            .0
            .state()
            .pending
            .remove(tx)
            .ok_or_else(|| ClientError::Reverted(tx.clone()))?;
        match call {
            Call::Approve(_, amount) => self.0.state().allowance = amount,
            Call::Stake(amount, fee) => {
                self.0.add_stake(amount);
                let mut s = self.0.state();
                s.token_balance = s.token_balance - amount;
                s.native_balance = s.native_balance - fee;
            }
            Call::Withdraw(id, fee) | Call::EmergencyWithdraw(id, fee) => {
                let mut s = self.0.state();
                FakeChain::remove_stake(&mut s, id);
                s.native_balance = s.native_balance - fee;
            }
            Call::Claim => {
                let mut s = self.0.state();
                s.token_balance = s.token_balance + s.history.current_rewards;
                s.history.total_claimed = s.history.total_claimed + s.history.current_rewards;
                s.history.current_rewards = U256::zero();
            }
        }
        let mut s = self.0.state();
        s.block += 1;
        Ok(TxReceipt {
            transaction_hash: tx.clone(),
            block_number: Some(s.block),
            gas_used: Some(U256::from(21_000u64)),
            gas_price: Some(U256::from(3_000_000_000u64)),
            success: true,
        })
    }
}

// ---------------------------------------------------------------------------
// Log store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct LogBook {
    pub user: Option<UserRecord>,
    pub logs: Vec<NewStakeLog>,
    pub updates: Vec<(String, StakeLogUpdate)>,
    pub fail_lookup: bool,
    pub fail_add: bool,
    pub fail_update: bool,
}

#[derive(Clone, Default)]
pub struct FakeLogs(pub Rc<RefCell<LogBook>>);

impl FakeLogs {
    pub fn with_user() -> Self {
        let logs = FakeLogs::default();
        logs.book().user = Some(UserRecord {
            id: "user-1".to_string(),
            wallet_address: WALLET.to_string(),
        });
        logs
    }

    pub fn book(&self) -> std::cell::RefMut<'_, LogBook> {
        self.0.borrow_mut()
    }
}

impl StakeLogStore for FakeLogs {
    fn find_user_by_wallet(&self, _wallet: &Address) -> Result<Option<UserRecord>> {
        let book = self.book();
        if book.fail_lookup {
            return Err(ClientError::Store("503 Service Unavailable".to_string()));
        }
        Ok(book.user.clone())
    }

    fn add_stake_log(&self, log: &NewStakeLog) -> Result<()> {
        let mut book = self.book();
        if book.fail_add {
            return Err(ClientError::Store("insert rejected".to_string()));
        }
        book.logs.push(log.clone());
        Ok(())
    }

    fn update_stake_log_status(&self, transaction_hash: &str, update: &StakeLogUpdate) -> Result<()> {
        let mut book = self.book();
        if book.fail_update {
            return Err(ClientError::Store("update rejected".to_string()));
        }
        book.updates.push((transaction_hash.to_string(), update.clone()));
        Ok(())
    }
}

pub type TestWallet = WalletController<FakeReader, FakeWriter, FakeLogs>;

pub fn connected_wallet(chain: &FakeChain, logs: &FakeLogs) -> TestWallet {
    let mut wallet = WalletController::new(logs.clone(), Duration::from_secs(60));
    wallet
        .on_wallet_connected(WALLET, chain.reader(), chain.writer())
        .expect("initial snapshot should load");
    wallet
}

// ---------------------------------------------------------------------------
// Link backend and notices
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub enum Reply<T> {
    Ok(T),
    /// Non-OK response with the backend's `error` message.
    Server(String),
    /// Body that could not be understood.
    Malformed,
}

impl<T: Clone> Reply<T> {
    fn result(&self) -> Result<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Server(message) => Err(ClientError::Server(message.clone())),
            Reply::Malformed => Err(ClientError::Abi("unexpected response body".to_string())),
        }
    }
}

pub struct ApiScript {
    pub status: Reply<StatusResponse>,
    pub initiate: Reply<InitiateResponse>,
    pub disconnect: Reply<()>,
    pub calls: Vec<(&'static str, Address)>,
}

impl Default for ApiScript {
    fn default() -> Self {
        ApiScript {
            status: Reply::Ok(StatusResponse::default()),
            initiate: Reply::Ok(InitiateResponse {
                session_id: "sess-1".to_string(),
                auth_url: "https://x.com/i/oauth2/authorize?state=abc".to_string(),
                is_mobile: false,
            }),
            disconnect: Reply::Ok(()),
            calls: Vec::new(),
        }
    }
}

#[derive(Clone, Default)]
pub struct FakeApi(pub Rc<RefCell<ApiScript>>);

impl FakeApi {
    pub fn script(&self) -> std::cell::RefMut<'_, ApiScript> {
        self.0.borrow_mut()
    }
}

impl SocialApi for FakeApi {
    fn status(&self, wallet: &Address) -> Result<StatusResponse> {
        let mut s = self.script();
        s.calls.push(("status", *wallet));
        s.status.result()
    }

    fn initiate(&self, wallet: &Address) -> Result<InitiateResponse> {
        let mut s = self.script();
        s.calls.push(("initiate", *wallet));
        s.initiate.result()
    }

    fn disconnect(&self, wallet: &Address) -> Result<()> {
        let mut s = self.script();
        s.calls.push(("disconnect", *wallet));
        s.disconnect.result()
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier(pub Rc<RefCell<Vec<(bool, String)>>>);

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|(ok, _)| !ok)
            .map(|(_, m)| m.clone())
            .collect()
    }

    pub fn successes(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter(|(ok, _)| *ok)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.0.borrow_mut().push((true, message.to_string()));
    }

    fn error(&self, message: &str) {
        self.0.borrow_mut().push((false, message.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Local HTTP listener
// ---------------------------------------------------------------------------

/// Answer exactly one HTTP request with `status` and a JSON `body`.
/// Returns the base URL and a handle yielding the raw request text.
pub fn serve_once(status: &'static str, body: &'static str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind local listener");
    let base_url = format!("http://{}", listener.local_addr().expect("local address"));
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept connection");
        let request = read_request(&mut stream);
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        stream
            .write_all(response.as_bytes())
            .expect("write response");
        request
    });
    (base_url, handle)
}

fn read_request(stream: &mut TcpStream) -> String {
    let mut data = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).expect("read request");
        if n == 0 {
            break;
        }
        data.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&data);
        if let Some(end) = text.find("\r\n\r\n") {
            let length = text[..end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if data.len() >= end + 4 + length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&data).into_owned()
}
