use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Enter a valid amount")]
    InvalidAmount,

    #[error("Invalid stake ID: {0}")]
    InvalidStakeId(String),

    #[error("Insufficient BNB for fee. Required: {required} BNB, Available: {available} BNB")]
    InsufficientFee { required: String, available: String },

    #[error("No contract connection")]
    ContractsUnavailable,

    #[error("Another wallet action is already in flight")]
    ActionInFlight,

    #[error("Please connect your wallet first")]
    NotConnected,

    #[error("{message}")]
    Rpc { code: i64, message: String },

    #[error("Transaction {0} reverted")]
    Reverted(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(String),

    /// Message taken from the `error` field of a backend response.
    #[error("{0}")]
    Server(String),

    #[error("Store request failed: {0}")]
    Store(String),

    #[error("Malformed ABI data: {0}")]
    Abi(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}
