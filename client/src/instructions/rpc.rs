use crate::error::{ClientError, Result};
use crate::instructions::staking_instructions::TxRequest;
use crate::instructions::utils::{decode_hex_data, encode_hex_data, Address};
use crate::units::{parse_quantity, to_quantity, U256};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

pub type TxHash = String;

/// Blocking JSON-RPC 2.0 client for an EVM node or wallet endpoint.
pub struct RpcClient {
    url: String,
    http: reqwest::blocking::Client,
    next_id: AtomicU64,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    gas_used: Option<String>,
    effective_gas_price: Option<String>,
    status: Option<String>,
}

/// Mined transaction summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub gas_price: Option<U256>,
    pub success: bool,
}

impl TryFrom<RawReceipt> for TxReceipt {
    type Error = ClientError;

    fn try_from(raw: RawReceipt) -> Result<Self> {
        let block_number = match raw.block_number.as_deref() {
            Some(n) => Some(parse_quantity(n)?.low_u64()),
            None => None,
        };
        let gas_used = raw.gas_used.as_deref().map(parse_quantity).transpose()?;
        let gas_price = raw
            .effective_gas_price
            .as_deref()
            .map(parse_quantity)
            .transpose()?;
        // Pre-Byzantium receipts carry no status; treat them as successful.
        let success = match raw.status.as_deref() {
            Some(s) => !parse_quantity(s)?.is_zero(),
            None => true,
        };
        Ok(TxReceipt {
            transaction_hash: raw.transaction_hash,
            block_number,
            gas_used,
            gas_price,
            success,
        })
    }
}

impl RpcClient {
    pub fn new(url: impl Into<String>) -> Self {
        RpcClient {
            url: url.into(),
            http: reqwest::blocking::Client::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn send_request(&self, method: &str, params: Value) -> Result<Option<Value>> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        debug!("rpc {} -> {} #{}", self.url, method, id);
        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        if let Some(err) = response.error {
            return Err(ClientError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(response.result.filter(|v| !v.is_null()))
    }

    pub fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        self.request_opt(method, params)?
            .ok_or_else(|| ClientError::Rpc {
                code: -32603,
                message: format!("{} returned no result", method),
            })
    }

    /// Like `request`, but a `null` result is `None` instead of an error.
    pub fn request_opt<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<Option<T>> {
        self.send_request(method, params)?
            .map(|value| {
                serde_json::from_value(value)
                    .map_err(|e| ClientError::Abi(format!("{} result: {}", method, e)))
            })
            .transpose()
    }

    pub fn chain_id(&self) -> Result<u64> {
        let id: String = self.request("eth_chainId", json!([]))?;
        Ok(parse_quantity(&id)?.low_u64())
    }

    pub fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([]))
    }

    pub fn get_balance(&self, owner: &Address) -> Result<U256> {
        let balance: String = self.request("eth_getBalance", json!([owner, "latest"]))?;
        parse_quantity(&balance)
    }

    pub fn call(&self, tx: &TxRequest) -> Result<Vec<u8>> {
        let data: String = self.request(
            "eth_call",
            json!([{ "to": tx.to, "data": encode_hex_data(&tx.data) }, "latest"]),
        )?;
        decode_hex_data(&data)
    }

    pub fn send_transaction(&self, from: &Address, tx: &TxRequest) -> Result<TxHash> {
        self.request(
            "eth_sendTransaction",
            json!([{
                "from": from,
                "to": tx.to,
                "data": encode_hex_data(&tx.data),
                "value": to_quantity(tx.value),
            }]),
        )
    }

    pub fn transaction_receipt(&self, hash: &str) -> Result<Option<TxReceipt>> {
        self.request_opt::<RawReceipt>("eth_getTransactionReceipt", json!([hash]))?
            .map(TxReceipt::try_from)
            .transpose()
    }
}

/// Submit `tx` from `from` through a wallet endpoint and return its hash.
pub fn send_txn(rpc: &RpcClient, from: &Address, tx: &TxRequest) -> Result<TxHash> {
    let hash = rpc.send_transaction(from, tx)?;
    info!("transaction sent: {}", hash);
    Ok(hash)
}

/// Poll for a receipt until the transaction is mined. There is no timeout.
pub fn wait_for_receipt(rpc: &RpcClient, hash: &str, poll: Duration) -> Result<TxReceipt> {
    loop {
        if let Some(receipt) = rpc.transaction_receipt(hash)? {
            if !receipt.success {
                return Err(ClientError::Reverted(receipt.transaction_hash));
            }
            info!(
                "transaction confirmed: {} in block {:?}",
                receipt.transaction_hash, receipt.block_number
            );
            return Ok(receipt);
        }
        thread::sleep(poll);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_fields_are_parsed_from_hex() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": "0xabc",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "status": "0x1"
        }))
        .unwrap();
        let receipt = TxReceipt::try_from(raw).unwrap();
        assert_eq!(receipt.block_number, Some(16));
        assert_eq!(receipt.gas_used, Some(U256::from(21_000u64)));
        assert_eq!(receipt.gas_price, Some(U256::from(1_000_000_000u64)));
        assert!(receipt.success);
    }

    #[test]
    fn failed_status_is_not_success() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": "0xdef",
            "blockNumber": "0x1",
            "status": "0x0"
        }))
        .unwrap();
        let receipt = TxReceipt::try_from(raw).unwrap();
        assert!(!receipt.success);
        assert_eq!(receipt.gas_price, None);
    }
}
