use crate::error::{ClientError, Result};
use crate::units::U256;
use arrayref::array_ref;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

pub const WORD: usize = 32;

/// A 20-byte account or contract address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Address(pub [u8; 20]);

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{40}$").expect("static regex"))
}

impl FromStr for Address {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if !address_pattern().is_match(s) {
            return Err(ClientError::Config(format!("invalid address: {}", s)));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(&s[2..], &mut bytes)
            .map_err(|e| ClientError::Config(format!("invalid address {}: {}", s, e)))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// First four bytes of the Keccak-256 hash of a canonical function signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = Keccak256::digest(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn encode_u256(value: U256) -> [u8; WORD] {
    value.to_big_endian()
}

pub fn encode_address(address: &Address) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[12..].copy_from_slice(&address.0);
    word
}

/// Calldata for `signature` applied to already-encoded static arguments.
pub fn encode_call(signature: &str, args: &[[u8; WORD]]) -> Vec<u8> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        data.extend_from_slice(arg);
    }
    data
}

/// The `index`-th 32-byte word of `data`, counted from `base` bytes in.
pub fn read_word(data: &[u8], base: usize, index: usize) -> Result<&[u8; WORD]> {
    let offset = base
        .checked_add(index.checked_mul(WORD).ok_or_else(overflow)?)
        .ok_or_else(overflow)?;
    if offset.checked_add(WORD).map_or(true, |end| end > data.len()) {
        return Err(ClientError::Abi(format!(
            "word {} at offset {} is past the end of {} bytes",
            index,
            base,
            data.len()
        )));
    }
    Ok(array_ref![data, offset, WORD])
}

pub fn read_u256(data: &[u8], base: usize, index: usize) -> Result<U256> {
    Ok(U256::from_big_endian(read_word(data, base, index)?))
}

pub fn read_usize(data: &[u8], base: usize, index: usize) -> Result<usize> {
    let value = read_u256(data, base, index)?;
    if value > U256::from(u32::MAX) {
        return Err(ClientError::Abi(format!("offset or length too large: {}", value)));
    }
    Ok(value.as_usize())
}

pub fn read_address(data: &[u8], base: usize, index: usize) -> Result<Address> {
    let word = read_word(data, base, index)?;
    if word[..12].iter().any(|b| *b != 0) {
        return Err(ClientError::Abi("address word has dirty upper bytes".to_string()));
    }
    Ok(Address(*array_ref![word, 12, 20]))
}

pub fn read_bool(data: &[u8], base: usize, index: usize) -> Result<bool> {
    match read_u256(data, base, index)? {
        v if v.is_zero() => Ok(false),
        v if v == U256::one() => Ok(true),
        v => Err(ClientError::Abi(format!("invalid bool word: {}", v))),
    }
}

pub fn decode_hex_data(data: &str) -> Result<Vec<u8>> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(digits).map_err(|e| ClientError::Abi(format!("bad hex data: {}", e)))
}

pub fn encode_hex_data(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn overflow() -> ClientError {
    ClientError::Abi("offset overflow".to_string())
}
