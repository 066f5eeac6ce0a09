//! Persistence of stake transaction logs behind a PostgREST endpoint.

use crate::error::{ClientError, Result};
use crate::instructions::utils::Address;
use crate::states::{NewStakeLog, StakeLogUpdate, UserRecord};
use log::debug;

pub trait StakeLogStore {
    fn find_user_by_wallet(&self, wallet: &Address) -> Result<Option<UserRecord>>;
    fn add_stake_log(&self, log: &NewStakeLog) -> Result<()>;
    fn update_stake_log_status(&self, transaction_hash: &str, update: &StakeLogUpdate)
        -> Result<()>;
}

/// PostgREST filter for the user row of `wallet`.
///
/// Stored addresses may be checksummed while `Address` prints lowercase, so
/// the match is case-insensitive.
fn user_lookup_query(wallet: &Address) -> [(&'static str, String); 3] {
    [
        ("select", "id,wallet_address".to_string()),
        ("wallet_address", format!("ilike.{}", wallet)),
        ("limit", "1".to_string()),
    ]
}

pub struct RestStakeLogStore {
    base_url: String,
    api_key: String,
    http: reqwest::blocking::Client,
}

impl RestStakeLogStore {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        RestStakeLogStore {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, name)
    }

    fn authorized(
        &self,
        request: reqwest::blocking::RequestBuilder,
    ) -> reqwest::blocking::RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn check(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().unwrap_or_default();
        Err(ClientError::Store(format!("{}: {}", status, body)))
    }
}

impl StakeLogStore for RestStakeLogStore {
    fn find_user_by_wallet(&self, wallet: &Address) -> Result<Option<UserRecord>> {
        let response = self
            .authorized(self.http.get(self.table("users")))
            .query(&user_lookup_query(wallet))
            .send()?;
        let mut users: Vec<UserRecord> = Self::check(response)?.json()?;
        Ok(users.pop())
    }

    fn add_stake_log(&self, log: &NewStakeLog) -> Result<()> {
        let response = self
            .authorized(self.http.post(self.table("stake_logs")))
            .header("Prefer", "return=minimal")
            .json(log)
            .send()?;
        Self::check(response)?;
        debug!("stake log {} saved as {:?}", log.transaction_hash, log.status);
        Ok(())
    }

    fn update_stake_log_status(
        &self,
        transaction_hash: &str,
        update: &StakeLogUpdate,
    ) -> Result<()> {
        let response = self
            .authorized(self.http.patch(self.table("stake_logs")))
            .query(&[("transaction_hash", format!("eq.{}", transaction_hash))])
            .header("Prefer", "return=minimal")
            .json(update)
            .send()?;
        Self::check(response)?;
        debug!("stake log {} updated to {:?}", transaction_hash, update.status);
        Ok(())
    }
}
