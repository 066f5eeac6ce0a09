//! HTTP boundary of the X account-link backend.

use crate::error::{ClientError, Result};
use crate::instructions::utils::Address;
use crate::states::LinkedSocialAccount;
use serde::Deserialize;
use serde_json::json;

pub const STATUS_PATH: &str = "/api/x/status";
pub const INITIATE_PATH: &str = "/api/x/initiate";
pub const DISCONNECT_PATH: &str = "/api/x/disconnect";

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub connected: bool,
    #[serde(rename = "xUser", default)]
    pub x_user: Option<LinkedSocialAccount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub session_id: String,
    pub auth_url: String,
    #[serde(default)]
    pub is_mobile: bool,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub trait SocialApi {
    fn status(&self, wallet: &Address) -> Result<StatusResponse>;
    fn initiate(&self, wallet: &Address) -> Result<InitiateResponse>;
    fn disconnect(&self, wallet: &Address) -> Result<()>;
}

pub struct HttpSocialApi {
    base_url: String,
    http: reqwest::blocking::Client,
}

impl HttpSocialApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpSocialApi {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::blocking::Client::new(),
        }
    }

    fn post(&self, path: &str, wallet: &Address) -> Result<reqwest::blocking::Response> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(&json!({ "walletAddress": wallet }))
            .send()?;
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        // The backend reports failures as `{ "error": "..." }`.
        match response.json::<ErrorBody>().ok().and_then(|b| b.error) {
            Some(message) => Err(ClientError::Server(message)),
            None => Err(ClientError::Api(format!("{} returned {}", path, status))),
        }
    }
}

impl SocialApi for HttpSocialApi {
    fn status(&self, wallet: &Address) -> Result<StatusResponse> {
        Ok(self.post(STATUS_PATH, wallet)?.json()?)
    }

    fn initiate(&self, wallet: &Address) -> Result<InitiateResponse> {
        Ok(self.post(INITIATE_PATH, wallet)?.json()?)
    }

    fn disconnect(&self, wallet: &Address) -> Result<()> {
        self.post(DISCONNECT_PATH, wallet)?;
        Ok(())
    }
}
