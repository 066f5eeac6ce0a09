use serde::{Deserialize, Serialize};

/// Link state of the X account for the connected wallet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkStatus {
    Connected,
    Connecting,
    #[default]
    Disconnected,
}

/// Public profile of the X account linked to a wallet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedSocialAccount {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub followers_count: u64,
    #[serde(default)]
    pub following_count: u64,
    #[serde(default)]
    pub tweet_count: u64,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

/// Device capability resolved by the calling environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    MobileIos,
    MobileAndroid,
    Other,
}

impl Platform {
    pub fn is_mobile_os(&self) -> bool {
        matches!(self, Platform::MobileIos | Platform::MobileAndroid)
    }
}

/// Where the OAuth flow continues after `initiate`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectPlan {
    pub url: String,
    /// Hand the URL to the native X app instead of a browser.
    pub open_in_app: bool,
    pub session_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn account_tolerates_missing_counts() {
        let account: LinkedSocialAccount =
            serde_json::from_value(json!({ "username": "alice", "name": "Alice" })).unwrap();
        assert_eq!(account.followers_count, 0);
        assert!(!account.verified);
        assert!(account.profile_image_url.is_none());
    }
}
