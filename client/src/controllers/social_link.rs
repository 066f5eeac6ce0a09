//! Links an X account to the connected wallet through the backend's OAuth flow.
//!
//! Every call degrades to a safe state on failure: the link is reported as
//! disconnected and the user is notified. Nothing is retried.

use crate::error::{ClientError, Result};
use crate::instructions::utils::Address;
use crate::notify::Notifier;
use crate::services::{InitiateResponse, SocialApi};
use crate::states::{LinkStatus, LinkedSocialAccount, Platform, RedirectPlan};
use log::{error, info};
use reqwest::Url;

/// Query parameter carrying the OAuth session id to the callback.
pub const SESSION_QUERY_PARAM: &str = "session_id";

const INITIATE_FAILED: &str = "Failed to start X authentication";
const DISCONNECT_FAILED: &str = "Failed to disconnect X account";
const DISCONNECTED: &str = "X account disconnected successfully";

/// What the calling environment knows about the device.
pub trait RedirectEnvironment {
    fn platform(&self) -> Platform;
    /// Asked only on iOS and Android when the backend reports a mobile client.
    fn prefers_app(&self) -> bool;
}

/// Fixed answers, for environments that resolve the capability up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticEnvironment {
    pub platform: Platform,
    pub prefers_app: bool,
}

impl RedirectEnvironment for StaticEnvironment {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn prefers_app(&self) -> bool {
        self.prefers_app
    }
}

/// Decide where to send the user once the backend has opened a session.
pub fn plan_redirect(
    response: &InitiateResponse,
    env: &impl RedirectEnvironment,
) -> Result<RedirectPlan> {
    let mut url = Url::parse(&response.auth_url)
        .map_err(|e| ClientError::Api(format!("invalid authorization URL: {}", e)))?;
    url.query_pairs_mut()
        .append_pair(SESSION_QUERY_PARAM, &response.session_id);

    let open_in_app = if response.is_mobile && env.platform().is_mobile_os() {
        env.prefers_app()
    } else {
        response.is_mobile
    };

    Ok(RedirectPlan {
        url: url.to_string(),
        open_in_app,
        session_id: response.session_id.clone(),
    })
}

pub struct SocialLinkController<A, N> {
    api: A,
    notifier: N,
    status: LinkStatus,
    account: Option<LinkedSocialAccount>,
}

impl<A: SocialApi, N: Notifier> SocialLinkController<A, N> {
    pub fn new(api: A, notifier: N) -> Self {
        SocialLinkController {
            api,
            notifier,
            status: LinkStatus::Disconnected,
            account: None,
        }
    }

    pub fn status(&self) -> LinkStatus {
        self.status
    }

    pub fn account(&self) -> Option<&LinkedSocialAccount> {
        self.account.as_ref()
    }

    fn reset(&mut self) {
        self.status = LinkStatus::Disconnected;
        self.account = None;
    }

    /// Refresh the link state. Call on start and whenever the wallet changes.
    pub fn check_status(&mut self, wallet: Option<&Address>) -> LinkStatus {
        let Some(wallet) = wallet else {
            return self.status;
        };
        match self.api.status(wallet) {
            Ok(response) => {
                self.status = if response.connected {
                    LinkStatus::Connected
                } else {
                    LinkStatus::Disconnected
                };
                self.account = response.x_user;
            }
            Err(e) => {
                error!("Error checking X status: {}", e);
                self.reset();
            }
        }
        self.status
    }

    /// Open an OAuth session and return where the user should be sent.
    ///
    /// After a successful call the flow continues in the external callback,
    /// which receives the session id on the redirect URL.
    pub fn initiate(
        &mut self,
        wallet: Option<&Address>,
        env: &impl RedirectEnvironment,
    ) -> Option<RedirectPlan> {
        let Some(wallet) = wallet else {
            self.notifier.error(&ClientError::NotConnected.to_string());
            return None;
        };

        self.status = LinkStatus::Connecting;
        let plan = self
            .api
            .initiate(wallet)
            .and_then(|response| plan_redirect(&response, env));
        match plan {
            Ok(plan) => {
                info!(
                    "redirecting to X authorization (app: {}) for session {}",
                    plan.open_in_app, plan.session_id
                );
                Some(plan)
            }
            Err(e) => {
                error!("Error initiating X auth: {}", e);
                self.status = LinkStatus::Disconnected;
                let message = match e {
                    ClientError::Server(message) => message,
                    _ => INITIATE_FAILED.to_string(),
                };
                self.notifier.error(&message);
                None
            }
        }
    }

    /// Unlink the X account. On failure the local state is left untouched.
    pub fn disconnect(&mut self, wallet: Option<&Address>) -> bool {
        let Some(wallet) = wallet else {
            return false;
        };
        match self.api.disconnect(wallet) {
            Ok(()) => {
                self.reset();
                self.notifier.success(DISCONNECTED);
                true
            }
            Err(e) => {
                error!("Error disconnecting X account: {}", e);
                self.notifier.error(DISCONNECT_FAILED);
                false
            }
        }
    }
}
