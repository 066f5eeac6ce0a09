use crate::instructions::utils::Address;
use std::time::{Duration, Instant};

/// A transient user-facing message that stops showing after its lifetime.
#[derive(Clone, Debug)]
pub struct Notice {
    pub message: String,
    raised_at: Instant,
    lifetime: Duration,
}

impl Notice {
    pub fn new(message: impl Into<String>, lifetime: Duration) -> Self {
        Notice {
            message: message.into(),
            raised_at: Instant::now(),
            lifetime,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.raised_at.elapsed() >= self.lifetime
    }
}

/// Session-local wallet flags. Rebuilt on every connection change.
#[derive(Clone, Debug, Default)]
pub struct WalletState {
    pub is_connected: bool,
    pub address: Option<Address>,
    pub loading: bool,
    error: Option<Notice>,
}

impl WalletState {
    pub fn connected(address: Address) -> Self {
        WalletState {
            is_connected: true,
            address: Some(address),
            ..Default::default()
        }
    }

    pub fn set_error(&mut self, message: impl Into<String>, lifetime: Duration) {
        self.error = Some(Notice::new(message, lifetime));
    }

    /// The current error, unless it has already expired.
    pub fn error(&self) -> Option<&str> {
        self.error
            .as_ref()
            .filter(|n| !n.is_expired())
            .map(|n| n.message.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_expires() {
        let mut state = WalletState::connected(Address([9; 20]));
        state.set_error("boom", Duration::from_secs(60));
        assert_eq!(state.error(), Some("boom"));
        state.set_error("gone", Duration::ZERO);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn default_is_disconnected_and_idle() {
        let state = WalletState::default();
        assert!(!state.is_connected);
        assert!(!state.loading);
        assert!(state.address.is_none());
    }
}
