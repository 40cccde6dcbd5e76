//! Owner identity types.
//!
//! Every reminder belongs to exactly one owner: either an anonymous guest
//! id minted on-device, or an authenticated account id issued by the
//! identity provider. Guest data never leaves the device.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

const GUEST_PREFIX: &str = "guest_";

/// Identifier of the owner of a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Wrap an owner id issued by the identity provider.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh anonymous guest id.
    #[must_use]
    pub fn guest() -> Self {
        Self(format!("{GUEST_PREFIX}{}", Uuid::now_v7()))
    }

    /// Guest owners are local-only; their data is never pushed or pulled.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_PREFIX)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for OwnerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for OwnerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Authentication-state transition reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// A guest upgraded to (or a returning user signed into) an account.
    SignedIn { owner: OwnerId },
    /// The session ended; the device reverts to a guest owner.
    SignedOut,
}
