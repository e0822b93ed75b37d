//! Per-source access credentials

use std::fmt;

use serde::{Deserialize, Serialize};

use super::source::Source;
use crate::impl_domain_status_conversions;

/// Opaque bearer token. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Returns `None` for blank input.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Raw secret, for building an `Authorization` header or a query param.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl fmt::Display for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Lifecycle state of a stored credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialState {
    /// Never set.
    #[default]
    Absent,
    Valid,
    /// Tombstone written after an upstream 401.
    Invalid,
}

impl_domain_status_conversions!(CredentialState {
    Absent => "absent",
    Valid => "valid",
    Invalid => "invalid",
});

/// What persistent storage holds for one (user, source) pair.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StoredCredential {
    #[default]
    Absent,
    Valid(AccessToken),
    Invalidated,
}

impl StoredCredential {
    #[must_use]
    pub const fn state(&self) -> CredentialState {
        match self {
            Self::Absent => CredentialState::Absent,
            Self::Valid(_) => CredentialState::Valid,
            Self::Invalidated => CredentialState::Invalid,
        }
    }

    #[must_use]
    pub const fn token(&self) -> Option<&AccessToken> {
        match self {
            Self::Valid(token) => Some(token),
            _ => None,
        }
    }
}

/// Credential overview reported to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub source: Source,
    pub state: CredentialState,
    pub needs_credential: bool,
}
