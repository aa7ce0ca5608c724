//! Identity credentials attached to outbound commands.
//!
//! Token issuance belongs to an external identity provider. The engine only
//! asks for a fresh token right before each command is sent.

use crate::error::{Result, SettingsError};
use crate::model::Identity;
use async_trait::async_trait;
use std::sync::RwLock;

/// A short-lived identity token.
///
/// `Debug` output is redacted so tokens never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct IdToken(String);

impl IdToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The raw token. Only call this to build a wire payload.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for IdToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("IdToken([REDACTED])")
    }
}

/// Supplies identity tokens for the signed-in user.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Fetch a fresh token for `identity`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Credential`] when no token can be issued.
    async fn id_token(&self, identity: &Identity) -> Result<IdToken>;
}

/// Provider holding the most recent token handed over by the shell.
///
/// The shell refreshes the token together with the signed-in user; an empty
/// provider refuses every request.
#[derive(Default)]
pub struct SharedTokenProvider {
    token: RwLock<Option<IdToken>>,
}

impl std::fmt::Debug for SharedTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let has_token = self.token.read().map(|t| t.is_some()).unwrap_or(false);
        f.debug_struct("SharedTokenProvider")
            .field("has_token", &has_token)
            .finish()
    }
}

impl SharedTokenProvider {
    #[must_use]
    pub fn new(token: IdToken) -> Self {
        Self {
            token: RwLock::new(Some(token)),
        }
    }

    /// Replace (or clear) the stored token.
    pub fn set(&self, token: Option<IdToken>) {
        match self.token.write() {
            Ok(mut slot) => *slot = token,
            Err(poisoned) => *poisoned.into_inner() = token,
        }
    }
}

#[async_trait]
impl CredentialProvider for SharedTokenProvider {
    async fn id_token(&self, identity: &Identity) -> Result<IdToken> {
        let token = self
            .token
            .read()
            .map_err(|_| SettingsError::Credential("token store poisoned".to_owned()))?
            .clone();
        token.ok_or_else(|| {
            SettingsError::Credential(format!("no token available for {}", identity.uid))
        })
    }
}
