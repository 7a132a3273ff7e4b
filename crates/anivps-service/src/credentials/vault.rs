//! Process-local holder of provider tokens.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::RwLock;
use uuid::Uuid;

/// Maps a session to the provider token its provisioning runs with.
///
/// Tokens are never written to the database, so a server restart forgets
/// them and the affected sessions fail on their next worker step.
#[derive(Default)]
pub struct CredentialVault {
    tokens: RwLock<HashMap<Uuid, String>>,
}

impl CredentialVault {
    /// Create an empty vault.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember `token` for `session_id`, replacing any previous token.
    pub async fn store(&self, session_id: Uuid, token: impl Into<String>) {
        self.tokens.write().await.insert(session_id, token.into());
    }

    /// The token held for `session_id`.
    pub async fn get(&self, session_id: Uuid) -> Option<String> {
        self.tokens.read().await.get(&session_id).cloned()
    }

    /// Forget the token of `session_id`.
    pub async fn remove(&self, session_id: Uuid) -> Option<String> {
        self.tokens.write().await.remove(&session_id)
    }

    /// Number of held tokens.
    pub async fn len(&self) -> usize {
        self.tokens.read().await.len()
    }

    /// Whether no token is held.
    pub async fn is_empty(&self) -> bool {
        self.tokens.read().await.is_empty()
    }
}

impl fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let held = self.tokens.try_read().map(|t| t.len()).ok();
        f.debug_struct("CredentialVault")
            .field("held", &held)
            .finish()
    }
}
