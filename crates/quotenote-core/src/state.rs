//! Shared cross-client state types.

use crate::auth::AuthSession;

/// Where quote operations are persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageMode {
    Local,
    Cloud,
}

/// Authentication facts supplied by the auth layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Anonymous,
    Authenticated {
        user_id: String,
        email: Option<String>,
    },
}

impl AuthState {
    /// Authenticated state for a bare user id
    pub fn user(user_id: impl Into<String>) -> Self {
        Self::Authenticated {
            user_id: user_id.into(),
            email: None,
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated { user_id, .. } => Some(user_id),
        }
    }

    #[must_use]
    pub const fn storage_mode(&self) -> StorageMode {
        if self.is_authenticated() {
            StorageMode::Cloud
        } else {
            StorageMode::Local
        }
    }
}

impl From<Option<&AuthSession>> for AuthState {
    fn from(session: Option<&AuthSession>) -> Self {
        session.map_or(Self::Anonymous, |session| Self::Authenticated {
            user_id: session.user.id.clone(),
            email: session.user.email.clone(),
        })
    }
}
