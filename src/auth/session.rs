/// Refresh Session Management
///
/// Owns every lifecycle transition of a refresh session: creation, eviction,
/// validation (which always consumes the session) and revocation. Tokens are
/// handed to the client in plaintext; the store only sees their digests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::auth::jwt::{TokenError, TokenManager};
use crate::auth::refresh_token::hash_token;
use crate::configuration::{JwtSettings, SessionSettings};
use crate::store::{NewRefreshSession, RefreshSession, RefreshSessionStore, StoreError, UserId};

/// Token pair returned to the caller. `expires_at` is the refresh session's
/// absolute expiry.
#[derive(Debug, Clone)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("refresh session not found")]
    NotFound,
    #[error("token expired")]
    TokenExpired,
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for SessionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::RefreshSessionNotFound => SessionError::NotFound,
            other => SessionError::Store(other),
        }
    }
}

pub struct SessionManager {
    store: Arc<dyn RefreshSessionStore>,
    tokens: Arc<dyn TokenManager>,
    access_ttl: Duration,
    refresh_ttl: Duration,
    max_sessions: usize,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn RefreshSessionStore>,
        tokens: Arc<dyn TokenManager>,
        jwt: &JwtSettings,
        session: &SessionSettings,
    ) -> Self {
        Self {
            store,
            tokens,
            access_ttl: jwt.access_token_ttl(),
            refresh_ttl: jwt.refresh_token_ttl(),
            max_sessions: session.max_sessions,
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Mints a token pair and persists the matching refresh session.
    ///
    /// If the insert fails the freshly minted tokens are dropped and the store
    /// error is returned; they were never handed out.
    pub async fn create_refresh_session(&self, user_id: UserId) -> Result<Tokens, SessionError> {
        let pair = self
            .tokens
            .create_tokens_pair(&user_id.to_string(), self.access_ttl)?;
        let expires_at = Utc::now() + self.refresh_ttl;

        self.store
            .create_refresh_session(NewRefreshSession {
                user_id,
                refresh_token: hash_token(&pair.refresh_token),
                expires_at,
            })
            .await
            .map_err(|e| {
                tracing::error!(user_id, error = %e, "Failed to persist refresh session");
                SessionError::Store(e)
            })?;

        tracing::debug!(user_id, "Refresh session created");

        Ok(Tokens {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_at,
        })
    }

    /// All sessions of a user; an empty list when there are none.
    pub async fn get_all_user_refresh_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RefreshSession>, SessionError> {
        match self.store.get_user_refresh_sessions(user_id).await {
            Ok(sessions) => Ok(sessions),
            Err(StoreError::RefreshSessionsNotFound) => Ok(Vec::new()),
            Err(e) => Err(SessionError::Store(e)),
        }
    }

    /// Deletes the session with the earliest expiry.
    ///
    /// # Panics
    /// If `sessions` is empty. Callers check the length first.
    pub async fn delete_earliest_refresh_session(
        &self,
        sessions: &[RefreshSession],
    ) -> Result<(), SessionError> {
        let earliest = sessions
            .iter()
            .min_by_key(|s| s.expires_at)
            .expect("delete_earliest_refresh_session called with no sessions");

        self.store
            .delete_refresh_session(&earliest.refresh_token)
            .await?;

        tracing::info!(
            user_id = earliest.user_id,
            session_id = earliest.id,
            "Evicted earliest refresh session"
        );
        Ok(())
    }

    /// Revokes the session behind `refresh_token`. An unknown token is
    /// reported as `SessionError::NotFound`.
    pub async fn delete_refresh_session(&self, refresh_token: &str) -> Result<(), SessionError> {
        self.store
            .delete_refresh_session(&hash_token(refresh_token))
            .await?;
        Ok(())
    }

    /// Consumes the session and returns its owner.
    ///
    /// The row is removed before the expiry check, so a token can be presented
    /// successfully at most once and an expired token is gone as well.
    pub async fn validate_refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<UserId, SessionError> {
        let session = self
            .store
            .take_refresh_session(&hash_token(refresh_token))
            .await?;

        if session.expires_at <= Utc::now() {
            tracing::info!(user_id = session.user_id, "Refresh token expired");
            return Err(SessionError::TokenExpired);
        }

        Ok(session.user_id)
    }
}
