/// Auth Service
///
/// The four user-facing operations: sign up, sign in, refresh and logout.
/// Credential checks happen here; every session transition is delegated to
/// the `SessionManager`.

use std::sync::Arc;

use tokio::task::JoinError;

use crate::auth::password::{HashError, PasswordHasher};
use crate::auth::session::{SessionError, SessionManager, Tokens};
use crate::store::{NewUser, StoreError, UserId, UserStore};

#[derive(Debug, Clone)]
pub struct SignUpInput {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct SignInInput {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    LoggedOut,
    /// The token matched no session: it was already used, revoked or evicted.
    AlreadyLoggedOut,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("user exists")]
    UserExists,
    #[error("wrong credentials")]
    WrongCredentials,
    #[error("invalid or expired session")]
    InvalidSession,
    #[error("missing access token")]
    MissingToken,
    #[error("invalid access token")]
    InvalidToken,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(SessionError),
    #[error(transparent)]
    Hash(#[from] HashError),
    #[error("blocking task failed: {0}")]
    Blocking(#[from] JoinError),
}

impl From<SessionError> for AuthError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound | SessionError::TokenExpired => AuthError::InvalidSession,
            other => AuthError::Session(other),
        }
    }
}

pub struct AuthService {
    users: Arc<dyn UserStore>,
    sessions: SessionManager,
    hasher: Arc<dyn PasswordHasher>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        sessions: SessionManager,
        hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            users,
            sessions,
            hasher,
        }
    }

    pub async fn sign_up(&self, input: SignUpInput) -> Result<UserId, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = input.password;
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&password)).await??;

        let user_id = self
            .users
            .create_user(NewUser {
                login: input.login.clone(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::UserExists => {
                    tracing::warn!(login = %input.login, "Sign up with a taken login");
                    AuthError::UserExists
                }
                other => AuthError::Store(other),
            })?;

        tracing::info!(user_id, login = %input.login, "User signed up");
        Ok(user_id)
    }

    /// An unknown login and a wrong password produce the same error. The
    /// unknown-login path still pays for one bcrypt round so both take
    /// comparable time.
    pub async fn sign_in(&self, input: SignInInput) -> Result<Tokens, AuthError> {
        let user = match self.users.get_user_by_login(&input.login).await {
            Ok(user) => Some(user),
            Err(StoreError::UserNotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let hasher = Arc::clone(&self.hasher);
        let password = input.password;
        let password_hash = user.as_ref().map(|u| u.password_hash.clone());
        let verified = tokio::task::spawn_blocking(move || match password_hash {
            Some(hash) => hasher.check_password(&password, &hash),
            None => {
                let _ = hasher.hash(&password);
                false
            }
        })
        .await?;

        let user = match (user, verified) {
            (Some(user), true) => user,
            _ => {
                tracing::warn!(login = %input.login, "Rejected sign in");
                return Err(AuthError::WrongCredentials);
            }
        };

        self.remove_excess_sessions(user.id).await?;
        let tokens = self.sessions.create_refresh_session(user.id).await?;

        tracing::info!(user_id = user.id, login = %user.login, "User signed in");
        Ok(tokens)
    }

    /// Evicts the earliest-expiring session once the user is at the cap.
    ///
    /// The fetch, evict and create steps are not serialized per user, so
    /// concurrent sign-ins can briefly leave more than `max_sessions` rows.
    /// A row that disappears between fetch and delete counts as evicted.
    async fn remove_excess_sessions(&self, user_id: UserId) -> Result<(), AuthError> {
        let sessions = self.sessions.get_all_user_refresh_sessions(user_id).await?;
        if sessions.is_empty() || sessions.len() < self.sessions.max_sessions() {
            return Ok(());
        }

        match self.sessions.delete_earliest_refresh_session(&sessions).await {
            Ok(()) | Err(SessionError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn logout(&self, refresh_token: &str) -> Result<LogoutOutcome, AuthError> {
        match self.sessions.delete_refresh_session(refresh_token).await {
            Ok(()) => {
                tracing::info!("Refresh session revoked");
                Ok(LogoutOutcome::LoggedOut)
            }
            Err(SessionError::NotFound) => {
                tracing::info!("Logout with an unknown refresh token");
                Ok(LogoutOutcome::AlreadyLoggedOut)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Consumes `refresh_token` and issues a brand-new pair for its owner.
    ///
    /// A session whose account no longer exists is rejected like an unknown
    /// token; it has already been consumed at that point.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens, AuthError> {
        let user_id = self
            .sessions
            .validate_refresh_session(refresh_token)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Rejected refresh token");
                AuthError::from(e)
            })?;

        let user = match self.users.get_user_by_id(user_id).await {
            Ok(user) => user,
            Err(StoreError::UserNotFound) => {
                tracing::warn!(user_id, "Refresh session of a missing user");
                return Err(AuthError::InvalidSession);
            }
            Err(e) => return Err(e.into()),
        };

        let tokens = self.sessions.create_refresh_session(user.id).await?;
        tracing::info!(user_id = user.id, login = %user.login, "Tokens refreshed");
        Ok(tokens)
    }
}
