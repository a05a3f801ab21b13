/// Persistence collaborators
///
/// The stores are plain persistence: no business rules live here. Every
/// "absent" outcome is reported as its own `StoreError` variant so callers can
/// tell it apart from a failing database.

#[cfg(test)]
mod failing;
mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use memory::{InMemoryRefreshSessionStore, InMemoryUrlStore, InMemoryUserStore};
pub use postgres::{PgRefreshSessionStore, PgUrlStore, PgUserStore};

#[cfg(test)]
pub(crate) use failing::{FailingRefreshSessionStore, FailingUserStore};

pub type UserId = i64;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user exists")]
    UserExists,
    #[error("user not found")]
    UserNotFound,
    #[error("refresh session not found")]
    RefreshSessionNotFound,
    #[error("refresh sessions not found")]
    RefreshSessionsNotFound,
    #[error("url exists")]
    UrlExists,
    #[error("url not found")]
    UrlNotFound,
    #[error("urls not found")]
    UrlsNotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A registered account. `password_hash` is never the plaintext.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub password_hash: String,
}

/// Fields required to insert a user; the id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password_hash: String,
}

/// A single-use refresh grant. `refresh_token` holds the token digest as
/// persisted, not the value handed to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub id: i64,
    pub user_id: UserId,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRefreshSession {
    pub user_id: UserId,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortUrl {
    pub alias: String,
    pub url: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `UserExists` when the login is already taken.
    async fn create_user(&self, user: NewUser) -> Result<UserId, StoreError>;
    async fn get_user_by_login(&self, login: &str) -> Result<User, StoreError>;
    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError>;
}

#[async_trait]
pub trait RefreshSessionStore: Send + Sync {
    async fn create_refresh_session(&self, session: NewRefreshSession) -> Result<(), StoreError>;
    /// Fails with `RefreshSessionNotFound` when no row carries `token`.
    async fn delete_refresh_session(&self, token: &str) -> Result<(), StoreError>;
    async fn get_refresh_session(&self, token: &str) -> Result<RefreshSession, StoreError>;
    /// Looks the session up and deletes it in one atomic step.
    ///
    /// Two concurrent calls with the same token never both return `Ok`.
    async fn take_refresh_session(&self, token: &str) -> Result<RefreshSession, StoreError>;
    /// Fails with `RefreshSessionsNotFound` when the user holds no session.
    async fn get_user_refresh_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RefreshSession>, StoreError>;
}

#[async_trait]
pub trait UrlStore: Send + Sync {
    /// Fails with `UrlExists` when the alias is taken.
    async fn save_url(&self, url: &str, alias: &str, user_id: UserId) -> Result<(), StoreError>;
    async fn get_url(&self, alias: &str) -> Result<String, StoreError>;
    /// Deletes only if `user_id` owns the alias, otherwise `UrlNotFound`.
    async fn delete_url(&self, alias: &str, user_id: UserId) -> Result<(), StoreError>;
    /// Fails with `UrlsNotFound` when the user owns no alias.
    async fn get_urls_by_user_id(&self, user_id: UserId) -> Result<Vec<ShortUrl>, StoreError>;
}
