//! Stores whose backend is down. Used to drive the internal-error paths.

use async_trait::async_trait;

use super::{
    NewRefreshSession, NewUser, RefreshSession, RefreshSessionStore, StoreError, User, UserId,
    UserStore,
};

fn unavailable() -> StoreError {
    StoreError::Database(sqlx::Error::PoolTimedOut)
}

pub struct FailingUserStore;

#[async_trait]
impl UserStore for FailingUserStore {
    async fn create_user(&self, _user: NewUser) -> Result<UserId, StoreError> {
        Err(unavailable())
    }

    async fn get_user_by_login(&self, _login: &str) -> Result<User, StoreError> {
        Err(unavailable())
    }

    async fn get_user_by_id(&self, _id: UserId) -> Result<User, StoreError> {
        Err(unavailable())
    }
}

/// Reads report "no sessions" so callers reach the write, which fails.
pub struct FailingRefreshSessionStore;

#[async_trait]
impl RefreshSessionStore for FailingRefreshSessionStore {
    async fn create_refresh_session(&self, _session: NewRefreshSession) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn delete_refresh_session(&self, _token: &str) -> Result<(), StoreError> {
        Err(unavailable())
    }

    async fn get_refresh_session(&self, _token: &str) -> Result<RefreshSession, StoreError> {
        Err(unavailable())
    }

    async fn take_refresh_session(&self, _token: &str) -> Result<RefreshSession, StoreError> {
        Err(unavailable())
    }

    async fn get_user_refresh_sessions(
        &self,
        _user_id: UserId,
    ) -> Result<Vec<RefreshSession>, StoreError> {
        Err(StoreError::RefreshSessionsNotFound)
    }
}
