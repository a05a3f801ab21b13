/// In-process stores
///
/// Same contracts as the Postgres adapters, kept behind one async mutex per
/// store. Used by the unit tests, the integration tests and the `memory`
/// storage backend.

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{
    NewRefreshSession, NewUser, RefreshSession, RefreshSessionStore, ShortUrl, StoreError, User,
    UrlStore, UserId, UserStore,
};

#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserId, StoreError> {
        let mut users = self.users.lock().await;
        if users.iter().any(|u| u.login == user.login) {
            return Err(StoreError::UserExists);
        }

        let id = users.len() as UserId + 1;
        users.push(User {
            id,
            login: user.login,
            password_hash: user.password_hash,
        });
        Ok(id)
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User, StoreError> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.login == login)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        self.users
            .lock()
            .await
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::UserNotFound)
    }
}

#[derive(Default)]
struct SessionTable {
    next_id: i64,
    rows: Vec<RefreshSession>,
}

#[derive(Default)]
pub struct InMemoryRefreshSessionStore {
    table: Mutex<SessionTable>,
}

impl InMemoryRefreshSessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live rows for `user_id`, regardless of expiry.
    pub async fn count_for_user(&self, user_id: UserId) -> usize {
        self.table
            .lock()
            .await
            .rows
            .iter()
            .filter(|s| s.user_id == user_id)
            .count()
    }
}

#[async_trait]
impl RefreshSessionStore for InMemoryRefreshSessionStore {
    async fn create_refresh_session(&self, session: NewRefreshSession) -> Result<(), StoreError> {
        let mut table = self.table.lock().await;
        table.next_id += 1;
        let id = table.next_id;
        table.rows.push(RefreshSession {
            id,
            user_id: session.user_id,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
        });
        Ok(())
    }

    async fn delete_refresh_session(&self, token: &str) -> Result<(), StoreError> {
        self.take_refresh_session(token).await.map(|_| ())
    }

    async fn get_refresh_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        self.table
            .lock()
            .await
            .rows
            .iter()
            .find(|s| s.refresh_token == token)
            .cloned()
            .ok_or(StoreError::RefreshSessionNotFound)
    }

    async fn take_refresh_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        let mut table = self.table.lock().await;
        let position = table
            .rows
            .iter()
            .position(|s| s.refresh_token == token)
            .ok_or(StoreError::RefreshSessionNotFound)?;
        Ok(table.rows.remove(position))
    }

    async fn get_user_refresh_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RefreshSession>, StoreError> {
        let sessions: Vec<RefreshSession> = self
            .table
            .lock()
            .await
            .rows
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();

        if sessions.is_empty() {
            return Err(StoreError::RefreshSessionsNotFound);
        }
        Ok(sessions)
    }
}

struct UrlRow {
    alias: String,
    url: String,
    user_id: UserId,
}

#[derive(Default)]
pub struct InMemoryUrlStore {
    rows: Mutex<Vec<UrlRow>>,
}

impl InMemoryUrlStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UrlStore for InMemoryUrlStore {
    async fn save_url(&self, url: &str, alias: &str, user_id: UserId) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.alias == alias) {
            return Err(StoreError::UrlExists);
        }
        rows.push(UrlRow {
            alias: alias.to_string(),
            url: url.to_string(),
            user_id,
        });
        Ok(())
    }

    async fn get_url(&self, alias: &str) -> Result<String, StoreError> {
        self.rows
            .lock()
            .await
            .iter()
            .find(|r| r.alias == alias)
            .map(|r| r.url.clone())
            .ok_or(StoreError::UrlNotFound)
    }

    async fn delete_url(&self, alias: &str, user_id: UserId) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().await;
        let position = rows
            .iter()
            .position(|r| r.alias == alias && r.user_id == user_id)
            .ok_or(StoreError::UrlNotFound)?;
        rows.remove(position);
        Ok(())
    }

    async fn get_urls_by_user_id(&self, user_id: UserId) -> Result<Vec<ShortUrl>, StoreError> {
        let urls: Vec<ShortUrl> = self
            .rows
            .lock()
            .await
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| ShortUrl {
                alias: r.alias.clone(),
                url: r.url.clone(),
            })
            .collect();

        if urls.is_empty() {
            return Err(StoreError::UrlsNotFound);
        }
        Ok(urls)
    }
}
