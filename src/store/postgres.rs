/// Postgres-backed stores
///
/// Thin adapters over a shared `PgPool`. Queries are runtime-checked; the
/// schema lives in `migrations/`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{
    NewRefreshSession, NewUser, RefreshSession, RefreshSessionStore, ShortUrl, StoreError, User,
    UrlStore, UserId, UserStore,
};

const UNIQUE_VIOLATION: &str = "23505";

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNIQUE_VIOLATION),
        _ => false,
    }
}

type SessionRow = (i64, i64, String, DateTime<Utc>);

fn session_from_row((id, user_id, refresh_token, expires_at): SessionRow) -> RefreshSession {
    RefreshSession {
        id,
        user_id,
        refresh_token,
        expires_at,
    }
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: NewUser) -> Result<UserId, StoreError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (login, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(&user.login)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::UserExists
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn get_user_by_login(&self, login: &str) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, login, password_hash FROM users WHERE login = $1",
        )
        .bind(login)
        .fetch_optional(&self.pool)
        .await?;

        let (id, login, password_hash) = row.ok_or(StoreError::UserNotFound)?;
        Ok(User {
            id,
            login,
            password_hash,
        })
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            "SELECT id, login, password_hash FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let (id, login, password_hash) = row.ok_or(StoreError::UserNotFound)?;
        Ok(User {
            id,
            login,
            password_hash,
        })
    }
}

pub struct PgRefreshSessionStore {
    pool: PgPool,
}

impl PgRefreshSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshSessionStore for PgRefreshSessionStore {
    async fn create_refresh_session(&self, session: NewRefreshSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_sessions (user_id, refresh_token, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(session.user_id)
        .bind(&session.refresh_token)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_refresh_session(&self, token: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM refresh_sessions WHERE refresh_token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::RefreshSessionNotFound);
        }

        Ok(())
    }

    async fn get_refresh_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token, expires_at
            FROM refresh_sessions
            WHERE refresh_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(session_from_row)
            .ok_or(StoreError::RefreshSessionNotFound)
    }

    async fn take_refresh_session(&self, token: &str) -> Result<RefreshSession, StoreError> {
        // A single DELETE .. RETURNING: only one concurrent caller gets the row.
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            DELETE FROM refresh_sessions
            WHERE refresh_token = $1
            RETURNING id, user_id, refresh_token, expires_at
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(session_from_row)
            .ok_or(StoreError::RefreshSessionNotFound)
    }

    async fn get_user_refresh_sessions(
        &self,
        user_id: UserId,
    ) -> Result<Vec<RefreshSession>, StoreError> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, user_id, refresh_token, expires_at
            FROM refresh_sessions
            WHERE user_id = $1
            ORDER BY expires_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(StoreError::RefreshSessionsNotFound);
        }

        Ok(rows.into_iter().map(session_from_row).collect())
    }
}

pub struct PgUrlStore {
    pool: PgPool,
}

impl PgUrlStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UrlStore for PgUrlStore {
    async fn save_url(&self, url: &str, alias: &str, user_id: UserId) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO urls (url, alias, user_id) VALUES ($1, $2, $3)")
            .bind(url)
            .bind(alias)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::UrlExists
                } else {
                    StoreError::Database(e)
                }
            })?;

        Ok(())
    }

    async fn get_url(&self, alias: &str) -> Result<String, StoreError> {
        sqlx::query_scalar::<_, String>("SELECT url FROM urls WHERE alias = $1")
            .bind(alias)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::UrlNotFound)
    }

    async fn delete_url(&self, alias: &str, user_id: UserId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM urls WHERE alias = $1 AND user_id = $2")
            .bind(alias)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::UrlNotFound);
        }

        Ok(())
    }

    async fn get_urls_by_user_id(&self, user_id: UserId) -> Result<Vec<ShortUrl>, StoreError> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT alias, url FROM urls WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Err(StoreError::UrlsNotFound);
        }

        Ok(rows
            .into_iter()
            .map(|(alias, url)| ShortUrl { alias, url })
            .collect())
    }
}
