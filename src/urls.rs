/// URL alias service
///
/// Saves, resolves, lists and deletes short aliases. Ownership is enforced by
/// the store: a user can only delete aliases they created.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::store::{StoreError, UrlStore, UserId};

const ALIAS_LENGTH: usize = 6;
const GENERATED_ALIAS_ATTEMPTS: usize = 3;

#[derive(Debug, thiserror::Error)]
pub enum UrlError {
    #[error("alias already exists")]
    AliasExists,
    #[error("url not found")]
    UrlNotFound,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for UrlError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UrlExists => UrlError::AliasExists,
            StoreError::UrlNotFound => UrlError::UrlNotFound,
            other => UrlError::Store(other),
        }
    }
}

pub fn random_alias() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ALIAS_LENGTH)
        .map(char::from)
        .collect()
}

pub struct UrlService {
    store: Arc<dyn UrlStore>,
}

impl UrlService {
    pub fn new(store: Arc<dyn UrlStore>) -> Self {
        Self { store }
    }

    /// Stores `url` under `alias`, or under a random 6-character alias when
    /// none is given. A taken custom alias is an error; a colliding generated
    /// one is retried a few times.
    pub async fn save_url(
        &self,
        url: &str,
        alias: Option<&str>,
        user_id: UserId,
    ) -> Result<String, UrlError> {
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            self.store.save_url(url, alias, user_id).await?;
            tracing::info!(user_id, alias, "Url saved");
            return Ok(alias.to_string());
        }

        let mut attempts = 0;
        loop {
            attempts += 1;
            let alias = random_alias();
            match self.store.save_url(url, &alias, user_id).await {
                Ok(()) => {
                    tracing::info!(user_id, alias = %alias, "Url saved with generated alias");
                    return Ok(alias);
                }
                Err(StoreError::UrlExists) if attempts < GENERATED_ALIAS_ATTEMPTS => {
                    tracing::debug!(alias = %alias, "Generated alias collided, retrying");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn get_url(&self, alias: &str) -> Result<String, UrlError> {
        Ok(self.store.get_url(alias).await?)
    }

    pub async fn delete_url(&self, alias: &str, user_id: UserId) -> Result<(), UrlError> {
        self.store.delete_url(alias, user_id).await?;
        tracing::info!(user_id, alias, "Url deleted");
        Ok(())
    }

    /// alias -> url for every alias the user owns; empty when there are none.
    pub async fn get_all_user_urls(
        &self,
        user_id: UserId,
    ) -> Result<BTreeMap<String, String>, UrlError> {
        match self.store.get_urls_by_user_id(user_id).await {
            Ok(urls) => Ok(urls.into_iter().map(|u| (u.alias, u.url)).collect()),
            Err(StoreError::UrlsNotFound) => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}
