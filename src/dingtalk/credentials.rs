//! Access-credential lifecycle: one DingTalk app credential per company,
//! persisted in Postgres with the current token mirrored into the cache.
//!
//! The store is the source of truth; the cache entry (`access_token:{company}`)
//! is an optimization with a TTL equal to the token's remaining validity.
//! Reads detect expiry and refresh synchronously with the calling request —
//! there is no background renewal loop, and concurrent refreshes for the same
//! company are not serialized (each produces a valid token; both store and
//! cache are last-writer-wins).

use chrono::{Duration, Utc};

use crate::cache::TieredCache;
use crate::dingtalk::client::DingTalkClient;
use crate::errors::AppError;
use crate::store::postgres::{CredentialRow, NewCredential, PgStore};

fn cache_key(company_id: i64) -> String {
    format!("access_token:{company_id}")
}

#[derive(Clone)]
pub struct CredentialService {
    db: PgStore,
    cache: TieredCache,
    client: DingTalkClient,
}

/// Fields accepted by `update`.
pub struct CredentialUpdate {
    pub app_key: String,
    pub app_secret: String,
    pub status: i16,
}

impl CredentialService {
    pub fn new(db: PgStore, cache: TieredCache, client: DingTalkClient) -> Self {
        Self { db, cache, client }
    }

    /// Read the company's active credential, transparently refreshing it when
    /// expired. Never returns an expired credential: on a stale row this
    /// either yields the refreshed result or the refresh failure.
    pub async fn get(&self, company_id: i64) -> Result<CredentialRow, AppError> {
        let credential = self
            .db
            .active_credential(company_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("no active credential configured for this company".into())
            })?;

        if Utc::now() > credential.expires_at {
            return self.refresh(company_id).await;
        }

        Ok(credential)
    }

    /// Fetch a fresh token upstream and write store then cache.
    /// A failed fetch leaves the stored row untouched.
    pub async fn refresh(&self, company_id: i64) -> Result<CredentialRow, AppError> {
        let mut credential = self
            .db
            .active_credential(company_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("no active credential configured for this company".into())
            })?;

        let fetched = self
            .client
            .fetch_token(&credential.app_key, &credential.app_secret)
            .await?;

        let now = Utc::now();
        credential.token = fetched.access_token;
        credential.expires_in = fetched.expires_in;
        credential.expires_at = now + Duration::seconds(fetched.expires_in);
        credential.refreshed_at = now;

        self.db.save_credential(&credential).await?;
        self.write_cache(&credential).await;

        tracing::info!(company_id, "access token refreshed");
        Ok(credential)
    }

    /// Register a credential for a company and perform the initial fetch.
    /// At most one live credential per company.
    pub async fn create(
        &self,
        company_id: i64,
        app_key: String,
        app_secret: String,
    ) -> Result<CredentialRow, AppError> {
        self.db
            .company(company_id)
            .await?
            .ok_or_else(|| AppError::NotFound("company not found".into()))?;

        if self.db.credential_exists(company_id).await? {
            return Err(AppError::AlreadyExists(
                "a credential is already configured for this company".into(),
            ));
        }

        let fetched = self.client.fetch_token(&app_key, &app_secret).await?;

        let now = Utc::now();
        let credential = self
            .db
            .insert_credential(&NewCredential {
                company_id,
                app_key,
                app_secret,
                token: fetched.access_token,
                expires_in: fetched.expires_in,
                expires_at: now + Duration::seconds(fetched.expires_in),
                refreshed_at: now,
            })
            .await?;

        self.write_cache(&credential).await;
        Ok(credential)
    }

    /// Update key/secret/status. Going (or staying) active re-fetches a fresh
    /// token unconditionally; going inactive evicts the cache and skips the
    /// upstream call.
    pub async fn update(&self, id: i64, update: CredentialUpdate) -> Result<CredentialRow, AppError> {
        let mut credential = self
            .db
            .credential_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("credential not found".into()))?;

        credential.app_key = update.app_key;
        credential.app_secret = update.app_secret;
        credential.status = update.status;

        if update.status == 1 {
            let fetched = self
                .client
                .fetch_token(&credential.app_key, &credential.app_secret)
                .await?;
            let now = Utc::now();
            credential.token = fetched.access_token;
            credential.expires_in = fetched.expires_in;
            credential.expires_at = now + Duration::seconds(fetched.expires_in);
            credential.refreshed_at = now;

            self.db.save_credential(&credential).await?;
            self.write_cache(&credential).await;
        } else {
            self.db.save_credential(&credential).await?;
            self.evict_cache(credential.company_id).await;
        }

        Ok(credential)
    }

    /// Evict the cache entry, then soft-delete the row. A reader between the
    /// two steps can still see a cache hit for the just-removed credential —
    /// an accepted narrow window (see DESIGN.md).
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        let credential = self
            .db
            .credential_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("credential not found".into()))?;

        self.evict_cache(credential.company_id).await;
        self.db.soft_delete_credential(id).await?;
        Ok(())
    }

    pub async fn list(
        &self,
        page: i64,
        page_size: i64,
    ) -> Result<(Vec<CredentialRow>, i64), AppError> {
        Ok(self.db.list_credentials(page, page_size).await?)
    }

    /// Probe the current token against the upstream user endpoint.
    pub async fn test(&self, company_id: i64) -> Result<(), AppError> {
        let credential = self.get(company_id).await?;
        self.client.probe(&credential.token).await
    }

    /// Cache-first token read for internal consumers that only need the
    /// opaque token string.
    pub async fn token(&self, company_id: i64) -> Result<String, AppError> {
        if let Some(token) = self.cache.get::<String>(&cache_key(company_id)).await {
            return Ok(token);
        }
        Ok(self.get(company_id).await?.token)
    }

    /// Cache writes are best-effort: the store already holds the truth.
    async fn write_cache(&self, credential: &CredentialRow) {
        let ttl = (credential.expires_at - Utc::now()).num_seconds().max(1) as u64;
        if let Err(e) = self
            .cache
            .set(&cache_key(credential.company_id), &credential.token, ttl)
            .await
        {
            tracing::warn!(
                company_id = credential.company_id,
                "failed to cache access token: {e}"
            );
        }
    }

    async fn evict_cache(&self, company_id: i64) {
        if let Err(e) = self.cache.del(&cache_key(company_id)).await {
            tracing::warn!(company_id, "failed to evict cached access token: {e}");
        }
    }
}
