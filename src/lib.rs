//! Backoffice — multi-tenant admin backend.
//!
//! Library crate: module tree plus the shared `AppState`. The binary in
//! `main.rs` handles startup; integration tests in `tests/` use this crate
//! directly.

pub mod api;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod config;
pub mod dingtalk;
pub mod errors;
pub mod jobs;
pub mod store;

use auth::jwt::TokenSigner;
use cache::TieredCache;
use dingtalk::client::DingTalkClient;
use dingtalk::credentials::CredentialService;
use store::postgres::PgStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub db: PgStore,
    pub cache: TieredCache,
    pub dingtalk: DingTalkClient,
    pub signer: TokenSigner,
    /// Client for the API test runner (30 s timeout, no retries).
    pub http: reqwest::Client,
    pub config: config::Config,
}

impl AppState {
    pub fn credentials(&self) -> CredentialService {
        CredentialService::new(self.db.clone(), self.cache.clone(), self.dingtalk.clone())
    }
}
