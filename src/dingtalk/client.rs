//! HTTP client for the DingTalk open API token endpoint.
//!
//! Upstream contract: `GET {base}/gettoken?appkey=..&appsecret=..` returns
//! `{"errcode": int, "errmsg": string, "access_token": string, "expires_in": int}`
//! where `errcode == 0` signals success. A failed fetch is surfaced to the
//! caller as-is: no retries — duplicated refreshes are cheaper than masking a
//! misconfigured credential behind backoff.

use std::time::Duration;

use serde::Deserialize;

use crate::errors::AppError;

/// Token lifetime the upstream applies when it omits `expires_in`.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 7200;

#[derive(Clone)]
pub struct DingTalkClient {
    http: reqwest::Client,
    base_url: String,
}

/// Wire shape of the token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenEnvelope {
    #[serde(default)]
    pub errcode: i64,
    #[serde(default)]
    pub errmsg: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
}

/// A successfully parsed upstream token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedToken {
    pub access_token: String,
    pub expires_in: i64,
}

impl TokenEnvelope {
    /// Enforce the errcode contract and fill in the TTL default.
    pub fn into_token(self) -> Result<FetchedToken, AppError> {
        if self.errcode != 0 {
            let detail = if self.errmsg.is_empty() {
                format!("errcode {}", self.errcode)
            } else {
                self.errmsg
            };
            return Err(AppError::Upstream(format!("token fetch failed: {detail}")));
        }

        let access_token = self
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppError::Upstream("token fetch failed: response missing access_token".into())
            })?;

        Ok(FetchedToken {
            access_token,
            expires_in: self.expires_in.unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        })
    }
}

impl DingTalkClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// Fetch a fresh access token for the given app credentials.
    pub async fn fetch_token(
        &self,
        app_key: &str,
        app_secret: &str,
    ) -> Result<FetchedToken, AppError> {
        let resp = self
            .http
            .get(self.url("gettoken"))
            .query(&[("appkey", app_key), ("appsecret", app_secret)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("token endpoint unreachable: {e}")))?;

        let envelope: TokenEnvelope = resp
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("malformed token response: {e}")))?;

        envelope.into_token()
    }

    /// Probe whether a token is accepted by the upstream user endpoint.
    pub async fn probe(&self, access_token: &str) -> Result<(), AppError> {
        let resp = self
            .http
            .get(self.url("topapi/v2/user/get"))
            .query(&[("access_token", access_token)])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("token probe failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(AppError::Upstream(format!(
                "token rejected upstream, HTTP {}",
                resp.status().as_u16()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let envelope = TokenEnvelope {
            errcode: 0,
            errmsg: "ok".into(),
            access_token: Some("tok123".into()),
            expires_in: Some(3600),
        };
        let token = envelope.into_token().unwrap();
        assert_eq!(token.access_token, "tok123");
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn test_missing_expires_in_defaults_to_7200() {
        let envelope = TokenEnvelope {
            errcode: 0,
            errmsg: String::new(),
            access_token: Some("tok123".into()),
            expires_in: None,
        };
        assert_eq!(envelope.into_token().unwrap().expires_in, 7200);
    }

    #[test]
    fn test_nonzero_errcode_carries_errmsg() {
        let envelope = TokenEnvelope {
            errcode: 40089,
            errmsg: "invalid appkey or appsecret".into(),
            access_token: None,
            expires_in: None,
        };
        match envelope.into_token() {
            Err(AppError::Upstream(msg)) => assert!(msg.contains("invalid appkey or appsecret")),
            other => panic!("expected Upstream error, got {other:?}"),
        }
    }

    #[test]
    fn test_success_without_token_is_an_error() {
        let envelope = TokenEnvelope {
            errcode: 0,
            errmsg: String::new(),
            access_token: None,
            expires_in: Some(7200),
        };
        assert!(matches!(
            envelope.into_token(),
            Err(AppError::Upstream(_))
        ));
    }
}
