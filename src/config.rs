use serde::Deserialize;

/// Fallback signing secret, matching historical deployments that never set
/// `BACKOFFICE_JWT_SECRET`. Tokens signed with it verify everywhere the
/// default is in effect, which is why startup warns loudly about it.
pub const DEFAULT_JWT_SECRET: &str = "backoffice-secret-key";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// HS256 signing secret for session tokens.
    pub jwt_secret: String,
    /// Base URL of the DingTalk open API. Overridable for tests/staging.
    pub dingtalk_base_url: String,
    /// Allowed CORS origin for the admin UI.
    pub dashboard_origin: String,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let jwt_secret =
        std::env::var("BACKOFFICE_JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.into());

    if jwt_secret == DEFAULT_JWT_SECRET {
        let env_mode = std::env::var("BACKOFFICE_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "BACKOFFICE_JWT_SECRET is still the insecure default. \
                 Set a proper secret before running in production."
            );
        }
        eprintln!("⚠️  BACKOFFICE_JWT_SECRET is not set — using the insecure default. Set a real secret for production.");
    }

    Ok(Config {
        port: std::env::var("BACKOFFICE_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/backoffice".into()),
        redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        jwt_secret,
        dingtalk_base_url: std::env::var("DINGTALK_BASE_URL")
            .unwrap_or_else(|_| "https://oapi.dingtalk.com".into()),
        dashboard_origin: std::env::var("DASHBOARD_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".into()),
    })
}
