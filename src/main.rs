use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use clap::Parser;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use backoffice::auth::jwt::TokenSigner;
use backoffice::auth::password::hash_password;
use backoffice::cache::TieredCache;
use backoffice::dingtalk::client::DingTalkClient;
use backoffice::store::postgres::{NewCompany, NewRole, NewUser, PgStore};
use backoffice::{api, cli, config, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "backoffice=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Admin { command }) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            handle_admin_command(&db, command).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Connecting to database...");
    let db = PgStore::connect(&cfg.database_url).await?;

    tracing::info!("Running migrations...");
    db.migrate().await?;

    tracing::info!("Connecting to Redis...");
    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client).await?;
    let cache = TieredCache::new(redis_conn);

    let dingtalk = DingTalkClient::new(cfg.dingtalk_base_url.clone());
    let signer = TokenSigner::new(&cfg.jwt_secret);
    let http = reqwest::Client::builder()
        .use_rustls_tls()
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(5))
        .build()?;

    let state = Arc::new(AppState {
        db,
        cache: cache.clone(),
        dingtalk,
        signer,
        http,
        config: cfg,
    });

    let app = axum::Router::new()
        // Health endpoint (no auth)
        .route("/health", axum::routing::get(health_check))
        .nest("/api/v1", api::api_router(&state))
        .with_state(state.clone())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.dashboard_origin))
        .layer(axum::middleware::from_fn(request_id_middleware))
        // Outermost recovery barrier: a panicking handler becomes a 500
        // envelope instead of tearing down the connection task.
        .layer(CatchPanicLayer::custom(handle_panic));

    jobs::cache_sweep::spawn(cache);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("backoffice listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "message": "backoffice is running"}))
}

fn cors_layer(dashboard_origin: &str) -> CorsLayer {
    use axum::http::{HeaderName, Method};
    use tower_http::cors::AllowOrigin;

    let origin = dashboard_origin.to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |value, _| {
            let value = value.to_str().unwrap_or("");
            value == origin
                || value.starts_with("http://localhost:")
                || value.starts_with("http://127.0.0.1:")
        }))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_credentials(true)
}

/// Middleware: injects a unique X-Request-Id into every response.
/// This allows clients to correlate errors with server logs.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = axum::http::HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("request handler panicked: {detail}");

    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "code": 500,
            "message": "internal server error",
            "data": null,
        })),
    )
        .into_response()
}

async fn handle_admin_command(db: &PgStore, cmd: cli::AdminCommands) -> anyhow::Result<()> {
    match cmd {
        cli::AdminCommands::Create {
            username,
            password,
            company_id,
        } => {
            let company = match db.company(company_id).await? {
                Some(company) => company,
                None => {
                    let company = db
                        .insert_company(&NewCompany {
                            parent_id: 0,
                            name: "Headquarters".into(),
                            code: "HQ".into(),
                            kind: 1,
                            status: 1,
                        })
                        .await?;
                    println!("Created default company (id {})", company.id);
                    company
                }
            };

            let role = match db.role_by_code("admin", None).await? {
                Some(role) => role,
                None => {
                    db.insert_role(&NewRole {
                        name: "Administrator".into(),
                        code: "admin".into(),
                        status: 1,
                    })
                    .await?
                }
            };

            if db.user_by_username(&username).await?.is_some() {
                anyhow::bail!("user '{}' already exists", username);
            }

            let hash = hash_password(&password).map_err(|e| anyhow::anyhow!("{e}"))?;
            let user = db
                .insert_user(&NewUser {
                    company_id: company.id,
                    username: username.clone(),
                    password: hash,
                    nickname: String::new(),
                    email: String::new(),
                    phone: String::new(),
                    status: 1,
                })
                .await?;
            db.assign_user_roles(user.id, &[role.id]).await?;

            println!(
                "Admin user created:\n  Username: {}\n  User ID:  {}\n  Role:     admin",
                username, user.id
            );
            Ok(())
        }
    }
}
