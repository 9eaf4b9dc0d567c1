// src/main.rs - itemvault HTTP server
use clap::Parser;
use itemvault::auth::TokenService;
use itemvault::config::{self, Config};
use itemvault::store::RecordStore;
use itemvault::web::api::{AppStateInner, create_router_with_state};
use itemvault::web::cors::AllowedOrigins;
use itemvault::web::rate_limiter::RateLimiter;
use itemvault::{BcryptHasher, CredentialHasher};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "itemvault-server", version, about = "Multi-user item registry with token auth")]
struct Cli {
    /// Path to a TOML configuration file. Defaults plus environment are used without it.
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Starting itemvault {}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let mut config = match cli.config.as_deref() {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path);
            config::load_config(path).map_err(|e| {
                tracing::error!("Failed to load config from '{}': {}", path, e);
                Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
            })?
        }
        None => Config::default(),
    };
    config.apply_env_overrides();

    if config.auth.uses_default_secret() {
        tracing::warn!("Using the built-in JWT secret; set ITEMVAULT_JWT_SECRET outside development");
    }

    let hasher: Arc<dyn CredentialHasher> = Arc::new(BcryptHasher::new(config.auth.bcrypt_cost));
    let store = Arc::new(RecordStore::new(hasher));

    let (admin, created) = store
        .ensure_admin_user(&config.admin.username, &config.admin.password)
        .await
        .map_err(|e| {
            tracing::error!("Failed to ensure admin user: {}", e);
            Box::new(e) as Box<dyn std::error::Error + Send + Sync + 'static>
        })?;
    if created {
        tracing::info!("Created default admin user '{}'", admin.username);
    } else {
        tracing::info!("Admin user '{}' already exists", admin.username);
    }

    if config.seed.welcome_item {
        if let Err(e) = store
            .create_item(
                &admin.username,
                "Welcome Item",
                "You can edit or delete this item once you are logged in.",
            )
            .await
        {
            tracing::warn!("Failed to seed welcome item: {}", e);
        }
    }

    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.jwt_issuer.clone(),
        config.auth.token_expiry(),
    ));
    tracing::info!(
        "Tokens issued by '{}' expire after {}s",
        tokens.issuer(),
        tokens.expiry().as_secs()
    );

    let rate_limiter = RateLimiter::new(config.login_limit.max_attempts, config.login_limit.window());
    let sweeper = rate_limiter.clone();
    let sweep_every = config
        .login_limit
        .window()
        .clamp(Duration::from_secs(1), Duration::from_secs(3600));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            sweeper.cleanup().await;
        }
    });

    let origins = AllowedOrigins::from_config(&config.server.allowed_origins, config.server.listen_port());
    match &origins {
        AllowedOrigins::Any => tracing::warn!("CORS allows every origin"),
        AllowedOrigins::List(list) => tracing::info!("CORS allows {} origin(s)", list.len()),
    }

    let state = AppStateInner::new(store, tokens, rate_limiter);
    let app = create_router_with_state(state, &origins);

    let listener = tokio::net::TcpListener::bind(&config.server.listen).await?;
    tracing::info!("Web API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
