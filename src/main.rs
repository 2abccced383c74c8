//! Verify AML/KYC server
//!
//! ```sh
//! # Run with default config (~/.config/verify-aml/config.toml)
//! JWT_SECRET=... verify-server
//!
//! # Custom config path and port
//! verify-server --config /etc/verify-aml/config.toml --port 8080
//!
//! # Validate config without starting
//! verify-server --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};

use verify_aml::application::{CredentialManager, UserService};
use verify_aml::domain::UserRepository;
use verify_aml::infrastructure::database::migrator::Migrator;
use verify_aml::infrastructure::{InMemoryUserRepository, SeaOrmUserRepository};
use verify_aml::shared::ShutdownCoordinator;
use verify_aml::{create_api_router, default_config_path, init_database, AppConfig, AppState};

/// Verify AML/KYC account and authentication server.
#[derive(Parser, Debug)]
#[command(name = "verify-server", version, about = "AML/KYC account and authentication API")]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "VERIFY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration and exit without starting the server.
    #[arg(long)]
    check: bool,
}

fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(default_config_path);
    let loaded = AppConfig::load_or_default(&config_path);
    let load_failed = loaded.as_ref().err().map(|e| e.to_string());
    let mut config = loaded.unwrap_or_default();

    config.apply_env()?;

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    init_tracing(&config);

    match load_failed {
        Some(e) => error!("Failed to load config from {}: {}. Using defaults.", config_path.display(), e),
        None => info!("Configuration loaded from {}", config_path.display()),
    }

    if std::env::var_os("MONGODB_URI").is_some() {
        warn!("MONGODB_URI is set but not supported; set DATABASE_URL for SQLite storage");
    }

    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   Listen      : {}", config.listen_address());
        println!(
            "   Storage     : {}",
            config.database.url.as_deref().unwrap_or("in-memory")
        );
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    info!("Starting Verify AML/KYC...");

    // ── Storage ────────────────────────────────────────────────
    let (repo, db, storage): (Arc<dyn UserRepository>, Option<DatabaseConnection>, &'static str) =
        match config.database_config() {
            Some(db_config) => {
                let db = match init_database(&db_config).await {
                    Ok(db) => db,
                    Err(e) => {
                        error!("Failed to connect to database: {}", e);
                        return Err(e.into());
                    }
                };

                info!("Running database migrations...");
                if let Err(e) = Migrator::up(&db, None).await {
                    error!("Failed to run migrations: {}", e);
                    return Err(e.into());
                }
                info!("Migrations completed");

                (
                    Arc::new(SeaOrmUserRepository::new(db.clone())),
                    Some(db),
                    "sqlite",
                )
            }
            None => {
                warn!("DATABASE_URL not set; accounts are kept in memory and lost on restart");
                (Arc::new(InMemoryUserRepository::new()), None, "memory")
            }
        };

    // ── Services ───────────────────────────────────────────────
    let credentials = Arc::new(
        CredentialManager::new(config.jwt_config()).with_password_cost(config.security.password_cost),
    );
    info!(
        "JWT configured with {}s token expiration",
        config.security.jwt_expire_secs
    );
    let users = Arc::new(UserService::new(repo, credentials));

    if let (Some(email), Some(password)) = (&config.admin.email, &config.admin.password) {
        match users
            .ensure_bootstrap_admin(
                &config.admin.first_name,
                &config.admin.last_name,
                email,
                password.as_str().into(),
            )
            .await
        {
            Ok(Some(admin)) => {
                info!("Default admin created: {}", admin.email);
                info!("⚠️  Please change the admin password immediately!");
            }
            Ok(None) => {}
            Err(e) => error!("Failed to create admin user: {}", e),
        }
    }

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
    let shutdown_signal = shutdown.signal();
    shutdown.start_signal_listener();

    // ── HTTP server ────────────────────────────────────────────
    let router = create_api_router(AppState::new(users, storage));
    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    info!("OpenAPI document at http://{}/api-docs/openapi.json", addr);

    let server_shutdown = shutdown_signal.clone();
    let result = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            server_shutdown.wait().await;
            info!("🛑 HTTP server received shutdown signal");
        })
        .await;

    if let Err(e) = &result {
        error!("HTTP server error: {}", e);
    }

    shutdown
        .cleanup_within_timeout(|| async move {
            if let Some(db) = db {
                match db.close().await {
                    Ok(()) => info!("✅ Database connection closed"),
                    Err(e) => warn!("Error closing database connection: {}", e),
                }
            }
        })
        .await;

    info!("👋 Verify AML/KYC shutdown complete");
    result.map_err(Into::into)
}
