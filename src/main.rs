//! pg-diag-gateway - run a fixed catalog of PostgreSQL diagnostic queries over HTTP.

use std::sync::Arc;
use std::time::Duration;

use pg_diag_gateway::catalog::QueryCatalog;
use pg_diag_gateway::cli::Cli;
use pg_diag_gateway::config::Config;
use pg_diag_gateway::db::{DatabaseClient, PostgresClient};
use pg_diag_gateway::error::{GatewayError, Result};
use pg_diag_gateway::gateway::{build_router, serve, shutdown_signal, AppState};
use pg_diag_gateway::logging;
use pg_diag_gateway::query::QueryExecutor;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env is normal; anything else is worth a warning once logging is up.
    let dotenv = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_logging(cli.log_file.as_deref());

    if let Err(e) = dotenv {
        if !e.not_found() {
            warn!("Ignoring unreadable .env file: {e}");
        }
    }

    if let Err(e) = run(cli).await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;

    let catalog = match &config.queries.dir {
        Some(dir) => {
            info!("Loading queries from: {}", dir.display());
            QueryCatalog::load_from_dir(dir)?
        }
        None => QueryCatalog::builtin(),
    };
    info!("Loaded {} diagnostic queries", catalog.len());

    info!("Connecting to {}", config.database.display_string());
    let db = Arc::new(
        PostgresClient::connect(&config.database, config.statement_timeout_ms()).await?,
    );

    let executor = QueryExecutor::new(
        db.clone(),
        Arc::new(catalog),
        Duration::from_millis(config.queries.timeout_ms),
    );
    let router = build_router(AppState::new(executor));

    let address = config.server.address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| GatewayError::config(format!("Failed to bind {address}: {e}")))?;
    info!(
        "Server running on {} (query timeout {}ms)",
        address, config.queries.timeout_ms
    );

    let served = serve(listener, router, shutdown_signal()).await;
    db.close().await?;
    served
}

/// Resolves configuration with precedence:
/// 1. CLI arguments (highest)
/// 2. Environment variables
/// 3. Config file
/// 4. Built-in defaults
fn resolve_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides()?;
    cli.apply_overrides(&mut config)?;
    config.validate()?;

    Ok(config)
}
