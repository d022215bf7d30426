//! LiftLog API server binary.

use clap::Parser;
use liftlog_api::AppState;
use liftlog_api::config::ApiConfig;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments. Unset flags fall back to `ApiConfig::from_env()`.
#[derive(Parser, Debug)]
#[command(name = "liftlog_api_server", about = "LiftLog workout tracking API", version)]
struct Args {
    /// Address to listen on, e.g. 0.0.0.0:8001.
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on; replaces the port of the bind address.
    #[arg(long)]
    port: Option<u16>,

    /// PostgreSQL connection URL.
    #[arg(long)]
    database_url: Option<String>,

    /// Maximum number of database connections in the pool.
    #[arg(long)]
    max_connections: Option<u32>,

    /// Serve from in-process stores instead of PostgreSQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

impl Args {
    fn apply(self, mut config: ApiConfig) -> ApiConfig {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(port) = self.port {
            let host = config
                .bind_addr
                .rsplit_once(':')
                .map_or(config.bind_addr.as_str(), |(host, _)| host);
            config.bind_addr = format!("{host}:{port}");
        }
        if let Some(url) = self.database_url {
            config.pg_connection_url = url;
        }
        if let Some(max) = self.max_connections {
            config.max_connections = max;
        }
        config
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,liftlog_api=debug,liftlog_core=debug".into()),
        )
        .init();

    let args = Args::parse();
    let in_memory = args.in_memory;
    let config = args.apply(ApiConfig::from_env());

    info!(
        version = liftlog_core::version(),
        bind_addr = %config.bind_addr,
        in_memory,
        "starting liftlog_api_server"
    );

    let state = if in_memory {
        warn!("using in-memory stores; nothing is persisted");
        AppState::in_memory(config.clone())
    } else {
        info!(max_connections = config.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(&config.pg_connection_url)
            .await?;

        info!("running database migrations");
        liftlog_api::migrate(&pool).await?;

        AppState::postgres(pool, config.clone())
    };

    let app = liftlog_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_environment_config() {
        let args = Args::parse_from([
            "liftlog_api_server",
            "--port",
            "9100",
            "--database-url",
            "postgres://db/liftlog",
            "--max-connections",
            "12",
        ]);
        let config = args.apply(ApiConfig::test_default());
        assert_eq!("127.0.0.1:9100", config.bind_addr);
        assert_eq!("postgres://db/liftlog", config.pg_connection_url);
        assert_eq!(12, config.max_connections);
    }

    #[test]
    fn bind_flag_replaces_address() {
        let args = Args::parse_from(["liftlog_api_server", "--bind", "0.0.0.0:8080"]);
        assert_eq!("0.0.0.0:8080", args.apply(ApiConfig::test_default()).bind_addr);
    }
}
