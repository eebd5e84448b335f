mod cli;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use paydesk_core::config::Config;
use paydesk_core::stores::postgres::PostgresTransactionStore;
use paydesk_core::{create_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = cli::Cli::parse();
    let config = Config::from_env()?;

    match args.command.unwrap_or(cli::Commands::Serve) {
        cli::Commands::Serve => serve(config).await,
        cli::Commands::Db(cli::DbCommands::Migrate) => {
            let pool = connect(&config).await?;
            run_migrations(&pool).await
        }
        cli::Commands::Tx(command) => {
            let pool = connect(&config).await?;
            let store = PostgresTransactionStore::new(pool);
            cli::handle_tx_command(&store, command).await
        }
        cli::Commands::Config => cli::handle_config_check(&config).await,
    }
}

async fn connect(config: &Config) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    let migrator = Migrator::new(Path::new("./migrations")).await?;
    migrator.run(pool).await?;
    tracing::info!("Database migrations completed");
    Ok(())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let pool = connect(&config).await?;
    run_migrations(&pool).await?;

    let store = Arc::new(PostgresTransactionStore::new(pool));
    let state = AppState::new(store, config.channel_webhook_secret.clone());
    let app = create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
