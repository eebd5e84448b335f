use clap::{Parser, Subcommand};

use paydesk_core::config::Config;
use paydesk_core::domain::ports::TransactionStore;
use paydesk_core::domain::status::TrxStatus;
use paydesk_core::domain::transaction::TrxUpdate;
use paydesk_core::stores::postgres::PostgresTransactionStore;

#[derive(Parser)]
#[command(name = "paydesk-core")]
#[command(about = "Paydesk Core - Payout Back-Office Service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Transaction management commands
    #[command(subcommand)]
    Tx(TxCommands),

    /// Database management commands
    #[command(subcommand)]
    Db(DbCommands),

    /// Configuration validation
    Config,
}

#[derive(Subcommand)]
pub enum TxCommands {
    /// Expire a pending payout the channel never answered
    Expire {
        #[arg(value_name = "TRX_ID")]
        trx_id: String,
    },

    /// Cancel a pending payout
    Cancel {
        #[arg(value_name = "TRX_ID")]
        trx_id: String,
    },
}

#[derive(Subcommand)]
pub enum DbCommands {
    /// Run database migrations
    Migrate,
}

pub async fn handle_tx_command(
    store: &PostgresTransactionStore,
    command: TxCommands,
) -> anyhow::Result<()> {
    let (trx_id, target) = match command {
        TxCommands::Expire { trx_id } => (trx_id, TrxStatus::Expired),
        TxCommands::Cancel { trx_id } => (trx_id, TrxStatus::Cancelled),
    };

    let updated = store
        .transition(&trx_id, TrxStatus::Pending, target, TrxUpdate::default())
        .await?;
    println!("transaction {} is now {}", updated.trx_id, updated.status);
    Ok(())
}

pub async fn handle_config_check(config: &Config) -> anyhow::Result<()> {
    config.validate()?;

    match sqlx::postgres::PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            sqlx::query("SELECT 1").execute(&pool).await?;
            println!("database: ok");
        }
        Err(err) => {
            println!("database: unreachable ({})", err);
            anyhow::bail!("configuration check failed");
        }
    }

    println!("configuration: ok");
    Ok(())
}
