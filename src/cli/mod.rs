use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::WalletService;
use crate::domain::{Amount, OperationType, WalletId};
use crate::http;
use crate::storage::Repository;

/// Wallet ledger - wallets, balances and deposit/withdraw operations
#[derive(Parser)]
#[command(name = "wallet-ledger")]
#[command(about = "A minimal wallet ledger service backed by SQLite")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "WALLET_DATABASE", default_value = "wallet.db", global = true)]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "WALLET_LISTEN", default_value = "0.0.0.0:8080")]
        listen: String,

        /// Per-request timeout in seconds
        #[arg(long, env = "WALLET_REQUEST_TIMEOUT", default_value = "30")]
        request_timeout: u64,
    },

    /// Wallet management commands
    #[command(subcommand)]
    Wallet(WalletCommands),
}

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new empty wallet
    Create,

    /// List all wallets
    List,

    /// Show a wallet's balance
    Balance {
        /// Wallet ID
        id: String,
    },

    /// Deposit into a wallet
    Deposit {
        /// Wallet ID
        id: String,

        /// Amount in whole units
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },

    /// Withdraw from a wallet
    Withdraw {
        /// Wallet ID
        id: String,

        /// Amount in whole units
        #[arg(allow_negative_numbers = true)]
        amount: Amount,
    },

    /// Delete a wallet and its operation history
    Delete {
        /// Wallet ID
        id: String,
    },

    /// Show the operations applied to a wallet
    History {
        /// Wallet ID
        id: String,
    },
}

/// Install the global tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        init_tracing(self.verbose);

        match self.command {
            Commands::Init => {
                WalletService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Serve {
                listen,
                request_timeout,
            } => {
                let service = WalletService::init(&self.database).await?;
                http::serve(service, &listen, Duration::from_secs(request_timeout)).await?;
            }

            Commands::Wallet(wallet_cmd) => {
                let service = WalletService::connect(&self.database).await?;
                run_wallet_command(&service, wallet_cmd).await?;
            }
        }

        Ok(())
    }
}

fn parse_wallet_id(id: &str) -> Result<WalletId> {
    Uuid::parse_str(id).with_context(|| format!("Invalid wallet ID '{}'", id))
}

async fn run_wallet_command(
    service: &WalletService<Repository>,
    cmd: WalletCommands,
) -> Result<()> {
    match cmd {
        WalletCommands::Create => {
            let wallet = service.create_wallet().await?;
            println!("{}", wallet.id);
        }

        WalletCommands::List => {
            let wallets = service.list_wallets().await?;
            if wallets.is_empty() {
                println!("No wallets found.");
            } else {
                println!("{:<38} {:>12}  {}", "ID", "BALANCE", "CREATED");
                println!("{}", "-".repeat(72));
                for wallet in wallets {
                    println!(
                        "{:<38} {:>12}  {}",
                        wallet.id.to_string(),
                        wallet.balance,
                        wallet.created_at.format("%Y-%m-%d %H:%M:%S")
                    );
                }
            }
        }

        WalletCommands::Balance { id } => {
            let balance = service.get_balance(parse_wallet_id(&id)?).await?;
            println!("{}", balance);
        }

        WalletCommands::Deposit { id, amount } => {
            let balance = service
                .apply_operation(parse_wallet_id(&id)?, OperationType::Deposit.as_str(), amount)
                .await?;
            println!("{}", balance);
        }

        WalletCommands::Withdraw { id, amount } => {
            let balance = service
                .apply_operation(parse_wallet_id(&id)?, OperationType::Withdraw.as_str(), amount)
                .await?;
            println!("{}", balance);
        }

        WalletCommands::Delete { id } => {
            service.delete_wallet(parse_wallet_id(&id)?).await?;
            println!("Deleted wallet: {}", id);
        }

        WalletCommands::History { id } => {
            let operations = service.operation_history(parse_wallet_id(&id)?).await?;
            if operations.is_empty() {
                println!("No operations found.");
            } else {
                println!("{:<6} {:<20} {:<10} {:>12}", "SEQ", "DATE", "TYPE", "AMOUNT");
                println!("{}", "-".repeat(51));
                for op in operations {
                    println!(
                        "{:<6} {:<20} {:<10} {:>12}",
                        op.id,
                        op.created_at.format("%Y-%m-%d %H:%M:%S"),
                        op.operation_type.as_str(),
                        op.amount
                    );
                }
            }
        }
    }
    Ok(())
}
