//! `ledger-runtime` command line.
//!
//! Loads a TOML config (defaults when omitted), installs logging and the
//! optional metrics exporter, then runs one subcommand against the
//! configured endpoints.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

use ledger_runtime::amount::{convert, format_amount, parse_amount, ConversionRecord};
use ledger_runtime::blockchain::{AlloyConnector, AlloyLedger, TxId, Wallet};
use ledger_runtime::config::{load_config, RuntimeConfig};
use ledger_runtime::lifecycle::{signals::shutdown_signal, CancelToken};
use ledger_runtime::observability::{logging, metrics};
use ledger_runtime::{Error, TransactionOrchestrator, TransferRequest};

#[derive(Parser)]
#[command(name = "ledger-runtime")]
#[command(about = "Resilient ledger RPC client runtime", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the health monitor until interrupted, logging endpoint state
    Watch,
    /// Probe every endpoint once and print the health report
    Status,
    /// Convert a human amount between two tokens
    Convert {
        amount: String,
        #[arg(long, default_value_t = 10_000)]
        rate_bps: u64,
        #[arg(long)]
        source_decimals: u8,
        #[arg(long)]
        target_decimals: u8,
    },
    /// Fetch an account balance through the healthy endpoint
    Balance { account: String },
    /// Sign, submit and confirm a transfer (key from LEDGER_RUNTIME_PRIVATE_KEY)
    Transfer {
        recipient: String,
        amount: String,
        #[arg(long, default_value_t = 10_000)]
        rate_bps: u64,
        #[arg(long, default_value_t = 18)]
        source_decimals: u8,
        #[arg(long, default_value_t = 18)]
        target_decimals: u8,
    },
    /// Re-poll a previously submitted transaction
    Resume { tx_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RuntimeConfig::default(),
    };

    logging::init_logging(&config.observability)?;
    tracing::info!(endpoints = config.endpoints.len(), "ledger-runtime v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let connector = Arc::new(AlloyConnector::from_config(&config.blockchain));

    match cli.command {
        Commands::Convert {
            amount,
            rate_bps,
            source_decimals,
            target_decimals,
        } => {
            let source = parse_amount(&amount, source_decimals)?;
            let target = convert(source, rate_bps, source_decimals, target_decimals)?;
            print_json(&serde_json::json!({
                "source_base_units": source,
                "target_base_units": target,
                "target": format_amount(target, target_decimals),
            }))?;
        }
        Commands::Status => {
            let orchestrator = TransactionOrchestrator::from_config(&config, connector)?;
            orchestrator.monitor().check_all().await;
            print_json(&orchestrator.monitor().status())?;
        }
        Commands::Watch => {
            let orchestrator = TransactionOrchestrator::from_config(&config, connector)?;
            let monitor = orchestrator.monitor().clone();
            monitor.start();
            shutdown_signal().await;
            monitor.stop();
            print_json(&monitor.status())?;
        }
        Commands::Balance { account } => {
            let orchestrator = TransactionOrchestrator::from_config(&config, connector)?;
            let balance = orchestrator.balance(&account).await?;
            print_json(&serde_json::json!({
                "account": account,
                "balance": balance.to_string(),
            }))?;
        }
        Commands::Transfer {
            recipient,
            amount,
            rate_bps,
            source_decimals,
            target_decimals,
        } => {
            let wallet = Wallet::from_env(&config.blockchain)?;
            sync_nonce(&wallet, &config).await;

            let orchestrator = TransactionOrchestrator::from_config(&config, connector)?
                .with_signer(Arc::new(wallet));
            let request = TransferRequest {
                amount,
                recipient,
                record: ConversionRecord {
                    rate_bps,
                    source_decimals,
                    target_decimals,
                },
            };

            let (cancel, watcher) = cancel_on_signal();
            let result = orchestrator.transfer_with_cancel(&request, &cancel).await;
            watcher.abort();
            report(result.map(serde_json::to_value))?;
        }
        Commands::Resume { tx_id } => {
            let orchestrator = TransactionOrchestrator::from_config(&config, connector)?;
            let (cancel, watcher) = cancel_on_signal();
            let result = orchestrator
                .resume_confirmation(&TxId(tx_id), &cancel)
                .await;
            watcher.abort();
            report(result.map(serde_json::to_value))?;
        }
    }

    Ok(())
}

/// Cancel the returned token when SIGINT/SIGTERM arrives.
fn cancel_on_signal() -> (CancelToken, JoinHandle<()>) {
    let cancel = CancelToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            cancel.cancel();
        })
    };
    (cancel, watcher)
}

/// Seed the wallet's local nonce from the primary endpoint, if reachable.
async fn sync_nonce(wallet: &Wallet, config: &RuntimeConfig) {
    let Some(primary) = config.endpoints.first() else {
        return;
    };
    let ledger = match AlloyLedger::connect(primary, config.blockchain.rpc_timeout()) {
        Ok(ledger) => ledger,
        Err(e) => {
            tracing::warn!(error = %e, "Cannot sync nonce");
            return;
        }
    };
    match ledger.transaction_count(wallet.address()).await {
        Ok(nonce) => wallet.set_nonce(nonce),
        Err(e) => tracing::warn!(error = %e, "Cannot sync nonce, starting from 0"),
    }
}

fn report(
    result: Result<serde_json::Result<serde_json::Value>, Error>,
) -> Result<(), Box<dyn std::error::Error>> {
    match result {
        Ok(value) => print_json(&value?),
        Err(e) => {
            let mut body = serde_json::json!({
                "error": e.to_string(),
                "disposition": format!("{:?}", e.disposition()),
            });
            if let Some(tx_id) = e.tx_id() {
                body["tx_id"] = serde_json::json!(tx_id);
            }
            print_json(&body)?;
            Err(e.into())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
