// src/main.rs
//! Stellar lumen wallet entry point
//! Reads config, builds the Horizon client and signer, then runs one command.
use anyhow::{Context, Result};
use clap::Parser;
use lumen_wallet::cli::{Cli, Commands};
use lumen_wallet::core::config::{NetworkConfig, WalletConfig};
use lumen_wallet::core::domain::{AccountId, Amount, Network};
use lumen_wallet::core::validation::is_valid_account_id;
use lumen_wallet::payment::{PaymentOutcome, StatusView};
use lumen_wallet::service::WalletSession;
use lumen_wallet::stellar::signer::ApprovalHook;
use lumen_wallet::stellar::xdr::Transaction;
use lumen_wallet::stellar::{HorizonClient, KeypairSigner, LedgerApi};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use zeroize::Zeroizing;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging()?;

    match cli.command {
        Commands::Validate { ref address } => {
            if is_valid_account_id(address) {
                println!("valid: {}", address.trim());
                return Ok(());
            }
            println!("invalid: {}", address.trim());
            std::process::exit(1);
        }
        Commands::Keygen => {
            let network = match cli.network.as_deref() {
                Some(name) => parse_network(name)?,
                None => Network::Testnet,
            };
            let signer = KeypairSigner::generate(network);
            println!("account: {}", signer.account_id());
            println!("secret:  {}", signer.secret_seed().as_str());
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&cli)?;
    info!(
        network = %config.network.network,
        horizon = %config.network.horizon_url(),
        "Starting lumen wallet v{}",
        env!("CARGO_PKG_VERSION")
    );
    let horizon = Arc::new(HorizonClient::from_config(&config)?);

    match cli.command {
        Commands::Balance { account: Some(account) } => {
            let account = AccountId::parse(&account)?;
            let info = horizon.load_account(&account).await?;
            println!("{} XLM", info.native_balance);
        }
        Commands::Balance { account: None } => {
            let mut session = open_session(&config, horizon, true)?;
            session.connect().await?;
            let balance = session.refresh_balance().await?;
            println!("{} XLM", balance);
        }
        Commands::History { account, limit } => {
            let records = match account {
                Some(account) => {
                    let account = AccountId::parse(&account)?;
                    let limit = limit.unwrap_or(config.client.history_limit);
                    horizon.list_transactions(&account, limit).await?
                }
                None => {
                    let mut session = open_session(&config, horizon, true)?;
                    session.connect().await?;
                    session.history(limit).await?
                }
            };
            if records.is_empty() {
                println!("no transactions");
            }
            for record in records {
                println!(
                    "{}  {}  ledger {}  ops {}  fee {}  {}{}",
                    record.created_at.format("%Y-%m-%d %H:%M:%S"),
                    record.hash,
                    record.ledger,
                    record.operation_count,
                    record.fee_charged,
                    if record.successful { "ok" } else { "failed" },
                    record.memo.map(|m| format!("  memo: {}", m)).unwrap_or_default()
                );
            }
        }
        Commands::Send {
            to,
            amount,
            memo,
            yes,
        } => {
            let mut session = open_session(&config, horizon, yes)?;
            session.connect().await?;
            match session.send_payment(&to, &amount, memo.as_deref()).await {
                PaymentOutcome::Success(receipt) => {
                    println!("sent: {}", receipt.hash);
                    println!("{}", receipt.explorer_url);
                    if let Some(balance) = session.balance().await {
                        println!("balance: {} XLM", balance);
                    }
                }
                PaymentOutcome::AbortedByUser => {
                    println!("cancelled");
                }
                PaymentOutcome::Failed(err) => {
                    let message = match session.flow().status() {
                        StatusView::ValidationError(text) | StatusView::Failure(text) => {
                            text.clone()
                        }
                        _ => err.to_string(),
                    };
                    error!(error = %err, "Payment failed");
                    anyhow::bail!(message);
                }
            }
        }
        Commands::Validate { .. } | Commands::Keygen => unreachable!(),
    }

    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn parse_network(name: &str) -> Result<Network> {
    Network::from_name(name).with_context(|| format!("unknown network '{}'", name))
}

/// Load configuration from --config, CONFIG_PATH or ./config.toml
fn load_config(cli: &Cli) -> Result<WalletConfig> {
    let path = cli
        .config
        .clone()
        .or_else(|| std::env::var("CONFIG_PATH").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("config.toml"));
    let mut config = WalletConfig::load(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;

    if let Some(name) = cli.network.as_deref() {
        let network = parse_network(name)?;
        if network != config.network.network {
            config.network = NetworkConfig::for_network(network);
        }
    }
    Ok(config)
}

fn open_session(
    config: &WalletConfig,
    horizon: Arc<HorizonClient>,
    skip_confirmation: bool,
) -> Result<WalletSession> {
    let secret = Zeroizing::new(
        std::env::var("STELLAR_SECRET_KEY")
            .context("STELLAR_SECRET_KEY must be set to use the signer's account")?,
    );
    let signer = KeypairSigner::from_secret(&secret, config.network.network)?
        .with_approval(approval_prompt(skip_confirmation));
    Ok(WalletSession::new(config.clone(), horizon, Arc::new(signer)))
}

/// Asks the operator to type "yes" before a transaction is signed.
fn approval_prompt(skip_confirmation: bool) -> ApprovalHook {
    Arc::new(move |tx: &Transaction| {
        if skip_confirmation {
            return true;
        }
        // Require both stdin and stdout to be a TTY for interactive confirmation.
        if !io::stdout().is_terminal() || !io::stdin().is_terminal() {
            error!("Refusing to sign: interactive TTY required (pass --yes to skip the prompt)");
            return false;
        }

        for op in &tx.operations {
            let amount = Amount::from_stroops(op.amount)
                .map(|a| a.to_string())
                .unwrap_or_else(|_| op.amount.to_string());
            println!(
                "Pay {} XLM to {}",
                amount,
                AccountId::from_public_key(&op.destination)
            );
        }
        println!("Fee: {} stroops", tx.fee);
        print!("Type yes to sign and submit: ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        if let Err(e) = io::stdin().read_line(&mut input) {
            error!(error = %e, "Failed to read confirmation input");
            return false;
        }
        input.trim().eq_ignore_ascii_case("yes")
    })
}
