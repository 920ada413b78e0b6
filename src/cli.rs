use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stellar lumen wallet CLI (library-facing definitions)
#[derive(Debug, Parser)]
#[command(name = "lumen_wallet", about = "Stellar lumen wallet", version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Network to use (testnet, public, futurenet); overrides the config file
    #[arg(long, global = true)]
    pub network: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the native balance of an account
    Balance {
        /// Account to query; defaults to the signer's account
        #[arg(long)]
        account: Option<String>,
    },
    /// List recent transactions, newest first
    History {
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Send a native payment signed with STELLAR_SECRET_KEY
    Send {
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        memo: Option<String>,
        /// Skip the interactive confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Check whether a string is a valid account address
    Validate { address: String },
    /// Generate a new random keypair
    Keygen,
}
