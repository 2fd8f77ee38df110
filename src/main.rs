//! Dogecoin SPV wallet CLI
//!
//! A command-line interface for the HD wallet and wire codecs.

use clap::{Parser, Subcommand};
use doge_spv_wallet::cli;
use doge_spv_wallet::config::{NetworkParams, WalletConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wallet")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "A lightweight Dogecoin SPV wallet in Rust", long_about = None)]
struct Cli {
    /// Data directory for the seed and wallet tables [default: .wallet_data]
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Network preset (dogecoin, testnet)
    #[arg(short, long)]
    network: Option<String>,

    /// JSON configuration file; command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fixed fee in base units
    #[arg(long)]
    fee: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a wallet from a hex seed
    Init {
        /// Master seed, 16 to 64 bytes of hex
        #[arg(short, long)]
        seed: String,
    },

    /// Show a receiving address
    Address {
        /// Derive a fresh receiving address
        #[arg(long)]
        new: bool,

        /// Derive a fresh change address
        #[arg(long)]
        change: bool,
    },

    /// Show the spendable balance
    Balance,

    /// Build and sign a spend
    Send {
        /// Recipient's address
        #[arg(short, long)]
        to: String,

        /// Amount in base units
        #[arg(short, long)]
        amount: u64,
    },

    /// Release the inputs of a built spend that will not be broadcast
    Abandon {
        txid: String,
    },

    /// Apply a raw transaction (hex) to the ledger
    ApplyTx {
        raw: String,
    },

    /// Decode a raw transaction (hex)
    DecodeTx {
        raw: String,
    },

    /// Decode a raw block payload file
    DecodeBlock {
        file: PathBuf,
    },

    /// Decode a file of framed network messages
    DecodeStream {
        file: PathBuf,

        /// Apply received transactions to the ledger
        #[arg(long)]
        apply: bool,
    },

    /// Print a framed getblocks request
    Getblocks {
        /// Locator block hashes, newest first
        locator: Vec<String>,
    },
}

fn load_config(cli: &Cli) -> Result<WalletConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => WalletConfig::load(path)?,
        None => WalletConfig::default(),
    };

    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(name) = &cli.network {
        config.network = NetworkParams::from_name(name)?;
    }
    if let Some(fee) = cli.fee {
        config.fee = fee;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Handle pure decoding commands without a runtime
    match &cli.command {
        Commands::DecodeTx { raw } => return cli::cmd_decode_tx(raw),
        Commands::Getblocks { locator } => return cli::cmd_getblocks(&config, locator),
        _ => {}
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Commands::DecodeTx { .. } | Commands::Getblocks { .. } => unreachable!(),

            Commands::Init { seed } => cli::cmd_init(config, &seed).await,
            Commands::Address { new, change } => cli::cmd_address(config, new, change).await,
            Commands::Balance => cli::cmd_balance(config).await,
            Commands::Send { to, amount } => cli::cmd_send(config, &to, amount).await,
            Commands::Abandon { txid } => cli::cmd_abandon(config, &txid).await,
            Commands::ApplyTx { raw } => cli::cmd_apply_tx(config, &raw).await,
            Commands::DecodeBlock { file } => cli::cmd_decode_block(&file).await,
            Commands::DecodeStream { file, apply } => {
                cli::cmd_decode_stream(config, &file, apply).await
            }
        }
    })
}
