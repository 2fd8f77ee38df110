//! CLI commands for the wallet
//!
//! Implements all command handlers for the CLI interface.

use bytes::BytesMut;
use futures::StreamExt;
use std::path::Path;
use tokio_util::codec::{Encoder, FramedRead};

use crate::config::{WalletConfig, COIN};
use crate::crypto::{ChainBranch, Seed};
use crate::network::{
    Block, GetBlocksMessage, Hash256, MessageCodec, Payload, RawMessage, Transaction,
};
use crate::storage::JsonFileStore;
use crate::wallet::{ApplyReport, Wallet};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn format_amount(value: u128) -> String {
    let coin = COIN as u128;
    format!("{}.{:08}", value / coin, value % coin)
}

fn print_report(report: &ApplyReport) {
    for outpoint in &report.spent {
        println!("   ├─ Spent {}", outpoint);
    }
    for (outpoint, value) in &report.received {
        println!("   ├─ Received {} at {}", format_amount(*value as u128), outpoint);
    }
    for failure in &report.failures {
        println!("   ├─ ❌ {}: {}", failure.outpoint, failure.error);
    }
    if report.change_confirmed {
        println!("   ├─ Change confirmed");
    }
}

/// Initialize a wallet from a hex seed
pub async fn cmd_init(config: WalletConfig, seed_hex: &str) -> CliResult<()> {
    if config.seed_path().exists() {
        println!("⚠️  Wallet already exists at {:?}", config.data_dir);
        return Ok(());
    }

    let seed = Seed::from_hex(seed_hex)?;
    let mut wallet = Wallet::create(config, seed).await?;

    println!("✅ Wallet initialized!");
    println!("   📁 Data directory: {:?}", wallet.config().data_dir);
    println!("   🌐 Network: {}", wallet.config().network.name);
    println!("   🔑 Master key: {}", wallet.keychain().extended_master_key()?);
    println!("   📍 Receive address: {}", wallet.receive_address()?);

    Ok(())
}

/// Show a receiving address, or derive a fresh one on either branch
pub async fn cmd_address(config: WalletConfig, new: bool, change: bool) -> CliResult<()> {
    let mut wallet = Wallet::open(config).await?;
    let branch = if change {
        ChainBranch::Internal
    } else {
        ChainBranch::External
    };

    let address = if new || change {
        wallet.new_address(branch)?
    } else {
        wallet.receive_address()?
    };

    println!("📍 {} address: {}", branch, address);
    Ok(())
}

/// Show the spendable balance
pub async fn cmd_balance(config: WalletConfig) -> CliResult<()> {
    let wallet = Wallet::open(config).await?;
    let balance = wallet.balance().await?;
    let outputs = wallet.ledger().unspent_outputs().await?;

    println!("💰 Balance: {}", format_amount(balance));
    println!("   UTXOs: {}", outputs.len());
    let pending = wallet.ledger().submitted();
    if !pending.is_empty() {
        println!("   Pending spends: {}", pending.len());
        for txid in &pending {
            println!("   ├─ {}", txid);
        }
    }
    for record in outputs.iter().take(10) {
        println!(
            "   └─ {} = {}",
            record.outpoint(),
            format_amount(record.value as u128)
        );
    }
    if outputs.len() > 10 {
        println!("   ... and {} more", outputs.len() - 10);
    }

    Ok(())
}

/// Build and sign a spend, printing the raw transaction
pub async fn cmd_send(config: WalletConfig, to: &str, amount: u64) -> CliResult<()> {
    let mut wallet = Wallet::open(config).await?;

    println!("📤 Sending {} to {}", format_amount(amount as u128), to);
    let spend = wallet.build_spend(amount, to).await?;

    println!("✅ Transaction signed!");
    println!("   ├─ ID: {}", spend.txid);
    println!("   ├─ Inputs: {}", spend.inputs.len());
    println!("   ├─ Fee: {}", format_amount(spend.fee as u128));
    if let Some(change) = spend.change {
        println!("   ├─ Change: {}", format_amount(change as u128));
    }
    println!("   └─ Size: {} bytes", spend.raw.len());
    println!("\n{}", hex::encode(&spend.raw));
    println!("\n💡 Inputs stay reserved until the transaction is applied or abandoned");

    Ok(())
}

/// Release the reservations of a spend that will not be broadcast
pub async fn cmd_abandon(config: WalletConfig, txid: &str) -> CliResult<()> {
    let txid: Hash256 = txid.parse()?;
    let mut wallet = Wallet::open(config).await?;

    if wallet.abandon_spend(&txid).await? {
        println!("🗑️  Abandoned spend {}", txid);
        println!("   └─ Balance: {}", format_amount(wallet.balance().await?));
    } else {
        println!("⚠️  No pending spend {}", txid);
    }
    Ok(())
}

/// Apply a raw transaction to the ledger
pub async fn cmd_apply_tx(config: WalletConfig, raw_hex: &str) -> CliResult<()> {
    let mut wallet = Wallet::open(config).await?;
    let raw = hex::decode(raw_hex.trim())?;
    let (tx, _) = Transaction::decode(&raw)?;

    println!("📥 Applying transaction {}", tx.txid());
    let report = wallet.apply_transaction(&tx).await;
    print_report(&report);
    println!(
        "   └─ Balance: {}",
        format_amount(wallet.balance().await?)
    );

    Ok(())
}

/// Decode a raw transaction and print it as JSON
pub fn cmd_decode_tx(raw_hex: &str) -> CliResult<()> {
    let raw = hex::decode(raw_hex.trim())?;
    let (tx, consumed) = Transaction::decode(&raw)?;
    if consumed != raw.len() {
        println!("⚠️  {} trailing bytes ignored", raw.len() - consumed);
    }

    println!("🧾 Transaction {}", tx.txid());
    println!("{}", serde_json::to_string_pretty(&tx)?);
    Ok(())
}

/// Decode a raw block payload from a file
pub async fn cmd_decode_block(path: &Path) -> CliResult<()> {
    let payload = tokio::fs::read(path).await?;
    let block = Block::decode(&payload)?;

    println!("🧱 Block {}", block.hash());
    println!("   ├─ Previous: {}", block.previous_hash());
    println!("   └─ Transactions: {}", block.transactions.len());
    for tx in &block.transactions {
        println!(
            "      └─ {} ({} in, {} out, {})",
            tx.txid(),
            tx.inputs.len(),
            tx.outputs.len(),
            format_amount(tx.total_output())
        );
    }
    Ok(())
}

/// Read framed messages from a capture file, optionally applying them
pub async fn cmd_decode_stream(config: WalletConfig, path: &Path, apply: bool) -> CliResult<()> {
    let file = tokio::fs::File::open(path).await?;
    let mut frames = FramedRead::new(file, MessageCodec::new(config.network.magic));
    let mut wallet = if apply {
        Some(Wallet::open(config).await?)
    } else {
        None
    };

    let mut count = 0usize;
    while let Some(frame) = frames.next().await {
        let payload = Payload::decode(frame?)?;
        count += 1;

        let transactions = match &payload {
            Payload::Tx(tx) => {
                println!("📨 tx {}", tx.txid());
                vec![tx.clone()]
            }
            Payload::Block(block) => {
                println!(
                    "📨 block {} ({} transactions)",
                    block.hash(),
                    block.transactions.len()
                );
                block.transactions.clone()
            }
            Payload::Reject(reject) => {
                println!("📨 {}", reject);
                Vec::new()
            }
            Payload::Other(raw) => {
                println!("📨 {} ({} bytes)", raw.command, raw.payload.len());
                Vec::new()
            }
        };

        if let Some(wallet) = wallet.as_mut() {
            for tx in &transactions {
                let report = wallet.apply_transaction(tx).await;
                if report.is_relevant() {
                    println!("   Transaction {}", tx.txid());
                    print_report(&report);
                }
            }
        }
    }

    println!("✅ {} messages decoded", count);
    if let Some(wallet) = wallet {
        println!("💰 Balance: {}", format_amount(wallet.balance().await?));
    }
    Ok(())
}

/// Print a framed `getblocks` request for the given locator hashes
pub fn cmd_getblocks(config: &WalletConfig, locator: &[String]) -> CliResult<()> {
    let hashes = locator
        .iter()
        .map(|h| h.parse::<Hash256>())
        .collect::<Result<Vec<_>, _>>()?;
    let message = GetBlocksMessage::new(config.network.protocol_version, hashes);

    let mut buf = BytesMut::new();
    MessageCodec::new(config.network.magic).encode(RawMessage::from(&message), &mut buf)?;

    println!("🔎 getblocks with {} locator hashes", message.locator_hashes.len());
    println!("{}", hex::encode(&buf));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash_to_address;
    use crate::network::transaction::tests::GENESIS_COINBASE_HEX;
    use crate::wallet::wallet::tests::fund;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0.00000000");
        assert_eq!(format_amount(150_000_000), "1.50000000");
        assert_eq!(format_amount(7), "0.00000007");
    }

    #[tokio::test]
    async fn test_init_and_apply() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = WalletConfig {
            data_dir: temp_dir.path().to_path_buf(),
            gap_limit: 2,
            ..WalletConfig::default()
        };

        cmd_init(config.clone(), "000102030405060708090a0b0c0d0e0f")
            .await
            .unwrap();
        assert!(config.seed_path().exists());

        cmd_apply_tx(config.clone(), GENESIS_COINBASE_HEX).await.unwrap();
        cmd_balance(config).await.unwrap();
    }

    #[test]
    fn test_decode_tx_rejects_truncated() {
        assert!(cmd_decode_tx(&GENESIS_COINBASE_HEX[..100]).is_err());
        assert!(cmd_decode_tx(GENESIS_COINBASE_HEX).is_ok());
    }

    #[tokio::test]
    async fn test_decode_stream() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = WalletConfig {
            data_dir: temp_dir.path().to_path_buf(),
            ..WalletConfig::default()
        };

        let raw = hex::decode(GENESIS_COINBASE_HEX).unwrap();
        let mut buf = BytesMut::new();
        let mut codec = MessageCodec::new(config.network.magic);
        codec.encode(RawMessage::new("tx", raw), &mut buf).unwrap();
        codec.encode(RawMessage::new("verack", Vec::new()), &mut buf).unwrap();

        let path = temp_dir.path().join("capture.bin");
        std::fs::write(&path, &buf).unwrap();
        cmd_decode_stream(config, &path, false).await.unwrap();
    }

    #[test]
    fn test_getblocks() {
        let config = WalletConfig::default();
        cmd_getblocks(&config, &["00".repeat(32)]).unwrap();
        assert!(cmd_getblocks(&config, &["zz".to_string()]).is_err());
    }

    #[tokio::test]
    async fn test_send_reservation_persists_until_abandoned() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = WalletConfig {
            data_dir: temp_dir.path().to_path_buf(),
            gap_limit: 2,
            ..WalletConfig::default()
        };
        cmd_init(config.clone(), "000102030405060708090a0b0c0d0e0f")
            .await
            .unwrap();

        let mut wallet = Wallet::open(config.clone()).await.unwrap();
        fund(&mut wallet, b"cli", 5 * COIN).await;
        drop(wallet);

        let destination = hash_to_address(&[0x55; 20], config.network.pubkey_hash_byte);
        cmd_send(config.clone(), &destination, COIN).await.unwrap();
        // The only confirmed output is still reserved by the first send
        assert!(cmd_send(config.clone(), &destination, COIN).await.is_err());

        let txid = Wallet::open(config.clone()).await.unwrap().ledger().submitted()[0];
        cmd_abandon(config.clone(), &txid.to_string()).await.unwrap();
        cmd_send(config.clone(), &destination, COIN).await.unwrap();
        cmd_abandon(config, &"00".repeat(32)).await.unwrap();
    }
}
