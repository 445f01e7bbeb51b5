use anyhow::{Context, Result};
use clap::Parser;
use escrow_client::{
    config::{Command, Config},
    JsonFileGameStore, Processor, RpcLedger,
};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    let session = config.session().context("failed to load key material")?;
    let options = config.options()?;
    let ledger = RpcLedger::new(config.rpc_url.clone());
    let store = JsonFileGameStore::new(config.store_path.clone());
    info!(
        rpc = %ledger.url(),
        store = %store.path().display(),
        program = %config.program_id,
        "escrow client ready"
    );
    let processor = Processor::new(ledger, store, session, config.accounts(), options);

    let output = match config.command {
        Command::Create => {
            let created = processor.create_game().await?;
            json!({
                "gameId": created.game_id,
                "gameAccount": created.game_account.to_string(),
                "transactionSignature": created.signature.to_string(),
            })
        }
        Command::Join {
            game_id,
            last_price,
        } => {
            let signature = processor.join_game(&game_id, last_price).await?;
            json!({ "transactionSignature": signature.to_string() })
        }
        Command::Settle {
            game_id,
            last_price,
        } => serde_json::to_value(processor.settle_game(&game_id, last_price).await?)?,
        Command::Withdraw { game_id } => {
            let signature = processor.withdraw_funds(&game_id).await?;
            json!({ "transactionSignature": signature.to_string() })
        }
        Command::Close { game_id } => {
            let signature = processor.close_game(&game_id).await?;
            json!({ "transactionSignature": signature.to_string() })
        }
        Command::Status { game_id } => serde_json::to_value(processor.game_status(&game_id).await?)?,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
