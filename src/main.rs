use anyhow::{bail, Context, Result};
use clap::Parser;
use log::warn;
use rouilleftp_client::config::{load_config, log_config, Config};
use rouilleftp_client::constants::DEFAULT_CONFIG_PATH;
use rouilleftp_client::core_cli::{format_entry, target_segments, Cli, Command};
use rouilleftp_client::core_log::logger::init_logger;
use rouilleftp_client::Session;
use std::path::Path;
use tokio::io::AsyncWriteExt;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    init_logger(args.verbose);

    // An explicit config path must exist, the default one may not
    let mut config = if !args.config.is_empty() {
        load_config(&args.config)?
    } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
        load_config(DEFAULT_CONFIG_PATH)?
    } else {
        Config::default()
    };
    args.apply_overrides(&mut config.client)?;
    log_config(&config.client);

    let mut session = Session::from_config(&config.client)
        .await
        .with_context(|| {
            format!(
                "Failed to open FTP session to {}:{}",
                config.client.host, config.client.port
            )
        })?;

    let result = run(&mut session, &args.command).await;
    session.dispose().await;
    result
}

async fn run(session: &mut Session, command: &Command) -> Result<()> {
    match command {
        Command::Upload { local, remote_dir } => {
            let segments = target_segments(remote_dir);
            if !session.upload(local, &segments).await? {
                bail!("Upload of {} was refused by the server", local.display());
            }
        }
        Command::Download { remote, local } => {
            session
                .download(remote, local)
                .await
                .with_context(|| format!("Failed to download {}", remote))?;
        }
        Command::Cat { remote, charset } => {
            let mut reader = session.read_file(remote, charset.as_deref()).await?;
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
            if !reader.finish().await? {
                warn!("Server did not confirm the transfer of {}", remote);
            }
        }
        Command::Delete { remote } => {
            if !session.delete(remote).await? {
                bail!("Failed to delete {}", remote);
            }
        }
        Command::List { remote } => {
            let entries = session.list_entries(remote).await?;
            for entry in entries.iter().filter(|e| !e.is_pseudo()) {
                println!("{}", format_entry(session.translator(), entry));
            }
        }
    }
    Ok(())
}
