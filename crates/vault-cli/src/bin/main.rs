//! vaultctl - command-line access to the secret vault
//!
//! Every run unlocks the vault with the master passphrase (from
//! `--passphrase`, `VAULT_PASSPHRASE` or a terminal prompt), performs one
//! command and exits. Logs go to stderr so command output stays pipeable.

use clap::Parser;

use vault_cli::{run, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let output = run(args).await?;
    println!("{}", output);
    Ok(())
}
