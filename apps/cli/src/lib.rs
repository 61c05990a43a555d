pub mod anki;
pub mod audio;
pub mod commands;
pub mod config;
pub mod error;
pub mod mochi;
pub mod retry;
pub mod sync;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vocab_core::OrdinalPolicy;

use crate::commands::{Cli, Command};

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let policy: OrdinalPolicy = cli.ordinal_policy.into();

    match cli.command {
        Command::Mochi => {
            commands::mochi::run(&cli.csv, &cli.audio_dir, policy).await?;
        }
        Command::Anki {
            output,
            deck_name,
            css,
        } => {
            commands::anki::run(
                &cli.csv,
                &cli.audio_dir,
                policy,
                &output,
                &deck_name,
                css.as_deref(),
            )?;
        }
        Command::Audio { max_attempts } => {
            commands::audio::run(&cli.csv, &cli.audio_dir, max_attempts).await?;
        }
        Command::Check => {
            commands::check::run(&cli.csv, policy)?;
        }
    }

    Ok(())
}
