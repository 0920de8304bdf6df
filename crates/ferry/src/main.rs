//! `ferry` - interactive command-line FTP client.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod settings;
mod shell;

use anyhow::{Context, Result};
use clap::Parser;
use ferry_ftp::Session;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use shell::Console;

fn init_tracing(log_level: &str) {
    let fallback = format!("ferry={log_level},ferry_ftp={log_level}");
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(&fallback))
                .unwrap_or_else(|_| "ferry=info,ferry_ftp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let settings_path = cli.config.clone().unwrap_or_else(settings::default_path);
    let settings = settings::load(&settings_path).await?;
    let config = settings.to_config(&cli.host, cli.port);

    info!("Connecting to {}", config.address());
    let (mut session, greeting) = Session::connect(&config)
        .await
        .with_context(|| format!("connecting to {}", config.address()))?;

    let mut console = Console::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout());
    console.say(&greeting.to_string()).await?;

    if !shell::login(&mut session, &mut console, cli.user.as_deref()).await? {
        session.quit().await?;
        return Ok(());
    }

    shell::run(&mut session, &mut console).await
}
