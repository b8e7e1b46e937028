//! OpenSASE Campaigns CLI
//!
//! Operator tooling for email campaigns stored in a JSON datastore file.
//!
//! # Usage
//!
//! ```bash
//! opensase-campaigns resolve --data store.json --owner acme --groups vip,beta
//! opensase-campaigns send --data store.json --owner acme --campaign spring --dry-run
//! opensase-campaigns run-scheduled --data store.json
//! opensase-campaigns preview --data store.json --owner acme --campaign spring --contact c1 --format json
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "opensase-campaigns")]
#[command(author = "OpenSASE")]
#[command(version)]
#[command(about = "OpenSASE Marketing campaigns", long_about = None)]
struct Cli {
    /// Campaigns config file (JSON)
    #[arg(long, env = "OPENSASE_CAMPAIGNS_CONFIG")]
    config: Option<PathBuf>,

    /// Transmission endpoint URL
    #[arg(long, env = "OPENSASE_TRANSMIT_URL")]
    transmit_url: Option<String>,

    /// API key for the transmission endpoint
    #[arg(long, env = "OPENSASE_TRANSMIT_KEY", hide_env_values = true)]
    transmit_key: Option<String>,

    /// Maximum concurrent endpoint calls
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from ~/.opensase
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the contacts a targeting selection resolves to
    Resolve(ResolveArgs),
    /// Send a stored campaign now
    Send(SendArgs),
    /// Send every scheduled campaign that is due
    RunScheduled(RunScheduledArgs),
    /// Render a campaign body for one contact
    Preview(PreviewArgs),
}

#[derive(Args)]
pub struct DataArgs {
    /// Datastore file
    #[arg(long)]
    pub data: PathBuf,
}

#[derive(Args)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[arg(long)]
    pub owner: String,
    /// Comma separated group ids
    #[arg(long, value_delimiter = ',', conflicts_with = "contacts")]
    pub groups: Option<Vec<String>>,
    /// Comma separated contact ids
    #[arg(long, value_delimiter = ',')]
    pub contacts: Option<Vec<String>>,
}

#[derive(Args)]
pub struct SendArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[arg(long)]
    pub owner: String,
    #[arg(long)]
    pub campaign: String,
    /// Accept every message without calling the endpoint
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct RunScheduledArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub data: DataArgs,
    #[arg(long)]
    pub owner: String,
    #[arg(long)]
    pub campaign: String,
    #[arg(long)]
    pub contact: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let profile = config::Profile::load(cli.profile.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Ignoring unreadable profile");
        config::Profile::default()
    });
    let format = cli.format.or(profile.default_format).unwrap_or(output::OutputFormat::Table);

    let overrides = config::Overrides {
        config_path: cli.config.or(profile.config_path.clone()),
        transmit_url: cli.transmit_url.or(profile.transmit_url.clone()),
        transmit_key: cli.transmit_key.or(profile.transmit_key.clone()),
        concurrency: cli.concurrency,
    };

    let result = match overrides.resolve() {
        Ok(settings) => match cli.command {
            Commands::Resolve(args) => commands::resolve::handle(args, &settings, format).await,
            Commands::Send(args) => commands::send::handle(args, &settings, format).await,
            Commands::RunScheduled(args) => commands::scheduled::handle(args, &settings, format).await,
            Commands::Preview(args) => commands::preview::handle(args, &settings, format).await,
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
