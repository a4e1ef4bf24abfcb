//! Session mode binary
//!
//! Logs one account in against a JSON mock server, synchronizes its remote
//! config, completes its tutorial and prints a summary to stdout.
//!
//! # Usage
//!
//! ```bash
//! pogom-session --mock-url http://127.0.0.1:9000 --username trainer --password secret
//! ```
//!
//! # Output
//!
//! ```json
//! {
//!   "username": "trainer",
//!   "level": 1,
//!   "tutorial_complete": true,
//!   "warned": false,
//!   "logged_in": true,
//!   "sync": {"asset_pages": 4, "template_pages": 1},
//!   "proxy": null,
//!   "last_timestamp_ms": 1478000000000,
//!   "remote_config": {"hash": "...", "asset_time": 1478000000.0, "template_time": 1478000000.0}
//! }
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pogom_session::{
    AuthService,
    cli::{SessionArgs, load_settings, log_filter, run_session_mode},
    utils::VERSION,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "pogom-session")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Account username
    #[arg(short, long, value_name = "USERNAME")]
    username: Option<String>,

    /// Account password
    #[arg(short, long, value_name = "PASSWORD")]
    password: Option<String>,

    /// Authentication provider (ptc or google)
    #[arg(short, long, value_name = "SERVICE", default_value = "ptc")]
    auth_service: String,

    /// Base URL of the JSON mock server
    #[arg(short, long, value_name = "URL")]
    mock_url: Option<String>,

    /// Proxy server URL (http://host:port, socks5://host:port, etc.), repeatable
    #[arg(long = "proxy", value_name = "PROXY")]
    proxies: Vec<String>,

    /// Show version information
    #[arg(long)]
    version: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Handle version flag early
    if cli.version {
        println!("{}", VERSION);
        return Ok(());
    }

    let (Some(username), Some(password)) = (cli.username, cli.password) else {
        eprintln!("Both --username and --password are required");
        std::process::exit(2);
    };
    let auth_service: AuthService = cli.auth_service.parse()?;

    let args = SessionArgs {
        config: cli.config,
        username,
        password,
        auth_service,
        mock_url: cli.mock_url,
        proxies: cli.proxies,
    };
    let settings = load_settings(&args);

    let default_filter = log_filter(cli.verbose, settings.as_ref().ok().map(|s| &s.logging));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!(
        "Preparing account {} (auth {}, {} proxies)",
        args.username,
        args.auth_service.as_str(),
        args.proxies.len()
    );

    let result = match settings {
        Ok(settings) => run_session_mode(args, settings).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(summary) => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Err(e) => {
            eprintln!("Failed to prepare account. Error: {:#}", e);
            println!("{{}}");
            std::process::exit(1);
        }
    }

    Ok(())
}
