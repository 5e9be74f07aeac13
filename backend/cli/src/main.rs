mod config;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use inkcalc_analyzer::Analyzer;
use inkcalc_core::Variables;
use inkcalc_gateway::{normalize_records, start_server, AppState};
use inkcalc_logging::init_logger;
use inkcalc_understanding::decode_image_bytes;

use config::Config;

#[derive(Parser)]
#[command(name = "inkcalc")]
#[command(about = "InkCalc: solve handwritten math with a vision model")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the InkCalc HTTP server
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Address to bind the HTTP server to
        #[arg(short, long)]
        bind: Option<String>,
    },
    /// Show whether a local server is running
    Status,
    /// Analyze a local image file and print the recognized records
    Solve {
        /// Path to a PNG/JPEG/WebP image
        image: PathBuf,
        /// Known variables as a JSON object, e.g. '{"x": 5}'
        #[arg(long)]
        vars: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();

    // Initialize structured logging
    init_logger(&config.log_options());

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, bind } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                bind_address: bind.unwrap_or(config.bind_address),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Status => {
            println!("InkCalc status: checking...");
            let client = reqwest::Client::new();
            match client
                .get(format!("http://localhost:{}/api/health", config.port))
                .send()
                .await
            {
                Ok(resp) => {
                    let body: serde_json::Value = resp.json().await?;
                    println!("{}", serde_json::to_string_pretty(&body)?);
                }
                Err(_) => {
                    println!("InkCalc is not running on port {}", config.port);
                }
            }
        }
        Commands::Solve { image, vars } => {
            solve(&config, image, vars.as_deref()).await?;
        }
    }

    Ok(())
}

async fn run_server(config: Config) -> Result<()> {
    info!(
        port = config.port,
        bind = %config.bind_address,
        model = %config.gemini_model,
        dev = config.is_dev(),
        "Starting InkCalc server"
    );

    let analyzer = Analyzer::new(config.vision_model()?);
    let state = Arc::new(AppState::new(analyzer));

    let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address))?;

    start_server(addr, state).await
}

async fn solve(config: &Config, path: PathBuf, vars: Option<&str>) -> Result<()> {
    let variables: Variables = match vars {
        Some(json) => serde_json::from_str(json).context("--vars must be a JSON object")?,
        None => Variables::new(),
    };

    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let image = decode_image_bytes(bytes)?;
    info!(
        path = %path.display(),
        width = image.width,
        height = image.height,
        "Analyzing image"
    );

    let analyzer = Analyzer::new(config.vision_model()?);
    let records = normalize_records(analyzer.analyze(&image, &variables).await?);
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
