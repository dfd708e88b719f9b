use clap::Parser;
use commodity_ticker::cli::{Cli, Commands};
use commodity_ticker::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        Config::default()
    });

    // Initialize telemetry
    let _telemetry = commodity_ticker::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting ticker");
            args.execute(&config).await?;
        }
        Commands::Snapshot(args) => {
            args.execute(&config).await?;
        }
        Commands::Chat(args) => {
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!(
                "  Ticker: every {}ms, ±{:.1}%, seed {}",
                config.ticker.interval_ms,
                config.ticker.max_fluctuation * 100.0,
                config
                    .ticker
                    .seed
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "entropy".to_string())
            );
            println!("  Instruments:");
            for i in &config.instruments {
                println!(
                    "    {:<6} {:<14} base {} [{}, {}] {:?}",
                    i.symbol, i.name, i.bounds.base, i.bounds.min, i.bounds.max, i.format
                );
            }
            println!(
                "  Chat: {} (key {})",
                config.chat.model,
                if config.chat.resolve_api_key().is_some() {
                    "set"
                } else {
                    "missing"
                }
            );
            println!(
                "  Telemetry: {} {:?}, metrics {}",
                config.telemetry.log_level,
                config.telemetry.log_format,
                config
                    .telemetry
                    .metrics_port
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "off".to_string())
            );
        }
    }

    Ok(())
}
