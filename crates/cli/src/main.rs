use clap::{Parser, Subcommand};

mod commands;
mod format;

use commands::{CorrelateArgs, GlobalArgs, HistoryArgs, StreamArgs, TrendArgs};

#[derive(Parser)]
#[command(name = "crypto-analytics")]
#[command(about = "Real-time crypto market analytics for Binance spot pairs", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream ranked snapshots until Ctrl+C
    Stream(StreamArgs),
    /// Fetch once and print the market trend report
    Trend(TrendArgs),
    /// Show daily price history for one asset
    History(HistoryArgs),
    /// Correlate two assets' daily closes
    Correlate(CorrelateArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Stream(args) => commands::run_stream(&cli.global, args).await?,
        Commands::Trend(args) => commands::run_trend(&cli.global, args).await?,
        Commands::History(args) => commands::run_history(&cli.global, args).await?,
        Commands::Correlate(args) => commands::run_correlate(&cli.global, args).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_stream_with_global_flags() {
        let cli = Cli::try_parse_from([
            "crypto-analytics",
            "stream",
            "--limit",
            "20",
            "--config",
            "other.toml",
            "--persist",
        ])
        .unwrap();

        assert_eq!(cli.global.config, "other.toml");
        match cli.command {
            Commands::Stream(args) => {
                assert_eq!(args.limit, Some(20));
                assert!(args.persist);
            }
            _ => panic!("expected stream"),
        }
    }

    #[test]
    fn test_parse_correlate() {
        let cli = Cli::try_parse_from(["crypto-analytics", "correlate", "btc", "eth", "-w", "14"])
            .unwrap();
        match cli.command {
            Commands::Correlate(args) => {
                assert_eq!(args.first, "btc");
                assert_eq!(args.second, "eth");
                assert_eq!(args.window, Some(14));
            }
            _ => panic!("expected correlate"),
        }
    }

    #[test]
    fn test_default_config_path() {
        let cli = Cli::try_parse_from(["crypto-analytics", "trend", "--json"]).unwrap();
        assert_eq!(cli.global.config, "config/Config.toml");
    }
}
