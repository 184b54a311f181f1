//! Configuration, data source and store shared by every command.

use anyhow::{Context, Result};
use clap::Args;
use crypto_analytics_binance::BinanceMarketData;
use crypto_analytics_core::{AppConfig, ConfigLoader, SnapshotStore};
use crypto_analytics_data::{DatabaseClient, PgSnapshotStore};
use std::sync::Arc;

/// Options accepted by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file path
    #[arg(short, long, global = true, default_value = "config/Config.toml")]
    pub config: String,

    /// Profile overlay (loads Config.{profile}.toml next to the config file)
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Database connection URL (uses DATABASE_URL env var if not provided)
    #[arg(long, global = true, env = "DATABASE_URL")]
    pub db_url: Option<String>,
}

pub struct AppContext {
    pub config: AppConfig,
    pub source: Arc<BinanceMarketData>,
    pub store: Option<Arc<dyn SnapshotStore>>,
}

impl AppContext {
    /// Loads configuration, builds the Binance source and connects the store
    /// when a database URL is configured.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be parsed, the HTTP client
    /// cannot be built, or a configured database is unreachable.
    pub async fn init(args: &GlobalArgs) -> Result<Self> {
        let mut config = match &args.profile {
            Some(profile) => ConfigLoader::load_with_profile(&args.config, profile)?,
            None => ConfigLoader::load_from(&args.config)?,
        };
        if let Some(url) = &args.db_url {
            config.database.url = Some(url.clone());
        }

        let source = Arc::new(
            BinanceMarketData::new(&config.binance).context("Failed to create Binance source")?,
        );

        let store: Option<Arc<dyn SnapshotStore>> = match config.database.url {
            Some(_) => {
                let client = DatabaseClient::connect(&config.database).await?;
                client.ensure_schema().await?;
                tracing::info!("Connected to database");
                Some(Arc::new(PgSnapshotStore::new(&client)))
            }
            None => {
                tracing::debug!("No database configured; persistence disabled");
                None
            }
        };

        Ok(Self {
            config,
            source,
            store,
        })
    }

    #[must_use]
    pub fn store_ref(&self) -> Option<&dyn SnapshotStore> {
        self.store.as_deref()
    }
}
