use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_connections: u32,
    /// Cross-chain id of the indexed ledger. Recorded on mirrored objects.
    pub source_chain_id: Option<u32>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Storage-module bucket and object indexer")]
pub struct Args {
    /// Host to bind to (overrides INDEXER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides INDEXER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides INDEXER_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Connection pool size (overrides INDEXER_MAX_CONNECTIONS)
    #[arg(long)]
    pub max_connections: Option<u32>,

    /// Cross-chain id of the indexed ledger (overrides INDEXER_SOURCE_CHAIN_ID)
    #[arg(long)]
    pub source_chain_id: Option<u32>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        let env_host = env::var("INDEXER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = env_parse("INDEXER_PORT")?.unwrap_or(3000);
        let env_db = env::var("INDEXER_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/indexer.db".into());
        let env_pool = env_parse("INDEXER_MAX_CONNECTIONS")?.unwrap_or(5);
        let env_chain = env_parse("INDEXER_SOURCE_CHAIN_ID")?;

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            database_url: args.database_url.unwrap_or(env_db),
            max_connections: args.max_connections.unwrap_or(env_pool),
            source_chain_id: args.source_chain_id.or(env_chain),
        };

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Read and parse an optional environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err).with_context(|| format!("reading {}", key)),
    }
}
