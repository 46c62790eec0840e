//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::SdkConfig;
use crate::error::{Error, Result};
use crate::pagination::{CursorPaginator, StorageKey};
use crate::rpc::RpcClient;
use crate::storage::StorageMap;
use crate::types::to_hex;
use futures::TryStreamExt;
use serde_json::{json, Value};
use std::io::{Stdout, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::info;

/// A collection resolved from the command line
#[derive(Debug, Clone)]
pub struct Target {
    /// Collection name (or the prefix itself for ad-hoc scans)
    pub name: String,
    /// Hashed storage prefix
    pub prefix: StorageKey,
    /// Paginator to scan with
    pub paginator: CursorPaginator,
}

/// CLI runner, writing one JSON document per line to `W`
pub struct Runner<W = Stdout> {
    cli: Cli,
    out: Mutex<W>,
}

impl Runner {
    /// Create a runner printing to stdout
    pub fn new(cli: Cli) -> Self {
        Self::with_writer(cli, std::io::stdout())
    }
}

impl<W: Write> Runner<W> {
    /// Create a runner printing to `out`
    pub fn with_writer(cli: Cli, out: W) -> Self {
        Self {
            cli,
            out: Mutex::new(out),
        }
    }

    /// Consume the runner, returning its writer
    pub fn into_writer(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Collections => self.collections(),
            Commands::Keys {
                collection,
                page_size,
            } => self.keys(collection, *page_size).await,
            Commands::Entries {
                collection,
                page_size,
                limit,
            } => self.entries(collection, *page_size, *limit).await,
            Commands::Count {
                collection,
                page_size,
            } => self.count(collection, *page_size).await,
        }
    }

    /// Load the config file, applying `--endpoint`
    pub fn load_config(&self) -> Result<SdkConfig> {
        let mut config = match (&self.cli.config, &self.cli.endpoint) {
            (Some(path), _) => SdkConfig::from_file(path)?,
            (None, Some(endpoint)) => SdkConfig::new(endpoint.clone()),
            (None, None) => {
                return Err(Error::config(
                    "No configuration given (use -c <file> or --endpoint <url>)",
                ))
            }
        };

        if let Some(endpoint) = &self.cli.endpoint {
            config.endpoint.clone_from(endpoint);
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolve a collection name or hex prefix and its page size
    pub fn resolve(
        &self,
        config: &SdkConfig,
        collection: &str,
        page_size: Option<i64>,
    ) -> Result<Target> {
        let (prefix, default_page_size) = match config.collection(collection) {
            Ok(c) => (c.prefix()?, config.page_size_for(collection)?),
            Err(_) if collection.starts_with("0x") => {
                (StorageKey::from_hex(collection)?, config.page_size)
            }
            Err(e) => return Err(e),
        };

        let paginator = CursorPaginator::try_from_signed(page_size.unwrap_or(default_page_size))?
            .with_exhaustion(config.exhaustion);

        Ok(Target {
            name: collection.to_string(),
            prefix,
            paginator,
        })
    }

    /// Build the storage map for `target`, pinned if requested
    async fn open(&self, config: &SdkConfig, target: &Target) -> Result<StorageMap> {
        let client = Arc::new(RpcClient::new(config.rpc_client_config())?);
        let map = StorageMap::new(client.clone(), &target.name, target.prefix.clone());

        let at = match (&self.cli.at, self.cli.finalized) {
            (Some(at), _) => Some(at.clone()),
            (None, true) => Some(client.finalized_head().await?),
            (None, false) => None,
        };

        Ok(match at {
            Some(at) => {
                info!("Reading {} at block {at}", target.name);
                map.pinned(at)
            }
            None => map,
        })
    }

    /// List configured collections
    fn collections(&self) -> Result<()> {
        let config = self.load_config()?;
        for collection in &config.collections {
            self.output_message(&json!({
                "name": collection.name,
                "prefix": collection.prefix,
                "page_size": collection.page_size.unwrap_or(config.page_size),
                "description": collection.description,
            }))?;
        }
        Ok(())
    }

    /// Print keys page by page
    async fn keys(&self, collection: &str, page_size: Option<i64>) -> Result<()> {
        let config = self.load_config()?;
        let target = self.resolve(&config, collection, page_size)?;
        let map = self.open(&config, &target).await?;

        let mut pages = Box::pin(target.paginator.paginate(&map));
        let mut page_number = 0u64;
        while let Some(page) = pages.try_next().await? {
            page_number += 1;
            let keys: Vec<String> = page.keys().map(StorageKey::to_hex).collect();
            self.output_message(&json!({ "page": page_number, "keys": keys }))?;
        }
        Ok(())
    }

    /// Print entries, stopping early at `limit`
    async fn entries(
        &self,
        collection: &str,
        page_size: Option<i64>,
        limit: Option<usize>,
    ) -> Result<()> {
        let config = self.load_config()?;
        let target = self.resolve(&config, collection, page_size)?;
        let map = self.open(&config, &target).await?;

        let start = Instant::now();
        let mut printed = 0usize;
        let mut pages = Box::pin(target.paginator.paginate(&map));

        // The next page is only requested while the limit is unmet
        while limit.map_or(true, |limit| printed < limit) {
            let Some(page) = pages.try_next().await? else {
                break;
            };
            let room = limit.map_or(usize::MAX, |limit| limit - printed);
            for (key, value) in page.into_iter().take(room) {
                self.output_message(&json!({
                    "key": key.to_hex(),
                    "value": to_hex(&value),
                }))?;
                printed += 1;
            }
        }

        info!(
            "Printed {printed} entries of {} in {:?}",
            target.name,
            start.elapsed()
        );
        Ok(())
    }

    /// Print entry and page totals
    async fn count(&self, collection: &str, page_size: Option<i64>) -> Result<()> {
        let config = self.load_config()?;
        let target = self.resolve(&config, collection, page_size)?;
        let map = self.open(&config, &target).await?;

        let start = Instant::now();
        let (pages, entries) = target
            .paginator
            .paginate(&map)
            .try_fold((0u64, 0usize), |(pages, entries), page| async move {
                Ok::<_, Error>((pages + 1, entries + page.len()))
            })
            .await?;

        info!("Counted {} in {:?}", target.name, start.elapsed());
        self.output_message(&json!({
            "collection": target.name,
            "entries": entries,
            "pages": pages,
        }))
    }

    /// Output a JSON message
    fn output_message(&self, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(out, "{line}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    const CONFIG: &str = "endpoint: http://127.0.0.1:9933\npage_size: 20\ncollections:\n  - name: vault_registry\n    prefix: \"0x01aa\"\n    page_size: 5\n";

    fn runner(args: &[&str]) -> Runner {
        Runner::new(Cli::try_parse_from(args).unwrap())
    }

    #[test]
    fn test_resolve_named_collection() {
        let config = SdkConfig::from_yaml(CONFIG).unwrap();
        let runner = runner(&["bridge-sdk", "count", "vault_registry"]);

        let target = runner.resolve(&config, "vault_registry", None).unwrap();
        assert_eq!(target.prefix, StorageKey::new(vec![0x01, 0xaa]));
        assert_eq!(target.paginator.page_size(), 5);

        let target = runner.resolve(&config, "vault_registry", Some(7)).unwrap();
        assert_eq!(target.paginator.page_size(), 7);
    }

    #[test]
    fn test_resolve_hex_prefix() {
        let config = SdkConfig::from_yaml(CONFIG).unwrap();
        let runner = runner(&["bridge-sdk", "keys", "0xbeef"]);

        let target = runner.resolve(&config, "0xbeef", None).unwrap();
        assert_eq!(target.prefix, StorageKey::new(vec![0xbe, 0xef]));
        assert_eq!(target.paginator.page_size(), 20);
    }

    #[test]
    fn test_resolve_rejects_negative_page_size() {
        let config = SdkConfig::from_yaml(CONFIG).unwrap();
        let runner = runner(&["bridge-sdk", "keys", "vault_registry", "--page-size", "-2"]);

        let err = runner.resolve(&config, "vault_registry", Some(-2)).unwrap_err();
        assert!(matches!(err, Error::InvalidPageSize { page_size: -2 }));
    }

    #[test]
    fn test_resolve_unknown_collection() {
        let config = SdkConfig::from_yaml(CONFIG).unwrap();
        let runner = runner(&["bridge-sdk", "count", "redeem_requests"]);

        let err = runner.resolve(&config, "redeem_requests", None).unwrap_err();
        assert!(matches!(err, Error::CollectionNotFound { .. }));
    }

    #[test]
    fn test_load_config_requires_source() {
        let err = runner(&["bridge-sdk", "collections"]).load_config().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));

        let config = runner(&["bridge-sdk", "--endpoint", "http://node:9933", "collections"])
            .load_config()
            .unwrap();
        assert_eq!(config.endpoint, "http://node:9933");
    }

    #[test]
    fn test_at_conflicts_with_finalized() {
        let parsed = Cli::try_parse_from([
            "bridge-sdk",
            "--at",
            "0x01",
            "--finalized",
            "count",
            "vaults",
        ]);
        assert!(parsed.is_err());
    }
}
