mod cli;

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use dugout_catalog::{
    CatalogHandle, CatalogRefresher, CatalogSeed, CatalogStore, EntityCatalog, QueryExecutor,
    RefreshOutcome,
};
use dugout_core::config::{load_dotenv, Config};
use dugout_engine::Answerer;
use dugout_llm::LlmIntentClassifier;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::cli::{CatalogAction, CliArgs, Command};

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = Config::from_env();
    config.log_summary();

    match args.command {
        Command::Ask { utterance, trace } => {
            let answerer = build_answerer(&config, args.reference_date).await?;
            match utterance {
                Some(u) => ask(&answerer, &u, trace).await?,
                None => {
                    let mut lines = BufReader::new(tokio::io::stdin()).lines();
                    while let Some(line) = lines.next_line().await? {
                        let line = line.trim();
                        if !line.is_empty() {
                            ask(&answerer, line, trace).await?;
                        }
                    }
                }
            }
        }
        Command::Catalog { action } => match action {
            CatalogAction::Rebuild => rebuild_catalog(&config).await?,
            CatalogAction::Show { entries } => show_catalog(&config, entries)?,
        },
    }

    Ok(())
}

async fn ask(answerer: &Answerer, utterance: &str, trace: bool) -> Result<()> {
    if trace {
        let detailed = answerer.answer_detailed(utterance).await;
        println!("{}", serde_json::to_string_pretty(&detailed)?);
        println!("{}", detailed.answer);
    } else {
        println!("{}", answerer.answer(utterance).await);
    }
    Ok(())
}

fn refresher(config: &Config, store: Arc<dyn dugout_catalog::StatsStore>) -> Result<CatalogRefresher> {
    let seed = CatalogSeed::load(config.catalog.seed_path.as_deref())
        .context("failed to load catalog seed")?;
    let persistence = CatalogStore::new(config.catalog.store_dir())
        .context("failed to open catalog directory")?;
    Ok(CatalogRefresher::new(seed, store, config.engine.store_timeout()).with_persistence(persistence))
}

/// Start from the persisted catalog when there is one, then refresh from
/// the store. A failed refresh keeps whatever was loaded.
async fn build_answerer(
    config: &Config,
    reference_date: Option<chrono::NaiveDate>,
) -> Result<Answerer> {
    let store = dugout_storage::create_store(config).context("failed to open stats store")?;
    let refresher = refresher(config, store.clone())?;

    let persisted = CatalogStore::new(config.catalog.store_dir())
        .ok()
        .and_then(|s| match s.load_current() {
            Ok(catalog) => catalog,
            Err(e) => {
                warn!("Ignoring persisted catalog: {}", e);
                None
            }
        });
    let handle = Arc::new(CatalogHandle::new(persisted.unwrap_or_else(EntityCatalog::empty)));
    match refresher.refresh(&handle).await {
        Ok(outcome) => info!("Catalog ready: {}", describe(&outcome)),
        Err(e) => warn!("Catalog refresh failed, answering with version {}: {}", handle.version(), e),
    }

    let executor = QueryExecutor::new(store, config.engine.store_timeout());
    let mut answerer = Answerer::new(handle, executor, &config.engine);

    if config.llm.fallback_enabled {
        match LlmIntentClassifier::from_config(config) {
            Ok(classifier) => answerer = answerer.with_fallback(Arc::new(classifier)),
            Err(e) => warn!("Intent fallback disabled: {}", e),
        }
    }
    if let Some(date) = reference_date {
        answerer = answerer.with_reference_date(date);
    }
    Ok(answerer)
}

async fn rebuild_catalog(config: &Config) -> Result<()> {
    let store = dugout_storage::create_store(config).context("failed to open stats store")?;
    let refresher = refresher(config, store)?;

    let persisted = CatalogStore::new(config.catalog.store_dir())?.load_current()?;
    let handle = CatalogHandle::new(persisted.unwrap_or_else(EntityCatalog::empty));
    let outcome = refresher.refresh(&handle).await.context("catalog rebuild failed")?;
    println!("{}", describe(&outcome));
    Ok(())
}

fn show_catalog(config: &Config, entries: bool) -> Result<()> {
    let persistence = CatalogStore::new(config.catalog.store_dir())?;
    let Some(catalog) = persistence.load_current()? else {
        println!("No catalog at {}. Run `dugout catalog rebuild` first.", persistence.base_dir().display());
        return Ok(());
    };

    println!("version:  {}", catalog.version);
    println!("built at: {}", catalog.built_at);

    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for entry in &catalog.entries {
        *counts.entry(entry.kind.to_string()).or_default() += 1;
    }
    for (kind, n) in &counts {
        println!("{:<9} {}", kind, n);
    }

    if entries {
        for entry in &catalog.entries {
            println!(
                "{}\t{}\t{}\t{}",
                entry.kind,
                entry.canonical_id,
                entry.display_name,
                entry.aliases.join(", ")
            );
        }
    }
    Ok(())
}

fn describe(outcome: &RefreshOutcome) -> String {
    match outcome {
        RefreshOutcome::Unchanged { version } => format!("unchanged ({})", version),
        RefreshOutcome::Replaced { version, entries } => {
            format!("replaced with {} ({} entries)", version, entries)
        }
    }
}
