mod cli;

use reelmerge::{
    config,
    policy::PolicyRegistry,
    providers::{FetcherRegistry, StaticFetcher},
    source::{RawValue, SourceRecord},
    store::{CanonicalStore, SqliteStore},
    worker::{KeyOutcome, PassReport, ReconcileJob, ReconcilePass},
};
use reelmerge_common::{ContentKey, MediaKind};
use reelmerge_db::pool::init_pool;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelmerge=trace,reelmerge_db=debug,reelmerge_common=debug".to_string()
        } else {
            "reelmerge=info,reelmerge_db=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Reconcile {
            input,
            dry_run,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(reconcile_file(&input, cli.config.as_deref(), dry_run, json))
        }
        Commands::Fetch {
            key,
            title,
            kind,
            dry_run,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(fetch_key(
                &key,
                &title,
                kind,
                cli.config.as_deref(),
                dry_run,
                json,
            ))
        }
        Commands::Show { key, history } => show_record(&key, cli.config.as_deref(), history),
        Commands::Normalize { field, value } => normalize_value(&field, &value, cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("reelmerge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn open_store(config: &config::Config) -> Result<Arc<SqliteStore>> {
    let db_path = shellexpand::tilde(&config.database.path.to_string_lossy()).into_owned();
    tracing::debug!("Opening database at {}", db_path);
    let pool = init_pool(&db_path).with_context(|| format!("Failed to open database {db_path}"))?;
    Ok(Arc::new(SqliteStore::new(pool)))
}

async fn reconcile_file(
    input: &Path,
    config_path: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {:?}", input))?;
    let records: Vec<SourceRecord> =
        serde_json::from_str(&content).with_context(|| format!("Invalid source records in {:?}", input))?;

    // One job per content key, in first-seen order.
    let mut jobs: Vec<ReconcileJob> = Vec::new();
    for record in &records {
        if !jobs.iter().any(|j| j.content_key == record.content_key) {
            jobs.push(ReconcileJob::new(record.content_key.clone(), MediaKind::default()));
        }
    }
    tracing::info!(records = records.len(), keys = jobs.len(), "Loaded source records");

    let mut fetchers = FetcherRegistry::new();
    for fetcher in StaticFetcher::from_records(records) {
        fetchers.register(Arc::new(fetcher));
    }

    let policy = PolicyRegistry::from_config(&config.merge)?;
    let pass = ReconcilePass::new(policy, fetchers, open_store(&config)?)
        .with_concurrency(config.worker.concurrency)
        .dry_run(dry_run);

    let report = pass.run(jobs).await;
    print_report(&report, json)
}

async fn fetch_key(
    key: &str,
    title: &str,
    kind: MediaKind,
    config_path: Option<&Path>,
    dry_run: bool,
    json: bool,
) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let pass = ReconcilePass::from_config(&config, open_store(&config)?)?.dry_run(dry_run);

    let report = pass
        .run(vec![ReconcileJob::new(key, kind).with_title(title)])
        .await;
    print_report(&report, json)
}

fn print_report(report: &PassReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for key in &report.keys {
        match &key.outcome {
            KeyOutcome::Applied { fields } => {
                println!("{}: {} field(s): {}", key.content_key, fields.len(), fields.join(", "))
            }
            KeyOutcome::Unchanged => println!("{}: unchanged", key.content_key),
            KeyOutcome::Failed { error } => println!("{}: FAILED: {}", key.content_key, error),
        }
    }

    println!();
    if report.dry_run {
        println!("[DRY RUN] Nothing was written");
    }
    println!(
        "Applied: {}  Unchanged: {}  Failed: {}",
        report.applied(),
        report.unchanged(),
        report.failed()
    );

    if report.failed() > 0 {
        anyhow::bail!("{} key(s) failed", report.failed());
    }
    Ok(())
}

fn show_record(key: &str, config_path: Option<&Path>, history: bool) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let store = open_store(&config)?;
    let key = ContentKey::new(key);

    let Some(record) = store.get(&key)? else {
        anyhow::bail!("No canonical record for {}", key);
    };

    println!("Content key: {}", record.content_key);
    println!("Created: {}", record.created_at);
    println!("Updated: {}", record.last_updated_at);
    println!();
    for (field, value) in &record.fields {
        match record.source_of(field) {
            Some(provider) => println!("  {field:<12} {value}  [{provider}]"),
            None => println!("  {field:<12} {value}"),
        }
    }

    if history {
        println!("\nHistory:");
        for entry in store.history(&key)? {
            println!(
                "  {} {} {:?} -> {:?} ({})",
                entry.applied_at.format("%Y-%m-%d %H:%M:%S"),
                entry.field,
                entry.old_value.unwrap_or_default(),
                entry.new_value,
                entry.source.map(|p| p.to_string()).unwrap_or_else(|| "merged".into()),
            );
        }
    }

    Ok(())
}

fn normalize_value(field: &str, value: &str, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let registry = PolicyRegistry::from_config(&config.merge)?;

    let normalized = registry.normalize(field, &RawValue::from(value))?;
    if normalized.is_empty() {
        println!("(empty)");
    } else {
        println!("{}", normalized.value);
    }
    tracing::debug!(quality = ?normalized.quality, "Normalized");

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            println!("  Database: {}", config.database.path.display());
            println!("  Concurrency: {}", config.worker.concurrency);
            println!("  TMDB enabled: {}", config.providers.tmdb_api_key.is_some());
            println!("  OMDb enabled: {}", config.providers.omdb_api_key.is_some());
            println!("  Field overrides: {}", config.merge.fields.len());
            println!("  Trusted domain overrides: {}", config.merge.trusted_domains.len());
        }
        None => {
            println!("No config file specified, using defaults");
            let config = config::Config::default();
            let registry = PolicyRegistry::default();
            println!("Default config:");
            println!("  Database: {}", config.database.path.display());
            println!("  Fields: {}", registry.len());
        }
    }

    Ok(())
}
