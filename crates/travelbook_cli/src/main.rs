//! travelbook command-line entry point.
//!
//! # Responsibility
//! - Open the record store for a data directory and run one maintenance
//!   command against it.
//! - Keep stdout machine-readable: records and snapshots print as JSON,
//!   diagnostics go to stderr and the log file.

mod cli;

use clap::Parser;
use cli::{CliArgs, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use travelbook_core::{
    ensure_id, export_json, import_json, init_logging, ExpiryScanner, ExpiryScheduler, ImportOptions,
    RecordStore, ScanConfig, StoreConfig,
};

fn main() -> ExitCode {
    let args = CliArgs::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("travelbook: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: CliArgs) -> Result<(), String> {
    let data_dir = absolute_dir(&args.resolve_data_dir())?;
    let log_dir = data_dir.join("logs");
    init_logging(&args.resolve_log_level(), &log_dir.to_string_lossy())?;

    let config = if args.fallback {
        StoreConfig::fallback_only(&data_dir)
    } else {
        StoreConfig::for_data_dir(&data_dir).with_env_overrides()
    };
    let store = RecordStore::open(&config).map_err(|err| err.to_string())?;
    log::info!(
        "event=cli_start module=cli status=ok backend={} data_dir={}",
        store.backend_kind().as_str(),
        data_dir.display()
    );

    match args.command {
        Command::Count { collection } => {
            let count = store.count(collection).map_err(|err| err.to_string())?;
            println!("{count}");
        }
        Command::List { collection } => {
            for row in store.get_all(collection).map_err(|err| err.to_string())? {
                println!("{row}");
            }
        }
        Command::Add { collection, record } => {
            let record = serde_json::from_str(&record)
                .map_err(|err| format!("record is not valid JSON: {err}"))?;
            let id = store
                .add(collection, ensure_id(record))
                .map_err(|err| err.to_string())?;
            println!("{id}");
        }
        Command::Delete { collection, id } => {
            let removed = store.delete(collection, &id).map_err(|err| err.to_string())?;
            if !removed {
                eprintln!("no record `{id}` in {collection}");
            }
        }
        Command::Export { out } => {
            let json = export_json(&store).map_err(|err| err.to_string())?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .map_err(|err| format!("cannot write {}: {err}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Command::Import { file, replace } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|err| format!("cannot read {}: {err}", file.display()))?;
            let report = import_json(&store, &raw, ImportOptions { merge: !replace })
                .map_err(|err| err.to_string())?;
            for rejected in &report.rejected {
                eprintln!(
                    "rejected {} {}: {}",
                    rejected.collection,
                    rejected.id.as_deref().unwrap_or("<no id>"),
                    rejected.reason
                );
            }
            for name in &report.skipped_collections {
                eprintln!("skipped `{name}`");
            }
            println!("{}", report.inserted);
        }
        Command::Scan => {
            let config = ScanConfig::default();
            let report = ExpiryScanner::new(&store, &config)
                .scan()
                .map_err(|err| err.to_string())?;
            println!(
                "scanned={} skipped={} candidates={} inserted={}",
                report.scanned, report.skipped, report.candidates, report.inserted
            );
        }
        Command::Watch { interval_secs } => {
            let config = ScanConfig {
                interval: Duration::from_secs(interval_secs.max(1)),
                ..ScanConfig::default()
            };
            watch(Arc::new(store), config)?;
        }
    }
    Ok(())
}

fn watch(store: Arc<RecordStore>, config: ScanConfig) -> Result<(), String> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| format!("cannot start runtime: {err}"))?;
    let scheduler = Arc::new(ExpiryScheduler::new(store, config));

    runtime.block_on(async {
        let runner = Arc::clone(&scheduler);
        let loop_task = async move { runner.run().await };
        tokio::pin!(loop_task);
        let interrupted = tokio::select! {
            _ = &mut loop_task => false,
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    log::warn!("event=watch_signal module=cli status=error error={err}");
                }
                true
            }
        };
        if interrupted {
            scheduler.shutdown();
            loop_task.await;
        }
    });

    eprintln!(
        "scheduler stopped after {} run(s), {} failed",
        scheduler.completed_runs(),
        scheduler.failed_runs()
    );
    Ok(())
}

fn absolute_dir(dir: &Path) -> Result<PathBuf, String> {
    std::fs::create_dir_all(dir)
        .map_err(|err| format!("cannot create {}: {err}", dir.display()))?;
    if dir.is_absolute() {
        return Ok(dir.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(dir))
        .map_err(|err| format!("cannot resolve {}: {err}", dir.display()))
}
