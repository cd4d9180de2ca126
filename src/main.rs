//! Vault diagnostics CLI
//!
//! Usage:
//!   vault-diag                          Run the interactive debug console
//!   vault-diag emit ERROR Source "msg"  Push one entry through the pipeline
//!   vault-diag sync                     Replay buffered offline logs
//!   vault-diag export --format gz       Export stored error logs
//!   vault-diag status | clear | config

use anyhow::{Context, Result};
use clap::Parser;
use std::io;
use std::sync::Arc;
use tokio::sync::watch;
use vault_diagnostics::cli::{Cli, Command};
use vault_diagnostics::config::{self, Config};
use vault_diagnostics::connectivity::{default_interval, spawn_connectivity_monitor, HttpProbe};
use vault_diagnostics::console::{self, ConsoleOptions, DebugConsole};
use vault_diagnostics::emitter::ConsoleEmitter;
use vault_diagnostics::export::{self, ExportOptions};
use vault_diagnostics::logging::{self, Collaborators, LogOptions, LoggingService};
use vault_diagnostics::storage::{FileStorage, Storage};
use vault_diagnostics::ui;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli
        .command
        .clone()
        .unwrap_or(Command::Console { force: false });

    // Diagnostics on stderr would draw over the console
    if !matches!(command, Command::Console { .. }) {
        logging::init_tracing(cli.verbose);
    }

    let config = match &cli.config {
        Some(path) => config::load_from(path),
        None => config::load(),
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(command, config))
}

async fn run(command: Command, config: Config) -> Result<()> {
    let storage_dir = config.paths.storage_dir();
    let storage: Arc<dyn Storage> = Arc::new(
        FileStorage::open(&storage_dir)
            .with_context(|| format!("cannot open storage in {}", storage_dir.display()))?,
    );

    let interactive = matches!(command, Command::Console { .. });
    let mut collaborators =
        Collaborators::new(storage.clone()).runtime(Arc::new(config.runtime.clone()));
    if interactive {
        collaborators = collaborators.console(ConsoleEmitter::with_writer(
            config.logging.production,
            Box::new(io::sink()),
            false,
        ));
    }
    let service = LoggingService::new(config.logging.clone(), collaborators);

    match command {
        Command::Console { force } => run_console(&config, service.clone(), storage, force).await?,
        Command::Emit {
            level,
            source,
            message,
            code,
            data,
        } => {
            let mut options = LogOptions::new();
            if let Some(code) = code {
                options = options.code(code);
            }
            if let Some(data) = data {
                let value = serde_json::from_str(&data).context("--data is not valid JSON")?;
                options = options.data(value);
            }
            match service.log(level, &source, &message, options) {
                Some(entry) => println!("{}", serde_json::to_string_pretty(&entry)?),
                None => println!("Filtered out (below minimum level or excluded source)"),
            }
        }
        Command::Sync => {
            let report = service.sync_offline().await;
            println!("{}", report);
        }
        Command::Export {
            format,
            level,
            filename,
            out,
        } => {
            let options = ExportOptions {
                format,
                level,
                filename: filename.unwrap_or_else(|| config.debug_console.export_filename.clone()),
            };
            let artifact = service.export_stored(&options)?;
            let dir = out.unwrap_or_else(|| config.paths.export_dir.clone());
            let path = export::write_to(&dir, &artifact)?;
            println!("Exported {} entries to {}", artifact.count, path.display());
        }
        Command::Status => {
            println!("Stored errors:   {}", service.stored_count());
            println!("Offline buffer:  {}", service.offline_count());
            println!("Remote:          {}", service.remote_endpoints().join(", "));
            println!("Storage:         {}", storage_dir.display());
        }
        Command::Clear => {
            let count = service.stored_count();
            service.clear_stored_logs();
            println!("Cleared {} stored entries", count);
        }
        Command::Config => {
            if let Ok(path) = config::config_path() {
                println!("# {}", path.display());
            }
            print!("{}", config::to_toml(&config)?);
        }
    }

    // Let live deliveries finish and write out buffered file entries
    service.settle().await;
    service.flush_files()?;
    Ok(())
}

async fn run_console(
    config: &Config,
    service: LoggingService,
    storage: Arc<dyn Storage>,
    force: bool,
) -> Result<()> {
    let has_errors = service.stored_count() > 0;
    if !console::is_enabled(
        config.logging.production,
        has_errors,
        force || config.debug_console.force,
    ) {
        println!("Debug console is off in production until errors are stored (use --force)");
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor = match service.remote_endpoints().first() {
        Some(endpoint) if config.logging.emitters.remote => {
            let probe = HttpProbe::new(endpoint.clone())?;
            Some(spawn_connectivity_monitor(
                service.clone(),
                Box::new(probe),
                default_interval(),
                shutdown_rx,
            ))
        }
        _ => None,
    };

    let mut console = DebugConsole::open(
        service,
        storage,
        console::new_session_id(),
        ConsoleOptions::from_config(config),
    );
    let result = ui::run(&mut console).await;

    let _ = shutdown_tx.send(true);
    if let Some(monitor) = monitor {
        let _ = monitor.await;
    }
    result.map_err(Into::into)
}
