mod cli;
mod logging;

use clap::Parser;
use crate::cli::app::App;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabstore::{Command, Database, DbConfig, DbError, StorageMode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const DEFAULT_SCHEMA: &str = "schema.json";

#[derive(Parser, Debug)]
#[command(name = "tabstore", version, about = "Concurrent table store with a line-oriented command language")]
struct Cli {
    /// Directory holding table snapshots and CSV files
    #[arg(long, default_value = ".")]
    data_dir: PathBuf,

    /// Schema descriptor to bootstrap tables from (defaults to ./schema.json when present)
    #[arg(long)]
    schema: Option<PathBuf>,

    /// Keep everything in memory; nothing is written to disk
    #[arg(long)]
    in_memory: bool,

    /// Read commands line by line from stdin instead of the terminal UI
    #[arg(long)]
    plain: bool,

    /// Log filter, e.g. `info` or `tabstore=debug`
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn config(&self) -> DbConfig {
        let storage = if self.in_memory {
            StorageMode::Memory
        } else {
            StorageMode::File
        };
        let config = DbConfig::new().data_dir(&self.data_dir).storage(storage);

        match &self.schema {
            Some(path) => config.schema_path(path),
            None if Path::new(DEFAULT_SCHEMA).exists() => config.schema_path(DEFAULT_SCHEMA),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.plain {
        logging::init_stderr(&cli.log_level)?;
    } else {
        logging::init_file(&cli.log_level, &cli.data_dir)?;
    }

    let config = cli.config();
    let db = Arc::new(Database::new(config.build_persistence()));

    if let Some(path) = &config.schema_path {
        match db.bootstrap_from_path(path).await {
            Ok(report) => tracing::info!(
                created = report.created.len(),
                resumed = report.resumed.len(),
                skipped = report.skipped.len(),
                mismatched = report.mismatched.len(),
                "schema bootstrap finished"
            ),
            Err(DbError::FileNotFound(file)) => {
                tracing::warn!(%file, "schema file not found, starting empty")
            }
            Err(e) => tracing::error!(error = %e, "schema bootstrap failed, starting empty"),
        }
    }

    if cli.plain {
        run_plain(&db).await?;
    } else {
        let mut app = App::new(db);
        app.run().await.map_err(|e| anyhow::anyhow!("{}", e))?;
    }
    Ok(())
}

async fn run_plain(db: &Database) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"Enter command: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("Error: {}", e);
                continue;
            }
        };
        if let Command::Exit = command {
            break;
        }

        match db.execute_command(&command).await {
            Ok(result) if result.columns().is_empty() => {
                println!("{}", result.status().unwrap_or("OK"));
            }
            Ok(result) => {
                for line in result.lines() {
                    println!("{}", line);
                }
            }
            Err(e) => {
                if !e.is_command_error() {
                    tracing::error!(error = %e, "storage failure");
                }
                println!("Error: {}", e);
            }
        }
    }
    Ok(())
}
