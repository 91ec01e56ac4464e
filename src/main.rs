// src/main.rs

use colored::*;
use log::{debug, info, warn};
use queueloader::cli::build_cli;
use queueloader::config::{prepare_destination, Settings};
use queueloader::{
    AppError, ConsolePresenter, QueueController, QueueEntry, QueueHandle, QueueStore,
    QueueSummary, YtDlpEngine,
};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

// Import env_logger for initialization
use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Initialize the logger with a custom format
    init_logger();
    info!("queueloader starting up - version {}", VERSION);

    let matches = build_cli().get_matches();

    let mut settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!("Could not load saved settings, using defaults: {}", e);
            Settings::default()
        }
    };
    settings.apply_overrides(
        matches.get_one::<String>("output-dir").map(String::as_str),
        matches.get_one::<String>("ytdlp").map(String::as_str),
        matches.get_one::<u64>("timeout").copied(),
    );
    debug!("Effective settings: {:?}", settings);

    if matches.get_flag("save-settings") {
        settings.save()?;
    }

    let engine = YtDlpEngine::new(settings.ytdlp_path.clone());
    match engine.probe().await {
        Ok(version) => info!("Using {} {}", engine.program(), version),
        Err(e) => {
            warn!("Download engine check failed: {}", e);
            eprintln!(
                "{}: {}. Downloads will fail until yt-dlp is installed.",
                "Warning".yellow(),
                e
            );
        }
    }

    let destination = match &settings.destination {
        Some(dir) => Some(prepare_destination(dir)?),
        None => None,
    };
    if destination.is_none() {
        println!(
            "{}",
            "No destination folder selected. Use --output-dir or the 'folder' command.".yellow()
        );
    }

    let store = QueueStore::new(Box::new(ConsolePresenter::new())).with_destination(destination);
    let queue = QueueController::new(store, Arc::new(engine))
        .with_timeout(settings.download_timeout())
        .spawn();

    let urls: Vec<String> = matches
        .get_many::<String>("urls")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let interactive = matches.get_flag("interactive") || urls.is_empty();

    let queued = queue.submit_all(&urls).await?;
    if !interactive && !urls.is_empty() && queued == 0 {
        queue.shutdown()?;
        return Err(AppError::ValidationError(format!(
            "None of the {} given URLs were queued",
            urls.len()
        )));
    }

    if interactive {
        run_interactive(&queue).await?;
    }

    queue.wait_until_idle().await?;
    let entries = queue.entries().await?;
    let summary = queue.summary().await?;
    queue.shutdown()?;

    print_queue(&entries);
    print_summary(&summary);

    if summary.failed > 0 {
        return Err(AppError::General(format!(
            "{} of {} downloads failed",
            summary.failed,
            summary.total()
        )));
    }

    Ok(())
}

/// Line-oriented front end: each line is a URL or a command
async fn run_interactive(queue: &QueueHandle) -> Result<(), AppError> {
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, argument) = line
            .split_once(char::is_whitespace)
            .map(|(command, rest)| (command, rest.trim()))
            .unwrap_or((line, ""));

        match command {
            "quit" | "exit" => break,
            "help" => print_help(),
            "list" => print_queue(&queue.entries().await?),
            "folder" => {
                if argument.is_empty() {
                    println!("{}", "Usage: folder <path>".yellow());
                    continue;
                }
                match prepare_destination(Path::new(argument)) {
                    Ok(dir) => queue.set_destination(dir)?,
                    Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
                }
            }
            _ => {
                queue.submit_all([line]).await?;
            }
        }
    }

    info!("Input closed, waiting for the queue to finish");
    Ok(())
}

fn print_help() {
    println!("{}", "Paste a video URL and press Enter to queue it.".bright_cyan());
    println!("  folder <path>  choose the destination folder");
    println!("  list           show the queue");
    println!("  quit           wait for the queue to finish and exit");
}

fn print_queue(entries: &[QueueEntry]) {
    if entries.is_empty() {
        println!("{}", "No downloads in queue.".blue());
        return;
    }

    println!("{}", "Download Queue:".bright_cyan().bold());
    println!("{}", "-".repeat(80));
    println!("{:<6} {:<45} {:<17} {:<12}", "#", "URL", "Status", "Added");
    println!("{}", "-".repeat(80));

    for entry in entries {
        let url_display = if entry.url.chars().count() > 43 {
            format!("{}...", entry.url.chars().take(40).collect::<String>())
        } else {
            entry.url.clone()
        };
        println!(
            "{:<6} {:<45} {:<17} {:<12}",
            format!("{}.", entry.index),
            url_display,
            entry.status.display_text(),
            entry.added_at.with_timezone(&chrono::Local).format("%H:%M:%S").to_string()
        );
    }
    println!("{}", "-".repeat(80));
}

fn print_summary(summary: &QueueSummary) {
    let line = format!(
        "Completed: {} | Failed: {} | Total: {}",
        summary.completed,
        summary.failed,
        summary.total()
    );
    if summary.failed > 0 {
        println!("{}", line.yellow());
    } else {
        println!("{}", line.green());
    }
}

/// Initialize the logger with a custom format and configuration
fn init_logger() {
    let mut builder = Builder::from_default_env();

    // Set the default level based on debug/release mode
    if cfg!(debug_assertions) {
        builder.filter_level(LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Info);
    }

    // Define a custom format with timestamp, level, module, and message
    builder.format(|buf, record| {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        writeln!(
            buf,
            "[{} {} {}] {}",
            timestamp,
            record.level().to_string().to_uppercase(),
            record.module_path().unwrap_or("unknown"),
            record.args()
        )
    });

    // Allow override through RUST_LOG environment variable
    builder.parse_env("RUST_LOG");

    builder.init();
}
