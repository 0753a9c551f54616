use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::info;

use epg_grid_lib::{
    guide::{now_and_next, progress, InstantParser},
    init_logging, settings, ApplyOutcome, Grid, GuideCache, GuideEntry, GuideSession,
    SettingsStore,
};

#[derive(Parser)]
#[command(name = "epg-grid")]
#[command(about = "Replay EPG guide fetches through the grid merge and warm-start cache", long_about = None)]
struct Cli {
    /// Data directory (defaults to $EPG_GRID_DATA_DIR or the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge guide fetch files, in order, into the cached guide
    Replay {
        /// JSON guide responses, applied in the order given
        files: Vec<PathBuf>,
        /// Ignore the cache and start from an empty guide
        #[arg(long)]
        cold: bool,
        /// Always take the incoming window start
        #[arg(long)]
        no_preserve: bool,
        /// Instant used for the now/next listing (defaults to now)
        #[arg(long)]
        at: Option<String>,
    },
    /// Inspect or reset the warm-start cache
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
    /// Remember the selected channel
    Select { channel_id: String },
}

#[derive(Subcommand)]
enum CacheCommands {
    Show,
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(settings::data_dir);
    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;
    let guide_settings = settings_store.guide();
    let config = guide_settings.reconcile_config();
    let cache = GuideCache::open(data_dir.join(&guide_settings.cache_file_name))?;

    match cli.command {
        Commands::Replay {
            files,
            cold,
            no_preserve,
            at,
        } => {
            let at = match at {
                Some(raw) => config.parser.parse(&raw).with_context(|| format!("invalid --at '{raw}'"))?,
                None => Utc::now(),
            };
            let preserve = guide_settings.preserve_existing_window && !no_preserve;
            let session = GuideSession::new(cache, config.clone(), preserve);

            if cold {
                session.cache().clear().await;
            } else {
                session.warm_start().await;
            }

            for path in &files {
                let grid = read_grid(path)?;
                let ticket = session.begin_fetch().await;
                let outcome = session.apply_fetch(&ticket, grid).await;
                info!(
                    "{}: {}",
                    path.display(),
                    match outcome {
                        ApplyOutcome::Replaced(_) => "merged",
                        ApplyOutcome::Unchanged => "no change",
                        ApplyOutcome::Stale => "stale, dropped",
                    }
                );
            }

            match session.current().await {
                Some(grid) => print_grid(&grid, at, &config.parser),
                None => println!("No guide data."),
            }
        }
        Commands::Cache { action } => match action {
            CacheCommands::Show => match cache.load().await {
                Some(payload) => {
                    println!("Cache file: {}", cache.path().display());
                    if let Some(saved_at) = payload.saved_at() {
                        println!("Saved at: {}", saved_at.to_rfc3339());
                    }
                    println!(
                        "Provider: {}",
                        payload.provider_id.as_deref().unwrap_or("-")
                    );
                    println!("Channels: {}", payload.channels.len());
                    println!(
                        "Selected: {}",
                        payload.selected_channel_id.as_deref().unwrap_or("-")
                    );
                    match payload.epg {
                        Some(grid) => print_grid(&grid, Utc::now(), &config.parser),
                        None => println!("No guide data."),
                    }
                }
                None => println!("No cached guide at {}", cache.path().display()),
            },
            CacheCommands::Clear => {
                cache.clear().await;
                println!("Cleared {}", cache.path().display());
            }
        },
        Commands::Select { channel_id } => {
            let session = GuideSession::new(
                cache,
                config,
                guide_settings.preserve_existing_window,
            );
            session.warm_start().await;
            session.select_channel(channel_id.clone()).await;
            println!("Selected {channel_id}");
        }
    }

    Ok(())
}

fn read_grid(path: &Path) -> Result<Grid> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn print_grid(grid: &Grid, at: DateTime<Utc>, parser: &InstantParser) {
    println!(
        "Window: {} .. {} ({} min), {} channels",
        grid.window.start.to_rfc3339(),
        grid.window.end.to_rfc3339(),
        grid.window.duration_minutes(),
        grid.count
    );

    for entry in &grid.items {
        println!("{}", listing_line(entry, at, parser));
    }
}

fn listing_line(entry: &GuideEntry, at: DateTime<Utc>, parser: &InstantParser) -> String {
    let listing = now_and_next(entry, at, parser);
    let now = listing
        .now
        .map(|program| {
            let pct = progress(program, at, parser).unwrap_or(0.0) * 100.0;
            format!("{} ({pct:.0}%)", program.title)
        })
        .unwrap_or_else(|| "-".into());
    let next = listing
        .next
        .map(|program| program.title.clone())
        .unwrap_or_else(|| "-".into());
    format!("- [{}] {}: now {now}, next {next}", entry.channel_id, entry.name)
}
