//! Kart Optimizer CLI - command-line front end for kartopt-core.
//!
//! Loads the dataset and images through the shared cache, runs searches and
//! manages options and saved filters.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use futures::StreamExt;
use kartopt_core::config::SearchConfig;
use kartopt_core::{
    Category, Direction, FilterInputs, GameData, KartOpt, OptimizerFilter, Options, SaveData, Selection, StatAxis,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "kartopt")]
#[command(about = "Find the best kart builds")]
struct Args {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Data directory (defaults to ~/.mkopt, or %APPDATA%\MariokartOptimizer)
    #[arg(long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the dataset and summarize it
    Data {
        /// Also list this character's rivals
        #[arg(long)]
        rivals: Option<String>,
    },
    /// Fetch a component image
    Image {
        /// Image name, e.g. "Mario.webp"
        name: String,
    },
    /// Search for the best builds
    Search {
        /// Start from a saved filter
        #[arg(long)]
        save: Option<String>,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Show or change options
    Options {
        /// In-memory image cache budget in bytes
        #[arg(long)]
        memory_cache_bytes: Option<u64>,

        /// Mirror downloads to the cache directory
        #[arg(long)]
        disk_cache: Option<bool>,

        #[arg(long)]
        locale: Option<String>,
    },
    /// Manage saved filters
    #[command(subcommand)]
    Saves(SavesCommand),
}

#[derive(Subcommand, Debug)]
enum SavesCommand {
    /// List saves, newest first
    List,
    /// Save a filter
    Create {
        name: String,

        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Delete a save
    Delete { name: String },
}

#[derive(ClapArgs, Debug, Default)]
struct FilterArgs {
    /// Axis to maximize (e.g. landSpeed, miniTurbo); repeatable
    #[arg(long)]
    maximize: Vec<StatAxis>,

    /// Axis to minimize; repeatable
    #[arg(long)]
    minimize: Vec<StatAxis>,

    /// Bounds as AXIS=MIN:MAX (default 0.75:5.75); a blank side clears
    /// that bound; repeatable
    #[arg(long, value_parser = parse_range)]
    range: Vec<(StatAxis, Option<f32>, Option<f32>)>,

    /// Component name to leave out of the search; repeatable
    #[arg(long)]
    exclude: Vec<String>,
}

impl FilterArgs {
    /// Apply these arguments on top of `save`.
    ///
    /// Fails if a cleared bound leaves the filter incomplete.
    fn apply(&self, save: &mut SaveData) -> Result<()> {
        let mut inputs = FilterInputs::from(save.filter());
        for &(axis, min, max) in &self.range {
            inputs.min[axis.index()] = min;
            inputs.max[axis.index()] = max;
        }
        for &axis in &self.maximize {
            inputs.directions[axis.index()] = Some(Direction::Maximize);
        }
        for &axis in &self.minimize {
            inputs.directions[axis.index()] = Some(Direction::Minimize);
        }

        let filter = inputs.complete().ok_or_else(|| {
            let missing: Vec<&str> = inputs.missing().into_iter().map(StatAxis::key).collect();
            anyhow!("Filter is incomplete, set bounds for: {}", missing.join(", "))
        })?;

        let mut disallowed = save.disallowed.clone();
        disallowed.extend(self.exclude.iter().cloned());
        *save = SaveData::new(&filter, disallowed);
        Ok(())
    }
}

fn parse_bound(value: &str, which: &str) -> Result<Option<f32>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|e| format!("bad {}: {}", which, e))
}

fn parse_range(s: &str) -> Result<(StatAxis, Option<f32>, Option<f32>), String> {
    let (axis, bounds) = s.split_once('=').ok_or("expected AXIS=MIN:MAX")?;
    let (min, max) = bounds.split_once(':').ok_or("expected AXIS=MIN:MAX")?;
    let axis: StatAxis = axis.parse().map_err(|e| format!("{}", e))?;
    Ok((axis, parse_bound(min, "minimum")?, parse_bound(max, "maximum")?))
}

fn default_save() -> SaveData {
    SaveData::new(&OptimizerFilter::default(), BTreeSet::new())
}

fn group_label(data: &GameData, category: Category, index: usize) -> String {
    data.group_names(category)
        .get(index)
        .map(|names| names.join("/"))
        .unwrap_or_else(|| format!("#{}", index))
}

fn print_combination(data: &GameData, selection: &Selection) {
    println!(
        "{} | {} | {} | {}",
        group_label(data, Category::Character, selection.character),
        group_label(data, Category::Kart, selection.kart),
        group_label(data, Category::Wheel, selection.wheel),
        group_label(data, Category::Glider, selection.glider),
    );
    if let Some(total) = data.total(*selection) {
        let stats: Vec<String> = total
            .labelled_stats()
            .into_iter()
            .map(|(label, value)| format!("{}: {:.2}", label, value))
            .collect();
        println!("    {}", stats.join(", "));
    }
}

async fn run(app: &KartOpt, command: Command) -> Result<()> {
    match command {
        Command::Data { rivals } => {
            let data = app
                .load_game_data()
                .await
                .ok_or_else(|| anyhow!("Dataset unavailable"))?;
            println!(
                "{} character groups, {} kart groups, {} wheel groups, {} glider groups",
                data.characters.len(),
                data.karts.len(),
                data.wheels.len(),
                data.gliders.len()
            );
            if let Some(character) = rivals {
                println!("Rivals of {}: {}", character, data.rivals_of(&character).join(", "));
            }
        }
        Command::Image { name } => {
            let mut stream = app.load_image(name.clone());
            let mut latest = None;
            while let Some(image) = stream.next().await {
                debug!("Received {}x{} image", image.width(), image.height());
                latest = Some(image);
            }
            match latest {
                Some(image) => println!("{}: {}x{}", name, image.width(), image.height()),
                // No image: show the bare name instead.
                None => println!("{}", name.trim_end_matches(".webp")),
            }
        }
        Command::Search { save, filter } => {
            let mut save_data = match save {
                Some(name) => app.saves().load(&name)?,
                None => default_save(),
            };
            filter.apply(&mut save_data)?;

            let data = app
                .load_game_data()
                .await
                .ok_or_else(|| anyhow!("Dataset unavailable"))?;
            let results = app
                .search_saved(&save_data)
                .await
                .ok_or_else(|| anyhow!("Dataset unavailable"))?;

            if results.is_empty() {
                println!("No combinations match.");
            }
            for selection in results.displayed() {
                print_combination(&data, selection);
            }
            if results.is_truncated() {
                println!(
                    "Showing {} of {} results.",
                    SearchConfig::DISPLAY_LIMIT,
                    results.len()
                );
            }
        }
        Command::Options {
            memory_cache_bytes,
            disk_cache,
            locale,
        } => {
            let current = app.options();
            let updated = Options {
                memory_cache_bytes: memory_cache_bytes.unwrap_or(current.memory_cache_bytes),
                use_disk_cache: disk_cache.unwrap_or(current.use_disk_cache),
                locale: locale.unwrap_or_else(|| current.locale.clone()),
            };
            if updated != current {
                app.save_options(updated.clone())
                    .context("Failed to save options")?;
            }
            println!("memory cache: {} bytes", updated.memory_cache_bytes);
            println!("disk cache:   {}", updated.use_disk_cache);
            println!("locale:       {}", updated.locale);
        }
        Command::Saves(SavesCommand::List) => {
            for entry in app.saves().list()? {
                println!("{}\t{}", entry.modified.format("%Y-%m-%d %H:%M"), entry.name);
            }
        }
        Command::Saves(SavesCommand::Create { name, filter }) => {
            let mut save_data = default_save();
            filter.apply(&mut save_data)?;
            app.saves().save(&name, &save_data)?;
            println!("Saved {}", name);
        }
        Command::Saves(SavesCommand::Delete { name }) => {
            app.saves().delete(&name)?;
            println!("Deleted {}", name);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let app = match args.root {
        Some(root) => KartOpt::builder(root).auto_create_dirs(true).build()?,
        None => KartOpt::open_default()?,
    };
    info!("Data root: {}", app.root().display());

    let result = run(&app, args.command).await;

    let errors = app.errors().snapshot();
    for message in &errors {
        eprintln!("error: {}", message);
    }
    result?;
    if !errors.is_empty() {
        bail!("{} background error(s)", errors.len());
    }
    Ok(())
}
