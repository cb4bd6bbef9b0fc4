use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use prettytable::Table;
use todowall::wallpaper::{self, Wallpaper};
use todowall::{categorize, Event, EventStore, RenderConfig};

const DESCRIPTION_WIDTH: usize = 40;

/// Every file and directory the commands work with.
#[derive(Debug)]
pub struct Paths {
    pub events: PathBuf,
    pub config: PathBuf,
    pub wallpapers: PathBuf,
    pub temp: PathBuf,
}

fn today_or_now(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

fn open_store(path: &Path) -> Result<EventStore> {
    EventStore::open(path)
        .with_context(|| format!("Failed to load events from {}.", path.display()))
}

pub fn init_config(paths: &Paths) -> Result<()> {
    if paths.config.exists() {
        bail!("Config file {} already exists.", paths.config.display());
    }
    RenderConfig::default()
        .save(&paths.config)
        .context("Failed to write the default config.")?;
    println!("Wrote {}", paths.config.display());
    Ok(())
}

pub fn add_event(
    paths: &Paths,
    name: String,
    description: String,
    starting_date: NaiveDate,
    ending_date: NaiveDate,
) -> Result<()> {
    let event = Event::new(name, description, starting_date, ending_date)
        .context("Invalid event.")?;
    let mut store = open_store(&paths.events)?;
    let position = store.add(event).context("Failed to save event.")?;

    let event = &store.events()[position - 1];
    println!(
        "{}. {} ({} -> {})",
        position,
        event.name(),
        event.starting_date(),
        event.ending_date()
    );
    Ok(())
}

pub fn list_events(paths: &Paths, today: Option<NaiveDate>) -> Result<()> {
    let today = today_or_now(today);
    let store = open_store(&paths.events)?;
    if store.events().is_empty() {
        println!("No events yet! use 'todowall add' to add one.");
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["#", "name", "description", "start", "end", "days left", "tier", "done"]);
    for (index, event) in store.events().iter().enumerate() {
        let done = if event.is_done() { "yes" } else { "" };
        table.add_row(row![
            index + 1,
            event.name(),
            textwrap::fill(event.description(), DESCRIPTION_WIDTH),
            event.starting_date(),
            event.ending_date(),
            event.remaining_days(today),
            event.tier(today),
            done
        ]);
    }
    table.printstd();
    Ok(())
}

pub fn mark_done(paths: &Paths, position: usize) -> Result<()> {
    let mut store = open_store(&paths.events)?;
    let event = store
        .mark_done(position)
        .context("Failed to mark event as done.")?;
    println!("{}. {} done.", position, event.name());
    Ok(())
}

pub fn remove_event(paths: &Paths, position: usize) -> Result<()> {
    let mut store = open_store(&paths.events)?;
    let event = store
        .remove(position)
        .context("Failed to remove event.")?;
    println!("Removed {}. {}", position, event.name());
    Ok(())
}

fn discover(dir: &Path) -> Result<Vec<Wallpaper>> {
    wallpaper::discover(dir)
        .with_context(|| format!("Failed to list wallpapers in {}.", dir.display()))
}

pub fn list_wallpapers(paths: &Paths) -> Result<()> {
    let wallpapers = discover(&paths.wallpapers)?;
    if wallpapers.is_empty() {
        println!("No wallpapers found in {}.", paths.wallpapers.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.add_row(row!["#", "path", "size"]);
    for (index, wallpaper) in wallpapers.iter().enumerate() {
        table.add_row(row![
            index + 1,
            wallpaper.path().display(),
            format!("{}x{}", wallpaper.width(), wallpaper.height())
        ]);
    }
    table.printstd();
    Ok(())
}

/// A path to any image, or else a position from `list_wallpapers`.
fn select_wallpaper(paths: &Paths, selector: &str) -> Result<Wallpaper> {
    if Path::new(selector).is_file() {
        return Wallpaper::open(selector)
            .with_context(|| format!("Failed to open wallpaper {}.", selector));
    }
    if let Ok(position) = selector.parse::<usize>() {
        let wallpapers = discover(&paths.wallpapers)?;
        if position == 0 || position > wallpapers.len() {
            bail!(
                "No wallpaper at position {}, there are {} in {}.",
                position,
                wallpapers.len(),
                paths.wallpapers.display()
            );
        }
        return Ok(wallpapers[position - 1].clone());
    }
    Wallpaper::open(selector).with_context(|| format!("Failed to open wallpaper {}.", selector))
}

pub fn render_wallpaper(
    paths: &Paths,
    selector: &str,
    today: Option<NaiveDate>,
    apply: bool,
) -> Result<()> {
    let config = RenderConfig::load(&paths.config)
        .with_context(|| format!("Failed to load config from {}.", paths.config.display()))?;
    let wallpaper = select_wallpaper(paths, selector)?;
    let store = open_store(&paths.events)?;
    let tiers = categorize(store.events(), today_or_now(today));

    let staged = wallpaper::stage(&wallpaper, &paths.temp).context("Failed to stage wallpaper.")?;
    let output = todowall::render(&staged, &tiers, &config).context("Failed to render wallpaper.")?;

    if apply {
        wallpaper::apply(&output).context("Failed to set the desktop background.")?;
    }
    println!("{}", output.display());
    Ok(())
}
