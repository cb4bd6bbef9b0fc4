#[macro_use]
extern crate prettytable;

use anyhow::{anyhow, Context};
use directories::ProjectDirs;
use std::path::PathBuf;
use structopt::StructOpt;

mod cli;
mod interface;

use cli::{Command::*, CommandLineArgs};
use interface::Paths;
use todowall::logging::init_logging;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "todowall", "todowall")
}

/// Fill in every location the user did not give on the command line with
/// the per-user defaults.
fn resolve_paths(
    events_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    wallpapers_dir: Option<PathBuf>,
) -> anyhow::Result<Paths> {
    let dirs = project_dirs();
    let data_dir = dirs.as_ref().map(|dirs| dirs.data_dir().to_path_buf());
    let in_data_dir = |name: &str| data_dir.as_ref().map(|dir| dir.join(name));

    let events = events_file
        .or_else(|| in_data_dir("events.txt"))
        .ok_or(anyhow!("Failed to find events file."))?;
    let config = config_file
        .or_else(|| dirs.as_ref().map(|dirs| dirs.config_dir().join("config.toml")))
        .ok_or(anyhow!("Failed to find config file."))?;
    let wallpapers = wallpapers_dir
        .or_else(|| in_data_dir("wallpapers"))
        .ok_or(anyhow!("Failed to find wallpapers directory."))?;
    let temp = in_data_dir("temp").unwrap_or_else(|| std::env::temp_dir().join("todowall"));

    Ok(Paths {
        events,
        config,
        wallpapers,
        temp,
    })
}

fn main() -> anyhow::Result<()> {
    // Get the command-line arguments.
    let CommandLineArgs {
        action,
        events_file,
        config_file,
        wallpapers_dir,
        verbose,
    } = CommandLineArgs::from_args();

    init_logging(verbose).context("Failed to initialize logging.")?;

    let paths = resolve_paths(events_file, config_file, wallpapers_dir)?;

    // Perform the action.
    match action {
        Init => interface::init_config(&paths),
        Add {
            name,
            description,
            starting_date,
            ending_date,
        } => interface::add_event(&paths, name, description, starting_date, ending_date),
        List { today } => interface::list_events(&paths, today),
        Done { position } => interface::mark_done(&paths, position),
        Rm { position } => interface::remove_event(&paths, position),
        Wallpapers => interface::list_wallpapers(&paths),
        Render {
            wallpaper,
            today,
            no_apply,
        } => interface::render_wallpaper(&paths, &wallpaper, today, !no_apply),
    }?;
    Ok(())
}
