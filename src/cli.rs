use chrono::NaiveDate;
use std::path::PathBuf;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
pub enum Command {
    /// Write the default render configuration file.
    Init,
    /// Add a new event.
    Add {
        /// Short name, drawn on the wallpaper.
        #[structopt()]
        name: String,

        /// What the event is about.
        #[structopt()]
        description: String,

        /// First day of the event (YYYY-MM-DD).
        #[structopt()]
        starting_date: NaiveDate,

        /// Deadline (YYYY-MM-DD).
        #[structopt()]
        ending_date: NaiveDate,
    },
    /// List all events with their urgency.
    List {
        /// Pretend today is this date (YYYY-MM-DD).
        #[structopt(long)]
        today: Option<NaiveDate>,
    },
    /// Mark an event as done by position.
    Done {
        #[structopt()]
        position: usize,
    },
    /// Remove an event by position.
    Rm {
        #[structopt()]
        position: usize,
    },
    /// List the available wallpapers.
    Wallpapers,
    /// Draw the events on a wallpaper and set it as desktop background.
    Render {
        /// Wallpaper position as shown by `wallpapers`, or an image path.
        #[structopt()]
        wallpaper: String,

        /// Pretend today is this date (YYYY-MM-DD).
        #[structopt(long)]
        today: Option<NaiveDate>,

        /// Only write the rendered image, leave the desktop alone.
        #[structopt(long)]
        no_apply: bool,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "todowall",
    about = "Paint your deadlines onto your desktop wallpaper."
)]
pub struct CommandLineArgs {
    #[structopt(subcommand)]
    pub action: Command,

    /// Use a different events file.
    #[structopt(parse(from_os_str), short, long = "events")]
    pub events_file: Option<PathBuf>,

    /// Use a different render configuration file.
    #[structopt(parse(from_os_str), short, long = "config")]
    pub config_file: Option<PathBuf>,

    /// Look for wallpapers in a different directory.
    #[structopt(parse(from_os_str), short, long = "wallpapers")]
    pub wallpapers_dir: Option<PathBuf>,

    /// More log output (-v, -vv, -vvv).
    #[structopt(short, long, parse(from_occurrences))]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_path_flags() {
        let args = CommandLineArgs::from_iter_safe(&[
            "todowall",
            "--events",
            "e.txt",
            "--config",
            "c.toml",
            "--wallpapers",
            "walls",
            "-vv",
            "render",
            "2024",
            "--no-apply",
        ])
        .unwrap();
        assert_eq!(args.events_file, Some(PathBuf::from("e.txt")));
        assert_eq!(args.config_file, Some(PathBuf::from("c.toml")));
        assert_eq!(args.wallpapers_dir, Some(PathBuf::from("walls")));
        assert_eq!(args.verbose, 2);
        match args.action {
            Command::Render {
                wallpaper,
                today,
                no_apply,
            } => {
                assert_eq!(wallpaper, "2024");
                assert_eq!(today, None);
                assert!(no_apply);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn short_path_flags() {
        let args =
            CommandLineArgs::from_iter_safe(&["todowall", "-e", "e.txt", "-w", "walls", "wallpapers"])
                .unwrap();
        assert_eq!(args.events_file, Some(PathBuf::from("e.txt")));
        assert_eq!(args.wallpapers_dir, Some(PathBuf::from("walls")));
        assert!(matches!(args.action, Command::Wallpapers));
    }
}
