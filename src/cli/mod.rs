mod args;
mod list;
mod object;
mod parse;

use std::{fmt::Display, process::ExitCode};

use clap::{
    builder::styling::{AnsiColor, Styles},
    Parser, Subcommand,
};
use concolor_clap::ColorChoice;
use env_logger::WriteStyle;
use log::{error, info};

use crate::{config::Config, error::Result, logger};

pub use self::args::{GetArgs, GlobalArgs, ListArgs, LoggerArgs, PutArgs, RemoveArgs};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, propagate_version = true, styles = cli_styles())]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream object metadata from a bucket
    Ls(ListArgs),
    /// Download one object
    Get(GetArgs),
    /// Upload one object
    Put(PutArgs),
    /// Delete objects
    Rm(RemoveArgs),
}

impl Command {
    fn global(&self) -> &GlobalArgs {
        match self {
            Command::Ls(args) => &args.global,
            Command::Get(args) => &args.global,
            Command::Put(args) => &args.global,
            Command::Rm(args) => &args.global,
        }
    }
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();
    let global = cli.command.global();
    let config = Config::from_env();
    let debug = config.as_ref().is_ok_and(|config| config.debug);
    init_logger(&global.logger, debug);

    let result = match config.map(|config| apply_args(config, global)) {
        Ok(config) => run(cli.command, config).await,
        Err(err) => Err(err),
    };

    if let Err(err) = result {
        error!("{err}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    match command {
        Command::Ls(args) => list::main(args, config).await,
        Command::Get(args) => object::get(args, config).await,
        Command::Put(args) => object::put(args, config).await,
        Command::Rm(args) => object::remove(args, config).await,
    }
}

/// Command-line flags override values read from the environment.
fn apply_args(mut config: Config, args: &GlobalArgs) -> Config {
    if let Some(storage) = &args.storage {
        config.storage = storage.clone();
    }

    if args.latency.is_some() {
        config.latency = args.latency;
    }

    config.fetch_headers |= args.fetch_headers;
    config
}

fn init_logger(args: &LoggerArgs, debug: bool) {
    let level = log_level_from_args(args.verbose, args.quiet);
    let style = match args.color {
        ColorChoice::Always => WriteStyle::Always,
        ColorChoice::Never => WriteStyle::Never,
        ColorChoice::Auto => WriteStyle::Auto,
    };
    logger::init(logger::with_debug(level, debug), style);
}

fn log_level_from_args(verbose: u8, quiet: u8) -> log::LevelFilter {
    let verbosity = i16::from(verbose) - i16::from(quiet);
    match verbosity {
        i16::MIN..=-3 => log::LevelFilter::Off,
        -2 => log::LevelFilter::Error,
        -1 => log::LevelFilter::Warn,
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}

fn print_stat<T: Display>(name: &str, value: T) {
    let style = AnsiColor::Cyan.on_default();
    info!("{style}{name}:{style:#} {value}");
}

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightMagenta.on_default())
        .usage(AnsiColor::BrightMagenta.on_default())
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightCyan.on_default())
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use clap::CommandFactory;

    use crate::backend::StorageUrl;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn verbosity() {
        assert_eq!(log_level_from_args(0, 0), log::LevelFilter::Info);
        assert_eq!(log_level_from_args(2, 0), log::LevelFilter::Trace);
        assert_eq!(log_level_from_args(0, 1), log::LevelFilter::Warn);
        assert_eq!(log_level_from_args(0, 5), log::LevelFilter::Off);
    }

    #[test]
    fn args_override_config() {
        let cli = Cli::parse_from([
            "bucketstream",
            "ls",
            "photos",
            "--storage",
            "file://data",
            "--latency",
            "5ms",
            "--fetch-headers",
        ]);
        let config = apply_args(Config::default(), cli.command.global());
        assert_eq!(config.storage, StorageUrl::Local(PathBuf::from("data")));
        assert_eq!(config.latency, Some(Duration::from_millis(5)));
        assert!(config.fetch_headers);
    }

    #[test]
    fn list_args_parse_time_bounds() {
        let cli = Cli::parse_from([
            "bucketstream",
            "ls",
            "photos",
            "--prefix",
            "2024/",
            "--since",
            "2024-01-01T00:00:00Z",
            "--until",
            "1h",
            "--buffer-size",
            "8",
        ]);
        let Command::Ls(args) = cli.command else {
            panic!("expected ls");
        };
        assert_eq!(args.prefix, "2024/");
        assert_eq!(args.since.unwrap().to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert!(args.until.is_some());
        assert_eq!(args.buffer_size, Some(8));
    }
}
