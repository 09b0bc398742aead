//! ringlamp CLI — encode, preview and publish lamp ring updates.

use std::path::PathBuf;

use clap::Parser;

mod cli;

#[derive(Parser)]
#[command(
    name = "ringlamp-cli",
    version,
    about = "Encode and publish updates for a 24-element RGB lamp ring"
)]
struct Args {
    /// Output as JSON (for encode, fill, preset, presets, config)
    #[arg(long, global = true)]
    json: bool,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the platform default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: cli::Command,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = cli::run(args.command, args.json, args.config.as_deref()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
