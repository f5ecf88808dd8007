use anyhow::{Context, Result};
use clap::crate_version;
use env_logger::Builder;
use log::LevelFilter;

use invopt::invopt_framework::invopt_command::{ARG_ID_VERBOSE, INVOPT_COMMANDS};

pub fn main() -> Result<()> {
    let command = INVOPT_COMMANDS.build_root_cli();
    let command = command.version(crate_version!());
    let cli_matches = command.get_matches();

    let level = match cli_matches.get_count(ARG_ID_VERBOSE) {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    Builder::new().filter_level(level).parse_default_env().init();

    log::info!("invopt starting");

    let output = INVOPT_COMMANDS.execute(&cli_matches).context("Executing invopt")?;
    println!("{}", output);
    Ok(())
}
