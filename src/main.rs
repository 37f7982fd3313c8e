mod config;

use std::{error::Error, path::PathBuf, process::ExitCode};

use chartfetch::{
    cli::{
        args::{CliArgs, Command},
        command_handlers::{do_fetch, do_has_ref},
    },
    ChartFetch,
};
use clap::Parser;

use crate::config::ChartFetchConfig;

fn run() -> Result<ExitCode, Box<dyn Error>> {
    let cli_args = CliArgs::parse();
    let config = ChartFetchConfig::load()?;

    let mut builder = ChartFetch::builder();
    if let Some(scratch_directory) = cli_args
        .scratch_directory
        .map(PathBuf::from)
        .or(config.scratch_dir)
    {
        builder = builder.scratch_directory(scratch_directory);
    }
    let chartfetch = builder.try_build()?;

    match cli_args.cmd {
        Command::Fetch {
            repository,
            version,
            name,
            output_directory,
        } => {
            let output_directory = output_directory.map(PathBuf::from).or(config.output_dir);
            let path = do_fetch(
                &chartfetch,
                &repository,
                &version,
                name.as_deref(),
                output_directory.as_deref(),
            )?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::HasRef {
            repository,
            reference,
        } => {
            let found = do_has_ref(&chartfetch, &repository, &reference)?;
            println!("{found}");
            Ok(if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
