use anyhow::Context;
use std::path::Path;
use tracing::info;
use tsbridge_core::{Config, Error};

use super::args::*;
use crate::exit_codes;

pub mod check;
pub mod conform;
pub mod inspect;
pub mod transpile;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Transpile(args) => transpile::run(args),
        Command::Inspect(args) => inspect::run(args),
        Command::Check(args) => check::run(args),
        Command::Conform(args) => conform::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::SUCCESS)
        }
    }
}

/// `--config`, else `./tsbridge.yaml`, else defaults. `--strict` wins over the file.
pub(crate) fn load_config(args: &ConfigArgs) -> anyhow::Result<Config> {
    let cwd = std::env::current_dir().context("failed to resolve working directory")?;
    let (mut config, path) = Config::discover(args.config.as_deref(), &cwd)?;
    if let Some(path) = path {
        info!("using config {}", path.display());
    }
    config.strict |= args.strict;
    Ok(config)
}

/// Reads an input file and returns its display name with the text.
pub(crate) fn read_source(path: &Path) -> anyhow::Result<(String, String)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok((name, text))
}

/// Prints a library error and maps it to an exit code.
pub(crate) fn report_error(err: &Error) -> i32 {
    eprintln!("error: {err}");
    match err {
        Error::Parse { .. } => exit_codes::PARSE_ERROR,
        _ => exit_codes::CONFIG_ERROR,
    }
}

pub(crate) fn report_warnings(count: usize) {
    if count > 0 {
        eprintln!("{count} warning(s); use --strict to fail on unsupported constructs");
    }
}
