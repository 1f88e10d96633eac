use anyhow::Context;
use tsbridge_core::generated::staleness;
use tsbridge_core::Staleness;

use super::{load_config, read_source, report_error};
use crate::cli::args::CheckArgs;
use crate::exit_codes;

pub fn run(args: CheckArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.config)?;
    let (name, source) = read_source(&args.input)?;
    let existing = std::fs::read_to_string(&args.against)
        .with_context(|| format!("failed to read {}", args.against.display()))?;

    let fresh = match tsbridge_core::generate(&name, &source, args.target, &config) {
        Ok(g) => g,
        Err(e) => return Ok(report_error(&e)),
    };

    let against = args.against.display();
    match staleness(&existing, &fresh) {
        Staleness::UpToDate => {
            eprintln!("{against} is up to date");
            Ok(exit_codes::SUCCESS)
        }
        Staleness::SourceChanged => {
            eprintln!("{against} is stale: {name} changed since it was generated");
            Ok(exit_codes::CHECK_FAILED)
        }
        Staleness::ContentChanged => {
            eprintln!("{against} is stale: contents differ from a fresh `tsbridge transpile`");
            Ok(exit_codes::CHECK_FAILED)
        }
    }
}
