use anyhow::Context;
use std::fs;

use super::{load_config, read_source, report_error, report_warnings};
use crate::cli::args::TranspileArgs;
use crate::exit_codes;

pub fn run(args: TranspileArgs) -> anyhow::Result<i32> {
    let config = load_config(&args.config)?;
    let (name, source) = read_source(&args.input)?;

    let generated = match tsbridge_core::generate(&name, &source, args.target, &config) {
        Ok(g) => g,
        Err(e) => return Ok(report_error(&e)),
    };
    report_warnings(generated.warnings.len());

    match &args.output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            fs::write(path, &generated.text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!(
                "Wrote {} ({} declarations, target {})",
                path.display(),
                generated.declarations,
                args.target
            );
        }
        None => print!("{}", generated.text),
    }
    Ok(exit_codes::SUCCESS)
}
