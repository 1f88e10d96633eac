use anyhow::Context;

use super::report_error;
use crate::cli::args::{InspectArgs, InspectFormat};
use crate::exit_codes;

pub fn run(args: InspectArgs) -> anyhow::Result<i32> {
    let module = match tsbridge_core::parse_file(&args.input) {
        Ok(m) => m,
        Err(e) => return Ok(report_error(&e)),
    };

    let text = match args.format {
        InspectFormat::Json => {
            let mut s = serde_json::to_string_pretty(&module).context("failed to encode JSON")?;
            s.push('\n');
            s
        }
        InspectFormat::Yaml => serde_yaml::to_string(&module).context("failed to encode YAML")?,
    };
    print!("{text}");
    Ok(exit_codes::SUCCESS)
}
