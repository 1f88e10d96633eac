use anyhow::Context;
use serde_json::{json, Value};
use tsbridge_core::conformance::{check_value_with, Options};

use super::report_error;
use crate::cli::args::{ConformArgs, ReportFormat};
use crate::exit_codes;

pub fn run(args: ConformArgs) -> anyhow::Result<i32> {
    let module = match tsbridge_core::parse_file(&args.input) {
        Ok(m) => m,
        Err(e) => return Ok(report_error(&e)),
    };
    let text = std::fs::read_to_string(&args.fixture)
        .with_context(|| format!("failed to read {}", args.fixture.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", args.fixture.display()))?;

    let options = Options {
        deny_unknown_fields: args.strict,
    };
    let violations = check_value_with(&module, &args.type_name, &value, options);

    match args.format {
        ReportFormat::Text => {
            for v in &violations {
                println!("{v}");
            }
            if violations.is_empty() {
                eprintln!("{} conforms to {}", args.fixture.display(), args.type_name);
            } else {
                eprintln!(
                    "{} does not conform to {}: {} violation(s)",
                    args.fixture.display(),
                    args.type_name,
                    violations.len()
                );
            }
        }
        ReportFormat::Json => {
            let report = json!({
                "type": args.type_name,
                "conforms": violations.is_empty(),
                "violations": violations,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    if violations.is_empty() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::CHECK_FAILED)
    }
}
