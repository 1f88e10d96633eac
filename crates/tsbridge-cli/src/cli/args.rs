use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tsbridge_core::Target;

#[derive(Parser)]
#[command(
    name = "tsbridge",
    version,
    about = "Generate Rust, Protobuf and JSON Schema definitions from TypeScript declarations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Translate a declaration file into the target language
    Transpile(TranspileArgs),
    /// Print the parsed declarations
    Inspect(InspectArgs),
    /// Fail if a generated file no longer matches its source
    Check(CheckArgs),
    /// Check a JSON fixture against a declared shape
    Conform(ConformArgs),
    Version,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Config file (default: ./tsbridge.yaml if present)
    #[arg(long, env = "TSBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Treat unsupported constructs as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct TranspileArgs {
    pub input: PathBuf,

    /// rust, proto or schema
    #[arg(short, long)]
    pub target: Target,

    /// Write here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum InspectFormat {
    #[default]
    Json,
    Yaml,
}

#[derive(Parser, Debug, Clone)]
pub struct InspectArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = InspectFormat::Json)]
    pub format: InspectFormat,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    pub input: PathBuf,

    #[arg(short, long)]
    pub target: Target,

    /// Previously generated file to compare against
    #[arg(long)]
    pub against: PathBuf,

    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct ConformArgs {
    pub input: PathBuf,

    /// Declared type the fixture claims to satisfy
    #[arg(long = "type")]
    pub type_name: String,

    /// JSON fixture
    pub fixture: PathBuf,

    /// Also report fields the type does not declare
    #[arg(long)]
    pub strict: bool,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}
