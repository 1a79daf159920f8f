//! Command line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Coffer: compile archive descriptions into replicated object storage topologies.
#[derive(Parser)]
#[command(name = "coffer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Assemble the topology and render its deployment manifest.
    Synth(SynthArgs),
    /// Print a derived policy document.
    Policy(PolicyArgs),
    /// Audit the replication role against the capabilities the rules need.
    Check(CheckArgs),
    /// Print version information.
    Version,
}

/// Archive input shared by every topology command.
///
/// Flags override the configuration file, which overrides the
/// `CDK_DEFAULT_ACCOUNT` and `CDK_DEFAULT_REGION` environment variables.
#[derive(Args, Debug, Default)]
pub struct InputArgs {
    /// Path to configuration file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Naming prefix for every derived resource.
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Replication region; repeat in precedence order. Replaces the
    /// configured list when given.
    #[arg(short, long = "region", value_name = "REGION")]
    pub regions: Vec<String>,

    /// Account id owning the archive.
    #[arg(short, long)]
    pub account: Option<String>,

    /// Region of the primary bucket and key.
    #[arg(long)]
    pub home_region: Option<String>,
}

/// Arguments for the synth command.
#[derive(Args)]
pub struct SynthArgs {
    /// Archive input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Write the manifest to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

/// Arguments for the policy command.
#[derive(Args)]
pub struct PolicyArgs {
    /// Archive input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Which policy to print.
    #[arg(short, long, default_value = "actor")]
    pub kind: PolicyKind,
}

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Archive input.
    #[command(flatten)]
    pub input: InputArgs,

    /// Output format (text, json).
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,
}

/// Policy documents the archive derives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyKind {
    /// The replication role's identity policy.
    #[default]
    Actor,
    /// The primary bucket's guard policy.
    Bucket,
}

/// Output format for CLI commands.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}
