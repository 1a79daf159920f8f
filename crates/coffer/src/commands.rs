//! Topology command handlers.
//!
//! Every handler writes to the given writer so the binary can pass stdout
//! and tests can capture the output.

use std::io::Write;

use anyhow::{bail, Context, Result};
use coffer_core::Config;
use coffer_topology::{ArchiveDescriptor, AuditReport, DeploymentDriver, ManifestDriver, Topology};
use tracing::{debug, info, warn};

use crate::cli::{CheckArgs, InputArgs, OutputFormat, PolicyArgs, PolicyKind, SynthArgs};

/// Load configuration and apply the command line overrides.
pub fn load_config(input: &InputArgs) -> Result<Config> {
    let mut config =
        Config::load(input.config.as_deref()).context("Failed to load configuration")?;
    apply_overrides(&mut config, input);
    Ok(config)
}

/// Replace configured values with any given on the command line.
pub fn apply_overrides(config: &mut Config, input: &InputArgs) {
    if let Some(prefix) = &input.prefix {
        config.archive.prefix.clone_from(prefix);
    }
    if !input.regions.is_empty() {
        config.archive.replication_regions.clone_from(&input.regions);
    }
    if let Some(account) = &input.account {
        config.environment.account_id = Some(account.clone());
    }
    if let Some(region) = &input.home_region {
        config.environment.home_region = Some(region.clone());
    }
}

fn assemble_topology(config: &Config) -> Result<Topology> {
    let descriptor =
        ArchiveDescriptor::from_config(config).context("Invalid archive description")?;
    descriptor.assemble().context("Failed to assemble archive topology")
}

/// Render the deployment manifest to `--out` or `out`.
pub fn handle_synth(args: &SynthArgs, config: &Config, out: &mut impl Write) -> Result<()> {
    let topology = assemble_topology(config)?;
    let manifest =
        ManifestDriver::new().deploy(&topology).context("Failed to render manifest")?;
    let rendered = serde_json::to_string_pretty(&manifest)?;

    match &args.out {
        Some(path) => {
            std::fs::write(path, format!("{rendered}\n"))
                .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
            info!(path = %path.display(), "Wrote deployment manifest");
        }
        None => writeln!(out, "{rendered}")?,
    }
    Ok(())
}

/// Print the actor or bucket guard policy document.
pub fn handle_policy(args: &PolicyArgs, config: &Config, out: &mut impl Write) -> Result<()> {
    let topology = assemble_topology(config)?;
    let statements = match args.kind {
        PolicyKind::Actor => topology.actor_statements(),
        PolicyKind::Bucket => topology.bucket_guard_statements(),
    };
    debug!(kind = ?args.kind, statements = statements.len(), "Rendering policy");

    let document = statements.to_document();
    writeln!(out, "{}", document.to_json_pretty().context("Failed to serialize policy")?)?;
    Ok(())
}

/// Audit the replication role and fail if any capability is missing.
pub fn handle_check(args: &CheckArgs, config: &Config, out: &mut impl Write) -> Result<()> {
    let topology = assemble_topology(config)?;
    let report = topology.audit();
    print_report(&report, args.format, out)?;

    let unsatisfied = report.unsatisfied().count();
    if unsatisfied > 0 {
        warn!(unsatisfied, "Replication role is missing capabilities");
        bail!("{unsatisfied} of {} capabilities unsatisfied", report.entries.len());
    }
    Ok(())
}

/// Print an audit report in the requested format.
pub fn print_report(report: &AuditReport, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(report)?)?;
        }
        OutputFormat::Text => {
            let status = if report.is_satisfied() { "SATISFIED" } else { "UNSATISFIED" };
            writeln!(out, "\n  Capability Audit: {status}")?;
            writeln!(out, "  ─────────────────────────────────────────────")?;
            for entry in &report.entries {
                let icon = if entry.is_satisfied() { "✓" } else { "✗" };
                writeln!(out, "  {icon} {}", entry.capability)?;
                for probe in &entry.missing {
                    writeln!(out, "      missing {} on {}", probe.action, probe.resource)?;
                }
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
