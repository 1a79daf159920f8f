//! Topology assembler.
//!
//! Validates the input descriptor, resolves every identifier once and hands
//! the same resolved set to the policy derivation engine, the rule builder
//! and the deployment instruction.

use std::collections::HashSet;

use coffer_core::policy::StatementSet;
use coffer_core::replication::{ReplicationConfiguration, ReplicationRule};
use coffer_core::Config;
use tracing::{debug, info, warn};

use crate::bucket::{BucketSpec, KeySpec, RoleSpec};
use crate::capability::{audit, required_capabilities, AuditReport, RequiredCapability};
use crate::deploy::DeploymentInstruction;
use crate::error::{TopologyError, TopologyResult};
use crate::naming::NamingResolver;
use crate::policy::derive_policies;
use crate::rules::build_rules;
use crate::types::{Prefix, Region, ResolvedRegion, TargetEnvironment};

/// The resolved multi-region archive.
///
/// Built once from immutable input and never mutated; a different input
/// means a different topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    prefix: Prefix,
    environment: TargetEnvironment,
    home_stack_name: String,
    primary_key: KeySpec,
    primary_bucket: BucketSpec,
    role: RoleSpec,
    regions: Vec<ResolvedRegion>,
    deployment: DeploymentInstruction,
}

impl Topology {
    /// The naming prefix.
    #[must_use]
    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    /// The target environment.
    #[must_use]
    pub fn environment(&self) -> &TargetEnvironment {
        &self.environment
    }

    /// Name of the stack holding the home region resources.
    #[must_use]
    pub fn home_stack_name(&self) -> &str {
        &self.home_stack_name
    }

    /// The archive key.
    #[must_use]
    pub fn primary_key(&self) -> &KeySpec {
        &self.primary_key
    }

    /// The archive bucket.
    #[must_use]
    pub fn primary_bucket(&self) -> &BucketSpec {
        &self.primary_bucket
    }

    /// The replication role.
    #[must_use]
    pub fn role(&self) -> &RoleSpec {
        &self.role
    }

    /// Resolved destination identifiers, in input order.
    #[must_use]
    pub fn regions(&self) -> &[ResolvedRegion] {
        &self.regions
    }

    /// The primary bucket's deny statements.
    #[must_use]
    pub fn bucket_guard_statements(&self) -> &StatementSet {
        &self.primary_bucket.policy
    }

    /// The replication role's identity statements.
    #[must_use]
    pub fn actor_statements(&self) -> &StatementSet {
        &self.role.policy
    }

    /// Replication rules ordered by priority; empty without replication.
    #[must_use]
    pub fn rules(&self) -> &[ReplicationRule] {
        self.primary_bucket.rules()
    }

    /// The replication configuration, absent when there are no rules.
    #[must_use]
    pub fn replication_configuration(&self) -> Option<&ReplicationConfiguration> {
        self.primary_bucket.replication.as_ref()
    }

    /// The multi-region deployment instruction.
    #[must_use]
    pub fn deployment(&self) -> &DeploymentInstruction {
        &self.deployment
    }

    /// Capabilities the rule set requires of the replication role.
    #[must_use]
    pub fn required_capabilities(&self) -> Vec<RequiredCapability> {
        required_capabilities(
            &self.primary_bucket.identifier,
            &self.primary_key.key,
            &self.regions,
        )
    }

    /// Audit the role's statements against the required capabilities.
    #[must_use]
    pub fn audit(&self) -> AuditReport {
        audit(self.actor_statements(), &self.required_capabilities())
    }
}

/// Build a topology from raw input.
///
/// The prefix is validated first, then the region list.
///
/// # Errors
///
/// Returns [`TopologyError::InvalidInput`] for a malformed prefix, an empty
/// region entry or names that exceed provider limits, and
/// [`TopologyError::DuplicateRegion`] if `regions` repeats an entry.
pub fn assemble<S: AsRef<str>>(
    prefix: &str,
    environment: &TargetEnvironment,
    regions: &[S],
) -> TopologyResult<Topology> {
    let prefix = Prefix::parse(prefix)?;
    let regions = parse_regions(regions)?;

    if regions.is_empty() {
        warn!(%prefix, "No replication regions; archive will not be replicated");
    }
    if regions.contains(environment.home_region()) {
        warn!(
            %prefix,
            region = %environment.home_region(),
            "Home region is also a replication target"
        );
    }

    let resolver = NamingResolver::new(prefix.clone(), environment.clone());
    let bucket_id = resolver.primary_bucket()?;
    let primary_key = KeySpec::symmetric(resolver.primary_key(), resolver.primary_key_alias());
    let role_id = resolver.replication_role()?;
    let resolved = resolver.resolve_all(&regions)?;

    let policies = derive_policies(&bucket_id, &primary_key.key, &resolved)?;
    policies.bucket_guard.to_document().validate()?;
    policies.actor.to_document().validate()?;

    let rules = build_rules(&resolved);
    let replication =
        (!rules.is_empty()).then(|| ReplicationConfiguration::new(role_id.arn(), rules));
    if let Some(replication) = &replication {
        replication.validate().map_err(coffer_core::Error::from)?;
    }

    let deployment = DeploymentInstruction::new(&resolver, &role_id, &resolved);
    let primary_bucket =
        BucketSpec::primary(bucket_id, &primary_key, policies.bucket_guard, replication);
    let role = RoleSpec::replication(role_id, policies.actor);

    let topology = Topology {
        home_stack_name: resolver.home_stack_name(),
        prefix,
        environment: environment.clone(),
        primary_key,
        primary_bucket,
        role,
        regions: resolved,
        deployment,
    };

    debug!(
        rules = topology.rules().len(),
        actor_statements = topology.actor_statements().len(),
        "Topology components derived"
    );
    info!(
        prefix = %topology.prefix,
        account = %environment.account_id(),
        home_region = %environment.home_region(),
        regions = topology.regions.len(),
        "Assembled archive topology"
    );

    Ok(topology)
}

fn parse_regions<S: AsRef<str>>(regions: &[S]) -> TopologyResult<Vec<Region>> {
    let mut seen = HashSet::with_capacity(regions.len());
    let mut parsed = Vec::with_capacity(regions.len());
    for name in regions {
        let region = Region::new(name.as_ref())?;
        if !seen.insert(region.clone()) {
            return Err(TopologyError::DuplicateRegion(region.to_string()));
        }
        parsed.push(region);
    }
    Ok(parsed)
}

/// The complete input descriptor of an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveDescriptor {
    /// Naming prefix.
    pub prefix: String,
    /// Account and home region.
    pub environment: TargetEnvironment,
    /// Replication regions, in precedence order.
    pub replication_regions: Vec<String>,
}

impl ArchiveDescriptor {
    /// Build a descriptor from loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if the account id or home
    /// region is missing or malformed.
    pub fn from_config(config: &Config) -> TopologyResult<Self> {
        let account_id = config.environment.account_id.as_deref().ok_or_else(|| {
            TopologyError::invalid_input(
                "account_id",
                format!("not configured and {} is unset", coffer_core::config::ACCOUNT_ENV),
            )
        })?;
        let home_region = config.environment.home_region.as_deref().ok_or_else(|| {
            TopologyError::invalid_input(
                "home_region",
                format!("not configured and {} is unset", coffer_core::config::REGION_ENV),
            )
        })?;

        Ok(Self {
            prefix: config.archive.prefix.clone(),
            environment: TargetEnvironment::new(account_id, home_region)?,
            replication_regions: config.archive.replication_regions.clone(),
        })
    }

    /// Assemble the topology this descriptor describes.
    ///
    /// # Errors
    ///
    /// See [`assemble`].
    pub fn assemble(&self) -> TopologyResult<Topology> {
        assemble(&self.prefix, &self.environment, &self.replication_regions)
    }
}
