//! Multi-region deployment instruction.
//!
//! The replication regions are provisioned by a self-managed stack set with
//! one instance per (region, account). Each instance creates the destination
//! key and bucket the naming resolver assigned to its region.

use serde::Serialize;

use crate::bucket::{BucketSpec, KeySpec};
use crate::naming::NamingResolver;
use crate::types::{AccountId, Region, ResolvedRegion, ResourceIdentifier};

/// Stack set parameter carrying the prefix.
pub const PREFIX_PARAMETER: &str = "Prefix";

/// Stack set parameter carrying the replication role ARN.
pub const ROLE_PARAMETER: &str = "ReplicationRole";

/// Who manages the stack set's execution roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionModel {
    /// Administration and execution roles are managed by the account.
    SelfManaged,
}

/// A stack set parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackParameter {
    /// Parameter name.
    pub parameter_key: String,
    /// Parameter value.
    pub parameter_value: String,
}

impl StackParameter {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Self { parameter_key: key.to_string(), parameter_value: value.into() }
    }
}

/// Where stack instances are deployed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackInstances {
    /// Target regions, in input order.
    pub regions: Vec<Region>,
    /// Target accounts.
    pub accounts: Vec<AccountId>,
}

/// Resources a stack instance creates in one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionalStack {
    /// The region.
    pub region: Region,
    /// Destination key.
    pub key: KeySpec,
    /// Destination bucket.
    pub bucket: BucketSpec,
}

impl RegionalStack {
    fn new(resolver: &NamingResolver, resolved: &ResolvedRegion) -> Self {
        let key = KeySpec::symmetric(
            resolver.replication_key(&resolved.region),
            resolved.key_alias.clone(),
        );
        let bucket = BucketSpec::replica(resolved.bucket.clone(), &key);
        Self { region: resolved.region.clone(), key, bucket }
    }
}

/// The stack set that provisions every replication region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentInstruction {
    /// Stack set name.
    pub stack_set_name: String,
    /// Permission model.
    pub permission_model: PermissionModel,
    /// Parameters passed to every instance.
    pub parameters: Vec<StackParameter>,
    /// Instance targets.
    pub instances: StackInstances,
    /// Per-region resources, in input order.
    pub regional_stacks: Vec<RegionalStack>,
}

impl DeploymentInstruction {
    /// Build the instruction for `regions` under the resolver's account.
    #[must_use]
    pub fn new(
        resolver: &NamingResolver,
        role: &ResourceIdentifier,
        regions: &[ResolvedRegion],
    ) -> Self {
        Self {
            stack_set_name: resolver.stack_set_name(),
            permission_model: PermissionModel::SelfManaged,
            parameters: vec![
                StackParameter::new(PREFIX_PARAMETER, resolver.prefix().as_str()),
                StackParameter::new(ROLE_PARAMETER, role.arn()),
            ],
            instances: StackInstances {
                regions: regions.iter().map(|r| r.region.clone()).collect(),
                accounts: vec![resolver.environment().account_id().clone()],
            },
            regional_stacks: regions.iter().map(|r| RegionalStack::new(resolver, r)).collect(),
        }
    }

    /// Returns the value of a parameter.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|p| p.parameter_key == key)
            .map(|p| p.parameter_value.as_str())
    }
}
