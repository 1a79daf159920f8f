//! Capability audit for the replication role.
//!
//! A replication rule set only works if the role can do a handful of
//! things: read the source, decrypt it, and for each destination encrypt,
//! write and manage versioning. Each capability is expressed as concrete
//! (action, resource) probes which are evaluated against the role's
//! statements with the same matching rules the provider applies. A missing
//! permission otherwise shows up only when replication silently stalls.

use std::fmt;

use coffer_core::policy::{Action, StatementSet};
use serde::Serialize;

use crate::policy::{REPLICATE_ACTIONS, SOURCE_VERSION_ACTIONS};
use crate::types::{Region, ResolvedRegion, ResourceIdentifier};

/// Something the replication role must be able to do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "capability", content = "region", rename_all = "kebab-case")]
pub enum Capability {
    /// Read the source bucket's replication configuration and listing.
    ReadReplicationConfiguration,
    /// Read source object versions with their ACLs and tags.
    ReadSourceVersions,
    /// Decrypt source objects with the archive key.
    DecryptSource,
    /// Encrypt replicas with the destination key of a region.
    EncryptDestination(Region),
    /// Write replicas, delete markers and tags into a region's bucket.
    WriteDestination(Region),
    /// List and manage versioning of a region's bucket.
    ManageDestinationVersioning(Region),
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadReplicationConfiguration => write!(f, "read replication configuration"),
            Self::ReadSourceVersions => write!(f, "read source object versions"),
            Self::DecryptSource => write!(f, "decrypt source objects"),
            Self::EncryptDestination(r) => write!(f, "encrypt replicas in {r}"),
            Self::WriteDestination(r) => write!(f, "write replicas to {r}"),
            Self::ManageDestinationVersioning(r) => write!(f, "manage destination versioning in {r}"),
        }
    }
}

/// One action on one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    /// The action attempted.
    pub action: Action,
    /// The resource ARN it is attempted on.
    pub resource: String,
}

impl Probe {
    fn new(action: Action, resource: impl Into<String>) -> Self {
        Self { action, resource: resource.into() }
    }
}

/// A capability together with the probes that demonstrate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequiredCapability {
    /// The capability.
    pub capability: Capability,
    /// Every probe must be allowed for the capability to hold.
    pub probes: Vec<Probe>,
}

/// Enumerate the capabilities a rule set over `regions` needs.
#[must_use]
pub fn required_capabilities(
    primary_bucket: &ResourceIdentifier,
    primary_key: &ResourceIdentifier,
    regions: &[ResolvedRegion],
) -> Vec<RequiredCapability> {
    let mut required = vec![
        RequiredCapability {
            capability: Capability::ReadReplicationConfiguration,
            probes: vec![
                Probe::new(Action::GetReplicationConfiguration, primary_bucket.arn()),
                Probe::new(Action::ListBucket, primary_bucket.arn()),
            ],
        },
        RequiredCapability {
            capability: Capability::ReadSourceVersions,
            probes: SOURCE_VERSION_ACTIONS
                .iter()
                .map(|&a| Probe::new(a, primary_bucket.objects_arn()))
                .collect(),
        },
        RequiredCapability {
            capability: Capability::DecryptSource,
            probes: vec![Probe::new(Action::KmsDecrypt, primary_key.arn())],
        },
    ];

    for resolved in regions {
        required.push(RequiredCapability {
            capability: Capability::EncryptDestination(resolved.region.clone()),
            probes: vec![Probe::new(Action::KmsEncrypt, resolved.key_alias.arn())],
        });
        required.push(RequiredCapability {
            capability: Capability::WriteDestination(resolved.region.clone()),
            probes: REPLICATE_ACTIONS
                .iter()
                .map(|&a| Probe::new(a, resolved.bucket.objects_arn()))
                .collect(),
        });
        required.push(RequiredCapability {
            capability: Capability::ManageDestinationVersioning(resolved.region.clone()),
            probes: [Action::ListBucket, Action::GetBucketVersioning, Action::PutBucketVersioning]
                .into_iter()
                .map(|a| Probe::new(a, resolved.bucket.arn()))
                .collect(),
        });
    }

    required
}

/// Outcome for one capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEntry {
    /// The capability checked.
    pub capability: Capability,
    /// Probes the statements do not allow.
    pub missing: Vec<Probe>,
}

impl AuditEntry {
    /// Returns true if every probe was allowed.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Result of auditing a statement set against required capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    /// One entry per required capability, in the order required.
    pub entries: Vec<AuditEntry>,
}

impl AuditReport {
    /// Returns true if every capability is satisfied.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.entries.iter().all(AuditEntry::is_satisfied)
    }

    /// The capabilities that are not satisfied.
    pub fn unsatisfied(&self) -> impl Iterator<Item = &AuditEntry> {
        self.entries.iter().filter(|e| !e.is_satisfied())
    }
}

/// Evaluate every probe of `required` against `statements`.
#[must_use]
pub fn audit(statements: &StatementSet, required: &[RequiredCapability]) -> AuditReport {
    let entries = required
        .iter()
        .map(|req| AuditEntry {
            capability: req.capability.clone(),
            missing: req
                .probes
                .iter()
                .filter(|p| !statements.allows(p.action, &p.resource))
                .cloned()
                .collect(),
        })
        .collect();
    AuditReport { entries }
}

#[cfg(test)]
mod tests {
    use coffer_core::policy::Statement;

    use super::*;
    use crate::naming::NamingResolver;
    use crate::policy::derive_policies;
    use crate::types::{Prefix, TargetEnvironment};

    struct Fixture {
        bucket: ResourceIdentifier,
        key: ResourceIdentifier,
        resolved: Vec<ResolvedRegion>,
    }

    fn fixture(regions: &[&str]) -> Fixture {
        let resolver = NamingResolver::new(
            Prefix::parse("archive").unwrap(),
            TargetEnvironment::new("123456789012", "us-east-1").unwrap(),
        );
        let regions: Vec<_> = regions.iter().map(|r| Region::new(*r).unwrap()).collect();
        Fixture {
            bucket: resolver.primary_bucket().unwrap(),
            key: resolver.primary_key(),
            resolved: resolver.resolve_all(&regions).unwrap(),
        }
    }

    #[test]
    fn test_required_capability_count() {
        let f = fixture(&["us-west-2", "us-east-2"]);
        let required = required_capabilities(&f.bucket, &f.key, &f.resolved);
        assert_eq!(required.len(), 3 + 3 * 2);
        assert!(required.iter().all(|r| !r.probes.is_empty()));
    }

    #[test]
    fn test_derived_statements_satisfy_all() {
        let f = fixture(&["us-west-2", "us-east-2"]);
        let policies = derive_policies(&f.bucket, &f.key, &f.resolved).unwrap();
        let required = required_capabilities(&f.bucket, &f.key, &f.resolved);

        let report = audit(&policies.actor, &required);
        assert!(report.is_satisfied());
        assert_eq!(report.unsatisfied().count(), 0);
    }

    #[test]
    fn test_missing_statement_is_reported() {
        let f = fixture(&["us-west-2"]);
        let policies = derive_policies(&f.bucket, &f.key, &f.resolved).unwrap();
        let required = required_capabilities(&f.bucket, &f.key, &f.resolved);

        let without_decrypt: StatementSet = policies
            .actor
            .iter()
            .filter(|s| !s.action.contains(Action::KmsDecrypt))
            .cloned()
            .collect();

        let report = audit(&without_decrypt, &required);
        let failed: Vec<_> = report.unsatisfied().map(|e| e.capability.clone()).collect();
        assert_eq!(failed, vec![Capability::DecryptSource]);
    }

    #[test]
    fn test_wildcard_grant_satisfies_probes() {
        let f = fixture(&["us-west-2"]);
        let required = required_capabilities(&f.bucket, &f.key, &f.resolved);
        let broad: StatementSet = [
            Statement::allow([Action::S3All], ["*"]),
            Statement::allow([Action::KmsDecrypt, Action::KmsEncrypt], ["*"]),
        ]
        .into_iter()
        .collect();
        assert!(audit(&broad, &required).is_satisfied());
    }

    #[test]
    fn test_empty_statements_fail_everything() {
        let f = fixture(&["us-west-2"]);
        let required = required_capabilities(&f.bucket, &f.key, &f.resolved);
        let report = audit(&StatementSet::new(), &required);
        assert_eq!(report.unsatisfied().count(), required.len());
    }

    #[test]
    fn test_capability_display_and_serialization() {
        let region = Region::new("us-west-2").unwrap();
        let cap = Capability::WriteDestination(region);
        assert_eq!(cap.to_string(), "write replicas to us-west-2");

        let json = serde_json::to_value(&cap).unwrap();
        assert_eq!(json["capability"], "write-destination");
        assert_eq!(json["region"], "us-west-2");

        let json = serde_json::to_value(Capability::DecryptSource).unwrap();
        assert_eq!(json, serde_json::json!({"capability": "decrypt-source"}));
    }
}
