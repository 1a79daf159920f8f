//! Resource specifications: buckets, keys and the replication role.
//!
//! Bucket settings that are not derived from the input (CORS, lifecycle,
//! public access) are fixed archive defaults defined here.

use coffer_core::cors::{CorsConfiguration, CorsRule, HttpMethod};
use coffer_core::encryption::ServerSideEncryptionConfiguration;
use coffer_core::lifecycle::{LifecycleConfiguration, LifecycleRule, StorageClass};
use coffer_core::policy::{Action, PolicyDocument, Principal, Statement, StatementSet};
use coffer_core::public_access_block::PublicAccessBlockConfiguration;
use coffer_core::replication::{ReplicationConfiguration, ReplicationRule};

use crate::naming::ROLE_PATH;
use crate::types::ResourceIdentifier;

/// Origin allowed by the archive CORS rule.
pub const CORS_ORIGIN: &str = "http://localhost:3000";

/// Id of the archive lifecycle rule.
pub const LIFECYCLE_RULE_ID: &str = "archive-tiering";

/// Key spec of every archive key.
pub const SYMMETRIC_DEFAULT: &str = "SYMMETRIC_DEFAULT";

/// Service principal that assumes the replication role.
pub const REPLICATION_SERVICE: &str = "s3.amazonaws.com";

/// What happens to a resource when its stack is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPolicy {
    /// Keep the resource.
    Retain,
    /// Delete the resource.
    Destroy,
}

impl RemovalPolicy {
    /// Convert to string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retain => "Retain",
            Self::Destroy => "Delete",
        }
    }
}

/// A customer managed symmetric key and its alias.
///
/// IAM grants and default bucket encryption name the key; replication rules
/// name the destination alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpec {
    /// Key identifier.
    pub key: ResourceIdentifier,
    /// Alias identifier.
    pub alias: ResourceIdentifier,
    /// Key spec (always `SYMMETRIC_DEFAULT`).
    pub key_spec: &'static str,
}

impl KeySpec {
    /// A symmetric key reachable through `alias`.
    #[must_use]
    pub fn symmetric(key: ResourceIdentifier, alias: ResourceIdentifier) -> Self {
        Self { key, alias, key_spec: SYMMETRIC_DEFAULT }
    }
}

/// A bucket and every setting it is created with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSpec {
    /// The bucket identifier.
    pub identifier: ResourceIdentifier,
    /// Removal policy.
    pub removal_policy: RemovalPolicy,
    /// Whether versioning is enabled.
    pub versioned: bool,
    /// Default encryption.
    pub encryption: ServerSideEncryptionConfiguration,
    /// Public access block.
    pub public_access_block: PublicAccessBlockConfiguration,
    /// CORS allow-list.
    pub cors: Option<CorsConfiguration>,
    /// Lifecycle rules.
    pub lifecycle: Option<LifecycleConfiguration>,
    /// Resource policy statements; empty when the bucket has no policy.
    pub policy: StatementSet,
    /// Replication configuration; absent when there are no rules.
    pub replication: Option<ReplicationConfiguration>,
}

impl BucketSpec {
    /// The archive bucket in the home region.
    #[must_use]
    pub fn primary(
        identifier: ResourceIdentifier,
        key: &KeySpec,
        guard: StatementSet,
        replication: Option<ReplicationConfiguration>,
    ) -> Self {
        Self {
            identifier,
            removal_policy: RemovalPolicy::Retain,
            versioned: true,
            encryption: ServerSideEncryptionConfiguration::kms(key.key.arn()),
            public_access_block: PublicAccessBlockConfiguration::block_all(),
            cors: Some(archive_cors()),
            lifecycle: Some(archive_lifecycle()),
            policy: guard,
            replication,
        }
    }

    /// A destination bucket in a replication region.
    #[must_use]
    pub fn replica(identifier: ResourceIdentifier, key: &KeySpec) -> Self {
        Self {
            identifier,
            removal_policy: RemovalPolicy::Retain,
            versioned: true,
            encryption: ServerSideEncryptionConfiguration::kms(key.key.arn()),
            public_access_block: PublicAccessBlockConfiguration::block_all(),
            cors: None,
            lifecycle: None,
            policy: StatementSet::new(),
            replication: None,
        }
    }

    /// The replication rules, empty when the bucket does not replicate.
    #[must_use]
    pub fn rules(&self) -> &[ReplicationRule] {
        match &self.replication {
            Some(replication) => &replication.rules,
            None => &[],
        }
    }

    /// The bucket policy document, if the bucket has one.
    #[must_use]
    pub fn policy_document(&self) -> Option<PolicyDocument> {
        (!self.policy.is_empty()).then(|| self.policy.to_document())
    }
}

/// The role the storage service assumes to replicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleSpec {
    /// The role identifier.
    pub identifier: ResourceIdentifier,
    /// IAM path.
    pub path: &'static str,
    /// Service principal allowed to assume the role.
    pub assumed_by: &'static str,
    /// Inline identity policy statements.
    pub policy: StatementSet,
}

impl RoleSpec {
    /// The replication role with the given identity statements.
    #[must_use]
    pub fn replication(identifier: ResourceIdentifier, policy: StatementSet) -> Self {
        Self { identifier, path: ROLE_PATH, assumed_by: REPLICATION_SERVICE, policy }
    }

    /// Trust policy letting the service principal assume the role.
    #[must_use]
    pub fn trust_policy(&self) -> PolicyDocument {
        StatementSet::from_iter([Statement::allow([Action::AssumeRole], Vec::<String>::new())
            .with_principal(Principal::service(self.assumed_by))])
        .to_document()
    }

    /// Name of the inline policy.
    #[must_use]
    pub fn policy_name(&self) -> String {
        format!("{}-policy", self.identifier.name())
    }
}

/// GET, POST and PUT from the local development origin, any header.
#[must_use]
pub fn archive_cors() -> CorsConfiguration {
    CorsConfiguration {
        rules: vec![CorsRule::new(
            [HttpMethod::Get, HttpMethod::Post, HttpMethod::Put],
            [CORS_ORIGIN],
        )
        .with_headers(["*"])],
    }
}

/// Abort stale multipart uploads after 90 days, move to infrequent access
/// after 30 days and expire after a year.
#[must_use]
pub fn archive_lifecycle() -> LifecycleConfiguration {
    LifecycleConfiguration {
        rules: vec![LifecycleRule::new(LIFECYCLE_RULE_ID)
            .with_abort_incomplete_multipart_upload(90)
            .with_expiration_days(365)
            .with_transition(StorageClass::StandardIa, 30)],
    }
}
