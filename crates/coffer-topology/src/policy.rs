//! Policy derivation engine.
//!
//! Derives the two statement sets an archive needs from resolved
//! identifiers alone:
//!
//! - **Bucket guards**: resource policy on the primary bucket denying bucket
//!   deletion and object version deletion to every principal.
//! - **Actor statements**: identity policy of the replication role. Three
//!   statements are always present (read the replication configuration,
//!   read source object versions, decrypt with the archive key); three more
//!   cover the destinations when at least one region is configured.
//!
//! Each per-region statement lists the resources of every region, in input
//! order, so a region dropped from the input leaves nothing behind.

use coffer_core::policy::{Action, Principal, Statement, StatementSet};
use tracing::debug;

use crate::error::{TopologyError, TopologyResult};
use crate::types::{ResolvedRegion, ResourceIdentifier, ResourceKind};

/// Statement ids, one per derived statement category.
pub mod sid {
    /// Guard: deny deleting the primary bucket.
    pub const DENY_BUCKET_DELETION: &str = "DenyBucketDeletion";
    /// Guard: deny deleting object versions in the primary bucket.
    pub const DENY_OBJECT_VERSION_DELETION: &str = "DenyObjectVersionDeletion";
    /// Actor: read the source replication configuration.
    pub const READ_REPLICATION_CONFIGURATION: &str = "ReadReplicationConfiguration";
    /// Actor: read source object versions and their metadata.
    pub const READ_SOURCE_VERSIONS: &str = "ReadSourceObjectVersions";
    /// Actor: decrypt source objects.
    pub const DECRYPT_SOURCE: &str = "DecryptSourceObjects";
    /// Actor: encrypt replicas with each destination key.
    pub const ENCRYPT_DESTINATION: &str = "EncryptReplicas";
    /// Actor: write replicas into each destination bucket.
    pub const REPLICATE_TO_DESTINATION: &str = "ReplicateToDestinations";
    /// Actor: inspect and manage destination bucket versioning.
    pub const MANAGE_DESTINATION_VERSIONING: &str = "ManageDestinationVersioning";
}

/// Actions the replication role needs on source object versions.
pub const SOURCE_VERSION_ACTIONS: [Action; 4] = [
    Action::GetObjectVersion,
    Action::GetObjectVersionAcl,
    Action::GetObjectVersionForReplication,
    Action::GetObjectVersionTagging,
];

/// Actions the replication role needs on destination objects.
pub const REPLICATE_ACTIONS: [Action; 3] =
    [Action::ReplicateDelete, Action::ReplicateObject, Action::ReplicateTags];

/// Actions the replication role needs on destination buckets.
pub const DESTINATION_BUCKET_ACTIONS: [Action; 3] =
    [Action::ListAll, Action::GetBucketVersioning, Action::PutBucketVersioning];

/// The statement sets derived for one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedPolicies {
    /// Resource policy statements for the primary bucket.
    pub bucket_guard: StatementSet,
    /// Identity policy statements for the replication role.
    pub actor: StatementSet,
}

/// Derive the bucket guard and actor statements.
///
/// # Errors
///
/// Returns [`TopologyError::InvalidInput`] if an identifier is of the wrong
/// kind, which means it was not produced by the naming resolver for this
/// purpose.
pub fn derive_policies(
    primary_bucket: &ResourceIdentifier,
    primary_key: &ResourceIdentifier,
    regions: &[ResolvedRegion],
) -> TopologyResult<DerivedPolicies> {
    expect_kind(primary_bucket, ResourceKind::PrimaryBucket, "primary_bucket")?;
    expect_kind(primary_key, ResourceKind::PrimaryKey, "primary_key")?;
    for resolved in regions {
        expect_kind(&resolved.bucket, ResourceKind::ReplicationBucket, "replication_bucket")?;
        expect_kind(&resolved.key_alias, ResourceKind::ReplicationKeyAlias, "replication_key")?;
    }

    let bucket_guard = bucket_guard_statements(primary_bucket);
    let actor = actor_statements(primary_bucket, primary_key, regions);

    debug!(
        guard_statements = bucket_guard.len(),
        actor_statements = actor.len(),
        regions = regions.len(),
        "Derived replication policies"
    );

    Ok(DerivedPolicies { bucket_guard, actor })
}

/// The two deny statements protecting the primary bucket.
#[must_use]
pub fn bucket_guard_statements(primary_bucket: &ResourceIdentifier) -> StatementSet {
    [
        Statement::deny([Action::DeleteBucket], [primary_bucket.arn()])
            .with_sid(sid::DENY_BUCKET_DELETION)
            .with_principal(Principal::any()),
        Statement::deny([Action::DeleteObjectVersion], [primary_bucket.objects_arn()])
            .with_sid(sid::DENY_OBJECT_VERSION_DELETION)
            .with_principal(Principal::any()),
    ]
    .into_iter()
    .collect()
}

fn actor_statements(
    primary_bucket: &ResourceIdentifier,
    primary_key: &ResourceIdentifier,
    regions: &[ResolvedRegion],
) -> StatementSet {
    let mut statements = StatementSet::new();

    statements.insert(
        Statement::allow(
            [Action::GetReplicationConfiguration, Action::ListBucket],
            [primary_bucket.arn()],
        )
        .with_sid(sid::READ_REPLICATION_CONFIGURATION),
    );
    statements.insert(
        Statement::allow(SOURCE_VERSION_ACTIONS, [primary_bucket.objects_arn()])
            .with_sid(sid::READ_SOURCE_VERSIONS),
    );
    statements.insert(
        Statement::allow([Action::KmsDecrypt], [primary_key.arn()]).with_sid(sid::DECRYPT_SOURCE),
    );

    if regions.is_empty() {
        return statements;
    }

    statements.insert(
        Statement::allow([Action::KmsEncrypt], regions.iter().map(|r| r.key_alias.arn()))
            .with_sid(sid::ENCRYPT_DESTINATION),
    );
    statements.insert(
        Statement::allow(REPLICATE_ACTIONS, regions.iter().map(|r| r.bucket.objects_arn()))
            .with_sid(sid::REPLICATE_TO_DESTINATION),
    );
    statements.insert(
        Statement::allow(DESTINATION_BUCKET_ACTIONS, regions.iter().map(|r| r.bucket.arn()))
            .with_sid(sid::MANAGE_DESTINATION_VERSIONING),
    );

    statements
}

fn expect_kind(
    id: &ResourceIdentifier,
    kind: ResourceKind,
    field: &'static str,
) -> TopologyResult<()> {
    if id.kind() == kind {
        Ok(())
    } else {
        Err(TopologyError::invalid_input(field, format!("{id} is a {:?}, expected {kind:?}", id.kind())))
    }
}
