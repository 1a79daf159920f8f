//! Naming resolver.
//!
//! Every resource name and ARN in a topology is produced here from the
//! prefix, the target environment and, for regional resources, the region.
//! Resolution is pure: the same inputs give the same identifiers across
//! process runs, so re-deploying against existing resources is idempotent.
//!
//! | resource | name |
//! |----------|------|
//! | primary bucket | `{prefix}-archive-{account}-{home_region}` |
//! | primary key | `{prefix}-archive-key` |
//! | primary key alias | `alias/archive` |
//! | replication role | `{prefix}-archive-replication-role` |
//! | replication bucket | `{prefix}-archive-replication-{region}` |
//! | replication key | `{prefix}-archive-replication-key` |
//! | replication key alias | `alias/archive/replication` |
//!
//! KMS assigns key ids at creation, so a key identifier carries the key's
//! logical name where the id goes (`arn:aws:kms:{region}:{account}:key/{name}`).
//! Deployment drivers bind it to the created key. Aliases never stand in for
//! a key in IAM resources: an alias ARN there does not authorize use of the
//! key behind it.

use tracing::debug;

use crate::error::{TopologyError, TopologyResult};
use crate::types::{Prefix, Region, ResolvedRegion, ResourceIdentifier, ResourceKind, TargetEnvironment};

/// Alias of the archive key in the home region.
pub const ARCHIVE_KEY_ALIAS: &str = "alias/archive";

/// Alias of the destination key in each replication region.
pub const REPLICATION_KEY_ALIAS: &str = "alias/archive/replication";

/// Path the replication role is created under.
pub const ROLE_PATH: &str = "/service-role/";

const MIN_BUCKET_NAME_LEN: usize = 3;
const MAX_BUCKET_NAME_LEN: usize = 63;
const MAX_ROLE_NAME_LEN: usize = 64;

/// Per-region resources a replication region receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplicationResource {
    /// The destination bucket.
    Bucket,
    /// The destination key alias.
    KeyAlias,
}

/// Resolves canonical resource identifiers for one prefix and environment.
#[derive(Debug, Clone)]
pub struct NamingResolver {
    prefix: Prefix,
    environment: TargetEnvironment,
}

impl NamingResolver {
    /// Create a resolver.
    #[must_use]
    pub fn new(prefix: Prefix, environment: TargetEnvironment) -> Self {
        Self { prefix, environment }
    }

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

    /// Resolve one per-region resource.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if the resulting bucket name
    /// is not a legal bucket name.
    pub fn resolve(
        &self,
        region: &Region,
        kind: ReplicationResource,
    ) -> TopologyResult<ResourceIdentifier> {
        match kind {
            ReplicationResource::Bucket => bucket(
                ResourceKind::ReplicationBucket,
                format!("{}-archive-replication-{region}", self.prefix),
                region,
            ),
            ReplicationResource::KeyAlias => {
                Ok(self.key_alias(ResourceKind::ReplicationKeyAlias, REPLICATION_KEY_ALIAS, region))
            }
        }
    }

    /// Resolve both destination identifiers of `region`.
    ///
    /// # Errors
    ///
    /// See [`NamingResolver::resolve`].
    pub fn resolve_region(&self, region: &Region) -> TopologyResult<ResolvedRegion> {
        Ok(ResolvedRegion {
            region: region.clone(),
            bucket: self.resolve(region, ReplicationResource::Bucket)?,
            key_alias: self.resolve(region, ReplicationResource::KeyAlias)?,
        })
    }

    /// Resolve every region, preserving input order.
    ///
    /// # Errors
    ///
    /// See [`NamingResolver::resolve`].
    pub fn resolve_all(&self, regions: &[Region]) -> TopologyResult<Vec<ResolvedRegion>> {
        let resolved = regions
            .iter()
            .map(|region| self.resolve_region(region))
            .collect::<TopologyResult<Vec<_>>>()?;
        debug!(prefix = %self.prefix, regions = resolved.len(), "Resolved replication identifiers");
        Ok(resolved)
    }

    /// The archive bucket in the home region.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if the bucket name would be
    /// longer than 63 characters.
    pub fn primary_bucket(&self) -> TopologyResult<ResourceIdentifier> {
        let home = self.environment.home_region();
        bucket(
            ResourceKind::PrimaryBucket,
            format!("{}-archive-{}-{home}", self.prefix, self.environment.account_id()),
            home,
        )
    }

    /// The archive key in the home region.
    #[must_use]
    pub fn primary_key(&self) -> ResourceIdentifier {
        self.key(
            ResourceKind::PrimaryKey,
            format!("{}-archive-key", self.prefix),
            self.environment.home_region(),
        )
    }

    /// The destination key in `region`.
    #[must_use]
    pub fn replication_key(&self, region: &Region) -> ResourceIdentifier {
        self.key(
            ResourceKind::ReplicationKey,
            format!("{}-archive-replication-key", self.prefix),
            region,
        )
    }

    /// The archive key alias in the home region.
    #[must_use]
    pub fn primary_key_alias(&self) -> ResourceIdentifier {
        self.key_alias(
            ResourceKind::PrimaryKeyAlias,
            ARCHIVE_KEY_ALIAS,
            self.environment.home_region(),
        )
    }

    /// The role assumed by the storage service to replicate.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if the role name would be
    /// longer than 64 characters.
    pub fn replication_role(&self) -> TopologyResult<ResourceIdentifier> {
        let name = format!("{}-archive-replication-role", self.prefix);
        if name.len() > MAX_ROLE_NAME_LEN {
            return Err(TopologyError::invalid_input(
                "prefix",
                format!("role name {name} exceeds {MAX_ROLE_NAME_LEN} characters"),
            ));
        }
        let arn = format!(
            "arn:aws:iam::{}:role{ROLE_PATH}{name}",
            self.environment.account_id()
        );
        Ok(ResourceIdentifier::new(ResourceKind::ReplicationRole, name, arn, None))
    }

    /// Name of the stack set that provisions the replication regions.
    #[must_use]
    pub fn stack_set_name(&self) -> String {
        format!("{}-archive-replication", self.prefix)
    }

    /// Name of the stack holding the home region resources.
    #[must_use]
    pub fn home_stack_name(&self) -> String {
        format!("{}-archive-stack", self.prefix)
    }

    fn key(&self, kind: ResourceKind, name: String, region: &Region) -> ResourceIdentifier {
        let arn = format!("arn:aws:kms:{region}:{}:key/{name}", self.environment.account_id());
        ResourceIdentifier::new(kind, name, arn, Some(region.clone()))
    }

    fn key_alias(&self, kind: ResourceKind, alias: &str, region: &Region) -> ResourceIdentifier {
        let arn = format!("arn:aws:kms:{region}:{}:{alias}", self.environment.account_id());
        ResourceIdentifier::new(kind, alias.to_string(), arn, Some(region.clone()))
    }
}

/// Resolve one per-region resource from raw input.
///
/// # Errors
///
/// Returns [`TopologyError::InvalidInput`] if the prefix is empty or
/// contains characters illegal in a resource name, if the region is empty,
/// or if the resulting bucket name is too long.
pub fn resolve(
    prefix: &str,
    environment: &TargetEnvironment,
    region: &str,
    kind: ReplicationResource,
) -> TopologyResult<ResourceIdentifier> {
    let resolver = NamingResolver::new(Prefix::parse(prefix)?, environment.clone());
    resolver.resolve(&Region::new(region)?, kind)
}

fn bucket(kind: ResourceKind, name: String, region: &Region) -> TopologyResult<ResourceIdentifier> {
    if !(MIN_BUCKET_NAME_LEN..=MAX_BUCKET_NAME_LEN).contains(&name.len()) {
        return Err(TopologyError::invalid_input(
            "prefix",
            format!(
                "bucket name {name} must be {MIN_BUCKET_NAME_LEN} to {MAX_BUCKET_NAME_LEN} characters"
            ),
        ));
    }
    let arn = format!("arn:aws:s3:::{name}");
    Ok(ResourceIdentifier::new(kind, name, arn, Some(region.clone())))
}
