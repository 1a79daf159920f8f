//! Validated input values and resolved resource identifiers.

use std::fmt;

use serde::Serialize;

use crate::error::{TopologyError, TopologyResult};

/// Naming prefix shared by every derived resource.
///
/// One or more of `[a-z0-9-]`, starting and ending with a letter or digit,
/// so it is a legal component of a bucket, role and stack name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Prefix(String);

impl Prefix {
    /// Parse and validate a prefix.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if the prefix is empty or
    /// contains characters illegal in a resource name.
    pub fn parse(s: &str) -> TopologyResult<Self> {
        if s.is_empty() {
            return Err(TopologyError::invalid_input("prefix", "must not be empty"));
        }
        if let Some(c) = s.chars().find(|c| !matches!(c, 'a'..='z' | '0'..='9' | '-')) {
            return Err(TopologyError::invalid_input(
                "prefix",
                format!("{s:?} contains {c:?}; only lowercase letters, digits and '-' are allowed"),
            ));
        }
        if s.starts_with('-') || s.ends_with('-') {
            return Err(TopologyError::invalid_input(
                "prefix",
                format!("{s:?} must start and end with a letter or digit"),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the prefix as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A provider region name such as `us-west-2`.
///
/// Membership in the provider's region set is not checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Region(String);

impl Region {
    /// Create a region, rejecting empty names.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if the name is empty.
    pub fn new(name: impl Into<String>) -> TopologyResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(TopologyError::invalid_input("region", "must not be empty"));
        }
        Ok(Self(name))
    }

    /// Get the region as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A twelve digit account id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Parse an account id.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] unless `s` is exactly twelve
    /// ASCII digits.
    pub fn parse(s: &str) -> TopologyResult<Self> {
        if s.is_empty() {
            return Err(TopologyError::invalid_input("account_id", "must not be empty"));
        }
        if s.len() != 12 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TopologyError::invalid_input(
                "account_id",
                format!("{s:?} is not a 12 digit account id"),
            ));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the account id as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account and home region the primary resources and replication role live
/// under. Fixed for the lifetime of a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetEnvironment {
    account_id: AccountId,
    home_region: Region,
}

impl TargetEnvironment {
    /// Create a target environment.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::InvalidInput`] if either value is empty or
    /// malformed.
    pub fn new(account_id: &str, home_region: &str) -> TopologyResult<Self> {
        let account_id = AccountId::parse(account_id)?;
        let home_region = Region::new(home_region).map_err(|_| {
            TopologyError::invalid_input("home_region", format!("{home_region:?} is not a region"))
        })?;
        Ok(Self { account_id, home_region })
    }

    /// The owning account.
    #[must_use]
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// The region hosting the primary bucket and key.
    #[must_use]
    pub fn home_region(&self) -> &Region {
        &self.home_region
    }
}

/// What a [`ResourceIdentifier`] names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResourceKind {
    /// The archive bucket in the home region.
    PrimaryBucket,
    /// The archive key in the home region.
    PrimaryKey,
    /// Alias of the archive key in the home region.
    PrimaryKeyAlias,
    /// The role the storage service assumes to replicate.
    ReplicationRole,
    /// A destination bucket in a replication region.
    ReplicationBucket,
    /// The destination key in a replication region.
    ReplicationKey,
    /// Alias of the destination key in a replication region.
    ReplicationKeyAlias,
}

impl ResourceKind {
    /// Returns true for bucket kinds.
    #[must_use]
    pub fn is_bucket(&self) -> bool {
        matches!(self, Self::PrimaryBucket | Self::ReplicationBucket)
    }

    /// Returns true for key kinds, not their aliases.
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self, Self::PrimaryKey | Self::ReplicationKey)
    }
}

/// A resolved, fully-qualified resource identifier.
///
/// Only the naming resolver constructs these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResourceIdentifier {
    kind: ResourceKind,
    name: String,
    arn: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<Region>,
}

impl ResourceIdentifier {
    pub(crate) fn new(
        kind: ResourceKind,
        name: String,
        arn: String,
        region: Option<Region>,
    ) -> Self {
        Self { kind, name, arn, region }
    }

    /// The kind of resource.
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The resource name (bucket, key, alias or role name).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The resource ARN.
    #[must_use]
    pub fn arn(&self) -> &str {
        &self.arn
    }

    /// The region the resource lives in; `None` for global resources.
    #[must_use]
    pub fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// ARN pattern covering every object (version) in a bucket.
    #[must_use]
    pub fn objects_arn(&self) -> String {
        format!("{}/*", self.arn)
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arn)
    }
}

/// The destination identifiers of one replication region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResolvedRegion {
    /// The target region.
    pub region: Region,
    /// Destination bucket.
    pub bucket: ResourceIdentifier,
    /// Destination key alias.
    pub key_alias: ResourceIdentifier,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_accepts_valid() {
        for p in ["archive", "a", "team-1", "0x"] {
            assert_eq!(Prefix::parse(p).unwrap().as_str(), p);
        }
    }

    #[test]
    fn test_prefix_rejects_invalid() {
        for p in ["", "Archive", "arch_ive", "arch ive", "-archive", "archive-", "arch.ive", "é"] {
            let err = Prefix::parse(p).unwrap_err();
            assert!(
                matches!(err, TopologyError::InvalidInput { field: "prefix", .. }),
                "{p:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_region_validation() {
        assert_eq!(Region::new("us-west-2").unwrap().to_string(), "us-west-2");
        assert!(Region::new("").is_err());
        // Syntax is left to the provider.
        assert!(Region::new("mars-north-1").is_ok());
    }

    #[test]
    fn test_account_id_validation() {
        assert!(AccountId::parse("123456789012").is_ok());
        assert!(AccountId::parse("").is_err());
        assert!(AccountId::parse("12345").is_err());
        assert!(AccountId::parse("12345678901a").is_err());
    }

    #[test]
    fn test_target_environment() {
        let env = TargetEnvironment::new("123456789012", "us-east-1").unwrap();
        assert_eq!(env.account_id().as_str(), "123456789012");
        assert_eq!(env.home_region().as_str(), "us-east-1");

        let err = TargetEnvironment::new("123456789012", "").unwrap_err();
        assert!(matches!(err, TopologyError::InvalidInput { field: "home_region", .. }));

        let err = TargetEnvironment::new("", "us-east-1").unwrap_err();
        assert!(matches!(err, TopologyError::InvalidInput { field: "account_id", .. }));
    }

    #[test]
    fn test_objects_arn() {
        let id = ResourceIdentifier::new(
            ResourceKind::ReplicationBucket,
            "b".to_string(),
            "arn:aws:s3:::b".to_string(),
            None,
        );
        assert_eq!(id.objects_arn(), "arn:aws:s3:::b/*");
        assert!(id.kind().is_bucket());
    }
}
