//! Public Access Block configuration for buckets.

use serde::{Deserialize, Serialize};

/// Public Access Block configuration for a bucket.
///
/// All fields default to `false` (allowing public access).
/// Set fields to `true` to block the corresponding type of public access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PublicAccessBlockConfiguration {
    /// Reject requests that include public ACL grants.
    #[serde(default)]
    pub block_public_acls: bool,

    /// Ignore all public ACLs on the bucket and its objects.
    #[serde(default)]
    pub ignore_public_acls: bool,

    /// Reject bucket policies that grant public access.
    #[serde(default)]
    pub block_public_policy: bool,

    /// Only allow authenticated principals if the bucket has a public policy.
    #[serde(default)]
    pub restrict_public_buckets: bool,
}

impl PublicAccessBlockConfiguration {
    /// Creates a configuration that blocks all public access.
    #[must_use]
    pub fn block_all() -> Self {
        Self {
            block_public_acls: true,
            ignore_public_acls: true,
            block_public_policy: true,
            restrict_public_buckets: true,
        }
    }

    /// Returns true if all public access is blocked.
    #[must_use]
    pub fn blocks_all(&self) -> bool {
        self.block_public_acls
            && self.ignore_public_acls
            && self.block_public_policy
            && self.restrict_public_buckets
    }
}
