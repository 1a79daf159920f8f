//! Replication rule builder.

use coffer_core::replication::{ReplicationDestination, ReplicationRule};
use tracing::debug;

use crate::types::ResolvedRegion;

/// Build one replication rule per region.
///
/// The rule id is the region name and the priority is its position in
/// `regions`. Every rule is enabled, covers the whole bucket, replicates
/// delete markers, selects only SSE-KMS encrypted source objects and
/// encrypts replicas with the destination key. An empty input gives an
/// empty rule set.
#[must_use]
pub fn build_rules(regions: &[ResolvedRegion]) -> Vec<ReplicationRule> {
    let rules: Vec<_> = (0u32..)
        .zip(regions)
        .map(|(priority, resolved)| {
            let destination = ReplicationDestination::new(resolved.bucket.arn())
                .with_replica_kms_key(resolved.key_alias.arn());
            ReplicationRule::new(resolved.region.as_str(), priority, destination)
                .with_prefix("")
                .with_delete_marker_replication(true)
                .with_kms_encrypted_source()
        })
        .collect();

    debug!(rules = rules.len(), "Built replication rules");
    rules
}
