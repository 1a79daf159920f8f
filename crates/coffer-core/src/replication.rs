//! Bucket replication configuration types.
//!
//! These mirror the S3 Cross-Region Replication document the archive bucket
//! carries.
//!
//! ```json
//! {
//!   "Role": "arn:aws:iam::123456789012:role/service-role/archive-archive-replication-role",
//!   "Rules": [
//!     {
//!       "ID": "us-west-2",
//!       "Priority": 0,
//!       "Status": "Enabled",
//!       "Filter": { "Prefix": "" },
//!       "Destination": {
//!         "Bucket": "arn:aws:s3:::archive-archive-replication-us-west-2",
//!         "EncryptionConfiguration": {
//!           "ReplicaKmsKeyID": "arn:aws:kms:us-west-2:123456789012:alias/archive/replication"
//!         }
//!       },
//!       "DeleteMarkerReplication": { "Status": "Enabled" },
//!       "SourceSelectionCriteria": {
//!         "SseKmsEncryptedObjects": { "Status": "Enabled" }
//!       }
//!     }
//!   ]
//! }
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Replication configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationConfiguration {
    /// IAM role ARN for replication.
    pub role: String,
    /// List of replication rules.
    pub rules: Vec<ReplicationRule>,
}

impl ReplicationConfiguration {
    /// Creates a configuration from a role ARN and its rules.
    #[must_use]
    pub fn new(role: impl Into<String>, rules: Vec<ReplicationRule>) -> Self {
        Self { role: role.into(), rules }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the role is missing, there are no rules, or two
    /// rules share an id or a priority.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        if self.role.is_empty() {
            return Err(ReplicationConfigError::MissingRole);
        }

        if self.rules.is_empty() {
            return Err(ReplicationConfigError::NoRules);
        }

        let mut ids = HashSet::new();
        let mut priorities = HashSet::new();
        for rule in &self.rules {
            if !ids.insert(rule.id.as_str()) {
                return Err(ReplicationConfigError::DuplicateRuleId(rule.id.clone()));
            }
            if !priorities.insert(rule.priority) {
                return Err(ReplicationConfigError::DuplicatePriority(rule.priority));
            }
            rule.validate()?;
        }

        Ok(())
    }
}

/// A single replication rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationRule {
    /// Unique identifier for the rule.
    #[serde(rename = "ID")]
    pub id: String,

    /// Priority of the rule (lower = higher priority).
    pub priority: u32,

    /// Status of the rule (Enabled or Disabled).
    pub status: RuleStatus,

    /// Filter to select objects this rule applies to.
    #[serde(default)]
    pub filter: ReplicationFilter,

    /// Destination bucket for replicated objects.
    pub destination: ReplicationDestination,

    /// Whether to replicate delete markers.
    pub delete_marker_replication: DeleteMarkerReplication,

    /// Criteria for selecting source objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_selection_criteria: Option<SourceSelectionCriteria>,
}

impl ReplicationRule {
    /// Creates an enabled rule covering the whole bucket.
    ///
    /// Delete markers are not replicated and no source selection criteria
    /// are set until the corresponding `with_*` method is called.
    #[must_use]
    pub fn new(id: impl Into<String>, priority: u32, destination: ReplicationDestination) -> Self {
        Self {
            id: id.into(),
            priority,
            status: RuleStatus::Enabled,
            filter: ReplicationFilter::default(),
            destination,
            delete_marker_replication: DeleteMarkerReplication { status: RuleStatus::Disabled },
            source_selection_criteria: None,
        }
    }

    /// Sets the key prefix filter.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.filter.prefix = prefix.into();
        self
    }

    /// Enables or disables delete marker replication.
    #[must_use]
    pub fn with_delete_marker_replication(mut self, enabled: bool) -> Self {
        self.delete_marker_replication.status = RuleStatus::from_enabled(enabled);
        self
    }

    /// Restricts the rule to SSE-KMS encrypted source objects.
    #[must_use]
    pub fn with_kms_encrypted_source(mut self) -> Self {
        self.source_selection_criteria = Some(SourceSelectionCriteria {
            sse_kms_encrypted_objects: SseKmsEncryptedObjects { status: RuleStatus::Enabled },
        });
        self
    }

    /// Returns true if delete markers are replicated.
    #[must_use]
    pub fn replicates_delete_markers(&self) -> bool {
        self.delete_marker_replication.status == RuleStatus::Enabled
    }

    /// Returns the key prefix this rule selects.
    #[must_use]
    pub fn filter_prefix(&self) -> &str {
        &self.filter.prefix
    }

    /// Returns true if only SSE-KMS encrypted source objects are replicated.
    #[must_use]
    pub fn requires_kms_encrypted_source(&self) -> bool {
        self.source_selection_criteria
            .as_ref()
            .is_some_and(|c| c.sse_kms_encrypted_objects.status == RuleStatus::Enabled)
    }

    /// Returns the destination key the replicas are encrypted with, if any.
    #[must_use]
    pub fn replica_kms_key(&self) -> Option<&str> {
        self.destination
            .encryption_configuration
            .as_ref()
            .map(|e| e.replica_kms_key_id.as_str())
    }

    /// Validate the rule.
    ///
    /// # Errors
    ///
    /// Returns an error if the id or destination bucket is empty, or if an
    /// encryption configuration names no key.
    pub fn validate(&self) -> Result<(), ReplicationConfigError> {
        if self.id.is_empty() {
            return Err(ReplicationConfigError::MissingRuleId);
        }
        if self.destination.bucket.is_empty() {
            return Err(ReplicationConfigError::MissingDestination(self.id.clone()));
        }
        if self.replica_kms_key().is_some_and(str::is_empty) {
            return Err(ReplicationConfigError::MissingReplicaKey(self.id.clone()));
        }
        Ok(())
    }
}

/// Status of a replication rule or one of its sub-settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleStatus {
    /// Rule is active.
    #[default]
    Enabled,
    /// Rule is inactive.
    Disabled,
}

impl RuleStatus {
    /// Maps a flag to `Enabled` or `Disabled`.
    #[must_use]
    pub const fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Filter to select objects for replication.
///
/// An empty prefix selects the whole bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationFilter {
    /// Key name prefix that selects objects.
    #[serde(default)]
    pub prefix: String,
}

/// Destination for replicated objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReplicationDestination {
    /// Destination bucket ARN.
    pub bucket: String,

    /// Encryption configuration for replicated objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_configuration: Option<EncryptionConfiguration>,
}

impl ReplicationDestination {
    /// Creates a destination for the given bucket ARN.
    #[must_use]
    pub fn new(bucket: impl Into<String>) -> Self {
        Self { bucket: bucket.into(), encryption_configuration: None }
    }

    /// Encrypts replicas with the given destination key.
    #[must_use]
    pub fn with_replica_kms_key(mut self, key_id: impl Into<String>) -> Self {
        self.encryption_configuration =
            Some(EncryptionConfiguration { replica_kms_key_id: key_id.into() });
        self
    }
}

/// Encryption configuration for destination objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptionConfiguration {
    /// KMS key ID (or alias ARN) for destination encryption.
    #[serde(rename = "ReplicaKmsKeyID")]
    pub replica_kms_key_id: String,
}

/// Delete marker replication settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMarkerReplication {
    /// Status of delete marker replication.
    pub status: RuleStatus,
}

/// Source selection criteria for replication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SourceSelectionCriteria {
    /// Settings for replicating SSE-KMS encrypted objects.
    pub sse_kms_encrypted_objects: SseKmsEncryptedObjects,
}

/// Settings for replicating SSE-KMS encrypted objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SseKmsEncryptedObjects {
    /// Status of SSE-KMS replication.
    pub status: RuleStatus,
}

/// Errors from replication configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplicationConfigError {
    /// Role ARN is required.
    #[error("Role ARN is required")]
    MissingRole,

    /// At least one rule is required.
    #[error("At least one rule is required")]
    NoRules,

    /// Rule id is required.
    #[error("Rule ID is required")]
    MissingRuleId,

    /// Duplicate rule ID.
    #[error("Duplicate rule ID: {0}")]
    DuplicateRuleId(String),

    /// Two rules share a priority.
    #[error("Duplicate rule priority: {0}")]
    DuplicatePriority(u32),

    /// Destination bucket is required.
    #[error("Destination bucket is required for rule {0}")]
    MissingDestination(String),

    /// Encryption configuration without a key.
    #[error("Replica KMS key is required for rule {0}")]
    MissingReplicaKey(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROLE: &str = "arn:aws:iam::123456789012:role/service-role/replication";

    fn rule(id: &str, priority: u32) -> ReplicationRule {
        ReplicationRule::new(
            id,
            priority,
            ReplicationDestination::new(format!("arn:aws:s3:::dest-{id}"))
                .with_replica_kms_key(format!("arn:aws:kms:{id}:123456789012:alias/dest")),
        )
    }

    #[test]
    fn test_rule_status_from_flag() {
        assert_eq!(RuleStatus::from_enabled(true), RuleStatus::Enabled);
        assert_eq!(RuleStatus::from_enabled(false), RuleStatus::Disabled);
        assert_eq!(serde_json::to_value(RuleStatus::Disabled).unwrap(), "Disabled");
    }

    #[test]
    fn test_new_rule_defaults() {
        let rule = ReplicationRule::new("r", 3, ReplicationDestination::new("arn:aws:s3:::d"));
        assert_eq!(rule.status, RuleStatus::Enabled);
        assert_eq!(rule.filter_prefix(), "");
        assert!(!rule.replicates_delete_markers());
        assert!(!rule.requires_kms_encrypted_source());
        assert_eq!(rule.replica_kms_key(), None);
    }

    #[test]
    fn test_rule_builders() {
        let rule = rule("us-west-2", 0).with_delete_marker_replication(true).with_kms_encrypted_source();
        assert!(rule.replicates_delete_markers());
        assert!(rule.requires_kms_encrypted_source());
        assert_eq!(rule.replica_kms_key(), Some("arn:aws:kms:us-west-2:123456789012:alias/dest"));
    }

    #[test]
    fn test_validate_empty_role() {
        let config = ReplicationConfiguration::new("", vec![rule("a", 0)]);
        assert_eq!(config.validate(), Err(ReplicationConfigError::MissingRole));
    }

    #[test]
    fn test_validate_no_rules() {
        let config = ReplicationConfiguration::new(ROLE, vec![]);
        assert_eq!(config.validate(), Err(ReplicationConfigError::NoRules));
    }

    #[test]
    fn test_validate_duplicate_rule_ids() {
        let config = ReplicationConfiguration::new(ROLE, vec![rule("a", 0), rule("a", 1)]);
        assert_eq!(config.validate(), Err(ReplicationConfigError::DuplicateRuleId("a".into())));
    }

    #[test]
    fn test_validate_duplicate_priorities() {
        let config = ReplicationConfiguration::new(ROLE, vec![rule("a", 0), rule("b", 0)]);
        assert_eq!(config.validate(), Err(ReplicationConfigError::DuplicatePriority(0)));
    }

    #[test]
    fn test_validate_missing_destination() {
        let config = ReplicationConfiguration::new(
            ROLE,
            vec![ReplicationRule::new("a", 0, ReplicationDestination::new(""))],
        );
        assert!(matches!(config.validate(), Err(ReplicationConfigError::MissingDestination(_))));
    }

    #[test]
    fn test_valid_config() {
        let config = ReplicationConfiguration::new(ROLE, vec![rule("a", 0), rule("b", 1)]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialized_shape() {
        let config = ReplicationConfiguration::new(
            ROLE,
            vec![rule("us-west-2", 0).with_delete_marker_replication(true).with_kms_encrypted_source()],
        );

        let json = serde_json::to_value(&config).unwrap();
        let rule = &json["Rules"][0];
        assert_eq!(rule["ID"], "us-west-2");
        assert_eq!(rule["Priority"], 0);
        assert_eq!(rule["Status"], "Enabled");
        assert_eq!(rule["Filter"]["Prefix"], "");
        assert_eq!(rule["DeleteMarkerReplication"]["Status"], "Enabled");
        assert_eq!(rule["SourceSelectionCriteria"]["SseKmsEncryptedObjects"]["Status"], "Enabled");
        assert_eq!(
            rule["Destination"]["EncryptionConfiguration"]["ReplicaKmsKeyID"],
            "arn:aws:kms:us-west-2:123456789012:alias/dest"
        );

        let parsed: ReplicationConfiguration = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, config);
    }
}
