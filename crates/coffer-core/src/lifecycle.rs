//! Lifecycle configuration for buckets.
//!
//! Rules control automatic storage-class transitions, expiration of current
//! versions and cleanup of abandoned multipart uploads.

use serde::{Deserialize, Serialize};

pub use crate::replication::RuleStatus;

/// Lifecycle configuration for a bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleConfiguration {
    /// List of lifecycle rules.
    pub rules: Vec<LifecycleRule>,
}

/// A single lifecycle rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LifecycleRule {
    /// Unique identifier for the rule.
    #[serde(rename = "ID")]
    pub id: String,

    /// Status of the rule (Enabled or Disabled).
    pub status: RuleStatus,

    /// Key prefix the rule applies to; empty selects the whole bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Expiration settings for current versions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Expiration>,

    /// Storage class transitions, in the order they were declared.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Transition>,

    /// Settings for aborting incomplete multipart uploads.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abort_incomplete_multipart_upload: Option<AbortIncompleteMultipartUpload>,
}

impl LifecycleRule {
    /// Creates an enabled rule with no actions.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: RuleStatus::Enabled,
            prefix: None,
            expiration: None,
            transitions: Vec::new(),
            abort_incomplete_multipart_upload: None,
        }
    }

    /// Expires current versions `days` after creation.
    #[must_use]
    pub fn with_expiration_days(mut self, days: u32) -> Self {
        self.expiration = Some(Expiration { days });
        self
    }

    /// Adds a transition to `storage_class` after `days`.
    #[must_use]
    pub fn with_transition(mut self, storage_class: StorageClass, days: u32) -> Self {
        self.transitions.push(Transition { days, storage_class });
        self
    }

    /// Aborts multipart uploads left incomplete for `days`.
    #[must_use]
    pub fn with_abort_incomplete_multipart_upload(mut self, days: u32) -> Self {
        self.abort_incomplete_multipart_upload =
            Some(AbortIncompleteMultipartUpload { days_after_initiation: days });
        self
    }

    /// Checks the rule for contradictions.
    ///
    /// # Errors
    ///
    /// Returns a description of the first problem found: a rule with no
    /// action, or a transition scheduled on or after expiration.
    pub fn validate(&self) -> Result<(), String> {
        if self.expiration.is_none()
            && self.transitions.is_empty()
            && self.abort_incomplete_multipart_upload.is_none()
        {
            return Err(format!("lifecycle rule {} has no action", self.id));
        }
        if let Some(expiration) = &self.expiration {
            if let Some(t) = self.transitions.iter().find(|t| t.days >= expiration.days) {
                return Err(format!(
                    "lifecycle rule {}: transition to {} after {} days is not before expiration",
                    self.id,
                    t.storage_class.as_str(),
                    t.days
                ));
            }
        }
        Ok(())
    }
}

/// Expiration settings for current object versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Expiration {
    /// Number of days after object creation when the object expires.
    pub days: u32,
}

/// A storage class transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Transition {
    /// Days after creation.
    pub days: u32,
    /// Target storage class.
    pub storage_class: StorageClass,
}

/// Storage classes objects may transition to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StorageClass {
    /// Infrequent access.
    StandardIa,
    /// One zone infrequent access.
    OnezoneIa,
    /// Intelligent tiering.
    IntelligentTiering,
    /// Glacier flexible retrieval.
    Glacier,
    /// Glacier deep archive.
    DeepArchive,
}

impl StorageClass {
    /// Convert to string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StandardIa => "STANDARD_IA",
            Self::OnezoneIa => "ONEZONE_IA",
            Self::IntelligentTiering => "INTELLIGENT_TIERING",
            Self::Glacier => "GLACIER",
            Self::DeepArchive => "DEEP_ARCHIVE",
        }
    }
}

/// Settings for aborting incomplete multipart uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AbortIncompleteMultipartUpload {
    /// Number of days after initiation when incomplete uploads are aborted.
    pub days_after_initiation: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_serialization() {
        let json = serde_json::to_string(&StorageClass::StandardIa).unwrap();
        assert_eq!(json, "\"STANDARD_IA\"");
        assert_eq!(StorageClass::DeepArchive.as_str(), "DEEP_ARCHIVE");
    }

    #[test]
    fn test_rule_builders() {
        let rule = LifecycleRule::new("tiering")
            .with_abort_incomplete_multipart_upload(90)
            .with_expiration_days(365)
            .with_transition(StorageClass::StandardIa, 30);

        assert_eq!(rule.status, RuleStatus::Enabled);
        assert_eq!(rule.expiration, Some(Expiration { days: 365 }));
        assert_eq!(rule.transitions.len(), 1);
        assert!(rule.validate().is_ok());

        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["ID"], "tiering");
        assert_eq!(json["Transitions"][0]["StorageClass"], "STANDARD_IA");
        assert_eq!(json["AbortIncompleteMultipartUpload"]["DaysAfterInitiation"], 90);
        assert!(json.get("Prefix").is_none());
    }

    #[test]
    fn test_validate_rule_without_action() {
        assert!(LifecycleRule::new("empty").validate().is_err());
    }

    #[test]
    fn test_validate_transition_after_expiration() {
        let rule = LifecycleRule::new("bad")
            .with_expiration_days(30)
            .with_transition(StorageClass::Glacier, 30);
        let err = rule.validate().unwrap_err();
        assert!(err.contains("GLACIER"));
    }
}
