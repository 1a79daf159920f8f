//! Server-side encryption configuration for buckets.
//!
//! Archive buckets always default to SSE-KMS with a customer managed key and
//! the bucket key enabled.

use serde::{Deserialize, Serialize};

/// Server-side encryption configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSideEncryptionConfiguration {
    /// List of encryption rules (typically just one).
    pub rules: Vec<ServerSideEncryptionRule>,
}

impl ServerSideEncryptionConfiguration {
    /// SSE-KMS default encryption with `key_id` and the bucket key enabled.
    #[must_use]
    pub fn kms(key_id: impl Into<String>) -> Self {
        Self {
            rules: vec![ServerSideEncryptionRule {
                apply_server_side_encryption_by_default: ApplyServerSideEncryptionByDefault {
                    sse_algorithm: SseAlgorithm::AwsKms,
                    kms_master_key_id: Some(key_id.into()),
                },
                bucket_key_enabled: true,
            }],
        }
    }

    /// Returns the KMS key objects are encrypted with by default, if any.
    #[must_use]
    pub fn kms_key_id(&self) -> Option<&str> {
        self.rules.iter().find_map(|r| {
            let default = &r.apply_server_side_encryption_by_default;
            match default.sse_algorithm {
                SseAlgorithm::AwsKms => default.kms_master_key_id.as_deref(),
                SseAlgorithm::Aes256 => None,
            }
        })
    }
}

/// A server-side encryption rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServerSideEncryptionRule {
    /// The default server-side encryption to apply.
    pub apply_server_side_encryption_by_default: ApplyServerSideEncryptionByDefault,
    /// Whether to use the bucket key for SSE-KMS.
    #[serde(default)]
    pub bucket_key_enabled: bool,
}

/// Default encryption settings to apply to new objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyServerSideEncryptionByDefault {
    /// The server-side encryption algorithm (AES256 or aws:kms).
    #[serde(rename = "SSEAlgorithm")]
    pub sse_algorithm: SseAlgorithm,
    /// KMS master key ID (only for aws:kms algorithm).
    #[serde(rename = "KMSMasterKeyID", default, skip_serializing_if = "Option::is_none")]
    pub kms_master_key_id: Option<String>,
}

/// Server-side encryption algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SseAlgorithm {
    /// AES256 encryption (S3-managed keys).
    #[serde(rename = "AES256")]
    Aes256,
    /// AWS KMS encryption.
    #[serde(rename = "aws:kms")]
    AwsKms,
}

impl SseAlgorithm {
    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AES256" => Some(Self::Aes256),
            "aws:kms" => Some(Self::AwsKms),
            _ => None,
        }
    }

    /// Convert to string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aes256 => "AES256",
            Self::AwsKms => "aws:kms",
        }
    }
}
