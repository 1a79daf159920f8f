//! IAM-style permission policy documents and evaluation.
//!
//! This module provides the statement and document types used for both
//! resource policies (bucket guards, which name a principal) and identity
//! policies (the replication role, which do not), plus the evaluation logic
//! used to check that a statement set grants a given action on a resource.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// The only policy language version Coffer emits.
pub const POLICY_VERSION: &str = "2012-10-17";

/// The result of policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// An explicit Allow from a policy statement.
    Allow,
    /// An explicit Deny from a policy statement.
    Deny,
    /// No matching statement found (implicit deny).
    DefaultDeny,
}

/// A policy document following the AWS IAM policy format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// The policy language version (should be "2012-10-17").
    pub version: String,
    /// An optional identifier for the policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The policy statements.
    pub statement: Vec<Statement>,
}

/// A single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// An optional identifier for the statement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
    /// Whether this statement allows or denies access.
    pub effect: Effect,
    /// The principal(s) this statement applies to. Identity policies leave
    /// this unset; the statement then applies to whoever holds the policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<Principal>,
    /// The action(s) this statement covers.
    pub action: ActionSet,
    /// The resource(s) this statement covers, in the order they were derived.
    /// Trust policies name a principal and leave this empty.
    #[serde(default, with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub resource: Vec<String>,
}

/// The effect of a policy statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    /// Allow the action.
    Allow,
    /// Deny the action.
    Deny,
}

/// The principal(s) a policy applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Principal {
    /// Wildcard - applies to everyone.
    Wildcard(WildcardPrincipal),
    /// Specific principals.
    Specific(PrincipalSpec),
}

impl Principal {
    /// The any-principal (`"*"`).
    #[must_use]
    pub fn any() -> Self {
        Self::Wildcard(WildcardPrincipal)
    }

    /// A service principal such as `s3.amazonaws.com`.
    #[must_use]
    pub fn service(service: impl Into<String>) -> Self {
        Self::Specific(PrincipalSpec {
            aws: None,
            service: Some(StringOrArray::Single(service.into())),
        })
    }

    /// Returns true if this is the any-principal.
    #[must_use]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Wildcard(_))
    }

    fn matches(&self, principal: Option<&str>) -> bool {
        match self {
            Self::Wildcard(_) => true,
            Self::Specific(spec) => principal.is_some_and(|p| {
                spec.aws.as_ref().is_some_and(|aws| aws.matches(p))
                    || spec.service.as_ref().is_some_and(|svc| svc.matches(p))
            }),
        }
    }
}

/// Represents a wildcard principal "*".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPrincipal;

impl Serialize for WildcardPrincipal {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str("*")
    }
}

impl<'de> Deserialize<'de> for WildcardPrincipal {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        if s == "*" {
            Ok(WildcardPrincipal)
        } else {
            Err(serde::de::Error::custom("expected \"*\""))
        }
    }
}

/// Specific principal specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PrincipalSpec {
    /// Account ARNs or account IDs.
    #[serde(default, rename = "AWS", skip_serializing_if = "Option::is_none")]
    pub aws: Option<StringOrArray>,
    /// Service principals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<StringOrArray>,
}

/// Either a single string or an array of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrArray {
    /// A single string.
    Single(String),
    /// An array of strings.
    Array(Vec<String>),
}

impl StringOrArray {
    /// Returns an iterator over the values.
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        let values: &[String] = match self {
            StringOrArray::Single(s) => std::slice::from_ref(s),
            StringOrArray::Array(v) => v,
        };
        values.iter().map(String::as_str)
    }

    /// Returns true if the given value matches any of the patterns.
    pub fn matches(&self, value: &str) -> bool {
        self.iter().any(|pattern| wildcard_match(pattern, value))
    }
}

/// Actions Coffer grants or denies.
///
/// Declaration order is the order actions are rendered in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Action {
    /// s3:*
    S3All,
    /// s3:GetReplicationConfiguration
    GetReplicationConfiguration,
    /// s3:List*
    ListAll,
    /// s3:ListBucket
    ListBucket,
    /// s3:ListBucketVersions
    ListBucketVersions,
    /// s3:GetObjectVersion
    GetObjectVersion,
    /// s3:GetObjectVersionAcl
    GetObjectVersionAcl,
    /// s3:GetObjectVersionForReplication
    GetObjectVersionForReplication,
    /// s3:GetObjectVersionTagging
    GetObjectVersionTagging,
    /// s3:ReplicateDelete
    ReplicateDelete,
    /// s3:ReplicateObject
    ReplicateObject,
    /// s3:ReplicateTags
    ReplicateTags,
    /// s3:GetBucketVersioning
    GetBucketVersioning,
    /// s3:PutBucketVersioning
    PutBucketVersioning,
    /// s3:DeleteBucket
    DeleteBucket,
    /// s3:DeleteObjectVersion
    DeleteObjectVersion,
    /// kms:Decrypt
    KmsDecrypt,
    /// kms:Encrypt
    KmsEncrypt,
    /// sts:AssumeRole
    AssumeRole,
}

impl Action {
    /// Returns the action string (e.g., "s3:ReplicateObject").
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::S3All => "s3:*",
            Self::GetReplicationConfiguration => "s3:GetReplicationConfiguration",
            Self::ListAll => "s3:List*",
            Self::ListBucket => "s3:ListBucket",
            Self::ListBucketVersions => "s3:ListBucketVersions",
            Self::GetObjectVersion => "s3:GetObjectVersion",
            Self::GetObjectVersionAcl => "s3:GetObjectVersionAcl",
            Self::GetObjectVersionForReplication => "s3:GetObjectVersionForReplication",
            Self::GetObjectVersionTagging => "s3:GetObjectVersionTagging",
            Self::ReplicateDelete => "s3:ReplicateDelete",
            Self::ReplicateObject => "s3:ReplicateObject",
            Self::ReplicateTags => "s3:ReplicateTags",
            Self::GetBucketVersioning => "s3:GetBucketVersioning",
            Self::PutBucketVersioning => "s3:PutBucketVersioning",
            Self::DeleteBucket => "s3:DeleteBucket",
            Self::DeleteObjectVersion => "s3:DeleteObjectVersion",
            Self::KmsDecrypt => "kms:Decrypt",
            Self::KmsEncrypt => "kms:Encrypt",
            Self::AssumeRole => "sts:AssumeRole",
        }
    }

    /// Parse an action from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "s3:*" => Some(Self::S3All),
            "s3:GetReplicationConfiguration" => Some(Self::GetReplicationConfiguration),
            "s3:List*" => Some(Self::ListAll),
            "s3:ListBucket" => Some(Self::ListBucket),
            "s3:ListBucketVersions" => Some(Self::ListBucketVersions),
            "s3:GetObjectVersion" => Some(Self::GetObjectVersion),
            "s3:GetObjectVersionAcl" => Some(Self::GetObjectVersionAcl),
            "s3:GetObjectVersionForReplication" => Some(Self::GetObjectVersionForReplication),
            "s3:GetObjectVersionTagging" => Some(Self::GetObjectVersionTagging),
            "s3:ReplicateDelete" => Some(Self::ReplicateDelete),
            "s3:ReplicateObject" => Some(Self::ReplicateObject),
            "s3:ReplicateTags" => Some(Self::ReplicateTags),
            "s3:GetBucketVersioning" => Some(Self::GetBucketVersioning),
            "s3:PutBucketVersioning" => Some(Self::PutBucketVersioning),
            "s3:DeleteBucket" => Some(Self::DeleteBucket),
            "s3:DeleteObjectVersion" => Some(Self::DeleteObjectVersion),
            "kms:Decrypt" => Some(Self::KmsDecrypt),
            "kms:Encrypt" => Some(Self::KmsEncrypt),
            "sts:AssumeRole" => Some(Self::AssumeRole),
            _ => None,
        }
    }

    /// Returns the service namespace ("s3", "kms" or "sts").
    #[must_use]
    pub fn service(&self) -> &'static str {
        self.as_str().split_once(':').map_or("", |(service, _)| service)
    }

    /// Returns true if this action, used as a pattern, covers `other`.
    #[must_use]
    pub fn covers(&self, other: Action) -> bool {
        wildcard_match(self.as_str(), other.as_str())
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Action {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Action::parse(&s).ok_or_else(|| serde::de::Error::custom(format!("unknown action: {s}")))
    }
}

/// An unordered set of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet(BTreeSet<Action>);

impl ActionSet {
    /// Returns true if the set contains exactly this action.
    #[must_use]
    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    /// Returns true if any action in the set covers `action`.
    #[must_use]
    pub fn covers(&self, action: Action) -> bool {
        self.0.iter().any(|pattern| pattern.covers(action))
    }

    /// Returns an iterator over the actions in rendering order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }

    /// Returns the number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Action> for ActionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for ActionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(self.0.iter())
    }
}

impl<'de> Deserialize<'de> for ActionSet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        one_or_many::deserialize(deserializer)?
            .iter()
            .map(|s| {
                Action::parse(s)
                    .ok_or_else(|| serde::de::Error::custom(format!("unknown action: {s}")))
            })
            .collect()
    }
}

/// A request to check against a policy.
#[derive(Debug, Clone)]
pub struct Request {
    /// The principal making the request, if known.
    pub principal: Option<String>,
    /// The action being performed.
    pub action: Action,
    /// The resource ARN.
    pub resource: String,
}

impl Request {
    /// Creates a request made by the holder of an identity policy.
    #[must_use]
    pub fn new(action: Action, resource: impl Into<String>) -> Self {
        Self { principal: None, action, resource: resource.into() }
    }

    /// Sets the requesting principal.
    #[must_use]
    pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
        self.principal = Some(principal.into());
        self
    }
}

impl Statement {
    /// Creates an Allow statement.
    pub fn allow<R>(actions: impl IntoIterator<Item = Action>, resources: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Allow, actions, resources)
    }

    /// Creates a Deny statement.
    pub fn deny<R>(actions: impl IntoIterator<Item = Action>, resources: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(Effect::Deny, actions, resources)
    }

    fn new<R>(effect: Effect, actions: impl IntoIterator<Item = Action>, resources: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            sid: None,
            effect,
            principal: None,
            action: actions.into_iter().collect(),
            resource: resources.into_iter().map(Into::into).collect(),
        }
    }

    /// Sets the statement id.
    #[must_use]
    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    /// Sets the principal.
    #[must_use]
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Returns true if both statements grant or deny the same thing.
    ///
    /// The statement id is a label and does not take part in the comparison.
    /// Resources compare as sets; their order only affects rendering.
    #[must_use]
    pub fn same_grant(&self, other: &Statement) -> bool {
        self.effect == other.effect
            && self.action == other.action
            && self.principal == other.principal
            && self.resource_set() == other.resource_set()
    }

    fn resource_set(&self) -> BTreeSet<&str> {
        self.resource.iter().map(String::as_str).collect()
    }

    /// Returns true if the statement names `resource` verbatim.
    #[must_use]
    pub fn references(&self, resource: &str) -> bool {
        self.resource.iter().any(|r| r == resource)
    }

    fn validate(&self) -> Result<(), String> {
        if self.action.is_empty() {
            return Err("statement has no actions".to_string());
        }
        if self.resource.is_empty() && self.principal.is_none() {
            return Err("statement has neither resources nor a principal".to_string());
        }
        for resource in &self.resource {
            if !resource.starts_with("arn:aws:") && resource != "*" {
                return Err(format!("invalid resource ARN: {resource}"));
            }
        }
        Ok(())
    }

    /// Evaluates this statement for the given request.
    #[must_use]
    pub fn evaluate(&self, request: &Request) -> PolicyDecision {
        if let Some(ref principal) = self.principal {
            if !principal.matches(request.principal.as_deref()) {
                return PolicyDecision::DefaultDeny;
            }
        }

        if !self.action.covers(request.action) {
            return PolicyDecision::DefaultDeny;
        }

        // A statement without resources applies to the resource it is attached to.
        if !self.resource.is_empty()
            && !self.resource.iter().any(|pattern| wildcard_match(pattern, &request.resource))
        {
            return PolicyDecision::DefaultDeny;
        }

        match self.effect {
            Effect::Allow => PolicyDecision::Allow,
            Effect::Deny => PolicyDecision::Deny,
        }
    }
}

/// A deduplicated collection of statements.
///
/// Two statements are duplicates when they have the same effect, actions,
/// resources and principal. Insertion order is kept for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct StatementSet(Vec<Statement>);

impl StatementSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a statement, returning false if an equivalent one exists.
    pub fn insert(&mut self, statement: Statement) -> bool {
        if self.0.iter().any(|s| s.same_grant(&statement)) {
            return false;
        }
        self.0.push(statement);
        true
    }

    /// Returns a copy of the set with the statement at `index` removed.
    #[must_use]
    pub fn without(&self, index: usize) -> Self {
        let mut statements = self.0.clone();
        if index < statements.len() {
            statements.remove(index);
        }
        Self(statements)
    }

    /// Returns the statements as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[Statement] {
        &self.0
    }

    /// Returns an iterator over the statements.
    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.0.iter()
    }

    /// Returns the number of statements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Evaluates the statements for a request; an explicit Deny wins.
    #[must_use]
    pub fn evaluate(&self, request: &Request) -> PolicyDecision {
        let mut has_allow = false;

        for stmt in &self.0 {
            match stmt.evaluate(request) {
                PolicyDecision::Deny => return PolicyDecision::Deny,
                PolicyDecision::Allow => has_allow = true,
                PolicyDecision::DefaultDeny => {}
            }
        }

        if has_allow {
            PolicyDecision::Allow
        } else {
            PolicyDecision::DefaultDeny
        }
    }

    /// Returns true if the holder of these statements may perform `action`
    /// on `resource`.
    #[must_use]
    pub fn allows(&self, action: Action, resource: &str) -> bool {
        self.evaluate(&Request::new(action, resource)) == PolicyDecision::Allow
    }

    /// Wraps the statements in a policy document.
    #[must_use]
    pub fn to_document(&self) -> PolicyDocument {
        PolicyDocument { version: POLICY_VERSION.to_string(), id: None, statement: self.0.clone() }
    }
}

impl FromIterator<Statement> for StatementSet {
    fn from_iter<I: IntoIterator<Item = Statement>>(iter: I) -> Self {
        let mut set = Self::new();
        for statement in iter {
            set.insert(statement);
        }
        set
    }
}

impl<'a> IntoIterator for &'a StatementSet {
    type Item = &'a Statement;
    type IntoIter = std::slice::Iter<'a, Statement>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl PolicyDocument {
    /// Parses a policy from JSON.
    ///
    /// # Errors
    /// Returns an error if the JSON is invalid or doesn't match the policy schema.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidPolicy(format!("invalid policy JSON: {e}")))
    }

    /// Serializes the policy to JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the policy to pretty-printed JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validates the policy structure.
    ///
    /// # Errors
    /// Returns an error if the policy is invalid.
    pub fn validate(&self) -> Result<(), Error> {
        if self.version != POLICY_VERSION && self.version != "2008-10-17" {
            return Err(Error::InvalidPolicy(format!(
                "invalid policy version: {}. Must be \"{POLICY_VERSION}\"",
                self.version
            )));
        }

        if self.statement.is_empty() {
            return Err(Error::InvalidPolicy(
                "policy must contain at least one statement".to_string(),
            ));
        }

        for (i, stmt) in self.statement.iter().enumerate() {
            stmt.validate().map_err(|e| Error::InvalidPolicy(format!("statement {i}: {e}")))?;
        }

        Ok(())
    }

    /// Evaluates the policy for a request.
    ///
    /// 1. If any statement explicitly denies, return Deny
    /// 2. If any statement explicitly allows, return Allow
    /// 3. Otherwise, return DefaultDeny (implicit deny)
    #[must_use]
    pub fn evaluate(&self, request: &Request) -> PolicyDecision {
        let mut has_allow = false;

        for stmt in &self.statement {
            match stmt.evaluate(request) {
                PolicyDecision::Deny => return PolicyDecision::Deny,
                PolicyDecision::Allow => has_allow = true,
                PolicyDecision::DefaultDeny => {}
            }
        }

        if has_allow {
            PolicyDecision::Allow
        } else {
            PolicyDecision::DefaultDeny
        }
    }
}

/// Serde adapter for fields written either as one string or a list.
mod one_or_many {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    pub fn serialize<S>(values: &[String], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        values.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match OneOrMany::deserialize(deserializer)? {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        })
    }
}

/// Matches a string against a wildcard pattern (supports * and ?).
pub fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(&c) if c == '?' || c == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star, tried)) => {
                    p = star + 1;
                    t = tried + 1;
                    backtrack = Some((star, tried + 1));
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|&c| c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bucket_policy() {
        let json = r#"{
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Deny",
                    "Principal": "*",
                    "Action": "s3:DeleteBucket",
                    "Resource": "arn:aws:s3:::my-bucket"
                }
            ]
        }"#;

        let policy = PolicyDocument::from_json(json).unwrap();
        assert_eq!(policy.version, POLICY_VERSION);
        assert_eq!(policy.statement.len(), 1);
        assert_eq!(policy.statement[0].effect, Effect::Deny);
        assert!(policy.statement[0].principal.as_ref().is_some_and(Principal::is_any));
        assert_eq!(policy.statement[0].resource, vec!["arn:aws:s3:::my-bucket"]);

        policy.validate().unwrap();
    }

    #[test]
    fn test_parse_service_principal() {
        let json = r#"{
            "Version": "2012-10-17",
            "Statement": [
                {
                    "Effect": "Allow",
                    "Principal": {"Service": "s3.amazonaws.com"},
                    "Action": ["s3:ReplicateObject", "s3:ReplicateTags"],
                    "Resource": ["arn:aws:s3:::dest/*"]
                }
            ]
        }"#;

        let policy = PolicyDocument::from_json(json).unwrap();
        assert_eq!(policy.statement[0].principal, Some(Principal::service("s3.amazonaws.com")));
        assert_eq!(policy.statement[0].action.len(), 2);
    }

    #[test]
    fn test_parse_unknown_action() {
        let json = r#"{
            "Version": "2012-10-17",
            "Statement": [
                {"Effect": "Allow", "Action": "s3:Teleport", "Resource": "*"}
            ]
        }"#;
        let err = PolicyDocument::from_json(json).unwrap_err();
        assert!(err.to_string().contains("s3:Teleport"));
    }

    #[test]
    fn test_serialization_omits_absent_fields() {
        let policy = StatementSet::from_iter([Statement::allow(
            [Action::KmsDecrypt],
            ["arn:aws:kms:us-east-1:123456789012:alias/archive"],
        )])
        .to_document();

        let json = policy.to_json().unwrap();
        assert_eq!(
            json,
            r#"{"Version":"2012-10-17","Statement":[{"Effect":"Allow","Action":["kms:Decrypt"],"Resource":["arn:aws:kms:us-east-1:123456789012:alias/archive"]}]}"#
        );
    }

    #[test]
    fn test_invalid_version() {
        let mut policy = StatementSet::from_iter([Statement::allow(
            [Action::ListBucket],
            ["arn:aws:s3:::my-bucket"],
        )])
        .to_document();
        policy.version = "2020-01-01".to_string();
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_empty_statement() {
        let policy = StatementSet::new().to_document();
        assert!(matches!(policy.validate(), Err(Error::InvalidPolicy(_))));
    }

    #[test]
    fn test_invalid_resource() {
        let policy =
            StatementSet::from_iter([Statement::allow([Action::ListBucket], ["my-bucket"])])
                .to_document();
        let err = policy.validate().unwrap_err();
        assert!(err.to_string().contains("statement 0"));
    }

    #[test]
    fn test_trust_policy_without_resource() {
        let policy = StatementSet::from_iter([Statement::allow(
            [Action::AssumeRole],
            Vec::<String>::new(),
        )
        .with_principal(Principal::service("s3.amazonaws.com"))])
        .to_document();

        policy.validate().unwrap();
        let json = serde_json::to_value(&policy).unwrap();
        assert!(json["Statement"][0].get("Resource").is_none());
        assert_eq!(json["Statement"][0]["Principal"]["Service"], "s3.amazonaws.com");

        let assume = Request::new(Action::AssumeRole, "arn:aws:iam::123456789012:role/r")
            .with_principal("s3.amazonaws.com");
        assert_eq!(policy.evaluate(&assume), PolicyDecision::Allow);

        let parsed = PolicyDocument::from_json(&policy.to_json().unwrap()).unwrap();
        assert!(parsed.statement[0].resource.is_empty());
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("foo*", "foobar"));
        assert!(wildcard_match("*bar", "foobar"));
        assert!(wildcard_match("foo*bar", "foobazbar"));
        assert!(wildcard_match("foo?bar", "fooxbar"));
        assert!(!wildcard_match("foo?bar", "fooxxbar"));
        assert!(wildcard_match("s3:List*", "s3:ListBucket"));
        assert!(!wildcard_match("s3:List*", "s3:GetBucketVersioning"));
        assert!(wildcard_match("arn:aws:s3:::bucket/*", "arn:aws:s3:::bucket/key"));
        assert!(!wildcard_match("arn:aws:s3:::bucket/*", "arn:aws:s3:::bucket"));
        assert!(wildcard_match("a*b*c", "aXbYbZc"));
        assert!(!wildcard_match("", "x"));
        assert!(wildcard_match("", ""));
    }

    #[test]
    fn test_action_covers() {
        assert!(Action::ListAll.covers(Action::ListBucket));
        assert!(Action::ListAll.covers(Action::ListBucketVersions));
        assert!(!Action::ListAll.covers(Action::PutBucketVersioning));
        assert!(Action::S3All.covers(Action::ReplicateObject));
        assert!(!Action::S3All.covers(Action::KmsEncrypt));
        assert!(Action::KmsEncrypt.covers(Action::KmsEncrypt));
        assert_eq!(Action::KmsEncrypt.service(), "kms");
        assert_eq!(Action::parse("s3:List*"), Some(Action::ListAll));
    }

    #[test]
    fn test_statement_set_dedup_ignores_sid() {
        let a = Statement::allow([Action::KmsEncrypt], ["arn:aws:kms:us-west-2:1:alias/x"])
            .with_sid("First");
        let b = Statement::allow([Action::KmsEncrypt], ["arn:aws:kms:us-west-2:1:alias/x"])
            .with_sid("Second");
        let c = Statement::deny([Action::KmsEncrypt], ["arn:aws:kms:us-west-2:1:alias/x"]);

        let set: StatementSet = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.as_slice()[0].sid.as_deref(), Some("First"));
    }

    #[test]
    fn test_statement_set_action_order_is_insignificant() {
        let a = Statement::allow([Action::ReplicateTags, Action::ReplicateObject], ["*"]);
        let b = Statement::allow([Action::ReplicateObject, Action::ReplicateTags], ["*"]);
        assert!(a.same_grant(&b));

        let mut set = StatementSet::new();
        assert!(set.insert(a));
        assert!(!set.insert(b));
    }

    #[test]
    fn test_statement_set_resource_order_is_insignificant() {
        let west = "arn:aws:kms:us-west-2:1:alias/x";
        let east = "arn:aws:kms:us-east-2:1:alias/x";
        let a = Statement::allow([Action::KmsEncrypt], [west, east]);
        let b = Statement::allow([Action::KmsEncrypt], [east, west]);
        assert!(a.same_grant(&b));

        let set: StatementSet = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set.as_slice()[0].resource, vec![west, east]);

        let narrower = Statement::allow([Action::KmsEncrypt], [west]);
        assert!(!set.as_slice()[0].same_grant(&narrower));
    }

    #[test]
    fn test_statement_set_without() {
        let set: StatementSet = [
            Statement::allow([Action::KmsDecrypt], ["arn:aws:kms:a"]),
            Statement::allow([Action::KmsEncrypt], ["arn:aws:kms:b"]),
        ]
        .into_iter()
        .collect();

        let reduced = set.without(0);
        assert_eq!(reduced.len(), 1);
        assert!(reduced.allows(Action::KmsEncrypt, "arn:aws:kms:b"));
        assert!(!reduced.allows(Action::KmsDecrypt, "arn:aws:kms:a"));
        assert_eq!(set.without(5), set);
    }

    #[test]
    fn test_evaluate_identity_statement() {
        let set: StatementSet = [Statement::allow(
            [Action::ListAll, Action::GetBucketVersioning],
            ["arn:aws:s3:::dest"],
        )]
        .into_iter()
        .collect();

        assert!(set.allows(Action::ListBucket, "arn:aws:s3:::dest"));
        assert!(set.allows(Action::GetBucketVersioning, "arn:aws:s3:::dest"));
        assert!(!set.allows(Action::PutBucketVersioning, "arn:aws:s3:::dest"));
        assert!(!set.allows(Action::ListBucket, "arn:aws:s3:::other"));
    }

    #[test]
    fn test_evaluate_deny_overrides_allow() {
        let policy = StatementSet::from_iter([
            Statement::allow([Action::S3All], ["arn:aws:s3:::my-bucket/*"]),
            Statement::deny([Action::DeleteObjectVersion], ["arn:aws:s3:::my-bucket/*"])
                .with_principal(Principal::any()),
        ])
        .to_document();

        let read = Request::new(Action::GetObjectVersion, "arn:aws:s3:::my-bucket/key")
            .with_principal("arn:aws:iam::123456789012:root");
        assert_eq!(policy.evaluate(&read), PolicyDecision::Allow);

        let delete = Request::new(Action::DeleteObjectVersion, "arn:aws:s3:::my-bucket/key")
            .with_principal("arn:aws:iam::123456789012:root");
        assert_eq!(policy.evaluate(&delete), PolicyDecision::Deny);
    }

    #[test]
    fn test_evaluate_specific_principal() {
        let stmt = Statement::allow([Action::ReplicateObject], ["arn:aws:s3:::dest/*"])
            .with_principal(Principal::service("s3.amazonaws.com"));

        let from_s3 =
            Request::new(Action::ReplicateObject, "arn:aws:s3:::dest/k").with_principal("s3.amazonaws.com");
        assert_eq!(stmt.evaluate(&from_s3), PolicyDecision::Allow);

        let anonymous = Request::new(Action::ReplicateObject, "arn:aws:s3:::dest/k");
        assert_eq!(stmt.evaluate(&anonymous), PolicyDecision::DefaultDeny);
    }

    #[test]
    fn test_evaluate_no_match() {
        let set: StatementSet =
            [Statement::allow([Action::KmsDecrypt], ["arn:aws:kms:us-east-1:1:alias/archive"])]
                .into_iter()
                .collect();
        let request = Request::new(Action::KmsDecrypt, "arn:aws:kms:us-west-2:1:alias/archive");
        assert_eq!(set.evaluate(&request), PolicyDecision::DefaultDeny);
    }
}
