//! Deployment drivers.
//!
//! A driver takes an assembled [`Topology`] and materialises it. Network
//! calls, retries and convergence belong to drivers; the topology itself
//! never contacts an external system. [`ManifestDriver`] renders the
//! topology into a JSON manifest describing the home stack and the stack
//! set.

use serde_json::{json, Map, Value};

use crate::assemble::Topology;
use crate::bucket::{BucketSpec, KeySpec, RoleSpec};
use crate::error::{TopologyError, TopologyResult};

/// Materialises a topology.
pub trait DeploymentDriver {
    /// What a successful deployment yields.
    type Output;
    /// Why a deployment failed.
    type Error;

    /// Deploy `topology`.
    ///
    /// # Errors
    ///
    /// Driver specific.
    fn deploy(&self, topology: &Topology) -> Result<Self::Output, Self::Error>;
}

/// Renders a topology into a deterministic JSON manifest.
///
/// Object keys are emitted in sorted order and regions in input order, so
/// the same topology always renders to the same bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestDriver;

impl ManifestDriver {
    /// Create a manifest driver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl DeploymentDriver for ManifestDriver {
    type Output = Value;
    type Error = TopologyError;

    fn deploy(&self, topology: &Topology) -> TopologyResult<Value> {
        let env = topology.environment();
        let key = topology.primary_key();
        let bucket = topology.primary_bucket();

        let mut resources = Map::new();
        resources.insert("ArchiveKey".into(), key_resource(key));
        resources.insert("ArchiveKeyAlias".into(), alias_resource(key, "ArchiveKey"));
        resources.insert("ArchiveBucket".into(), bucket_resource(bucket, "ArchiveKey")?);
        if let Some(policy) = bucket.policy_document() {
            let policy = to_value(&policy)?;
            resources.insert(
                "ArchiveBucketPolicy".into(),
                json!({
                    "Type": "AWS::S3::BucketPolicy",
                    "Properties": { "Bucket": bucket.identifier.name(), "PolicyDocument": policy },
                }),
            );
        }
        resources
            .insert("ReplicationRole".into(), role_resource(topology.role(), key, "ArchiveKey")?);

        let deployment = topology.deployment();
        let templates = deployment
            .regional_stacks
            .iter()
            .map(|stack| {
                let mut resources = Map::new();
                resources.insert("ReplicationKey".into(), key_resource(&stack.key));
                resources.insert(
                    "ReplicationKeyAlias".into(),
                    alias_resource(&stack.key, "ReplicationKey"),
                );
                resources.insert(
                    "ReplicationBucket".into(),
                    bucket_resource(&stack.bucket, "ReplicationKey")?,
                );
                Ok::<_, TopologyError>(json!({ "Region": stack.region, "Resources": resources }))
            })
            .collect::<TopologyResult<Vec<_>>>()?;

        Ok(json!({
            "HomeStack": {
                "StackName": topology.home_stack_name(),
                "Account": env.account_id(),
                "Region": env.home_region(),
                "Resources": resources,
            },
            "StackSet": {
                "StackSetName": deployment.stack_set_name,
                "PermissionModel": deployment.permission_model,
                "Parameters": deployment.parameters,
                "StackInstancesGroup": [{
                    "Regions": deployment.instances.regions,
                    "DeploymentTargets": { "Accounts": deployment.instances.accounts },
                }],
                "Templates": templates,
            },
        }))
    }
}

fn key_resource(key: &KeySpec) -> Value {
    json!({
        "Type": "AWS::KMS::Key",
        "DeletionPolicy": "Retain",
        "Properties": { "KeySpec": key.key_spec, "EnableKeyRotation": false },
    })
}

fn alias_resource(key: &KeySpec, key_ref: &str) -> Value {
    json!({
        "Type": "AWS::KMS::Alias",
        "Properties": { "AliasName": key.alias.name(), "TargetKeyId": { "Ref": key_ref } },
    })
}

fn bucket_resource(bucket: &BucketSpec, key_ref: &str) -> TopologyResult<Value> {
    let mut properties = Map::new();
    properties.insert("BucketName".into(), json!(bucket.identifier.name()));
    if bucket.versioned {
        properties.insert("VersioningConfiguration".into(), json!({ "Status": "Enabled" }));
    }
    let mut encryption = to_value(&bucket.encryption)?;
    if let Some(rule) = encryption.pointer_mut("/Rules/0/ApplyServerSideEncryptionByDefault") {
        // Default encryption binds to the key resource, not its alias.
        rule["KMSMasterKeyID"] = json!({ "Fn::GetAtt": [key_ref, "Arn"] });
    }
    properties.insert(
        "BucketEncryption".into(),
        json!({ "ServerSideEncryptionConfiguration": encryption["Rules"] }),
    );
    properties.insert(
        "PublicAccessBlockConfiguration".into(),
        to_value(&bucket.public_access_block)?,
    );
    if let Some(cors) = &bucket.cors {
        properties.insert("CorsConfiguration".into(), to_value(cors)?);
    }
    if let Some(lifecycle) = &bucket.lifecycle {
        properties.insert("LifecycleConfiguration".into(), to_value(lifecycle)?);
    }
    if let Some(replication) = &bucket.replication {
        properties.insert("ReplicationConfiguration".into(), to_value(replication)?);
    }

    Ok(json!({
        "Type": "AWS::S3::Bucket",
        "DeletionPolicy": bucket.removal_policy.as_str(),
        "UpdateReplacePolicy": bucket.removal_policy.as_str(),
        "Properties": properties,
    }))
}

fn role_resource(role: &RoleSpec, key: &KeySpec, key_ref: &str) -> TopologyResult<Value> {
    let trust = to_value(&role.trust_policy())?;
    let mut policy = to_value(&role.policy.to_document())?;
    bind_key_arn(&mut policy, key, key_ref);
    Ok(json!({
        "Type": "AWS::IAM::Role",
        "Properties": {
            "RoleName": role.identifier.name(),
            "Path": role.path,
            "AssumeRolePolicyDocument": trust,
            "Policies": [{ "PolicyName": role.policy_name(), "PolicyDocument": policy }],
        },
    }))
}

/// Replace every statement resource naming `key` with the created key's ARN.
fn bind_key_arn(policy: &mut Value, key: &KeySpec, key_ref: &str) {
    let Some(statements) = policy.get_mut("Statement").and_then(Value::as_array_mut) else {
        return;
    };
    for resource in statements
        .iter_mut()
        .filter_map(|s| s.get_mut("Resource").and_then(Value::as_array_mut))
        .flat_map(|resources| resources.iter_mut())
    {
        if resource.as_str() == Some(key.key.arn()) {
            *resource = json!({ "Fn::GetAtt": [key_ref, "Arn"] });
        }
    }
}

fn to_value<T: serde::Serialize>(value: &T) -> TopologyResult<Value> {
    Ok(serde_json::to_value(value).map_err(coffer_core::Error::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble::assemble;
    use crate::types::TargetEnvironment;

    fn render(regions: &[&str]) -> Value {
        let env = TargetEnvironment::new("123456789012", "us-east-1").unwrap();
        let topology = assemble("archive", &env, regions).unwrap();
        ManifestDriver::new().deploy(&topology).unwrap()
    }

    #[test]
    fn test_home_stack() {
        let manifest = render(&["us-west-2"]);
        let home = &manifest["HomeStack"];
        assert_eq!(home["StackName"], "archive-archive-stack");
        assert_eq!(home["Account"], "123456789012");
        assert_eq!(home["Region"], "us-east-1");

        let bucket = &home["Resources"]["ArchiveBucket"];
        assert_eq!(bucket["DeletionPolicy"], "Retain");
        let props = &bucket["Properties"];
        assert_eq!(props["BucketName"], "archive-archive-123456789012-us-east-1");
        assert_eq!(props["VersioningConfiguration"]["Status"], "Enabled");
        assert_eq!(
            props["BucketEncryption"]["ServerSideEncryptionConfiguration"][0]
                ["ApplyServerSideEncryptionByDefault"]["KMSMasterKeyID"]["Fn::GetAtt"][0],
            "ArchiveKey"
        );
        assert_eq!(props["PublicAccessBlockConfiguration"]["BlockPublicPolicy"], true);
        assert_eq!(props["LifecycleConfiguration"]["Rules"][0]["Expiration"]["Days"], 365);
        assert_eq!(props["ReplicationConfiguration"]["Rules"][0]["ID"], "us-west-2");

        let role = &home["Resources"]["ReplicationRole"]["Properties"];
        assert_eq!(role["Path"], "/service-role/");
        assert_eq!(
            role["AssumeRolePolicyDocument"]["Statement"][0]["Principal"]["Service"],
            "s3.amazonaws.com"
        );
        let statements = role["Policies"][0]["PolicyDocument"]["Statement"].as_array().unwrap();
        assert_eq!(statements.len(), 6);
        let decrypt = statements.iter().find(|s| s["Sid"] == "DecryptSourceObjects").unwrap();
        assert_eq!(decrypt["Resource"], json!([{ "Fn::GetAtt": ["ArchiveKey", "Arn"] }]));
        assert!(!serde_json::to_string(&decrypt).unwrap().contains(":alias/"));

        let policy = &home["Resources"]["ArchiveBucketPolicy"]["Properties"]["PolicyDocument"];
        assert_eq!(policy["Statement"].as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn test_stack_set() {
        let manifest = render(&["us-west-2", "eu-west-1"]);
        let stack_set = &manifest["StackSet"];
        assert_eq!(stack_set["StackSetName"], "archive-archive-replication");
        assert_eq!(stack_set["PermissionModel"], "SELF_MANAGED");
        assert_eq!(stack_set["Parameters"][0]["ParameterKey"], "Prefix");
        assert_eq!(stack_set["Parameters"][0]["ParameterValue"], "archive");
        assert_eq!(stack_set["StackInstancesGroup"][0]["Regions"], json!(["us-west-2", "eu-west-1"]));
        assert_eq!(
            stack_set["StackInstancesGroup"][0]["DeploymentTargets"]["Accounts"],
            json!(["123456789012"])
        );

        let templates = stack_set["Templates"].as_array().unwrap();
        assert_eq!(templates.len(), 2);
        assert_eq!(templates[0]["Region"], "us-west-2");
        assert_eq!(templates[1]["Region"], "eu-west-1");
        let resources = &templates[0]["Resources"];
        assert_eq!(resources["ReplicationKeyAlias"]["Properties"]["AliasName"], "alias/archive/replication");
        assert_eq!(
            resources["ReplicationBucket"]["Properties"]["BucketName"],
            "archive-archive-replication-us-west-2"
        );
        assert!(resources["ReplicationBucket"]["Properties"].get("ReplicationConfiguration").is_none());
    }

    #[test]
    fn test_no_replication_configuration_without_regions() {
        let manifest = render(&[]);
        let props = &manifest["HomeStack"]["Resources"]["ArchiveBucket"]["Properties"];
        assert!(props.get("ReplicationConfiguration").is_none());
        assert_eq!(manifest["StackSet"]["Templates"], json!([]));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let a = serde_json::to_string(&render(&["us-west-2", "us-east-2"])).unwrap();
        let b = serde_json::to_string(&render(&["us-west-2", "us-east-2"])).unwrap();
        assert_eq!(a, b);
    }
}
