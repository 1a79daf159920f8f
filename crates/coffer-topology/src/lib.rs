//! Multi-region archive topology derivation for Coffer.
//!
//! Compiles an archive descriptor (prefix, target environment, replication
//! regions) into a resource topology for encrypted, versioned, replicated
//! object storage:
//!
//! - **Naming**: canonical names and ARNs for every resource
//! - **Policy derivation**: bucket guards and least-privilege replication
//!   role statements
//! - **Rule building**: ordered replication rules with stable priorities
//! - **Assembly**: one immutable [`Topology`] per input
//! - **Capability audit**: checks the role statements grant what the rules
//!   need
//!
//! # Architecture
//!
//! ```text
//!                ┌────────────────┐
//!   descriptor ─▶│ NamingResolver │
//!                └───────┬────────┘
//!                        │ ResolvedRegion[]
//!          ┌─────────────┼───────────────┐
//!          ▼             ▼               ▼
//!   derive_policies  build_rules  DeploymentInstruction
//!          └─────────────┼───────────────┘
//!                        ▼
//!                    Topology ──▶ DeploymentDriver
//! ```
//!
//! # Example
//!
//! ```
//! use coffer_topology::{assemble, TargetEnvironment};
//!
//! let env = TargetEnvironment::new("123456789012", "us-east-1")?;
//! let topology = assemble("archive", &env, &["us-west-2", "us-east-2"])?;
//!
//! assert_eq!(topology.rules().len(), 2);
//! assert!(topology.audit().is_satisfied());
//! # Ok::<(), coffer_topology::TopologyError>(())
//! ```

#![warn(missing_docs)]

pub mod assemble;
pub mod bucket;
pub mod capability;
pub mod deploy;
pub mod driver;
pub mod error;
pub mod naming;
pub mod policy;
pub mod rules;
pub mod types;

pub use assemble::{assemble, ArchiveDescriptor, Topology};
pub use bucket::{BucketSpec, KeySpec, RemovalPolicy, RoleSpec};
pub use capability::{audit, required_capabilities, AuditEntry, AuditReport, Capability, Probe};
pub use deploy::{DeploymentInstruction, PermissionModel, RegionalStack, StackInstances};
pub use driver::{DeploymentDriver, ManifestDriver};
pub use error::{TopologyError, TopologyResult};
pub use naming::{resolve, NamingResolver, ReplicationResource};
pub use policy::{derive_policies, DerivedPolicies};
pub use rules::build_rules;
pub use types::{AccountId, Prefix, Region, ResolvedRegion, ResourceIdentifier, ResourceKind, TargetEnvironment};
