//! Core types and utilities for Coffer.
//!
//! This crate provides the building blocks shared by every Coffer component:
//! - Configuration management (TOML file plus environment fallback)
//! - Error types
//! - S3 and IAM resource documents: permission policies, replication,
//!   lifecycle, encryption, public access block and CORS configuration

#![warn(missing_docs)]

pub mod config;
pub mod cors;
pub mod encryption;
pub mod error;
pub mod lifecycle;
pub mod policy;
pub mod public_access_block;
pub mod replication;

pub use config::{ArchiveConfig, Config, EnvironmentConfig, LogFormat, LoggingConfig};
pub use error::{Error, Result};
