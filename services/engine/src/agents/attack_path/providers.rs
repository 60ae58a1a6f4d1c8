//! Cloud Provider Capabilities
//!
//! Trait-based abstractions over the four capability groups the attack
//! path drives: identity, access policy, object storage and audit trail.

use async_trait::async_trait;
use thiserror::Error;

use super::types::{CredentialTriplet, TrailRecord};

/// Provider error codes that mean "resource not found"
pub const NOT_FOUND_CODES: &[&str] = &[
    "NoSuchBucket",
    "NoSuchEntity",
    "TrailNotFoundException",
    "NotFound",
];

/// A failed provider call, carrying the machine-readable error code
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed ({code}): {message}")]
pub struct ProviderError {
    /// API operation name (e.g., "AttachRolePolicy")
    pub operation: &'static str,
    /// Provider error code, "Unknown" when the provider sent none
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(operation: &'static str, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            operation,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        NOT_FOUND_CODES.contains(&self.code.as_str())
    }
}

/// Identity service ("who am I")
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// ARN of the caller bound to the credentials
    async fn caller_arn(&self) -> Result<String, ProviderError>;
}

/// Access-policy attach/detach on roles
#[async_trait]
pub trait AccessPolicyApi: Send + Sync {
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), ProviderError>;

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), ProviderError>;
}

/// Object storage inspection
#[async_trait]
pub trait ObjectStorageApi: Send + Sync {
    /// Bucket names in discovery order
    async fn list_buckets(&self) -> Result<Vec<String>, ProviderError>;

    /// Whether server access logging has a target configured
    async fn bucket_logging_enabled(&self, bucket: &str) -> Result<bool, ProviderError>;

    /// Succeeds when the bucket ACL can be read
    async fn bucket_acl(&self, bucket: &str) -> Result<(), ProviderError>;
}

/// Audit trail control
#[async_trait]
pub trait AuditTrailApi: Send + Sync {
    /// Trails homed in the client's region
    async fn describe_trails(&self) -> Result<Vec<TrailRecord>, ProviderError>;

    async fn stop_logging(&self, trail_name: &str) -> Result<(), ProviderError>;

    async fn start_logging(&self, trail_name: &str) -> Result<(), ProviderError>;
}

/// Per-run API handles bound to one credential triplet and one region
pub struct ScopedClients {
    pub region: String,
    pub identity: Box<dyn IdentityApi>,
    pub iam: Box<dyn AccessPolicyApi>,
    pub storage: Box<dyn ObjectStorageApi>,
    pub audit: Box<dyn AuditTrailApi>,
}

/// Builds [`ScopedClients`] for a run
#[async_trait]
pub trait ClientFactory: Send + Sync {
    /// Construct handles without contacting the provider
    async fn build(
        &self,
        region: &str,
        credentials: &CredentialTriplet,
    ) -> Result<ScopedClients, ProviderError>;
}
