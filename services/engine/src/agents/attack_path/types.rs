//! Attack Path Types
//!
//! Core types produced and consumed across a single attack-path run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::providers::ProviderError;

/// Temporary credential triplet harvested from a leak source
///
/// Never mutated after harvesting. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTriplet {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

impl CredentialTriplet {
    /// Access key id safe for logs (first four characters only)
    pub fn masked_access_key_id(&self) -> String {
        let prefix: String = self.access_key_id.chars().take(4).collect();
        format!("{}****", prefix)
    }
}

impl fmt::Debug for CredentialTriplet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTriplet")
            .field("access_key_id", &self.masked_access_key_id())
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .finish()
    }
}

/// Caller identity resolved from the harvested credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssumedIdentity {
    pub arn: String,
    pub role_name: String,
}

impl AssumedIdentity {
    /// Derive the role name from an assumed-role ARN
    ///
    /// `arn:aws:sts::111:assumed-role/ROLE/SESSION` yields `ROLE`: the role
    /// is always the second-to-last `/` segment.
    pub fn from_arn(arn: &str) -> Result<Self, AttackPathError> {
        let arn = arn.trim();
        if arn.is_empty() {
            return Err(AttackPathError::Identity(
                "caller identity returned an empty ARN".to_string(),
            ));
        }

        let segments: Vec<&str> = arn.split('/').collect();
        if segments.len() < 2 {
            return Err(AttackPathError::Identity(format!(
                "ARN '{}' has no role path segment",
                arn
            )));
        }

        let role_name = segments[segments.len() - 2];
        if role_name.is_empty() {
            return Err(AttackPathError::Identity(format!(
                "ARN '{}' has an empty role segment",
                arn
            )));
        }

        Ok(Self {
            arn: arn.to_string(),
            role_name: role_name.to_string(),
        })
    }
}

/// Server access logging state of a bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggingStatus {
    Enabled,
    Disabled,
    #[serde(rename = "Bucket not found")]
    BucketNotFound,
    Unknown,
}

/// Whether a bucket ACL could be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AclStatus {
    Exists,
    #[serde(rename = "Bucket not found")]
    BucketNotFound,
    Unknown,
}

/// Per-bucket enumeration result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketReport {
    pub name: String,
    pub logging_status: LoggingStatus,
    pub acl_status: AclStatus,
}

/// An audit trail discovered in the target region
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrailRecord {
    pub name: String,
}

impl TrailRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Whether the administrative policy is attached to the assumed role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationState {
    #[default]
    NotAttempted,
    Attached,
    AttachFailed,
    Reverted,
    /// Detach failed after a successful attach; the policy may still be attached
    RevertFailed,
}

impl EscalationState {
    pub fn is_attached(&self) -> bool {
        matches!(self, EscalationState::Attached | EscalationState::RevertFailed)
    }
}

/// Workflow state machine positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    CredentialsAcquired,
    IdentityAssumed,
    PrivilegeEscalated,
    ResourcesEnumerated,
    TrailsProcessed,
    PrivilegeReverted,
    Reported,
    Failed,
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkflowState::Idle => "idle",
            WorkflowState::CredentialsAcquired => "credentials_acquired",
            WorkflowState::IdentityAssumed => "identity_assumed",
            WorkflowState::PrivilegeEscalated => "privilege_escalated",
            WorkflowState::ResourcesEnumerated => "resources_enumerated",
            WorkflowState::TrailsProcessed => "trails_processed",
            WorkflowState::PrivilegeReverted => "privilege_reverted",
            WorkflowState::Reported => "reported",
            WorkflowState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Terminal output of a run, serialized by the HTTP trigger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowReport {
    #[serde(rename = "RunId")]
    pub run_id: Uuid,
    #[serde(rename = "EndpointURLTargeted")]
    pub endpoint_url_targeted: String,
    #[serde(rename = "AssumedLambdaRoleName")]
    pub assumed_lambda_role_name: String,
    #[serde(rename = "AssumedRoleARN")]
    pub assumed_role_arn: String,
    #[serde(rename = "EscalatePrivileges")]
    pub escalate_privileges: String,
    #[serde(rename = "ServiceEnumeration")]
    pub service_enumeration: String,
    /// Comma-joined names of trails whose logging was suppressed and restored
    #[serde(rename = "DefensiveEvasion")]
    pub defensive_evasion: String,
    #[serde(rename = "Buckets")]
    pub buckets: Vec<BucketReport>,
    #[serde(rename = "Warnings", default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(rename = "CompletedAt")]
    pub completed_at: DateTime<Utc>,
    #[serde(skip)]
    pub suppressed_trails: Vec<String>,
    #[serde(skip)]
    pub escalation: EscalationState,
}

/// Incrementally assembled report data, finalized once per run
#[derive(Debug, Default)]
pub struct ReportDraft {
    pub endpoint_url_targeted: String,
    pub identity: Option<AssumedIdentity>,
    pub escalate_privileges: String,
    pub buckets: Vec<BucketReport>,
    pub suppressed_trails: Vec<String>,
    pub warnings: Vec<String>,
}

impl ReportDraft {
    pub fn new(endpoint_url_targeted: &str) -> Self {
        Self {
            endpoint_url_targeted: endpoint_url_targeted.to_string(),
            ..Default::default()
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn finalize(self, run_id: Uuid, escalation: EscalationState) -> WorkflowReport {
        let (arn, role_name) = self
            .identity
            .map(|identity| (identity.arn, identity.role_name))
            .unwrap_or_default();

        WorkflowReport {
            run_id,
            endpoint_url_targeted: self.endpoint_url_targeted,
            assumed_lambda_role_name: role_name,
            assumed_role_arn: arn,
            escalate_privileges: self.escalate_privileges,
            service_enumeration: format!(
                "Enumerating through S3 Resources checking ACL Configurations ({} buckets inspected)",
                self.buckets.len()
            ),
            defensive_evasion: self.suppressed_trails.join(","),
            buckets: self.buckets,
            warnings: self.warnings,
            completed_at: Utc::now(),
            suppressed_trails: self.suppressed_trails,
            escalation,
        }
    }
}

/// Errors that abort a run
///
/// `Fetch`, `Parse` and `Identity` only occur before any mutating cloud
/// call. Provider errors after identity assumption degrade the report
/// instead of surfacing here.
#[derive(Debug, Error)]
pub enum AttackPathError {
    /// Leak source unreachable
    #[error("Failed to fetch leak source {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// A credential field is missing from the leaked text
    #[error("Credential field {0} missing from leaked text")]
    Parse(&'static str),

    /// Caller identity could not be resolved
    #[error("Identity assumption failed: {0}")]
    Identity(String),

    /// Provider error before any mutation (client construction)
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}
