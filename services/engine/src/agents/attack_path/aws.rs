//! AWS Provider Clients
//!
//! STS, IAM, S3 and CloudTrail handles built from harvested static
//! credentials. Construction performs no network call.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use tracing::debug;

use super::providers::{
    AccessPolicyApi, AuditTrailApi, ClientFactory, IdentityApi, ObjectStorageApi, ProviderError,
    ScopedClients,
};
use super::types::{CredentialTriplet, TrailRecord};

const CREDENTIALS_PROVIDER_NAME: &str = "harvested_static";

/// Convert an SDK error into a [`ProviderError`] keeping the service code
fn sdk_error<E, R>(operation: &'static str, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().unwrap_or("Unknown").to_string();
    ProviderError::new(operation, code, DisplayErrorContext(&err).to_string())
}

/// Reject region strings the SDK would only fail on at request time
fn validate_region(region: &str) -> Result<(), ProviderError> {
    let well_formed = !region.is_empty()
        && region
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if well_formed {
        Ok(())
    } else {
        Err(ProviderError::new(
            "BuildClients",
            "InvalidRegion",
            format!("malformed region '{}'", region),
        ))
    }
}

/// Builds AWS SDK clients from a harvested credential triplet
#[derive(Debug, Clone, Copy, Default)]
pub struct AwsClientFactory;

#[async_trait]
impl ClientFactory for AwsClientFactory {
    async fn build(
        &self,
        region: &str,
        credentials: &CredentialTriplet,
    ) -> Result<ScopedClients, ProviderError> {
        validate_region(region)?;

        let static_credentials = Credentials::new(
            &credentials.access_key_id,
            &credentials.secret_access_key,
            Some(credentials.session_token.clone()),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let conf = aws_config::defaults(BehaviorVersion::latest())
            .credentials_provider(SharedCredentialsProvider::new(static_credentials))
            .region(Region::new(region.to_string()))
            .load()
            .await;

        debug!(
            "Built scoped AWS clients for {} in {}",
            credentials.masked_access_key_id(),
            region
        );

        Ok(ScopedClients {
            region: region.to_string(),
            identity: Box::new(AwsIdentity {
                client: aws_sdk_sts::Client::new(&conf),
            }),
            iam: Box::new(AwsAccessPolicy {
                client: aws_sdk_iam::Client::new(&conf),
            }),
            storage: Box::new(AwsObjectStorage {
                client: aws_sdk_s3::Client::new(&conf),
            }),
            audit: Box::new(AwsAuditTrail {
                client: aws_sdk_cloudtrail::Client::new(&conf),
            }),
        })
    }
}

/// STS GetCallerIdentity
pub struct AwsIdentity {
    client: aws_sdk_sts::Client,
}

#[async_trait]
impl IdentityApi for AwsIdentity {
    async fn caller_arn(&self) -> Result<String, ProviderError> {
        let resp = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| sdk_error("GetCallerIdentity", e))?;

        Ok(resp.arn().unwrap_or_default().to_string())
    }
}

/// IAM role policy attachment
pub struct AwsAccessPolicy {
    client: aws_sdk_iam::Client,
}

#[async_trait]
impl AccessPolicyApi for AwsAccessPolicy {
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), ProviderError> {
        self.client
            .attach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| sdk_error("AttachRolePolicy", e))?;
        Ok(())
    }

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), ProviderError> {
        self.client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| sdk_error("DetachRolePolicy", e))?;
        Ok(())
    }
}

/// S3 bucket listing and configuration reads
pub struct AwsObjectStorage {
    client: aws_sdk_s3::Client,
}

#[async_trait]
impl ObjectStorageApi for AwsObjectStorage {
    async fn list_buckets(&self) -> Result<Vec<String>, ProviderError> {
        let resp = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| sdk_error("ListBuckets", e))?;

        Ok(resp
            .buckets()
            .iter()
            .filter_map(|bucket| bucket.name().map(str::to_string))
            .collect())
    }

    async fn bucket_logging_enabled(&self, bucket: &str) -> Result<bool, ProviderError> {
        let resp = self
            .client
            .get_bucket_logging()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| sdk_error("GetBucketLogging", e))?;

        Ok(resp.logging_enabled().is_some())
    }

    async fn bucket_acl(&self, bucket: &str) -> Result<(), ProviderError> {
        self.client
            .get_bucket_acl()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| sdk_error("GetBucketAcl", e))?;
        Ok(())
    }
}

/// CloudTrail discovery and logging control
pub struct AwsAuditTrail {
    client: aws_sdk_cloudtrail::Client,
}

#[async_trait]
impl AuditTrailApi for AwsAuditTrail {
    async fn describe_trails(&self) -> Result<Vec<TrailRecord>, ProviderError> {
        // Shadow trails are homed in other regions and cannot be stopped from here
        let resp = self
            .client
            .describe_trails()
            .include_shadow_trails(false)
            .send()
            .await
            .map_err(|e| sdk_error("DescribeTrails", e))?;

        Ok(resp
            .trail_list()
            .iter()
            .filter_map(|trail| trail.name().map(TrailRecord::new))
            .collect())
    }

    async fn stop_logging(&self, trail_name: &str) -> Result<(), ProviderError> {
        self.client
            .stop_logging()
            .name(trail_name)
            .send()
            .await
            .map_err(|e| sdk_error("StopLogging", e))?;
        Ok(())
    }

    async fn start_logging(&self, trail_name: &str) -> Result<(), ProviderError> {
        self.client
            .start_logging()
            .name(trail_name)
            .send()
            .await
            .map_err(|e| sdk_error("StartLogging", e))?;
        Ok(())
    }
}
