//! Recording mock cloud for tests
//!
//! Implements every provider capability plus the client factory and leak
//! source, logging each call with the (virtual) time it was issued.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::time::Instant;

use super::harvester::LeakSource;
use super::providers::{
    AccessPolicyApi, AuditTrailApi, ClientFactory, IdentityApi, ObjectStorageApi, ProviderError,
    ScopedClients,
};
use super::types::{AttackPathError, CredentialTriplet, TrailRecord};

pub const SCENARIO_LEAK: &str =
    "AWS_ACCESS_KEY_ID=AK1\nAWS_SECRET_ACCESS_KEY=SK1\nAWS_SESSION_TOKEN=TK1\n";
pub const SCENARIO_ARN: &str = "arn:aws:sts::111:assumed-role/LambdaExecRole/sess1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    BuildClients { region: String, access_key_id: String },
    CallerIdentity,
    AttachRolePolicy { role: String, policy: String },
    DetachRolePolicy { role: String, policy: String },
    ListBuckets,
    GetBucketLogging(String),
    GetBucketAcl(String),
    DescribeTrails,
    StopLogging(String),
    StartLogging(String),
}

/// Scripted provider behaviour
#[derive(Debug, Clone)]
pub struct CloudBehaviour {
    pub caller_arn: String,
    pub fail_caller_identity: bool,
    pub fail_attach: bool,
    pub fail_detach: bool,
    pub buckets: Vec<String>,
    pub fail_list_buckets: bool,
    pub panic_on_list_buckets: bool,
    pub logging_enabled: Vec<String>,
    pub missing_buckets: Vec<String>,
    pub denied_buckets: Vec<String>,
    pub trails: Vec<String>,
    pub fail_describe_trails: bool,
    pub fail_stop: Vec<String>,
    pub fail_start: Vec<String>,
}

impl Default for CloudBehaviour {
    fn default() -> Self {
        Self {
            caller_arn: SCENARIO_ARN.to_string(),
            fail_caller_identity: false,
            fail_attach: false,
            fail_detach: false,
            buckets: Vec::new(),
            fail_list_buckets: false,
            panic_on_list_buckets: false,
            logging_enabled: Vec::new(),
            missing_buckets: Vec::new(),
            denied_buckets: Vec::new(),
            trails: Vec::new(),
            fail_describe_trails: false,
            fail_stop: Vec::new(),
            fail_start: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct MockCloud {
    behaviour: Arc<CloudBehaviour>,
    log: Arc<Mutex<Vec<(Call, Instant)>>>,
}

impl MockCloud {
    pub fn new(behaviour: CloudBehaviour) -> Self {
        Self {
            behaviour: Arc::new(behaviour),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push((call, Instant::now()));
    }

    fn check(&self, fail: bool, operation: &'static str, code: &str) -> Result<(), ProviderError> {
        if fail {
            Err(ProviderError::new(operation, code, "scripted failure"))
        } else {
            Ok(())
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.log.lock().unwrap().iter().filter(|(c, _)| predicate(c)).count()
    }

    pub fn position(&self, predicate: impl Fn(&Call) -> bool) -> Option<usize> {
        self.calls().iter().position(predicate)
    }
}

#[async_trait]
impl IdentityApi for MockCloud {
    async fn caller_arn(&self) -> Result<String, ProviderError> {
        self.record(Call::CallerIdentity);
        self.check(self.behaviour.fail_caller_identity, "GetCallerIdentity", "ExpiredToken")?;
        Ok(self.behaviour.caller_arn.clone())
    }
}

#[async_trait]
impl AccessPolicyApi for MockCloud {
    async fn attach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), ProviderError> {
        self.record(Call::AttachRolePolicy {
            role: role_name.to_string(),
            policy: policy_arn.to_string(),
        });
        self.check(self.behaviour.fail_attach, "AttachRolePolicy", "AccessDenied")
    }

    async fn detach_role_policy(&self, role_name: &str, policy_arn: &str) -> Result<(), ProviderError> {
        self.record(Call::DetachRolePolicy {
            role: role_name.to_string(),
            policy: policy_arn.to_string(),
        });
        self.check(self.behaviour.fail_detach, "DetachRolePolicy", "NoSuchEntity")
    }
}

#[async_trait]
impl ObjectStorageApi for MockCloud {
    async fn list_buckets(&self) -> Result<Vec<String>, ProviderError> {
        self.record(Call::ListBuckets);
        if self.behaviour.panic_on_list_buckets {
            panic!("scripted panic in ListBuckets");
        }
        self.check(self.behaviour.fail_list_buckets, "ListBuckets", "AccessDenied")?;
        Ok(self.behaviour.buckets.clone())
    }

    async fn bucket_logging_enabled(&self, bucket: &str) -> Result<bool, ProviderError> {
        self.record(Call::GetBucketLogging(bucket.to_string()));
        self.bucket_check("GetBucketLogging", bucket)?;
        Ok(self.behaviour.logging_enabled.iter().any(|b| b == bucket))
    }

    async fn bucket_acl(&self, bucket: &str) -> Result<(), ProviderError> {
        self.record(Call::GetBucketAcl(bucket.to_string()));
        self.bucket_check("GetBucketAcl", bucket)
    }
}

impl MockCloud {
    fn bucket_check(&self, operation: &'static str, bucket: &str) -> Result<(), ProviderError> {
        let missing = self.behaviour.missing_buckets.iter().any(|b| b == bucket);
        let denied = self.behaviour.denied_buckets.iter().any(|b| b == bucket);
        self.check(missing, operation, "NoSuchBucket")?;
        self.check(denied, operation, "AccessDenied")
    }
}

#[async_trait]
impl AuditTrailApi for MockCloud {
    async fn describe_trails(&self) -> Result<Vec<TrailRecord>, ProviderError> {
        self.record(Call::DescribeTrails);
        self.check(self.behaviour.fail_describe_trails, "DescribeTrails", "AccessDenied")?;
        Ok(self.behaviour.trails.iter().map(TrailRecord::new).collect())
    }

    async fn stop_logging(&self, trail_name: &str) -> Result<(), ProviderError> {
        self.record(Call::StopLogging(trail_name.to_string()));
        let fail = self.behaviour.fail_stop.iter().any(|t| t == trail_name);
        self.check(fail, "StopLogging", "AccessDenied")
    }

    async fn start_logging(&self, trail_name: &str) -> Result<(), ProviderError> {
        self.record(Call::StartLogging(trail_name.to_string()));
        let fail = self.behaviour.fail_start.iter().any(|t| t == trail_name);
        self.check(fail, "StartLogging", "AccessDenied")
    }
}

#[async_trait]
impl ClientFactory for MockCloud {
    async fn build(
        &self,
        region: &str,
        credentials: &CredentialTriplet,
    ) -> Result<ScopedClients, ProviderError> {
        self.record(Call::BuildClients {
            region: region.to_string(),
            access_key_id: credentials.access_key_id.clone(),
        });

        Ok(ScopedClients {
            region: region.to_string(),
            identity: Box::new(self.clone()),
            iam: Box::new(self.clone()),
            storage: Box::new(self.clone()),
            audit: Box::new(self.clone()),
        })
    }
}

/// Leak source returning a fixed body, or unreachable when `None`
pub struct MockLeakSource {
    body: Option<String>,
    reads: AtomicUsize,
}

impl MockLeakSource {
    pub fn serving(body: &str) -> Self {
        Self {
            body: Some(body.to_string()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            body: None,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeakSource for MockLeakSource {
    async fn read(&self, url: &str) -> Result<String, AttackPathError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.body.clone().ok_or_else(|| AttackPathError::Fetch {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}
