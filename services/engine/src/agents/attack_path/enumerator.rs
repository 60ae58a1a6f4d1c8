//! Resource Enumerator
//!
//! Lists storage buckets and inspects logging and ACL configuration for
//! the first few of them.

use tracing::{info, warn};

use super::providers::{ObjectStorageApi, ProviderError};
use super::types::{AclStatus, BucketReport, LoggingStatus};

/// Buckets inspected per run, regardless of how many exist
pub const MAX_BUCKETS: usize = 3;

/// Inspect up to [`MAX_BUCKETS`] buckets in discovery order
///
/// Only the listing call can fail; per-bucket errors degrade that
/// bucket's status fields.
pub async fn enumerate(storage: &dyn ObjectStorageApi) -> Result<Vec<BucketReport>, ProviderError> {
    let names = storage.list_buckets().await?;
    info!("Discovered {} buckets, inspecting up to {}", names.len(), MAX_BUCKETS);

    let mut reports = Vec::with_capacity(names.len().min(MAX_BUCKETS));
    for name in names.into_iter().take(MAX_BUCKETS) {
        let report = inspect_bucket(storage, name).await;
        info!(
            "Bucket {}: logging {:?}, ACL {:?}",
            report.name, report.logging_status, report.acl_status
        );
        reports.push(report);
    }

    Ok(reports)
}

async fn inspect_bucket(storage: &dyn ObjectStorageApi, name: String) -> BucketReport {
    let logging_status = match storage.bucket_logging_enabled(&name).await {
        Ok(true) => LoggingStatus::Enabled,
        Ok(false) => LoggingStatus::Disabled,
        Err(e) if e.is_not_found() => LoggingStatus::BucketNotFound,
        Err(e) => {
            warn!("Could not read logging config for {}: {}", name, e);
            LoggingStatus::Unknown
        }
    };

    let acl_status = match storage.bucket_acl(&name).await {
        Ok(()) => AclStatus::Exists,
        Err(e) if e.is_not_found() => AclStatus::BucketNotFound,
        Err(e) => {
            warn!("Could not read ACL for {}: {}", name, e);
            AclStatus::Unknown
        }
    };

    BucketReport {
        name,
        logging_status,
        acl_status,
    }
}
