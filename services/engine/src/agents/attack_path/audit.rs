//! Audit Suppression Controller
//!
//! Discovers the region's audit trails and toggles their logging. The
//! suppress/restore pairing and the dwell between them belong to the
//! orchestrator.

use tracing::{info, warn};

use super::providers::{AuditTrailApi, ProviderError};
use super::types::TrailRecord;

/// Discover all trails in the client's region
pub async fn list_trails(audit: &dyn AuditTrailApi) -> Result<Vec<TrailRecord>, ProviderError> {
    let trails = audit.describe_trails().await?;
    info!("Discovered {} audit trails", trails.len());
    Ok(trails)
}

/// Audit trail control scoped to one successful discovery
pub struct AuditSuppression<'a> {
    audit: &'a dyn AuditTrailApi,
    trails: Vec<TrailRecord>,
}

impl<'a> AuditSuppression<'a> {
    /// Run discovery; failure leaves nothing to suppress or restore
    pub async fn discover(audit: &'a dyn AuditTrailApi) -> Result<Self, ProviderError> {
        let trails = list_trails(audit).await?;
        Ok(Self { audit, trails })
    }

    pub fn trails(&self) -> &[TrailRecord] {
        &self.trails
    }

    /// Trail names to process: the hint alone when given, else every discovered trail
    pub fn targets(&self, trail_hint: Option<&str>) -> Vec<String> {
        match trail_hint {
            Some(hint) => vec![hint.to_string()],
            None => self.trails.iter().map(|t| t.name.clone()).collect(),
        }
    }

    /// Stop logging on a discovered trail; false on no match or provider error
    pub async fn suppress(&self, trail_name: &str) -> bool {
        if !self.trails.iter().any(|t| t.name == trail_name) {
            warn!("Trail '{}' not found", trail_name);
            return false;
        }

        match self.audit.stop_logging(trail_name).await {
            Ok(()) => {
                info!("Audit logging for '{}' has been stopped", trail_name);
                true
            }
            Err(e) => {
                warn!("Failed to stop logging on '{}': {}", trail_name, e);
                false
            }
        }
    }

    /// Start logging on a trail; false on provider error
    pub async fn restore(&self, trail_name: &str) -> bool {
        match self.audit.start_logging(trail_name).await {
            Ok(()) => {
                info!("Audit logging for '{}' has been re-enabled", trail_name);
                true
            }
            Err(e) => {
                warn!("Failed to restart logging on '{}': {}", trail_name, e);
                false
            }
        }
    }
}
