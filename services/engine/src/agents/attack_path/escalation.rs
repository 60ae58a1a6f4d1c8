//! Privilege Escalation Controller
//!
//! Attaches the administrative policy to the assumed role and detaches it
//! again as the run's compensating action.

use tracing::{error, info, warn};

use super::providers::{AccessPolicyApi, ProviderError};
use super::types::EscalationState;

/// AWS managed administrative policy
pub const ADMIN_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AdministratorAccess";

/// Attach the administrative policy to `role_name`
pub async fn escalate(iam: &dyn AccessPolicyApi, role_name: &str) -> Result<(), ProviderError> {
    iam.attach_role_policy(role_name, ADMIN_POLICY_ARN).await
}

/// Detach the administrative policy from `role_name`
pub async fn revert(iam: &dyn AccessPolicyApi, role_name: &str) -> Result<(), ProviderError> {
    iam.detach_role_policy(role_name, ADMIN_POLICY_ARN).await
}

/// Escalation tracked for one run
///
/// `revert` consumes the value, so a run can detach at most once.
pub struct PrivilegeEscalation<'a> {
    iam: &'a dyn AccessPolicyApi,
    role_name: String,
    state: EscalationState,
}

impl<'a> PrivilegeEscalation<'a> {
    pub fn new(iam: &'a dyn AccessPolicyApi, role_name: &str) -> Self {
        Self {
            iam,
            role_name: role_name.to_string(),
            state: EscalationState::NotAttempted,
        }
    }

    pub fn state(&self) -> EscalationState {
        self.state
    }

    /// Attempt the attach once; later calls are ignored
    pub async fn escalate(&mut self) -> Result<(), ProviderError> {
        if self.state != EscalationState::NotAttempted {
            warn!("Escalation already attempted for role {}", self.role_name);
            return Ok(());
        }

        match escalate(self.iam, &self.role_name).await {
            Ok(()) => {
                info!("Attached {} to role {}", ADMIN_POLICY_ARN, self.role_name);
                self.state = EscalationState::Attached;
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Failed to attach {} to role {}: {} (continuing with current privileges)",
                    ADMIN_POLICY_ARN, self.role_name, e
                );
                self.state = EscalationState::AttachFailed;
                Err(e)
            }
        }
    }

    /// Issue the detach unconditionally; failure is logged, never raised
    pub async fn revert(self) -> EscalationState {
        match revert(self.iam, &self.role_name).await {
            Ok(()) => {
                info!("Detached {} from role {}", ADMIN_POLICY_ARN, self.role_name);
                EscalationState::Reverted
            }
            Err(e) if self.state.is_attached() => {
                error!(
                    "Failed to detach {} from role {}: {}",
                    ADMIN_POLICY_ARN, self.role_name, e
                );
                EscalationState::RevertFailed
            }
            Err(e) => {
                warn!("Detach on role {} after failed attach: {}", self.role_name, e);
                self.state
            }
        }
    }
}
