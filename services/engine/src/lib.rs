//! Lornu AI Attack Path Engine Library
//!
//! Attack-path orchestration against a vulnerable serverless target,
//! exposed over a small HTTP trigger.

pub mod agents;
pub mod config;
pub mod server;

pub use agents::attack_path;
pub use agents::AttackPathOrchestrator;
