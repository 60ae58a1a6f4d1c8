//! Agent modules for the Lornu AI Attack Path Engine
//!
//! - `attack_path`: Serverless credential-leak to privilege-escalation workflow

pub mod attack_path;

pub use attack_path::AttackPathOrchestrator;
