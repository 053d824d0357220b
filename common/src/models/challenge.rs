// common/src/models/challenge.rs
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ChallengeError;
use crate::wire;

/// The only protocol version currently understood
pub const SIGN_IN_VERSION: &str = "1";

/// Shortest nonce accepted from a client
pub const MIN_NONCE_LEN: usize = 8;

/// Structured, unsigned invitation to authenticate.
///
/// Serialized with camelCase field names; optional fields are left out of
/// the JSON entirely when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Challenge {
    /// Authority the signer is asked to trust, e.g. `example.com` or `localhost:3000`
    pub domain: String,
    pub statement: String,
    pub uri: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    pub nonce: String,
    #[serde(with = "wire::timestamp")]
    pub issued_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "wire::timestamp_opt")]
    pub expiration_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "wire::timestamp_opt")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

impl Challenge {
    /// Check that every field can be rendered on its own line of the signed message.
    pub fn validate(&self) -> Result<(), ChallengeError> {
        validate_domain(&self.domain)?;

        if self.statement.is_empty() {
            return Err(ChallengeError::invalid_field("statement", "must not be empty"));
        }
        single_line("statement", &self.statement)?;

        absolute_uri("uri", &self.uri)?;

        if self.version != SIGN_IN_VERSION {
            return Err(ChallengeError::invalid_field(
                "version",
                format!("unsupported version {:?}", self.version),
            ));
        }

        if let Some(chain_id) = &self.chain_id {
            single_line("chainId", chain_id)?;
        }

        if self.nonce.len() < MIN_NONCE_LEN {
            return Err(ChallengeError::invalid_field(
                "nonce",
                format!("must be at least {} characters", MIN_NONCE_LEN),
            ));
        }
        if !self.nonce.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ChallengeError::invalid_field("nonce", "must be alphanumeric"));
        }

        if let Some(request_id) = &self.request_id {
            single_line("requestId", request_id)?;
        }

        if let Some(resources) = &self.resources {
            for resource in resources {
                absolute_uri("resources", resource)?;
            }
        }

        Ok(())
    }

    /// Start of the validity window
    pub fn valid_from(&self) -> DateTime<Utc> {
        self.not_before.unwrap_or(self.issued_at)
    }

    /// End of the validity window; `max_window` applies when no expiration was set
    pub fn valid_until(&self, max_window: Duration) -> DateTime<Utc> {
        self.expiration_time
            .unwrap_or_else(|| self.issued_at + max_window)
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The nonce stays out: this text ends up in the public audit log
        write!(
            f,
            "sign-in challenge for {} issued at {}",
            self.domain,
            wire::format_timestamp(&self.issued_at)
        )
    }
}

/// Authority (`host[:port]`) of a URI, the same value a browser reports as `URL.host`.
pub fn authority_of(uri: &str) -> Result<String, ChallengeError> {
    let parsed = Url::parse(uri).map_err(|e| ChallengeError::InvalidOrigin {
        origin: uri.to_string(),
        reason: e.to_string(),
    })?;

    let host = parsed.host_str().ok_or_else(|| ChallengeError::InvalidOrigin {
        origin: uri.to_string(),
        reason: "URI has no host".to_string(),
    })?;

    // `port()` is None when the scheme's default port is used
    Ok(match parsed.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

fn validate_domain(domain: &str) -> Result<(), ChallengeError> {
    if domain.is_empty() {
        return Err(ChallengeError::invalid_field("domain", "must not be empty"));
    }
    if domain.chars().any(|c| c.is_whitespace() || c.is_control() || c == '/') {
        return Err(ChallengeError::invalid_field("domain", "must be a bare host[:port]"));
    }
    Ok(())
}

fn single_line(field: &'static str, value: &str) -> Result<(), ChallengeError> {
    if value.contains(['\n', '\r']) {
        return Err(ChallengeError::invalid_field(field, "must not contain line breaks"));
    }
    Ok(())
}

fn absolute_uri(field: &'static str, value: &str) -> Result<(), ChallengeError> {
    single_line(field, value)?;
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| ChallengeError::invalid_field(field, format!("{:?} is not an absolute URI: {}", value, e)))
}
