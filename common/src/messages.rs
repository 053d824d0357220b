// common/src/messages.rs
use serde::{Deserialize, Serialize};

use crate::error::VerificationError;
use crate::models::{Challenge, SignInOutput};

/// Body of `POST /api/createSignInData`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSignInRequest {
    /// Page URI the client is signing in from
    pub uri: String,
}

/// Body of `POST /api/verifySIWS`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub input: Challenge,
    pub output: SignInOutput,
}

/// Response of `POST /api/verifySIWS`, also used for 4xx error bodies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl VerifyResponse {
    pub fn success(address: String) -> Self {
        Self {
            ok: true,
            error: None,
            message: None,
            address: Some(address),
        }
    }

    /// Policy failures carry only the error kind; malformed requests also
    /// explain what was wrong.
    pub fn failure(err: &VerificationError) -> Self {
        let message = match err {
            VerificationError::MalformedRequest(detail) => Some(detail.clone()),
            _ => None,
        };
        Self {
            ok: false,
            error: Some(err.kind().to_string()),
            message,
            address: None,
        }
    }
}
