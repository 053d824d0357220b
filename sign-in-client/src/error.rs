// sign-in-client/src/error.rs
use common::{ChallengeError, SigningError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request to sign-in service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid challenge: {0}")]
    Challenge(#[from] ChallengeError),

    /// The challenge names a different site than the one we are on
    #[error("challenge is for {found:?} but this client is on {expected:?}")]
    DomainMismatch { expected: String, found: String },

    #[error(transparent)]
    Signing(#[from] SigningError),

    /// Signer answered with a key or message other than the one requested
    #[error("signer returned an unexpected proof: {0}")]
    UnexpectedProof(&'static str),

    /// Service answered `{ok: false}`; `kind` is the wire error name
    #[error("sign-in rejected: {kind}")]
    Rejected { kind: String, message: Option<String> },
}

impl ClientError {
    /// Rejection kind reported by the service, if this is a rejection
    pub fn rejection_kind(&self) -> Option<&str> {
        match self {
            Self::Rejected { kind, .. } => Some(kind),
            _ => None,
        }
    }
}
