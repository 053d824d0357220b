// common/src/error.rs
use thiserror::Error;

/// A challenge could not be issued, or a received challenge is not well formed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChallengeError {
    #[error("invalid request origin {origin:?}: {reason}")]
    InvalidOrigin { origin: String, reason: String },

    #[error("invalid challenge field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl ChallengeError {
    pub fn invalid_field(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField { field, reason: reason.into() }
    }
}

/// Why a sign-in attempt was refused by the verifier.
///
/// The first five variants are policy failures and are answered with a
/// normal `{ok: false}` response. `MalformedRequest` is a transport-level
/// problem and maps to a 4xx.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    #[error("challenge domain {found:?} does not match expected domain {expected:?}")]
    DomainMismatch { expected: String, found: String },

    #[error("challenge is outside its validity window")]
    Expired,

    #[error("nonce was not issued by this server or has already been used")]
    NonceReused,

    #[error("signed message does not match the issued challenge")]
    MessageMismatch,

    #[error("signature verification failed")]
    BadSignature,

    #[error("malformed request: {0}")]
    MalformedRequest(String),
}

impl VerificationError {
    /// Stable name used on the wire (`{ok: false, error: <kind>}`)
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DomainMismatch { .. } => "DomainMismatch",
            Self::Expired => "Expired",
            Self::NonceReused => "NonceReused",
            Self::MessageMismatch => "MessageMismatch",
            Self::BadSignature => "BadSignature",
            Self::MalformedRequest(_) => "MalformedRequest",
        }
    }

    pub fn is_policy_failure(&self) -> bool {
        !matches!(self, Self::MalformedRequest(_))
    }
}

impl From<ChallengeError> for VerificationError {
    fn from(err: ChallengeError) -> Self {
        Self::MalformedRequest(err.to_string())
    }
}

/// The key holder declined or could not produce a signature
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SigningError {
    #[error("signing request was refused: {0}")]
    Refused(String),

    #[error("signing capability unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(VerificationError::Expired.kind(), "Expired");
        assert_eq!(VerificationError::NonceReused.kind(), "NonceReused");
        assert_eq!(
            VerificationError::DomainMismatch {
                expected: "example.com".into(),
                found: "phishing.com".into(),
            }
            .kind(),
            "DomainMismatch"
        );
    }

    #[test]
    fn test_malformed_is_not_policy() {
        assert!(VerificationError::BadSignature.is_policy_failure());
        assert!(!VerificationError::MalformedRequest("x".into()).is_policy_failure());

        let err: VerificationError = ChallengeError::invalid_field("nonce", "too short").into();
        assert_eq!(err.kind(), "MalformedRequest");
    }
}
