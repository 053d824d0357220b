// auth-server/src/generator.rs
use std::sync::Arc;

use chrono::{DateTime, Duration, SubsecRound, Utc};
use common::{authority_of, Challenge, ChallengeConfig, ChallengeError, SIGN_IN_VERSION};

use crate::nonce_store::NonceStore;
use crate::utils::token::generate_nonce;

/// Issues sign-in challenges bound to the origin they were requested from
pub struct ChallengeGenerator {
    statement: String,
    chain_id: Option<String>,
    resources: Option<Vec<String>>,
    ttl: Duration,
    nonce_store: Option<Arc<NonceStore>>,
}

impl ChallengeGenerator {
    pub fn new(config: &ChallengeConfig) -> Self {
        Self {
            statement: config.statement.clone(),
            chain_id: config.chain_id.clone(),
            resources: config.resources.clone(),
            ttl: Duration::seconds(config.ttl_secs.max(1)),
            nonce_store: None,
        }
    }

    /// Record every issued nonce so the verifier can enforce single use
    pub fn with_nonce_store(mut self, store: Arc<NonceStore>) -> Self {
        self.nonce_store = Some(store);
        self
    }

    pub fn generate(&self, request_origin: &str) -> Result<Challenge, ChallengeError> {
        self.generate_at(request_origin, Utc::now())
    }

    /// Build a challenge for `request_origin` as if issued at `now`.
    ///
    /// The domain always comes from the origin URI's authority, never from
    /// any other client-supplied text.
    pub fn generate_at(
        &self,
        request_origin: &str,
        now: DateTime<Utc>,
    ) -> Result<Challenge, ChallengeError> {
        let domain = authority_of(request_origin)?;

        // Millisecond precision, the same shape a browser's toISOString() yields
        let issued_at = now.trunc_subsecs(3);

        let challenge = Challenge {
            domain,
            statement: self.statement.clone(),
            uri: request_origin.to_string(),
            version: SIGN_IN_VERSION.to_string(),
            chain_id: self.chain_id.clone(),
            nonce: generate_nonce(),
            issued_at,
            expiration_time: Some(issued_at + self.ttl),
            not_before: None,
            request_id: None,
            resources: self.resources.clone(),
        };
        challenge.validate()?;

        if let Some(store) = &self.nonce_store {
            store.record_issued(&challenge, issued_at + self.ttl);
        }

        tracing::info!("Issued {}", challenge);
        Ok(challenge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nonce_store::NonceState;

    fn generator() -> ChallengeGenerator {
        ChallengeGenerator::new(&ChallengeConfig::default())
    }

    #[test]
    fn test_domain_comes_from_origin() {
        let c = generator().generate("https://example.com/login?next=/home").unwrap();
        assert_eq!(c.domain, "example.com");
        assert_eq!(c.uri, "https://example.com/login?next=/home");
        assert_eq!(c.version, "1");
        assert_eq!(c.statement, "Sign in with Solana to the app.");

        let local = generator().generate("http://localhost:3000/").unwrap();
        assert_eq!(local.domain, "localhost:3000");
    }

    #[test]
    fn test_rejects_malformed_origin() {
        assert!(matches!(
            generator().generate("not a uri"),
            Err(ChallengeError::InvalidOrigin { .. })
        ));
        assert!(generator().generate("data:text/plain,hello").is_err());
        assert!(generator().generate("https://example.com/\nNonce: x").is_err());
    }

    #[test]
    fn test_timestamps() {
        let now = Utc::now();
        let c = generator().generate_at("https://example.com/", now).unwrap();

        assert!(c.issued_at <= now);
        assert!(now - c.issued_at < Duration::milliseconds(1));
        assert_eq!(c.expiration_time, Some(c.issued_at + Duration::seconds(600)));
        assert_eq!(c.not_before, None);
    }

    #[test]
    fn test_fresh_nonce_per_challenge() {
        let g = generator();
        let a = g.generate("https://example.com/").unwrap();
        let b = g.generate("https://example.com/").unwrap();
        assert_ne!(a.nonce, b.nonce);
        assert_eq!(a.validate(), Ok(()));
    }

    #[test]
    fn test_records_issued_nonce() {
        let store = Arc::new(NonceStore::default());
        let g = generator().with_nonce_store(store.clone());

        let c = g.generate("https://example.com/").unwrap();
        assert_eq!(store.state(&c.nonce), Some(NonceState::Issued));

        // Failed issuance leaves nothing behind
        assert!(g.generate("nope").is_err());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_configured_fields() {
        let config = ChallengeConfig {
            chain_id: Some("solana:mainnet".to_string()),
            resources: Some(vec!["https://phantom.app/".to_string()]),
            ..ChallengeConfig::default()
        };
        let c = ChallengeGenerator::new(&config)
            .generate("https://example.com/")
            .unwrap();
        assert_eq!(c.chain_id.as_deref(), Some("solana:mainnet"));
        assert_eq!(c.resources, Some(vec!["https://phantom.app/".to_string()]));
    }
}
