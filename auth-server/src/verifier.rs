// auth-server/src/verifier.rs
//! Server-side verification of sign-in proofs.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. the challenge's domain is exactly the domain this server serves
//! 2. the current time lies inside the challenge's validity window
//! 3. the nonce has not been used before (and is marked used, atomically)
//! 4. the message the client says it signed equals our own canonical
//!    reconstruction of the challenge
//! 5. the signature is valid for the reconstructed bytes under the
//!    presented public key
//!
//! The client-supplied `signedMessage` is never the input to step 5.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use common::{address_of, canonicalize, Challenge, SignInOutput, VerificationError, VerifiedIdentity};
use ed25519_dalek::{Signature, VerifyingKey};

use crate::nonce_store::{NonceRejection, NonceStore};

pub struct Verifier {
    max_window: Duration,
    nonce_store: Option<Arc<NonceStore>>,
}

impl Verifier {
    /// `max_window` bounds challenges that carry no expiration time
    pub fn new(max_window: Duration) -> Self {
        Self {
            max_window,
            nonce_store: None,
        }
    }

    /// Without a store, replay protection is limited to the validity window
    pub fn with_nonce_store(mut self, store: Arc<NonceStore>) -> Self {
        self.nonce_store = Some(store);
        self
    }

    pub fn verify(
        &self,
        challenge: &Challenge,
        output: &SignInOutput,
        expected_domain: &str,
    ) -> Result<VerifiedIdentity, VerificationError> {
        self.verify_at(challenge, output, expected_domain, Utc::now())
    }

    pub fn verify_at(
        &self,
        challenge: &Challenge,
        output: &SignInOutput,
        expected_domain: &str,
        now: DateTime<Utc>,
    ) -> Result<VerifiedIdentity, VerificationError> {
        // Canonicalization is only unambiguous for well-formed challenges
        challenge.validate()?;

        if challenge.domain != expected_domain {
            tracing::warn!(
                "Rejected challenge for domain {:?}, expected {:?}",
                challenge.domain,
                expected_domain
            );
            return Err(VerificationError::DomainMismatch {
                expected: expected_domain.to_string(),
                found: challenge.domain.clone(),
            });
        }

        let valid_until = challenge.valid_until(self.max_window);
        if now < challenge.valid_from() || now > valid_until {
            return Err(VerificationError::Expired);
        }

        if let Some(store) = &self.nonce_store {
            store.consume(challenge, valid_until).map_err(|rejection| {
                tracing::warn!("Nonce rejected for {}: {}", challenge.domain, rejection);
                match rejection {
                    NonceRejection::Altered => VerificationError::MessageMismatch,
                    NonceRejection::AlreadyUsed | NonceRejection::NotIssued => {
                        VerificationError::NonceReused
                    }
                }
            })?;
        }

        let address = address_of(&output.account.public_key);
        let expected_message = canonicalize(challenge, &address);
        if expected_message != output.signed_message {
            return Err(VerificationError::MessageMismatch);
        }

        verify_signature(&output.account.public_key, &expected_message, &output.signature)?;

        tracing::info!("Verified sign-in for {} on {}", address, challenge.domain);
        Ok(VerifiedIdentity {
            public_key: output.account.public_key.clone(),
            address,
            verified_at: now,
        })
    }
}

fn verify_signature(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<(), VerificationError> {
    let key_bytes: [u8; 32] = public_key
        .try_into()
        .map_err(|_| VerificationError::BadSignature)?;
    let key = VerifyingKey::from_bytes(&key_bytes).map_err(|_| VerificationError::BadSignature)?;
    let signature = Signature::from_slice(signature).map_err(|_| VerificationError::BadSignature)?;

    key.verify_strict(message, &signature)
        .map_err(|_| VerificationError::BadSignature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::SIGN_IN_VERSION;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    const DOMAIN: &str = "example.com";

    fn challenge_at(issued_at: DateTime<Utc>) -> Challenge {
        Challenge {
            domain: DOMAIN.to_string(),
            statement: "Sign in".to_string(),
            uri: "https://example.com/".to_string(),
            version: SIGN_IN_VERSION.to_string(),
            chain_id: None,
            nonce: "n1n1n1n1n1".to_string(),
            issued_at,
            expiration_time: Some(issued_at + Duration::minutes(10)),
            not_before: None,
            request_id: None,
            resources: None,
        }
    }

    fn sign(key: &SigningKey, challenge: &Challenge) -> SignInOutput {
        let public_key = key.verifying_key().to_bytes().to_vec();
        let message = canonicalize(challenge, &address_of(&public_key));
        let signature = key.sign(&message).to_bytes().to_vec();
        SignInOutput::new(public_key, signature, message)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, 11, 5, 46, 45).unwrap()
    }

    fn verifier() -> Verifier {
        Verifier::new(Duration::minutes(10))
    }

    #[test]
    fn test_round_trip() {
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        let output = sign(&key, &c);

        let identity = verifier()
            .verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1))
            .unwrap();
        assert_eq!(identity.public_key, key.verifying_key().to_bytes().to_vec());
        assert_eq!(identity.address, address_of(&identity.public_key));
        assert_eq!(identity.verified_at, t0() + Duration::seconds(1));
    }

    #[test]
    fn test_domain_forgery_is_rejected_even_with_valid_signature() {
        let key = SigningKey::generate(&mut OsRng);
        let mut c = challenge_at(t0());
        c.domain = "phishing.com".to_string();
        let output = sign(&key, &c);

        let err = verifier()
            .verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1))
            .unwrap_err();
        assert_eq!(
            err,
            VerificationError::DomainMismatch {
                expected: "example.com".to_string(),
                found: "phishing.com".to_string(),
            }
        );
    }

    #[test]
    fn test_expiry_boundary() {
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        let output = sign(&key, &c);
        let expires = c.expiration_time.unwrap();

        assert!(verifier()
            .verify_at(&c, &output, DOMAIN, expires - Duration::seconds(1))
            .is_ok());
        assert_eq!(
            verifier().verify_at(&c, &output, DOMAIN, expires + Duration::seconds(1)),
            Err(VerificationError::Expired)
        );
        // Not yet valid
        assert_eq!(
            verifier().verify_at(&c, &output, DOMAIN, t0() - Duration::seconds(1)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn test_not_before_and_default_window() {
        let key = SigningKey::generate(&mut OsRng);

        let mut c = challenge_at(t0());
        c.not_before = Some(t0() + Duration::minutes(1));
        let output = sign(&key, &c);
        assert_eq!(
            verifier().verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(30)),
            Err(VerificationError::Expired)
        );
        assert!(verifier()
            .verify_at(&c, &output, DOMAIN, t0() + Duration::minutes(2))
            .is_ok());

        let mut open = challenge_at(t0());
        open.expiration_time = None;
        let output = sign(&key, &open);
        assert!(verifier()
            .verify_at(&open, &output, DOMAIN, t0() + Duration::minutes(9))
            .is_ok());
        assert_eq!(
            verifier().verify_at(&open, &output, DOMAIN, t0() + Duration::minutes(11)),
            Err(VerificationError::Expired)
        );
    }

    #[test]
    fn test_replay_is_rejected() {
        let store = Arc::new(NonceStore::default());
        let verifier = verifier().with_nonce_store(store.clone());
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        store.record_issued(&c, c.expiration_time.unwrap());
        let output = sign(&key, &c);
        let now = t0() + Duration::seconds(1);

        assert!(verifier.verify_at(&c, &output, DOMAIN, now).is_ok());
        assert_eq!(
            verifier.verify_at(&c, &output, DOMAIN, now),
            Err(VerificationError::NonceReused)
        );
    }

    #[test]
    fn test_resigned_altered_challenge_is_rejected() {
        let store = Arc::new(NonceStore::default());
        let verifier = verifier().with_nonce_store(store.clone());
        let key = SigningKey::generate(&mut OsRng);
        let issued = challenge_at(t0());
        store.record_issued(&issued, issued.expiration_time.unwrap());
        let now = t0() + Duration::seconds(1);

        // Correctly signed, but not the challenge that was issued
        let mut altered = issued.clone();
        altered.statement = "Approve a transfer".to_string();
        altered.expiration_time = Some(t0() + Duration::days(365));
        let output = sign(&key, &altered);

        assert_eq!(
            verifier.verify_at(&altered, &output, DOMAIN, now),
            Err(VerificationError::MessageMismatch)
        );

        // The genuine holder can still use the nonce
        let output = sign(&key, &issued);
        assert!(verifier.verify_at(&issued, &output, DOMAIN, now).is_ok());
    }

    #[test]
    fn test_unissued_nonce_is_rejected_by_strict_store() {
        let verifier = verifier().with_nonce_store(Arc::new(NonceStore::new(true)));
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        let output = sign(&key, &c);

        assert_eq!(
            verifier.verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1)),
            Err(VerificationError::NonceReused)
        );
    }

    #[test]
    fn test_tampered_signature() {
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        let now = t0() + Duration::seconds(1);

        for i in [0, 31, 63] {
            let mut output = sign(&key, &c);
            output.signature[i] ^= 0x01;
            assert_eq!(
                verifier().verify_at(&c, &output, DOMAIN, now),
                Err(VerificationError::BadSignature)
            );
        }
    }

    #[test]
    fn test_tampered_signed_message() {
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        let mut output = sign(&key, &c);
        let last = output.signed_message.len() - 1;
        output.signed_message[last] ^= 0x01;

        assert_eq!(
            verifier().verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1)),
            Err(VerificationError::MessageMismatch)
        );
    }

    #[test]
    fn test_tampered_challenge_fields() {
        let key = SigningKey::generate(&mut OsRng);
        let original = challenge_at(t0());
        let output = sign(&key, &original);
        let now = t0() + Duration::seconds(1);

        let tampered: Vec<Challenge> = vec![
            Challenge { statement: "Sign in!".into(), ..original.clone() },
            Challenge { uri: "https://example.com/x".into(), ..original.clone() },
            Challenge { nonce: "n1n1n1n1n2".into(), ..original.clone() },
            Challenge { chain_id: Some("solana:devnet".into()), ..original.clone() },
            Challenge { resources: Some(vec![]), ..original.clone() },
            Challenge { issued_at: t0() - Duration::seconds(1), ..original.clone() },
        ];

        for c in tampered {
            assert_eq!(
                verifier().verify_at(&c, &output, DOMAIN, now),
                Err(VerificationError::MessageMismatch),
                "tampered challenge {:?}",
                c
            );
        }
    }

    #[test]
    fn test_message_signed_for_another_key() {
        // Signed message names a different address than the presented key
        let alice = SigningKey::generate(&mut OsRng);
        let mallory = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());

        let mut output = sign(&alice, &c);
        output.account.public_key = mallory.verifying_key().to_bytes().to_vec();
        assert_eq!(
            verifier().verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1)),
            Err(VerificationError::MessageMismatch)
        );
    }

    #[test]
    fn test_short_key_is_bad_signature() {
        let key = SigningKey::generate(&mut OsRng);
        let c = challenge_at(t0());
        let mut output = sign(&key, &c);
        output.account.public_key.truncate(31);
        output.signed_message = canonicalize(&c, &address_of(&output.account.public_key));

        assert_eq!(
            verifier().verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1)),
            Err(VerificationError::BadSignature)
        );
    }

    #[test]
    fn test_malformed_challenge() {
        let key = SigningKey::generate(&mut OsRng);
        let mut c = challenge_at(t0());
        c.statement = "Sign in\nNonce: other".to_string();
        let output = sign(&key, &c);

        assert!(matches!(
            verifier().verify_at(&c, &output, DOMAIN, t0() + Duration::seconds(1)),
            Err(VerificationError::MalformedRequest(_))
        ));
    }

    #[test]
    fn test_end_to_end_scenario() {
        let store = Arc::new(NonceStore::new(false));
        let verifier = verifier().with_nonce_store(store);
        let key = SigningKey::generate(&mut OsRng);

        let mut c = challenge_at(t0());
        c.nonce = "n1".repeat(4);
        c.expiration_time = None;
        let output = sign(&key, &c);
        let pk = output.account.public_key.clone();

        let identity = verifier
            .verify_at(&c, &output, "example.com", t0() + Duration::seconds(1))
            .unwrap();
        assert_eq!(identity.public_key, pk);
    }
}
