// common/src/signer.rs
use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

use crate::error::SigningError;
use crate::message::address_of;
use crate::models::SignInOutput;

/// Holder of a private key, living in its own trust domain (a wallet).
///
/// Signing is asynchronous because the key holder may ask a user first, and
/// it may be refused.
#[async_trait]
pub trait SigningCapability: Send + Sync {
    /// Raw public key the capability signs with
    fn public_key(&self) -> Vec<u8>;

    /// Base58 account address of [`public_key`](Self::public_key)
    fn address(&self) -> String {
        address_of(&self.public_key())
    }

    async fn sign(&self, message: &[u8]) -> Result<SignInOutput, SigningError>;
}

/// In-process ed25519 keypair. Stands in for a wallet in tools and tests.
pub struct KeypairSigner {
    key: SigningKey,
}

impl KeypairSigner {
    pub fn generate() -> Self {
        Self { key: SigningKey::generate(&mut OsRng) }
    }

    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self { key: SigningKey::from_bytes(seed) }
    }

    /// Load a base58-encoded 32-byte seed
    pub fn from_base58(secret: &str) -> Result<Self, SigningError> {
        let bytes = bs58::decode(secret.trim())
            .into_vec()
            .map_err(|e| SigningError::Unavailable(format!("invalid signer secret: {}", e)))?;
        let seed: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            SigningError::Unavailable(format!("signer secret must be 32 bytes, got {}", b.len()))
        })?;
        Ok(Self::from_seed(&seed))
    }
}

#[async_trait]
impl SigningCapability for KeypairSigner {
    fn public_key(&self) -> Vec<u8> {
        self.key.verifying_key().to_bytes().to_vec()
    }

    async fn sign(&self, message: &[u8]) -> Result<SignInOutput, SigningError> {
        let signature = self.key.sign(message);
        Ok(SignInOutput::new(
            self.public_key(),
            signature.to_bytes().to_vec(),
            message.to_vec(),
        ))
    }
}
