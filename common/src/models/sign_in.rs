// common/src/models/sign_in.rs
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::VerificationError;
use crate::message::address_of;
use crate::wire;

pub const PUBLIC_KEY_LEN: usize = 32;
pub const SIGNATURE_LEN: usize = 64;

/// Account that produced a sign-in proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    #[serde(with = "wire::bytes")]
    pub public_key: Vec<u8>,
    /// Base58 form of `public_key` as reported by the wallet. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Proof returned by the signing capability for a challenge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInOutput {
    pub account: Account,
    #[serde(with = "wire::bytes")]
    pub signature: Vec<u8>,
    /// Bytes the signer says it signed. Only compared against the verifier's
    /// own reconstruction, never trusted on its own.
    #[serde(with = "wire::bytes")]
    pub signed_message: Vec<u8>,
}

impl SignInOutput {
    pub fn new(public_key: Vec<u8>, signature: Vec<u8>, signed_message: Vec<u8>) -> Self {
        let address = address_of(&public_key);
        Self {
            account: Account { public_key, address: Some(address) },
            signature,
            signed_message,
        }
    }

    /// Reject proofs whose byte arrays cannot possibly be an ed25519 key/signature
    /// or whose reported address disagrees with the key.
    pub fn check_shape(&self) -> Result<(), VerificationError> {
        if self.account.public_key.len() != PUBLIC_KEY_LEN {
            return Err(VerificationError::MalformedRequest(format!(
                "publicKey must be {} bytes, got {}",
                PUBLIC_KEY_LEN,
                self.account.public_key.len()
            )));
        }
        if self.signature.len() != SIGNATURE_LEN {
            return Err(VerificationError::MalformedRequest(format!(
                "signature must be {} bytes, got {}",
                SIGNATURE_LEN,
                self.signature.len()
            )));
        }
        if let Some(address) = &self.account.address {
            if *address != address_of(&self.account.public_key) {
                return Err(VerificationError::MalformedRequest(
                    "account address does not match publicKey".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Identity established by a successful verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedIdentity {
    #[serde(with = "wire::bytes")]
    pub public_key: Vec<u8>,
    pub address: String,
    #[serde(with = "wire::timestamp")]
    pub verified_at: DateTime<Utc>,
}

impl fmt::Display for VerifiedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signed in as {}", self.address)
    }
}
