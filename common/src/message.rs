// common/src/message.rs
//! Canonical sign-in message.
//!
//! Both sides build the bytes to sign with [`canonicalize`], so the signer and
//! the verifier agree byte for byte without ever exchanging the text as a
//! source of truth. Each field sits on its own labelled line; challenges that
//! passed [`Challenge::validate`] contain no line breaks, so a field can never
//! spill into the next label.

use crate::models::Challenge;
use crate::wire::format_timestamp;

const HEADER_SUFFIX: &str = " wants you to sign in with your Solana account:";

/// Base58 account address for a raw public key
pub fn address_of(public_key: &[u8]) -> String {
    bs58::encode(public_key).into_string()
}

/// Build the exact bytes a signer must sign for `challenge`.
///
/// `signer_identity` is the signer's account address (see [`address_of`]).
/// Pure and deterministic: optional fields contribute a line only when
/// present, and `resources: Some(vec![])` still emits its `Resources:` header.
pub fn canonicalize(challenge: &Challenge, signer_identity: &str) -> Vec<u8> {
    let mut lines: Vec<String> = Vec::with_capacity(16);

    lines.push(format!("{}{}", challenge.domain, HEADER_SUFFIX));
    lines.push(signer_identity.to_string());
    lines.push(String::new());
    lines.push(challenge.statement.clone());
    lines.push(String::new());

    lines.push(format!("URI: {}", challenge.uri));
    lines.push(format!("Version: {}", challenge.version));
    if let Some(chain_id) = &challenge.chain_id {
        lines.push(format!("Chain ID: {}", chain_id));
    }
    lines.push(format!("Nonce: {}", challenge.nonce));
    lines.push(format!("Issued At: {}", format_timestamp(&challenge.issued_at)));
    if let Some(expiration_time) = &challenge.expiration_time {
        lines.push(format!("Expiration Time: {}", format_timestamp(expiration_time)));
    }
    if let Some(not_before) = &challenge.not_before {
        lines.push(format!("Not Before: {}", format_timestamp(not_before)));
    }
    if let Some(request_id) = &challenge.request_id {
        lines.push(format!("Request ID: {}", request_id));
    }
    if let Some(resources) = &challenge.resources {
        lines.push("Resources:".to_string());
        for resource in resources {
            lines.push(format!("- {}", resource));
        }
    }

    lines.join("\n").into_bytes()
}
