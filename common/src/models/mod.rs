// common/src/models/mod.rs
pub mod challenge;
pub mod record;
pub mod sign_in;

pub use challenge::{authority_of, Challenge, SIGN_IN_VERSION};
pub use record::{RecordStatus, VerificationRecord, METHOD_CREATE_SIGN_IN_DATA, METHOD_SIGN_IN};
pub use sign_in::{Account, SignInOutput, VerifiedIdentity, PUBLIC_KEY_LEN, SIGNATURE_LEN};
