pub mod audit;
pub mod config;
pub mod error;
pub mod message;
pub mod messages;
pub mod models;
pub mod signer;
pub mod utils;
pub mod wire;

pub use audit::AuditLog;
pub use self::config::*;
pub use error::*;
pub use message::{address_of, canonicalize};
pub use messages::*;
pub use models::*;
pub use signer::{KeypairSigner, SigningCapability};
pub use utils::*;
