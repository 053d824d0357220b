// sign-in-client/src/lib.rs
pub mod client;
pub mod error;

pub use client::SignInClient;
pub use error::ClientError;
