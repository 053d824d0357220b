// auth-server/src/utils/mod.rs
pub mod token;
