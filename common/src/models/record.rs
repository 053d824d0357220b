// common/src/models/record.rs
use std::fmt;

use serde::{Deserialize, Serialize};

pub const METHOD_CREATE_SIGN_IN_DATA: &str = "createSignInData";
pub const METHOD_SIGN_IN: &str = "signIn";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Error,
}

/// Auditable outcome of one operation. Built once, never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    status: RecordStatus,
    method: String,
    message: String,
}

impl VerificationRecord {
    /// Map an outcome to a record. Errors use their display text as the message.
    pub fn from_result<T, E>(method: &str, result: &Result<T, E>) -> Self
    where
        T: fmt::Display,
        E: fmt::Display,
    {
        match result {
            Ok(value) => Self {
                status: RecordStatus::Success,
                method: method.to_string(),
                message: value.to_string(),
            },
            Err(err) => Self {
                status: RecordStatus::Error,
                method: method.to_string(),
                message: err.to_string(),
            },
        }
    }

    pub fn status(&self) -> RecordStatus {
        self.status
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}
