// common/src/audit.rs
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, MutexGuard};

use crate::models::{RecordStatus, VerificationRecord};

/// Default number of records kept before the oldest are dropped
pub const DEFAULT_AUDIT_CAPACITY: usize = 1000;

/// Ordered, append-only log of operation outcomes.
///
/// This is what a UI reads to show "connect / sign-in / sign-message" history.
#[derive(Debug)]
pub struct AuditLog {
    records: Mutex<VecDeque<VerificationRecord>>,
    capacity: usize,
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIT_CAPACITY)
    }
}

impl AuditLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    /// Turn an outcome into a record and append it. Never fails.
    pub fn record<T, E>(&self, method: &str, result: &Result<T, E>) -> VerificationRecord
    where
        T: fmt::Display,
        E: fmt::Display,
    {
        let record = VerificationRecord::from_result(method, result);

        match record.status() {
            RecordStatus::Success => {
                tracing::info!(method = record.method(), "{}", record.message());
            }
            RecordStatus::Error => {
                tracing::warn!(method = record.method(), "{}", record.message());
            }
        }

        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record.clone());

        record
    }

    /// Copy of the log, oldest first
    pub fn snapshot(&self) -> Vec<VerificationRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<VerificationRecord>> {
        // A panic while holding the lock cannot leave a half-written record
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{SigningError, VerificationError};
    use crate::models::METHOD_SIGN_IN;

    #[test]
    fn test_records_in_order() {
        let log = AuditLog::default();
        assert!(log.is_empty());

        let ok: Result<&str, VerificationError> = Ok("Signed in as abc");
        let err: Result<&str, VerificationError> = Err(VerificationError::NonceReused);
        let refused: Result<&str, SigningError> = Err(SigningError::Refused("user rejected".into()));

        let first = log.record(METHOD_SIGN_IN, &ok);
        log.record(METHOD_SIGN_IN, &err);
        log.record("signMessage", &refused);

        let records = log.snapshot();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0], first);
        assert_eq!(records[1].status(), RecordStatus::Error);
        assert_eq!(records[2].method(), "signMessage");
        assert_eq!(records[2].message(), "signing request was refused: user rejected");
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let log = AuditLog::new(2);
        for i in 0..3 {
            let r: Result<String, VerificationError> = Ok(format!("attempt {}", i));
            log.record(METHOD_SIGN_IN, &r);
        }

        let records = log.snapshot();
        assert_eq!(log.len(), 2);
        assert_eq!(records[0].message(), "attempt 1");
        assert_eq!(records[1].message(), "attempt 2");
    }
}
