// auth-server/src/nonce_store.rs
use chrono::{DateTime, Utc};
use common::Challenge;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonceState {
    Issued,
    Consumed,
}

#[derive(Debug, Clone)]
struct NonceEntry {
    state: NonceState,
    /// Challenge as issued. Cleared once consumed.
    issued: Option<Challenge>,
    /// Entry can be forgotten after this instant; the challenge window has closed
    retain_until: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NonceRejection {
    #[error("nonce has already been used")]
    AlreadyUsed,

    #[error("nonce was never issued by this server")]
    NotIssued,

    #[error("challenge differs from the one issued with this nonce")]
    Altered,
}

/// Counts of tracked nonces by state
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NonceCounts {
    pub issued: usize,
    pub consumed: usize,
}

/// Single-use bookkeeping for sign-in nonces.
///
/// `consume` runs under the map's shard lock for that key, so two concurrent
/// verifications presenting the same nonce cannot both succeed.
#[derive(Debug)]
pub struct NonceStore {
    entries: DashMap<String, NonceEntry>,
    require_issued: bool,
}

impl Default for NonceStore {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NonceStore {
    /// With `require_issued`, nonces this store has not seen are rejected
    pub fn new(require_issued: bool) -> Self {
        Self {
            entries: DashMap::new(),
            require_issued,
        }
    }

    /// Remember a freshly issued challenge under its nonce.
    ///
    /// `retain_until` is fixed here; consuming the nonce never extends it.
    pub fn record_issued(&self, challenge: &Challenge, retain_until: DateTime<Utc>) {
        self.entries.insert(
            challenge.nonce.clone(),
            NonceEntry {
                state: NonceState::Issued,
                issued: Some(challenge.clone()),
                retain_until,
            },
        );
        tracing::debug!("Recorded issued challenge for {}", challenge.domain);
    }

    /// Atomically check that `challenge` is the unused one issued under its
    /// nonce and mark the nonce consumed.
    ///
    /// An altered challenge leaves the nonce unspent. `retain_until` only
    /// applies to nonces this store never issued.
    pub fn consume(
        &self,
        challenge: &Challenge,
        retain_until: DateTime<Utc>,
    ) -> Result<(), NonceRejection> {
        match self.entries.entry(challenge.nonce.clone()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if entry.state == NonceState::Consumed {
                    return Err(NonceRejection::AlreadyUsed);
                }
                if entry.issued.as_ref().is_some_and(|issued| issued != challenge) {
                    return Err(NonceRejection::Altered);
                }
                entry.state = NonceState::Consumed;
                entry.issued = None;
                Ok(())
            }
            Entry::Vacant(vacant) => {
                if self.require_issued {
                    return Err(NonceRejection::NotIssued);
                }
                vacant.insert(NonceEntry {
                    state: NonceState::Consumed,
                    issued: None,
                    retain_until,
                });
                Ok(())
            }
        }
    }

    pub fn state(&self, nonce: &str) -> Option<NonceState> {
        self.entries.get(nonce).map(|entry| entry.state)
    }

    /// Drop entries whose window closed before `now`. Returns how many were removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.retain_until >= now);
        before.saturating_sub(self.entries.len())
    }

    pub fn counts(&self) -> NonceCounts {
        self.entries
            .iter()
            .fold(NonceCounts::default(), |mut counts, entry| {
                match entry.value().state {
                    NonceState::Issued => counts.issued += 1,
                    NonceState::Consumed => counts.consumed += 1,
                }
                counts
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
