// auth-server/src/nonce_registry.rs
use actix::{Actor, Context, Handler, Message, AsyncContext, MessageResult};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use crate::nonce_store::NonceStore;

// Default cleanup interval in seconds
const DEFAULT_CLEANUP_INTERVAL: u64 = 60;

/// Actor message: Purge nonces whose validity window has closed
#[derive(Message)]
#[rtype(result = "usize")]
pub struct PurgeExpiredNonces;

/// Actor message: Get nonce store metrics
#[derive(Message)]
#[rtype(result = "NonceMetrics")]
pub struct GetNonceMetrics;

/// Nonce store metrics
#[derive(Debug, Clone, Default, Serialize)]
pub struct NonceMetrics {
    pub tracked: usize,
    pub issued: usize,
    pub consumed: usize,
    pub purged_total: usize,
}

/// Owns the housekeeping of the shared nonce store.
///
/// Issuance and consumption go straight to the store from request handlers;
/// this actor only purges stale entries on a timer and reports metrics.
pub struct NonceRegistryActor {
    store: Arc<NonceStore>,
    // Cleanup interval in seconds
    cleanup_interval: u64,
    purged_total: usize,
}

impl NonceRegistryActor {
    pub fn new(store: Arc<NonceStore>) -> Self {
        Self {
            store,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            purged_total: 0,
        }
    }

    pub fn with_cleanup_interval(mut self, interval_seconds: u64) -> Self {
        self.cleanup_interval = interval_seconds.max(1);
        self
    }

    fn purge(&mut self) -> usize {
        let purged = self.store.purge_expired(Utc::now());
        self.purged_total += purged;
        purged
    }

    fn metrics(&self) -> NonceMetrics {
        let counts = self.store.counts();
        NonceMetrics {
            tracked: counts.issued + counts.consumed,
            issued: counts.issued,
            consumed: counts.consumed,
            purged_total: self.purged_total,
        }
    }
}

impl Actor for NonceRegistryActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("NonceRegistryActor started, purging every {}s", self.cleanup_interval);

        // Schedule periodic purge
        ctx.run_interval(Duration::from_secs(self.cleanup_interval), |act, _ctx| {
            let purged = act.purge();
            if purged > 0 {
                tracing::info!("Purged {} expired nonces", purged);
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "NonceRegistryActor stopped. {} nonces tracked, {} purged during lifetime",
            self.store.len(),
            self.purged_total
        );
    }
}

impl Handler<PurgeExpiredNonces> for NonceRegistryActor {
    type Result = MessageResult<PurgeExpiredNonces>;

    fn handle(&mut self, _msg: PurgeExpiredNonces, _ctx: &mut Self::Context) -> Self::Result {
        let purged = self.purge();
        tracing::debug!("Purged {} expired nonces on request", purged);
        MessageResult(purged)
    }
}

impl Handler<GetNonceMetrics> for NonceRegistryActor {
    type Result = MessageResult<GetNonceMetrics>;

    fn handle(&mut self, _msg: GetNonceMetrics, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ChallengeGenerator;
    use chrono::Duration as ChronoDuration;
    use common::ChallengeConfig;

    #[actix_web::test]
    async fn test_purge_and_metrics() {
        let store = Arc::new(NonceStore::default());
        let generator = ChallengeGenerator::new(&ChallengeConfig::default())
            .with_nonce_store(store.clone());
        let now = Utc::now();

        // Default ttl is ten minutes
        generator
            .generate_at("https://example.com/", now - ChronoDuration::minutes(20))
            .unwrap();
        let live = generator.generate_at("https://example.com/", now).unwrap();
        store.consume(&live, now + ChronoDuration::minutes(5)).unwrap();

        let registry = NonceRegistryActor::new(store.clone())
            .with_cleanup_interval(3600)
            .start();

        let purged = registry.send(PurgeExpiredNonces).await.unwrap();
        assert_eq!(purged, 1);

        let metrics = registry.send(GetNonceMetrics).await.unwrap();
        assert_eq!(metrics.tracked, 1);
        assert_eq!(metrics.issued, 0);
        assert_eq!(metrics.consumed, 1);
        assert_eq!(metrics.purged_total, 1);
    }
}
