// auth-server/src/lib.rs
pub mod api;
pub mod generator;
pub mod middleware;
pub mod nonce_registry;
pub mod nonce_store;
pub mod utils;
pub mod verifier;

use std::sync::Arc;

use actix::{Actor, Addr};
use actix_web::web;
use chrono::Duration;
use common::{AuditLog, Config};

use generator::ChallengeGenerator;
use nonce_registry::NonceRegistryActor;
use nonce_store::NonceStore;
use verifier::Verifier;

/// Shared state handed to every worker's `App`
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub generator: web::Data<ChallengeGenerator>,
    pub verifier: web::Data<Verifier>,
    pub audit: web::Data<AuditLog>,
    pub nonce_registry: Option<web::Data<Addr<NonceRegistryActor>>>,
}

impl AppState {
    /// Build the sign-in services from configuration.
    ///
    /// Starts the nonce registry actor when the store is enabled, so this must
    /// run inside an actix system.
    pub fn new(config: Config) -> Self {
        let mut generator = ChallengeGenerator::new(&config.challenge);
        let mut verifier = Verifier::new(Duration::seconds(config.challenge.max_window_secs.max(1)));
        let mut nonce_registry = None;

        if config.nonce_store.enabled {
            let store = Arc::new(NonceStore::new(config.nonce_store.require_issued));
            generator = generator.with_nonce_store(store.clone());
            verifier = verifier.with_nonce_store(store.clone());

            let registry = NonceRegistryActor::new(store)
                .with_cleanup_interval(config.nonce_store.cleanup_interval_secs)
                .start();
            nonce_registry = Some(web::Data::new(registry));
        } else {
            tracing::warn!("Nonce store disabled; replay protection is limited to the challenge window");
        }

        Self {
            audit: web::Data::new(AuditLog::new(config.audit_capacity)),
            config: web::Data::new(config),
            generator: web::Data::new(generator),
            verifier: web::Data::new(verifier),
            nonce_registry,
        }
    }

    /// Register shared state and the `/api` routes
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.generator.clone())
            .app_data(self.verifier.clone())
            .app_data(self.audit.clone());

        if let Some(registry) = &self.nonce_registry {
            cfg.app_data(registry.clone());
        }

        api::configure(cfg);
    }
}
