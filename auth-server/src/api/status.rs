// auth-server/src/api/status.rs
use actix::Addr;
use actix_web::{get, web, HttpResponse, Responder};
use common::AuditLog;
use serde_json::json;

use crate::nonce_registry::{GetNonceMetrics, NonceRegistryActor};

#[get("/")]
pub async fn api_index() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "name": "Sign-In-With-Solana API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// Ordered audit log, oldest first
#[get("/logs")]
pub async fn get_logs(audit: web::Data<AuditLog>) -> impl Responder {
    HttpResponse::Ok().json(audit.snapshot())
}

// Nonce store metrics; counts only
#[get("/status")]
pub async fn get_status(registry: Option<web::Data<Addr<NonceRegistryActor>>>) -> impl Responder {
    let Some(registry) = registry else {
        return HttpResponse::Ok().json(json!({ "nonce_store": "disabled" }));
    };

    match registry.send(GetNonceMetrics).await {
        Ok(metrics) => HttpResponse::Ok().json(json!({ "nonce_store": metrics })),
        Err(e) => {
            tracing::error!("Error retrieving nonce metrics: {}", e);
            HttpResponse::InternalServerError().json(json!({
                "error": "Internal server error"
            }))
        }
    }
}
