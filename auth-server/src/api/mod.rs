// auth-server/src/api/mod.rs
use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use common::{AuditLog, VerificationError, VerifyResponse, METHOD_CREATE_SIGN_IN_DATA, METHOD_SIGN_IN};

pub mod sign_in;
pub mod status;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .service(status::api_index)
            .service(sign_in::create_sign_in_data)
            .service(sign_in::verify_siws)
            .service(status::get_logs)
            .service(status::get_status)
    );
}

/// Undecodable JSON bodies become `400 {ok: false, error: "MalformedRequest"}`
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, req| {
        let detail = VerificationError::MalformedRequest(err.to_string());
        record_rejected_body(req, &detail);
        let response = HttpResponse::BadRequest().json(VerifyResponse::failure(&detail));
        InternalError::from_response(err, response).into()
    })
}

fn record_rejected_body(req: &HttpRequest, detail: &VerificationError) {
    let method = if req.path().ends_with("/createSignInData") {
        METHOD_CREATE_SIGN_IN_DATA
    } else {
        METHOD_SIGN_IN
    };

    match req.app_data::<web::Data<AuditLog>>() {
        Some(audit) => {
            audit.record(method, &Err::<String, _>(detail.clone()));
        }
        None => tracing::warn!("Rejected {} request body: {}", method, detail),
    }
}
