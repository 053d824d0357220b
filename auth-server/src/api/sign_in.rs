// auth-server/src/api/sign_in.rs
use actix_web::{post, web, HttpResponse, Responder};
use common::{
    AuditLog, Config, CreateSignInRequest, VerificationError, VerifyRequest, VerifyResponse,
    METHOD_CREATE_SIGN_IN_DATA, METHOD_SIGN_IN,
};

use crate::generator::ChallengeGenerator;
use crate::verifier::Verifier;

// Issue a fresh challenge bound to the requesting page's origin
#[post("/createSignInData")]
pub async fn create_sign_in_data(
    body: web::Json<CreateSignInRequest>,
    generator: web::Data<ChallengeGenerator>,
    audit: web::Data<AuditLog>,
) -> impl Responder {
    let result = generator.generate(&body.uri);
    audit.record(METHOD_CREATE_SIGN_IN_DATA, &result);

    match result {
        Ok(challenge) => HttpResponse::Ok().json(challenge),
        Err(e) => {
            let err = VerificationError::from(e);
            HttpResponse::BadRequest().json(VerifyResponse::failure(&err))
        }
    }
}

// Verify a signed challenge. Policy failures are still 200 with ok = false.
#[post("/verifySIWS")]
pub async fn verify_siws(
    body: web::Json<VerifyRequest>,
    verifier: web::Data<Verifier>,
    config: web::Data<Config>,
    audit: web::Data<AuditLog>,
) -> impl Responder {
    let VerifyRequest { input, output } = body.into_inner();

    let result = output
        .check_shape()
        .and_then(|()| verifier.verify(&input, &output, &config.expected_domain));
    audit.record(METHOD_SIGN_IN, &result);

    match result {
        Ok(identity) => HttpResponse::Ok().json(VerifyResponse::success(identity.address)),
        Err(e) if e.is_policy_failure() => HttpResponse::Ok().json(VerifyResponse::failure(&e)),
        Err(e) => HttpResponse::BadRequest().json(VerifyResponse::failure(&e)),
    }
}
