// sign-in-client/src/client.rs
use std::time::Duration;

use common::{
    authority_of, canonicalize, AuditLog, Challenge, Config, CreateSignInRequest, SignInOutput,
    SigningCapability, SigningError, VerifyRequest, VerifyResponse, METHOD_SIGN_IN,
};
use reqwest::Client;

use crate::error::ClientError;

/// Runs the sign-in handshake against the service at `endpoint` on behalf of
/// a page at `origin`, using `signer` as the wallet.
pub struct SignInClient<S> {
    http: Client,
    endpoint: String,
    origin: String,
    signer: S,
    signing_timeout: Duration,
    audit: AuditLog,
}

impl<S: SigningCapability> SignInClient<S> {
    pub fn new(config: &Config, signer: S) -> Result<Self, ClientError> {
        let timeout = Duration::from_secs(config.request_timeout_secs.max(1));
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            origin: config.client.origin.clone(),
            signer,
            signing_timeout: timeout,
            audit: AuditLog::new(config.audit_capacity),
        })
    }

    /// How long the signer may take before the attempt is abandoned
    pub fn with_signing_timeout(mut self, timeout: Duration) -> Self {
        self.signing_timeout = timeout;
        self
    }

    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// Full handshake: fetch, sign, submit. Returns the verified address.
    ///
    /// The outcome is appended to this client's audit log either way.
    pub async fn sign_in(&self) -> Result<String, ClientError> {
        let result = self.try_sign_in().await;

        let outcome = result.as_ref().map(|address| format!("Signed in as {}", address));
        self.audit.record(METHOD_SIGN_IN, &outcome);

        result
    }

    async fn try_sign_in(&self) -> Result<String, ClientError> {
        let challenge = self.fetch_challenge().await?;
        let output = self.sign_challenge(&challenge).await?;
        self.submit(&challenge, &output).await
    }

    /// Ask the service for a challenge bound to our origin
    pub async fn fetch_challenge(&self) -> Result<Challenge, ClientError> {
        let response = self.http
            .post(format!("{}/createSignInData", self.endpoint))
            .json(&CreateSignInRequest { uri: self.origin.clone() })
            .send()
            .await?;

        if !response.status().is_success() {
            let body: VerifyResponse = response.json().await?;
            return Err(rejection(body));
        }

        let challenge: Challenge = response.json().await?;
        tracing::debug!("Received {}", challenge);
        Ok(challenge)
    }

    /// Check the challenge is for this site, then have the signer sign its
    /// canonical form.
    pub async fn sign_challenge(&self, challenge: &Challenge) -> Result<SignInOutput, ClientError> {
        challenge.validate()?;

        let expected = authority_of(&self.origin)?;
        if challenge.domain != expected {
            tracing::warn!(
                "Refusing to sign challenge for {} while on {}",
                challenge.domain,
                expected
            );
            return Err(ClientError::DomainMismatch {
                expected,
                found: challenge.domain.clone(),
            });
        }

        let message = canonicalize(challenge, &self.signer.address());

        let output = tokio::time::timeout(self.signing_timeout, self.signer.sign(&message))
            .await
            .map_err(|_| {
                SigningError::Unavailable(format!(
                    "no signature within {}s",
                    self.signing_timeout.as_secs_f32()
                ))
            })?
            .map_err(|e| {
                tracing::error!("Signing failed: {}", e);
                e
            })?;

        if output.signed_message != message {
            return Err(ClientError::UnexpectedProof("signed message differs from the challenge"));
        }
        if output.account.public_key != self.signer.public_key() {
            return Err(ClientError::UnexpectedProof("proof is for a different account"));
        }

        Ok(output)
    }

    /// Submit the proof. Any `{ok: false}` answer becomes `ClientError::Rejected`.
    pub async fn submit(
        &self,
        challenge: &Challenge,
        output: &SignInOutput,
    ) -> Result<String, ClientError> {
        let body = VerifyRequest {
            input: challenge.clone(),
            output: output.clone(),
        };

        let response: VerifyResponse = self.http
            .post(format!("{}/verifySIWS", self.endpoint))
            .json(&body)
            .send()
            .await?
            .json()
            .await?;

        match response {
            VerifyResponse { ok: true, address: Some(address), .. } => {
                tracing::info!("Signed in as {}", address);
                Ok(address)
            }
            VerifyResponse { ok: true, address: None, .. } => Ok(self.signer.address()),
            rejected => Err(rejection(rejected)),
        }
    }
}

fn rejection(body: VerifyResponse) -> ClientError {
    let kind = body.error.unwrap_or_else(|| "Unknown".to_string());
    tracing::warn!("Sign-in rejected by service: {}", kind);
    ClientError::Rejected { kind, message: body.message }
}
