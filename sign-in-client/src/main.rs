// sign-in-client/src/main.rs
use common::{setup_tracing, Config, KeypairSigner, SigningCapability};
use sign_in_client::SignInClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = Config::from_env();

    let signer = match &config.client.signer_secret {
        Some(secret) => KeypairSigner::from_base58(secret)?,
        None => {
            tracing::info!("No signer secret configured, using an ephemeral key");
            KeypairSigner::generate()
        }
    };

    tracing::info!(
        "Signing in to {} from {} as {}",
        config.endpoint,
        config.client.origin,
        signer.address()
    );

    let client = SignInClient::new(&config, signer)?;
    let result = client.sign_in().await;

    for record in client.audit().snapshot() {
        println!("{}", serde_json::to_string(&record)?);
    }

    result?;
    Ok(())
}
