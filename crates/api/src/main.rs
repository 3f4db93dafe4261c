use std::sync::Arc;

use anyhow::Context;

use tama_api::config::{self, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = config::load_env_file(config::SECRETS_ENV_FILE);
    let config = AppConfig::from_env().context("invalid configuration")?;
    tama_observability::init(config.log_format);

    match env_file {
        Ok(path) => tracing::info!(path = %path.display(), "loaded environment file"),
        Err(e) => tracing::warn!(error = %e, "no environment file loaded; using process environment"),
    }

    let secret = config.signing_secret()?;
    if secret.is_ephemeral() {
        tracing::warn!("JWT_SECRET not set; using a random secret, tokens will not survive a restart");
    }

    let services = tama_api::app::services::build_services(&config, &secret).await?;
    let app = tama_api::app::build_app(Arc::new(services));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(addr = %listener.local_addr()?, env = ?config.env, "listening");

    axum::serve(listener, app).await?;
    Ok(())
}
