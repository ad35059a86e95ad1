use anyhow::Context;
use clap::Parser;
use knobel_service::{router, AppState, Args};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if args.openrouter_api_key.is_none() {
        tracing::warn!(
            "OPENROUTER_API_KEY is not set; scoring requests will answer CONFIG_OPENROUTER_API_KEY_MISSING"
        );
    }

    let listen = args.listen;
    let app = router(AppState::new(args));
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;
    tracing::info!(%listen, "knobel-service listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
