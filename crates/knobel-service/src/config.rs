//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// knobel-service - scoring edge service for the knobel decision app
#[derive(Parser, Debug, Clone)]
#[command(name = "knobel-service")]
#[command(about = "Scores decision choices via OpenRouter")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8787")]
    pub listen: SocketAddr,

    /// OpenRouter API key. When absent the service still starts, but every
    /// scoring request answers 500 CONFIG_OPENROUTER_API_KEY_MISSING.
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub openrouter_api_key: Option<String>,

    /// Upstream model identifier
    #[arg(long, env = "OPENROUTER_MODEL", default_value = "openai/gpt-4o-mini")]
    pub openrouter_model: String,

    /// Optional HTTP-Referer header forwarded to OpenRouter
    #[arg(long, env = "OPENROUTER_HTTP_REFERER")]
    pub openrouter_http_referer: Option<String>,

    /// Optional X-Title header forwarded to OpenRouter
    #[arg(long, env = "OPENROUTER_X_TITLE")]
    pub openrouter_x_title: Option<String>,

    /// Comma-separated origin allow-list. Requests carrying a different
    /// Origin header get 403; requests without an Origin header pass
    /// (server-to-server callers). An empty list allows any origin, which is
    /// only meant for local development.
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}
