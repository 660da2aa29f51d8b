use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// HS256 key for session tokens. Session tokens are minted elsewhere
    /// (or via `teamlink session` for development); the gateway only verifies.
    pub secret_key: String,
    /// Public base URL of this gateway, used when building connect URLs.
    pub public_url: String,
    pub slack_client_id: String,
    pub slack_client_secret: String,
    pub slack_redirect_uri: String,
    /// Browser-facing authorization page.
    pub slack_authorize_url: String,
    /// Base URL for the Slack Web API. Overridable so tests can point the
    /// gateway at a local mock server.
    pub slack_api_base: String,
}

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let secret_key = std::env::var("TEAMLINK_SECRET_KEY")
        .unwrap_or_else(|_| "CHANGE_ME_SESSION_SIGNING_KEY".into());

    if secret_key == "CHANGE_ME_SESSION_SIGNING_KEY" {
        let env_mode = std::env::var("TEAMLINK_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "TEAMLINK_SECRET_KEY is still the insecure placeholder. \
                 Set a proper signing key before running in production."
            );
        }
        eprintln!("⚠️  TEAMLINK_SECRET_KEY is not set — using insecure placeholder. Set a real signing key for production.");
    }

    let port: u16 = std::env::var("TEAMLINK_PORT")
        .unwrap_or_else(|_| "8080".into())
        .parse()
        .unwrap_or(8080);

    Ok(Config {
        port,
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/teamlink".into()),
        secret_key,
        public_url: std::env::var("TEAMLINK_PUBLIC_URL")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}", port)),
        slack_client_id: std::env::var("SLACK_CLIENT_ID").unwrap_or_default(),
        slack_client_secret: std::env::var("SLACK_CLIENT_SECRET").unwrap_or_default(),
        slack_redirect_uri: std::env::var("SLACK_REDIRECT_URI")
            .unwrap_or_else(|_| format!("http://127.0.0.1:{}/oauth/slack/callback", port)),
        slack_authorize_url: std::env::var("SLACK_AUTHORIZE_URL")
            .unwrap_or_else(|_| "https://slack.com/oauth/v2/authorize".into()),
        slack_api_base: std::env::var("SLACK_API_BASE")
            .unwrap_or_else(|_| "https://slack.com/api".into()),
    })
}
