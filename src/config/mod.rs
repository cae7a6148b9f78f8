use std::fmt;
use std::time::Duration;

use clap::Args;

/// Complete runtime configuration. Every value can come from a flag or a
/// `RESTAURANT_*` environment variable.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    #[command(flatten)]
    pub web: WebConfig,
    #[command(flatten)]
    pub db: DbConfig,
    #[command(flatten)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Web")]
pub struct WebConfig {
    #[arg(long = "web-api-host", env = "RESTAURANT_WEB_API_HOST", default_value = "0.0.0.0:3000")]
    pub api_host: String,

    #[arg(long = "web-debug-host", env = "RESTAURANT_WEB_DEBUG_HOST", default_value = "0.0.0.0:4000")]
    pub debug_host: String,

    #[arg(long = "web-read-timeout", env = "RESTAURANT_WEB_READ_TIMEOUT", default_value = "5s", value_parser = humantime::parse_duration)]
    pub read_timeout: Duration,

    #[arg(long = "web-write-timeout", env = "RESTAURANT_WEB_WRITE_TIMEOUT", default_value = "5s", value_parser = humantime::parse_duration)]
    pub write_timeout: Duration,

    #[arg(long = "web-shutdown-timeout", env = "RESTAURANT_WEB_SHUTDOWN_TIMEOUT", default_value = "5s", value_parser = humantime::parse_duration)]
    pub shutdown_timeout: Duration,
}

#[derive(Clone, Args)]
#[command(next_help_heading = "Database")]
pub struct DbConfig {
    #[arg(long = "db-user", env = "RESTAURANT_DB_USER", default_value = "postgres")]
    pub user: String,

    #[arg(long = "db-password", env = "RESTAURANT_DB_PASSWORD", default_value = "postgres", hide_env_values = true, hide_default_value = true)]
    pub password: String,

    #[arg(long = "db-host", env = "RESTAURANT_DB_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long = "db-name", env = "RESTAURANT_DB_NAME", default_value = "postgres")]
    pub name: String,

    #[arg(long = "db-disable-tls", env = "RESTAURANT_DB_DISABLE_TLS", default_value_t = true, action = clap::ArgAction::Set)]
    pub disable_tls: bool,
}

// The password never reaches the logs.
impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("user", &self.user)
            .field("password", &"xxxxxx")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("disable_tls", &self.disable_tls)
            .finish()
    }
}

#[derive(Debug, Clone, Args)]
#[command(next_help_heading = "Auth")]
pub struct AuthConfig {
    #[arg(long = "auth-key-id", env = "RESTAURANT_AUTH_KEY_ID", default_value = "1")]
    pub key_id: String,

    #[arg(long = "auth-private-key-file", env = "RESTAURANT_AUTH_PRIVATE_KEY_FILE", default_value = "/app/private.pem")]
    pub private_key_file: String,

    #[arg(long = "auth-public-key-file", env = "RESTAURANT_AUTH_PUBLIC_KEY_FILE", default_value = "/app/public.pem")]
    pub public_key_file: String,

    #[arg(long = "auth-algorithm", env = "RESTAURANT_AUTH_ALGORITHM", default_value = "RS256")]
    pub algorithm: String,

    #[arg(long = "auth-token-ttl", env = "RESTAURANT_AUTH_TOKEN_TTL", default_value = "1h", value_parser = humantime::parse_duration)]
    pub token_ttl: Duration,
}
