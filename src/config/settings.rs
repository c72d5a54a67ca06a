use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};

/// Everything the daemon needs, resolved once at startup and handed into
/// component constructors. Components never look up the environment
/// themselves.
#[derive(Debug, Clone)]
pub struct Settings {
    pub credentials: Credentials,
    pub exchange: ExchangeConfig,
    pub store_path: PathBuf,
    pub server: ServerConfig,
    pub schedule: ScheduleConfig,
}

/// Operator-supplied OAuth2 client credentials and the seed refresh token
/// used until a record has been persisted.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
    pub seed_refresh_token: String,
}

impl Credentials {
    /// clap guarantees presence; emptiness still has to be rejected before
    /// any component runs.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("CLIENT_ID", &self.client_id),
            ("CLIENT_SECRET", &self.client_secret),
            ("SEED_REFRESH_TOKEN", &self.seed_refresh_token),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                bail!("{name} must not be empty");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    pub token_url: String,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// Pause between failed exchange attempts.
    pub retry_backoff: Duration,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub metrics_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub refresh_interval: Duration,
}
