use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use token_relay::config::settings::{
    Credentials, ExchangeConfig, ScheduleConfig, ServerConfig, Settings,
};
use token_relay::exchange::client::ExchangeClient;
use token_relay::exchange::transport::HttpTransport;
use token_relay::resilience::retry::RetrySettings;
use token_relay::scheduler::RefreshScheduler;
use token_relay::server;
use token_relay::store::file_store::FileStore;
use token_relay::utils::logging::{self, LogFormat, LogLevel};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// OAuth2 client identifier
    #[arg(long, env = "CLIENT_ID")]
    client_id: String,
    /// OAuth2 client secret
    #[arg(long, env = "CLIENT_SECRET")]
    client_secret: String,
    /// Fallback refresh token, used until a record has been persisted
    #[arg(long, env = "SEED_REFRESH_TOKEN")]
    seed_refresh_token: String,
    /// Authorization server token endpoint
    #[arg(
        long,
        env = "TOKEN_URL",
        default_value = "https://api.smartthings.com/oauth/token"
    )]
    token_url: String,
    /// Where the token record is persisted and served from
    #[arg(long, env = "TOKEN_FILE", default_value = "/tmp/token_info.json")]
    token_file: PathBuf,
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0")]
    bind_addr: String,
    #[arg(long, env = "PORT", default_value_t = 5165)]
    port: u16,
    #[arg(long, env = "REFRESH_INTERVAL_MINUTES", default_value_t = 960)]
    refresh_interval_minutes: u64,
    #[arg(long, env = "RETRY_BACKOFF_SECONDS", default_value_t = 5)]
    retry_backoff_seconds: u64,
    #[arg(long, env = "HTTP_TIMEOUT_SECONDS", default_value_t = 30)]
    http_timeout_seconds: u64,
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value = "info")]
    log_level: LogLevel,
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "compact")]
    log_format: LogFormat,
    /// Expose /metrics on the publication server
    #[arg(long, env = "METRICS_ENABLED")]
    metrics: bool,
}

impl Args {
    fn into_settings(self) -> Settings {
        Settings {
            credentials: Credentials {
                client_id: self.client_id,
                client_secret: self.client_secret,
                seed_refresh_token: self.seed_refresh_token,
            },
            exchange: ExchangeConfig {
                token_url: self.token_url,
                timeout: Duration::from_secs(self.http_timeout_seconds),
                retry_backoff: Duration::from_secs(self.retry_backoff_seconds),
            },
            store_path: self.token_file,
            server: ServerConfig {
                host: self.bind_addr,
                port: self.port,
                metrics_enabled: self.metrics,
            },
            schedule: ScheduleConfig {
                refresh_interval: Duration::from_secs(self.refresh_interval_minutes * 60),
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Resolve configuration
    //
    // clap exits nonzero on missing required env/args; emptiness is
    // rejected here before anything starts.
    // -------------------------------

    let args = Args::parse();
    logging::init_logging(args.log_level, args.log_format);

    let settings = args.into_settings();
    settings.credentials.validate()?;

    // -------------------------------
    // 2. Build components
    // -------------------------------

    let store = FileStore::new(settings.store_path.clone());
    let transport = HttpTransport::new(
        settings.exchange.token_url.clone(),
        settings.exchange.timeout,
    )?;
    let client = ExchangeClient::new(
        settings.credentials.clone(),
        RetrySettings::new(settings.exchange.retry_backoff),
        store.clone(),
        transport,
    );
    let scheduler = RefreshScheduler::new(settings.schedule.refresh_interval);

    // -------------------------------
    // 3. Start publication endpoint
    // -------------------------------

    let http_server = server::server::start(&settings.server, store.dir());

    // -------------------------------
    // 4. Run refresh cycles: once now, then on the schedule
    // -------------------------------

    let refresher = scheduler.run(&client);

    info!("service starting...");
    tokio::try_join!(http_server, refresher)?;

    Ok(())
}
