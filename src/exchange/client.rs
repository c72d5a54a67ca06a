use anyhow::{anyhow, Result};
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::settings::Credentials;
use crate::exchange::transport::{RefreshForm, TokenTransport};
use crate::helpers::time::utc_now_rfc3339;
use crate::observability::metrics::get_metrics;
use crate::resilience::retry::RetrySettings;
use crate::store::file_store::FileStore;
use crate::store::record::TokenRecord;

static OK_MSG: &'static str = "ok";
static REJECTED_MSG: &'static str = "rejected";
static ERROR_MSG: &'static str = "error";

/// Converts the current refresh token into a fresh access/refresh pair and
/// persists the result through the store.
///
/// The transport is a seam: production wires in [`HttpTransport`], tests a
/// scripted fake.
///
/// [`HttpTransport`]: crate::exchange::transport::HttpTransport
#[derive(Debug, Clone)]
pub struct ExchangeClient<T> {
    credentials: Credentials,
    retry: RetrySettings,
    store: FileStore,
    transport: T,
}

impl<T: TokenTransport> ExchangeClient<T> {
    pub fn new(
        credentials: Credentials,
        retry: RetrySettings,
        store: FileStore,
        transport: T,
    ) -> Self {
        Self {
            credentials,
            retry,
            store,
            transport,
        }
    }

    /// Store-then-seed resolution: the most recently persisted refresh token
    /// wins; the operator-supplied seed is used only when no usable record
    /// exists.
    async fn current_refresh_token(&self) -> String {
        match self
            .store
            .read()
            .await
            .and_then(|record| record.refresh_token().map(str::to_owned))
        {
            Some(token) => token,
            None => {
                warn!("using seed refresh token");
                self.credentials.seed_refresh_token.clone()
            }
        }
    }

    /// One full refresh cycle: retry the exchange until the server accepts
    /// with a 200, then persist the response.
    ///
    /// An error out of here means persistence failed after a successful
    /// exchange; the exchange itself never gives up.
    pub async fn refresh_cycle(&self) -> Result<()> {
        let metrics = get_metrics().await;
        let start = Instant::now();

        let refresh_token = self.current_refresh_token().await;
        let prefix: String = refresh_token.chars().take(10).collect();
        info!("current refresh_token: {prefix}...");

        let form = RefreshForm {
            client_id: self.credentials.client_id.clone(),
            client_secret: self.credentials.client_secret.clone(),
            refresh_token,
        };

        let body = self
            .retry
            .run_until_success(|attempt| {
                let form = form.clone();
                async move {
                    match self.transport.exchange(&form).await {
                        Ok(response) if response.is_accepted() => {
                            metrics.exchange_attempts.with_label_values(&[OK_MSG]).inc();
                            info!("exchange attempt {attempt} accepted");
                            Ok(response.body)
                        }
                        Ok(response) => {
                            metrics
                                .exchange_attempts
                                .with_label_values(&[REJECTED_MSG])
                                .inc();
                            Err(anyhow!(
                                "token endpoint returned {}: {}",
                                response.status,
                                response.body
                            ))
                        }
                        Err(err) => {
                            metrics
                                .exchange_attempts
                                .with_label_values(&[ERROR_MSG])
                                .inc();
                            Err(err)
                        }
                    }
                }
            })
            .await;

        let persisted = self.persist(&body).await;
        let outcome = if persisted.is_ok() { OK_MSG } else { ERROR_MSG };
        metrics
            .exchange_cycle_duration
            .with_label_values(&[outcome])
            .observe(start.elapsed().as_secs_f64());
        persisted
    }

    /// Stamps `issued_at` and hands the record to the store. A 200 body that
    /// is not a JSON object is persisted untouched; the endpoint's word is
    /// trusted.
    async fn persist(&self, body: &str) -> Result<()> {
        let metrics = get_metrics().await;
        let written = match serde_json::from_str::<Map<String, Value>>(body) {
            Ok(fields) => {
                let mut record = TokenRecord::from_fields(fields);
                record.set_issued_at(utc_now_rfc3339());
                self.store.write(&record).await
            }
            Err(err) => {
                warn!("token response is not a JSON object ({err}); storing raw body");
                self.store.write_bytes(body.as_bytes()).await
            }
        };
        match written {
            Ok(()) => {
                metrics.store_writes.with_label_values(&[OK_MSG]).inc();
                info!("token updated, stored at '{}'", self.store.path().display());
                Ok(())
            }
            Err(err) => {
                metrics.store_writes.with_label_values(&[ERROR_MSG]).inc();
                Err(err)
            }
        }
    }
}
