use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use http::StatusCode;
use reqwest::Client;

/// One refresh-token exchange attempt, reduced to what the client cares
/// about: the status line and the raw body.
#[derive(Debug, Clone)]
pub struct ExchangeResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ExchangeResponse {
    /// Only a plain 200 counts as acceptance.
    pub fn is_accepted(&self) -> bool {
        self.status == StatusCode::OK
    }
}

/// Form parameters for the `grant_type=refresh_token` exchange.
#[derive(Debug, Clone)]
pub struct RefreshForm {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl RefreshForm {
    /// Body pairs in wire order. The secret travels in the body as well as
    /// the Basic header; the token endpoint expects both.
    pub fn params(&self) -> [(&'static str, &str); 4] {
        [
            ("grant_type", "refresh_token"),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ]
    }

    /// `Basic base64(client_id:client_secret)`.
    pub fn basic_auth(&self) -> String {
        let raw = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", BASE64.encode(raw))
    }
}

/// Seam between the refresh cycle and the network, so tests can script
/// the authorization server's behavior.
pub trait TokenTransport: Send + Sync {
    fn exchange(
        &self,
        form: &RefreshForm,
    ) -> impl Future<Output = Result<ExchangeResponse>> + Send;
}

/// Production transport: form-encoded POST to the token endpoint with a
/// fixed per-attempt timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    url: String,
    client: Client,
}

impl HttpTransport {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self { url, client })
    }
}

impl TokenTransport for HttpTransport {
    async fn exchange(&self, form: &RefreshForm) -> Result<ExchangeResponse> {
        let response = self
            .client
            .post(&self.url)
            .header(http::header::AUTHORIZATION, form.basic_auth())
            .form(&form.params())
            .send()
            .await
            .context("token request failed")?;

        let status = response.status();
        let body = response.text().await.context("reading token response")?;
        Ok(ExchangeResponse { status, body })
    }
}
