// tests/common/mod.rs
pub use axum::Router;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use http::StatusCode;
use reqwest::Client;
use tokio::time::Instant;

use crate::config::settings::Credentials;
use crate::exchange::transport::{ExchangeResponse, RefreshForm, TokenTransport};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub fn test_credentials() -> Credentials {
    Credentials {
        client_id: "cid".to_owned(),
        client_secret: "csec".to_owned(),
        seed_refresh_token: "seed-refresh-token".to_owned(),
    }
}

/// Scripted authorization-server behavior for a single exchange attempt.
#[derive(Debug, Clone)]
pub enum Script {
    Ok(&'static str),
    Status(u16, &'static str),
    TransportError,
}

/// Transport fake that plays back a script and records the instant and form
/// of every attempt. The last script entry repeats once the script is down
/// to one element, so an always-failing or always-succeeding server is a
/// one-entry script.
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    script: Mutex<VecDeque<Script>>,
    attempts: Mutex<Vec<Instant>>,
    forms: Mutex<Vec<RefreshForm>>,
}

impl ScriptedTransport {
    pub fn new(script: Vec<Script>) -> Self {
        assert!(!script.is_empty(), "script must not be empty");
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(script.into()),
                attempts: Mutex::new(Vec::new()),
                forms: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.inner.attempts.lock().unwrap().clone()
    }

    pub fn forms(&self) -> Vec<RefreshForm> {
        self.inner.forms.lock().unwrap().clone()
    }

    fn next_script(&self) -> Script {
        let mut script = self.inner.script.lock().unwrap();
        if script.len() > 1 {
            script.pop_front().unwrap()
        } else {
            script.front().cloned().unwrap()
        }
    }
}

impl TokenTransport for ScriptedTransport {
    async fn exchange(&self, form: &RefreshForm) -> Result<ExchangeResponse> {
        self.inner.attempts.lock().unwrap().push(Instant::now());
        self.inner.forms.lock().unwrap().push(form.clone());
        match self.next_script() {
            Script::Ok(body) => Ok(ExchangeResponse {
                status: StatusCode::OK,
                body: body.to_owned(),
            }),
            Script::Status(code, body) => Ok(ExchangeResponse {
                status: StatusCode::from_u16(code).unwrap(),
                body: body.to_owned(),
            }),
            Script::TransportError => Err(anyhow!("connection refused")),
        }
    }
}
