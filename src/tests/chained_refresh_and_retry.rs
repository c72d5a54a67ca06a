
// This test simulates a token endpoint that fails the first N attempts and
// succeeds later, then runs the production refresh cycle and asserts final
// success with exactly one persisted record.

#[cfg(test)]
mod tests {

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use axum::routing::post;
    use axum::Router;
    use http::StatusCode;
    use serde_json::json;
    use serial_test::serial;

    use crate::exchange::client::ExchangeClient;
    use crate::exchange::transport::HttpTransport;
    use crate::observability::metrics::get_metrics;
    use crate::resilience::retry::RetrySettings;
    use crate::store::file_store::FileStore;
    use crate::tests::common::{spawn_axum, test_credentials};

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[serial]
    async fn exchange_retries_until_accepted_and_writes_once() {
        // token endpoint fails first 2 attempts then succeeds
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = counter.clone();
        let router = Router::new().route(
            "/oauth/token",
            post(move || {
                let c = counter_clone.clone();
                async move {
                    let n = c.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        (StatusCode::INTERNAL_SERVER_ERROR, "transient".to_owned())
                    } else {
                        let body = json!({
                            "access_token": "exchange-xyz",
                            "refresh_token": "rotated",
                            "expires_in": 3600
                        })
                        .to_string();
                        (StatusCode::OK, body)
                    }
                }
            }),
        );
        let (handle, addr) = spawn_axum(router).await;

        let metrics = get_metrics().await;
        let rejected_before = metrics.exchange_attempts.with_label_values(&["rejected"]).get();

        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("token_info.json"));
        let transport = HttpTransport::new(
            format!("http://{addr}/oauth/token"),
            Duration::from_secs(5),
        )
        .unwrap();
        let client = ExchangeClient::new(
            test_credentials(),
            RetrySettings::new(Duration::from_millis(50)),
            store.clone(),
            transport,
        );

        client.refresh_cycle().await.unwrap();

        assert_eq!(
            counter.load(Ordering::SeqCst),
            3,
            "server should have seen exactly 3 attempts"
        );
        let record = store.read().await.expect("record persisted after acceptance");
        assert_eq!(record.access_token(), Some("exchange-xyz"));
        assert_eq!(record.refresh_token(), Some("rotated"));

        // failed attempts produce no files: only the final record on disk
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1, "only the final record exists on disk");

        let rejected_after = metrics.exchange_attempts.with_label_values(&["rejected"]).get();
        assert_eq!(rejected_after - rejected_before, 2);

        handle.abort();
    }
}
