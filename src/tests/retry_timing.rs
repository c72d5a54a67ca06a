#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serial_test::serial;

    use crate::exchange::client::ExchangeClient;
    use crate::resilience::retry::RetrySettings;
    use crate::store::file_store::FileStore;
    use crate::tests::common::{test_credentials, Script, ScriptedTransport};

    // Runs against tokio's paused clock: no real sleeps, exact backoff
    // observation.
    #[tokio::test(start_paused = true)]
    #[serial]
    async fn failed_attempts_are_spaced_by_the_backoff() {
        let transport = ScriptedTransport::new(vec![
            Script::TransportError,
            Script::Status(500, "boom"),
            Script::Status(503, "unavailable"),
            Script::Ok(r#"{"access_token":"a","refresh_token":"b"}"#),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("token_info.json"));
        let client = ExchangeClient::new(
            test_credentials(),
            RetrySettings::new(Duration::from_secs(5)),
            store.clone(),
            transport.clone(),
        );

        client.refresh_cycle().await.unwrap();

        let attempts = transport.attempts();
        assert_eq!(attempts.len(), 4, "three failures then the success");
        for pair in attempts.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_secs(5),
                "attempts must sit at least one backoff apart"
            );
        }

        // the store was empty, so the first attempt carried the seed
        let forms = transport.forms();
        assert_eq!(forms[0].refresh_token, "seed-refresh-token");

        assert_eq!(store.read().await.unwrap().access_token(), Some("a"));
    }
}
