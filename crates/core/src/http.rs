//! Shared HTTP client construction.
//!
//! Every outbound service call carries a total-request timeout so a
//! stalled endpoint surfaces as the mapped error kind (retrieval,
//! generation, or authentication) instead of hanging the cycle.

use std::time::Duration;

/// Total-request timeout applied to every outbound service call.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the standard client with the default timeout.
pub fn build_client() -> reqwest::Client {
    build_client_with(REQUEST_TIMEOUT)
}

/// Build a client with an explicit total-request timeout.
pub fn build_client_with(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        // The builder only fails when the TLS backend cannot initialize;
        // fall back to the default client rather than panicking here.
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        // Bound but never accepted: the handshake completes via the
        // backlog and no response ever arrives.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let client = build_client_with(Duration::from_millis(200));
        let err = client
            .get(format!("http://{}/", addr))
            .send()
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        drop(listener);
    }
}
