//! Retry with exponential backoff for RPC calls.
//!
//! Only connection-establishment failures are retried. A request that reached
//! the database (timeouts, resets mid-response, any HTTP status) is never
//! replayed, since the procedures are not idempotent.

use std::time::Duration;

/// Maximum number of retry attempts after the initial request.
const MAX_RETRIES: u32 = 3;

/// Base delay between retries (doubles each attempt: 200ms, 400ms, 800ms).
const BASE_DELAY_MS: u64 = 200;

/// Send an HTTP request, retrying connection failures.
///
/// The closure `f` is called up to `MAX_RETRIES + 1` times.
pub(crate) async fn retry_send<F, Fut>(function: &str, f: F) -> Result<reqwest::Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..MAX_RETRIES {
        match f().await {
            Ok(resp) => return Ok(resp),
            Err(e) if e.is_connect() => {
                let delay = Duration::from_millis(BASE_DELAY_MS * 2u64.pow(attempt));
                tracing::warn!(
                    function,
                    attempt = attempt + 1,
                    max_retries = MAX_RETRIES,
                    "RPC connection failed, retrying in {delay:?}: {e}"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    f().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn connection_refused_exhausts_all_attempts() {
        let call_count = Arc::new(AtomicU32::new(0));
        let cc = call_count.clone();

        let result = retry_send("probe", || {
            let cc = cc.clone();
            async move {
                cc.fetch_add(1, Ordering::SeqCst);
                reqwest::Client::builder()
                    .timeout(Duration::from_millis(50))
                    .build()
                    .unwrap()
                    .get("http://127.0.0.1:1/")
                    .send()
                    .await
            }
        })
        .await;

        assert!(result.is_err(), "request to closed port must fail");
        assert_eq!(call_count.load(Ordering::SeqCst), MAX_RETRIES + 1);
    }

    #[tokio::test]
    async fn timeout_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let call_count = Arc::new(AtomicU32::new(0));
        let cc = call_count.clone();
        let url = server.uri();
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(50))
            .build()
            .unwrap();

        let result = retry_send("probe", || {
            cc.fetch_add(1, Ordering::SeqCst);
            client.get(&url).send()
        })
        .await;

        assert!(result.unwrap_err().is_timeout());
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn http_error_status_is_returned_not_retried() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = server.uri();
        let resp = retry_send("probe", || client.get(&url).send()).await.unwrap();
        assert_eq!(resp.status().as_u16(), 503);
    }
}
