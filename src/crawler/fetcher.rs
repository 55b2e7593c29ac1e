//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests for the crawler, including:
//! - Building HTTP clients with bounded timeouts
//! - GET requests for listing and detail pages
//! - Form POST requests for structured endpoints
//! - Error classification
//!
//! Identity headers are attached per request, so one client can serve many
//! freshly drawn identities.

use crate::identity::Identity;
use reqwest::{redirect::Policy, Client, RequestBuilder};
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Response body
        body: String,
    },

    /// The server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
        /// Whether the request ran out of time
        timed_out: bool,
    },
}

impl FetchResult {
    /// Short description of a failed fetch, for logs
    pub fn describe_failure(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status_code } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error, .. } => Some(error.clone()),
        }
    }

    /// Returns true if the request ran out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::NetworkError { timed_out: true, .. })
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `timeout` - Upper bound on a whole request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use intern_scout::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL with GET under the given identity
pub async fn fetch_url(client: &Client, url: &str, identity: &Identity) -> FetchResult {
    send(client.get(url).headers(identity.header_map())).await
}

/// POSTs a urlencoded form under the given identity
pub async fn post_form(
    client: &Client,
    url: &str,
    identity: &Identity,
    form: &[(&str, String)],
) -> FetchResult {
    send(client.post(url).headers(identity.header_map()).form(form)).await
}

async fn send(request: RequestBuilder) -> FetchResult {
    match request.send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: e.to_string(),
                    timed_out: e.is_timeout(),
                },
            }
        }
        Err(e) => {
            // Classify error
            if e.is_timeout() {
                FetchResult::NetworkError {
                    error: "Request timeout".to_string(),
                    timed_out: true,
                }
            } else if e.is_connect() {
                FetchResult::NetworkError {
                    error: "Connection refused".to_string(),
                    timed_out: false,
                }
            } else {
                FetchResult::NetworkError {
                    error: e.to_string(),
                    timed_out: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdentityProvider;
    use wiremock::matchers::{body_string_contains, header, headers, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn identity() -> Identity {
        IdentityProvider::new(vec!["TestAgent/1.0".to_string()]).next_identity()
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_success_sends_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "TestAgent/1.0"))
            .and(headers("accept-language", vec!["zh-CN", "zh;q=0.9", "en;q=0.8"]))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let result = fetch_url(&client, &format!("{}/page", server.uri()), &identity()).await;

        match result {
            FetchResult::Success {
                status_code, body, ..
            } => {
                assert_eq!(status_code, 200);
                assert_eq!(body, "<html></html>");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let result = fetch_url(&client, &server.uri(), &identity()).await;

        assert!(matches!(result, FetchResult::HttpError { status_code: 503 }));
        assert_eq!(result.describe_failure().as_deref(), Some("HTTP 503"));
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_millis(200)).unwrap();
        let result = fetch_url(&client, &server.uri(), &identity()).await;

        assert!(matches!(
            result,
            FetchResult::NetworkError {
                timed_out: true,
                ..
            }
        ));
        assert!(result.is_timeout());
    }

    #[tokio::test]
    async fn test_connection_refused_is_not_timeout() {
        let server = MockServer::start().await;
        let uri = server.uri();
        drop(server);

        let client = build_http_client(Duration::from_secs(2)).unwrap();
        let result = fetch_url(&client, &uri, &identity()).await;

        assert!(matches!(result, FetchResult::NetworkError { .. }));
        assert!(!result.is_timeout());
        assert!(!FetchResult::HttpError { status_code: 504 }.is_timeout());
    }

    #[tokio::test]
    async fn test_post_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .and(body_string_contains("pn=2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .mount(&server)
            .await;

        let client = build_http_client(Duration::from_secs(5)).unwrap();
        let result = post_form(
            &client,
            &format!("{}/api", server.uri()),
            &identity(),
            &[("pn", "2".to_string()), ("kd", "java".to_string())],
        )
        .await;

        assert!(matches!(result, FetchResult::Success { .. }));
    }
}
