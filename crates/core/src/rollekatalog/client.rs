//! OS2rollekatalog organisation import client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::{debug, info, instrument, warn};

use super::{RoleCatalogSink, SinkResponse};
use crate::config::{HttpConfig, RollekatalogConfig};
use crate::errors::SinkError;
use crate::models::RoleCatalogPayload;

const API_KEY_HEADER: &str = "ApiKey";

/// POSTs payloads to the configured import endpoint.
pub struct RoleCatalogClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl RoleCatalogClient {
    /// Build the client. Certificate verification stays on unless
    /// `insecure_skip_tls_verify` is set in the configuration.
    pub fn new(config: &RollekatalogConfig, http_config: &HttpConfig) -> Result<Self, SinkError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("os2rollekatalog-sync/", env!("CARGO_PKG_VERSION"))),
        );

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if config.insecure_skip_tls_verify {
            warn!(url = %config.url, "accepting invalid TLS certificates from OS2rollekatalog");
            builder = builder.danger_accept_invalid_certs(true);
        }
        if let Some(secs) = http_config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder.build()?;

        info!(url = %config.url, "created RoleCatalogClient");
        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
        })
    }
}

#[async_trait]
impl RoleCatalogSink for RoleCatalogClient {
    #[instrument(skip(self, payload))]
    async fn send(&self, payload: &RoleCatalogPayload) -> Result<SinkResponse, SinkError> {
        debug!(
            org_units = payload.org_unit_count(),
            users = payload.user_count(),
            "posting payload"
        );

        let resp = self
            .http
            .post(&self.url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        let body = read_body(resp).await;
        if !status.is_success() {
            warn!(status = %status, body = %body, "OS2rollekatalog rejected the payload");
            return Err(SinkError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = %status, body = %body, "OS2rollekatalog accepted the payload");
        Ok(SinkResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// The response body, or empty if it cannot be read.
async fn read_body(resp: reqwest::Response) -> String {
    match resp.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!(error = %e, "failed to read OS2rollekatalog response body");
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrganisationPayload;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn config(insecure: bool) -> RollekatalogConfig {
        RollekatalogConfig {
            url: "https://rk.example.com/api/organisation/v3".into(),
            api_key_env: "UNUSED".into(),
            insecure_skip_tls_verify: insecure,
            api_key: Some("key".into()),
        }
    }

    #[test]
    fn test_client_construction() {
        let client = RoleCatalogClient::new(&config(false), &HttpConfig::default()).unwrap();
        assert_eq!(client.url, "https://rk.example.com/api/organisation/v3");
        assert_eq!(client.api_key, "key");
    }

    #[test]
    fn test_insecure_client_construction() {
        let http = HttpConfig {
            timeout_secs: Some(5),
        };
        assert!(RoleCatalogClient::new(&config(true), &http).is_ok());
    }

    /// Accept one request, read it fully, then answer 200 with a body that
    /// is shorter than its declared length.
    async fn truncated_body_server() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request_complete(&request) {
                    break;
                }
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nshort")
                .await
                .unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{}/api/organisation/v3", addr)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some((head, body)) = text.split_once("\r\n\r\n") else {
            return false;
        };
        let length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        body.len() >= length
    }

    #[tokio::test]
    async fn test_unreadable_body_is_treated_as_empty() {
        let mut cfg = config(false);
        cfg.url = truncated_body_server().await;
        let client = RoleCatalogClient::new(&cfg, &HttpConfig::default()).unwrap();

        let payload = RoleCatalogPayload::Flat(OrganisationPayload::default());
        let response = client.send(&payload).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, "");
    }
}
