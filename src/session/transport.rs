//! HTTP transport to the verification backend

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Response};
use tracing::{debug, instrument};

use crate::config::ViewerConfig;
use crate::error::{Error, Result};

use super::classify;

/// Response headers, with the body still to be downloaded
#[derive(Debug)]
pub struct ResponseHead {
    pub status: u16,
    pub content_type: Option<String>,
    response: Response,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Download the full body
    pub async fn bytes(self) -> Result<Vec<u8>> {
        let bytes = self.response.bytes().await.map_err(network_error)?;
        Ok(bytes.to_vec())
    }

    /// Download the body as text; failures yield `None`
    pub async fn text(self) -> Option<String> {
        self.response.text().await.ok()
    }
}

/// Posts verification codes to the backend
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &ViewerConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .connect_timeout(config.timeout)
            .user_agent(format!("cert-verify/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// `POST` the code as a single url-encoded form field, asking for `accept`
    #[instrument(skip(self, code))]
    pub async fn post_form(
        &self,
        endpoint: &str,
        field: &str,
        code: &str,
        accept: &str,
    ) -> Result<ResponseHead> {
        let response = self
            .client
            .post(endpoint)
            .header(ACCEPT, accept)
            .form(&[(field, code)])
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        debug!(status, content_type = ?content_type, "Received response headers");

        Ok(ResponseHead {
            status,
            content_type,
            response,
        })
    }
}

fn network_error(err: reqwest::Error) -> Error {
    Error::Network {
        kind: classify::classify_transport(&err),
        message: classify::transport_text(&err),
    }
}
