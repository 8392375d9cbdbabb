mod builder;

pub use builder::XmlaClientBuilder;

use async_trait::async_trait;
use mdxql::{MdxResult, Response, Transport};
use tracing::{debug, warn};

use crate::protocol::{execute_envelope, parse_execute_response, ExecuteProperties, XmlaError};

pub(crate) struct Credentials {
    pub username: String,
    pub password: String,
}

/// Posts MDX statements to an XMLA endpoint.
pub struct XmlaClient {
    url: String,
    properties: ExecuteProperties,
    credentials: Option<Credentials>,
    client: reqwest::Client,
}

impl XmlaClient {
    pub fn builder(url: &str) -> XmlaClientBuilder {
        XmlaClientBuilder::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn properties(&self) -> &ExecuteProperties {
        &self.properties
    }

    /// Sends one `Execute` request and returns the raw response body.
    pub async fn execute_raw(&self, statement: &str) -> Result<String, XmlaError> {
        let envelope = execute_envelope(statement, &self.properties);
        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(envelope);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.username, Some(&credentials.password));
        }

        debug!(url = %self.url, catalog = %self.properties.catalog, "Executing statement");
        let response = request
            .send()
            .await
            .map_err(|e| XmlaError::ConnectionError(format!("HTTP request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = if error_text.trim().is_empty() {
                "Encountered an unexpected MDX error. No response was provided.".to_string()
            } else {
                error_text
            };
            return Err(XmlaError::ServerError(format!("HTTP {}: {}", status, message)));
        }

        response
            .text()
            .await
            .map_err(|e| XmlaError::ProtocolError(format!("Failed to read response: {}", e)))
    }
}

#[async_trait]
impl Transport for XmlaClient {
    async fn post(&self, statement: &str) -> MdxResult<Response> {
        let body = self.execute_raw(statement).await.map_err(|e| {
            warn!(url = %self.url, "XMLA request failed: {}", e);
            e
        })?;
        parse_execute_response(&body)
    }
}
