use std::time::Duration;

use super::{Credentials, XmlaClient};
use crate::protocol::{ExecuteProperties, XmlaError};

const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

pub struct XmlaClientBuilder {
    url: String,
    properties: ExecuteProperties,
    credentials: Option<Credentials>,
    timeout_ms: Option<u64>,
}

impl XmlaClientBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.trim_end_matches('/').to_string(),
            properties: ExecuteProperties::new(""),
            credentials: None,
            timeout_ms: None,
        }
    }

    pub fn catalog(mut self, catalog: &str) -> Self {
        self.properties.catalog = catalog.to_string();
        self
    }

    /// HTTP basic authentication.
    pub fn credentials(mut self, username: &str, password: &str) -> Self {
        self.credentials = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });
        self
    }

    /// Client-side request timeout.
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    /// Server-side `Timeout` property.
    pub fn server_timeout_secs(mut self, secs: u64) -> Self {
        self.properties.timeout_secs = secs;
        self
    }

    pub fn locale_identifier(mut self, lcid: u32) -> Self {
        self.properties.locale_identifier = lcid;
        self
    }

    pub fn property(mut self, name: &str, value: &str) -> Self {
        self.properties.extra.push((name.to_string(), value.to_string()));
        self
    }

    pub fn build(self) -> Result<XmlaClient, XmlaError> {
        if self.properties.catalog.is_empty() {
            return Err(XmlaError::ProtocolError("A catalog must be specified".to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(
                self.timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            ))
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| XmlaError::ConnectionError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(XmlaClient {
            url: self.url,
            properties: self.properties,
            credentials: self.credentials,
            client,
        })
    }
}
