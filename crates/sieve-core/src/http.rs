//! reqwest-backed transport speaking the sieve service's JSON protocol.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::reference::ReferenceDescriptor;
use crate::transport::{Transport, TransportError, WriteAck, WriteTarget};

/// Connection settings for a sieve service.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// The sieve resource, e.g. `https://example.org/u/alice/sieve/`.
    /// Also the target of read-state writes.
    pub sieve_url: String,
    /// The bookmark collection resource; derived from `sieve_url` when
    /// absent.
    pub collection_url: Option<String>,
    /// Value of the service's session cookie.
    pub session_cookie: Option<String>,
    /// CSRF token, sent both as cookie and as `X-CSRFToken` header on
    /// writes.
    pub csrf_token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl HttpConfig {
    pub fn new(sieve_url: impl Into<String>) -> Self {
        Self {
            sieve_url: sieve_url.into(),
            collection_url: None,
            session_cookie: None,
            csrf_token: None,
            timeout_secs: 10,
        }
    }
}

/// The sieve resource rendered as JSON.
#[derive(Debug, Deserialize)]
pub struct SievePage {
    /// Total unread count on the server; may exceed the served page.
    #[serde(default)]
    pub num_unread_references: u64,
    pub references: Vec<ReferenceDescriptor>,
}

pub struct HttpTransport {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// Fetch the bounded list of unread references.
    pub async fn fetch_sieve(&self) -> Result<SievePage, TransportError> {
        let mut request = self
            .client
            .get(&self.config.sieve_url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(cookie) = self.cookie_header() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn target_url(&self, target: WriteTarget) -> String {
        match target {
            WriteTarget::Sieve => self.config.sieve_url.clone(),
            WriteTarget::Collection => match &self.config.collection_url {
                Some(url) => url.clone(),
                None => derive_collection_url(&self.config.sieve_url),
            },
        }
    }

    fn cookie_header(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(session) = &self.config.session_cookie {
            parts.push(format!("sessionid={session}"));
        }
        if let Some(token) = &self.config.csrf_token {
            parts.push(format!("csrftoken={token}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("; "))
        }
    }
}

impl Transport for HttpTransport {
    fn write(
        &self,
        target: WriteTarget,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), TransportError>> + Send {
        let mut request = self.client.post(self.target_url(target)).json(&payload);
        if let Some(cookie) = self.cookie_header() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }
        if let Some(token) = &self.config.csrf_token {
            request = request.header("X-CSRFToken", token);
        }
        async move {
            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            let ack: WriteAck = serde_json::from_slice(&body)?;
            if ack.is_success() {
                Ok(())
            } else {
                Err(TransportError::Rejected(ack.status))
            }
        }
    }
}

/// Map `…/u/<user>/sieve/` onto the sibling collection resource.
fn derive_collection_url(sieve_url: &str) -> String {
    let trimmed = sieve_url.trim_end_matches('/');
    match trimmed.strip_suffix("/sieve") {
        Some(base) => format!("{base}/collection/"),
        None => format!("{trimmed}/collection/"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_url_is_the_sieve_sibling() {
        assert_eq!(
            derive_collection_url("https://example.org/u/alice/sieve/"),
            "https://example.org/u/alice/collection/"
        );
        assert_eq!(
            derive_collection_url("https://example.org/u/alice/sieve"),
            "https://example.org/u/alice/collection/"
        );
        // urls without the conventional suffix get the segment appended
        assert_eq!(
            derive_collection_url("https://example.org/reader/"),
            "https://example.org/reader/collection/"
        );
    }

    #[test]
    fn cookie_header_combines_session_and_csrf() {
        let mut config = HttpConfig::new("https://example.org/u/alice/sieve/");
        config.session_cookie = Some("s3ss10n".to_string());
        config.csrf_token = Some("t0k3n".to_string());
        let transport = HttpTransport::new(config).unwrap();
        assert_eq!(
            transport.cookie_header().as_deref(),
            Some("sessionid=s3ss10n; csrftoken=t0k3n")
        );

        let anonymous = HttpTransport::new(HttpConfig::new("https://example.org/")).unwrap();
        assert_eq!(anonymous.cookie_header(), None);
    }

    #[test]
    fn sieve_page_deserializes_service_output() {
        let page: SievePage = serde_json::from_str(
            r#"{
                "num_unread_references": 12,
                "references": [
                    {"url": "http://a", "title": "A", "source_url": "http://s", "source_title": "S"},
                    {"url": "http://b"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(page.num_unread_references, 12);
        assert_eq!(page.references.len(), 2);
        assert_eq!(page.references[1].url, "http://b");
        assert_eq!(page.references[1].title, "");
    }
}
