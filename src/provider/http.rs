//! HTTP transport for Query API calls

use super::client::Transport;
use super::error::ProviderError;
use crate::query::params::{RequestDescriptor, Service};
use crate::query::xml::ResponseNode;
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and drops control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// Where each service is reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoints {
    /// Public regional endpoints
    Regional(String),
    /// One base URL for every service, `<base>/<service>/`
    Override(Url),
}

impl Endpoints {
    pub fn url_for(&self, service: Service) -> String {
        match self {
            Self::Regional(region) => format!("https://{}.{}.amazonaws.com/", service.as_str(), region),
            Self::Override(base) => {
                let base = base.as_str().trim_end_matches('/');
                format!("{}/{}/", base, service.as_str())
            },
        }
    }
}

/// Transport that POSTs form-encoded Query requests and parses the XML
/// answer. Signing is expected to be layered on by the deployment.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    endpoints: Endpoints,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(endpoints: Endpoints) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .user_agent(concat!("cloudq/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ProviderError::request_failed(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoints })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Form body: `Action`, `Version`, then the request parameters in order
    fn form(request: &RequestDescriptor) -> Vec<(&str, &str)> {
        let mut form = Vec::with_capacity(request.params().len() + 2);
        form.push(("Action", request.action()));
        form.push(("Version", request.service().api_version()));
        form.extend(request.params().iter().map(|(k, v)| (k.as_str(), v.as_str())));
        form
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn invoke(&self, request: RequestDescriptor) -> Result<ResponseNode, ProviderError> {
        let url = self.endpoints.url_for(request.service());
        tracing::debug!("POST {} Action={}", url, request.action());

        let response = self
            .client
            .post(&url)
            .form(&Self::form(&request))
            .send()
            .await
            .map_err(|e| ProviderError::request_failed(format!("failed to send request: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::request_failed(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            // Only the sanitized/truncated body goes to the log
            tracing::error!("API error: {} - {}", status, sanitize_for_log(&body));
            return Err(match ResponseNode::parse(&body) {
                Ok(doc) => ProviderError::from_document(status.as_u16(), &doc),
                Err(_) => ProviderError::new(
                    status.canonical_reason().unwrap_or("HttpError"),
                    &format!("request failed with status {}", status),
                )
                .with_status(status.as_u16()),
            });
        }

        ResponseNode::parse(&body).map_err(|e| {
            tracing::error!("undecodable response: {} - {}", e, sanitize_for_log(&body));
            ProviderError::malformed(e.to_string()).with_status(status.as_u16())
        })
    }
}
