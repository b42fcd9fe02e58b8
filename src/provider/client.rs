//! Query Client
//!
//! Main client for issuing provider requests, combining the transport with
//! the ambient request context (region, account, provider dialect).

use super::error::ProviderError;
use crate::error::{classify, AdapterError, CallStyle, ErrorClass};
use crate::query::params::RequestDescriptor;
use crate::query::xml::ResponseNode;
use crate::resource::registry::ResourceKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Performs signed transport I/O for one request
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the parsed response document, or the
    /// provider fault on any non-success answer
    async fn invoke(&self, request: RequestDescriptor) -> Result<ResponseNode, ProviderError>;
}

/// Provider flavour; a few response fields differ between implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Aws,
    Eucalyptus,
}

/// Ambient, read-only request context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub region: String,
    pub account: String,
    pub dialect: Dialect,
}

impl RequestContext {
    pub fn new(region: &str, account: &str) -> Self {
        Self {
            region: region.to_string(),
            account: account.to_string(),
            dialect: Dialect::Aws,
        }
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Main query client
#[derive(Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
    context: RequestContext,
}

impl QueryClient {
    /// Create a new client over a transport
    pub fn new(transport: Arc<dyn Transport>, context: RequestContext) -> Self {
        Self { transport, context }
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    pub fn current_region(&self) -> &str {
        &self.context.region
    }

    pub fn current_account(&self) -> &str {
        &self.context.account
    }

    /// Switch to a different region
    pub fn switch_region(&mut self, region: &str) {
        self.context.region = region.to_string();
    }

    /// Send a request without classifying failures
    pub async fn invoke(&self, request: RequestDescriptor) -> Result<ResponseNode, ProviderError> {
        tracing::debug!(
            "invoke: service={}, action={}, params={}",
            request.service(),
            request.action(),
            request.params().len()
        );
        self.transport.invoke(request).await
    }

    /// Send a request and classify any failure for `kind`.
    ///
    /// Returns `Ok(None)` when the provider reports the resource does not
    /// exist and the call style treats that as absence.
    pub async fn call(
        &self,
        kind: ResourceKind,
        style: CallStyle,
        operation: &str,
        resource: &str,
        request: RequestDescriptor,
    ) -> Result<Option<ResponseNode>, AdapterError> {
        match self.invoke(request).await {
            Ok(doc) => Ok(Some(doc)),
            Err(err) => {
                let class = classify(kind, style, &err);
                if class == ErrorClass::NotFound {
                    tracing::debug!("{} {}: not found ({})", operation, resource, err.code);
                    return Ok(None);
                }
                tracing::error!("{} {}: {}", operation, resource, err.summary());
                Err(AdapterError::from_provider(operation, resource, class, err))
            },
        }
    }

    /// Like [`call`](Self::call) for calls where absence is not an answer
    pub async fn call_required(
        &self,
        kind: ResourceKind,
        style: CallStyle,
        operation: &str,
        resource: &str,
        request: RequestDescriptor,
    ) -> Result<ResponseNode, AdapterError> {
        self.call(kind, style, operation, resource, request)
            .await?
            .ok_or_else(|| AdapterError::fatal(operation, resource, "resource does not exist"))
    }
}

/// Check the `return` acknowledgment of a mutating call; anything other
/// than `true` means the provider refused the operation
pub fn check_acknowledged(doc: &ResponseNode, operation: &str, resource: &str) -> Result<(), AdapterError> {
    match doc.find_first("return") {
        Some(node) if !node.text().is_some_and(|t| t.eq_ignore_ascii_case("true")) => {
            tracing::warn!("{} {}: provider returned {:?}", operation, resource, node.text());
            Err(AdapterError::denied(operation, resource))
        },
        _ => Ok(()),
    }
}
