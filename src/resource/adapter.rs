//! Generic resource adapter
//!
//! One adapter type serves every resource kind. It is parameterized by a
//! [`KindSpec`] capability record (the registry kind plus its element
//! decoder); the operation table, service, response path and not-found
//! rules come from the registry. The per-kind adapters only add argument
//! shaping on top.

use super::decode::DecodeFn;
use super::filter::FilterOptions;
use super::registry::{action, resource_def, Operation, ResourceKind};
use crate::error::{CallStyle, Result};
use crate::provider::{check_acknowledged, QueryClient};
use crate::query::paginate::{decode_page, Paginator};
use crate::query::params::{RequestBuilder, RequestDescriptor};
use crate::query::xml::ResponseNode;
use futures::{Stream, TryStreamExt};

/// Capability record for one resource kind
pub struct KindSpec<T> {
    pub kind: ResourceKind,
    pub decode: DecodeFn<T>,
}

impl<T> Clone for KindSpec<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for KindSpec<T> {}

/// Adapter over one resource kind
#[derive(Clone)]
pub struct ResourceAdapter<T> {
    client: QueryClient,
    spec: KindSpec<T>,
}

impl<T> ResourceAdapter<T> {
    pub fn new(client: QueryClient, spec: KindSpec<T>) -> Self {
        Self { client, spec }
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn kind(&self) -> ResourceKind {
        self.spec.kind
    }

    /// `Kind.op` name used in logs and errors
    pub fn operation(&self, op: Operation) -> String {
        self.spec.kind.operation(op)
    }

    /// Start a request for `op`; unsupported operations fail here, before
    /// anything is sent
    pub fn request(&self, op: Operation) -> Result<RequestBuilder> {
        let def = resource_def(self.spec.kind)?;
        Ok(RequestBuilder::new(def.service, action(self.spec.kind, op)?))
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Paginated listing decoded with any element decoder of this kind
    pub fn paginate<U>(&self, op: Operation, template: RequestDescriptor, decode: DecodeFn<U>) -> Paginator<U, DecodeFn<U>> {
        Paginator::new(self.client.clone(), self.spec.kind, &self.operation(op), template, decode)
    }

    /// All resources of the listing, re-checked against `filter`
    pub async fn list<F>(&self, template: RequestDescriptor, filter: Option<&F>) -> Result<Vec<T>>
    where
        F: FilterOptions<T>,
    {
        let items = self
            .paginate(Operation::List, template, self.spec.decode)
            .collect_all()
            .await?;
        Ok(match filter {
            Some(filter) => items.into_iter().filter(|item| filter.matches(item)).collect(),
            None => items,
        })
    }

    /// Lazy form of [`list`](Self::list)
    pub fn stream<F>(&self, template: RequestDescriptor, filter: Option<F>) -> impl Stream<Item = Result<T>>
    where
        F: FilterOptions<T>,
    {
        self.paginate(Operation::List, template, self.spec.decode)
            .into_stream()
            .try_filter(move |item| std::future::ready(filter.as_ref().map_or(true, |f| f.matches(item))))
    }

    /// Single lookup. Absence (including a not-found fault) is `Ok(None)`;
    /// among the decoded elements the first accepted by `is_target` wins.
    pub async fn get<P>(&self, id: &str, request: RequestDescriptor, is_target: P) -> Result<Option<T>>
    where
        P: Fn(&T) -> bool,
    {
        let operation = self.operation(Operation::Get);
        let Some(doc) = self
            .client
            .call(self.spec.kind, CallStyle::Get, &operation, id, request)
            .await?
        else {
            return Ok(None);
        };

        let items = self.decode_elements(&doc, &operation, id)?;
        Ok(items.into_iter().find(|item| is_target(item)))
    }

    /// Decode every list element of a response document
    pub fn decode_elements(&self, doc: &ResponseNode, operation: &str, resource: &str) -> Result<Vec<T>> {
        let def = resource_def(self.spec.kind)?;
        let (container, item) = def.element_path();
        decode_page(doc, container, item, self.client.context(), &self.spec.decode)
            .map_err(|e| e.into_adapter(operation, resource))
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Send a mutating request and check its acknowledgment.
    ///
    /// Returns `Ok(None)` only for remove-style calls whose target is
    /// already gone.
    pub async fn execute(&self, op: Operation, style: CallStyle, resource: &str, request: RequestDescriptor) -> Result<Option<ResponseNode>> {
        let operation = self.operation(op);
        tracing::info!("{} {} ({})", operation, resource, request.action());

        let doc = match style {
            CallStyle::Remove | CallStyle::Lookup | CallStyle::Get => {
                self.client
                    .call(self.spec.kind, style, &operation, resource, request)
                    .await?
            },
            CallStyle::Mutate | CallStyle::Create => Some(
                self.client
                    .call_required(self.spec.kind, style, &operation, resource, request)
                    .await?,
            ),
        };

        if let Some(doc) = &doc {
            check_acknowledged(doc, &operation, resource)?;
        }
        Ok(doc)
    }

    /// Add or overwrite tags on one or more resources
    pub async fn update_tags(&self, ids: &[&str], tags: &[(&str, &str)]) -> Result<()> {
        if ids.is_empty() || tags.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Operation::Tag)?
            .indexed("ResourceId", ids)
            .tags(tags.iter().map(|(k, v)| (*k, Some(*v))))
            .build();
        self.execute(Operation::Tag, CallStyle::Mutate, &ids.join(","), request)
            .await
            .map(|_| ())
    }

    /// Remove tags; an entry with a value only removes the tag while it
    /// still holds that value
    pub async fn remove_tags(&self, ids: &[&str], tags: &[(&str, Option<&str>)]) -> Result<()> {
        if ids.is_empty() || tags.is_empty() {
            return Ok(());
        }
        let request = self
            .request(Operation::Untag)?
            .indexed("ResourceId", ids)
            .tags(tags.iter().copied())
            .build();
        self.execute(Operation::Untag, CallStyle::Mutate, &ids.join(","), request)
            .await
            .map(|_| ())
    }
}
