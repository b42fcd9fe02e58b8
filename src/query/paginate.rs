//! Pagination Driver
//!
//! Issues a listing request, decodes every element of the page and follows
//! the continuation token until the provider stops returning one. A token
//! that comes back a second time is a protocol violation and stops the
//! listing with a Fatal error instead of looping.

use crate::error::{AdapterError, CallStyle, Result};
use crate::provider::{QueryClient, RequestContext};
use crate::query::params::RequestDescriptor;
use crate::query::xml::ResponseNode;
use crate::resource::decode::DecodeError;
use crate::resource::registry::{resource_def, ResourceKind};
use futures::stream::{self, Stream};
use std::collections::{HashSet, VecDeque};

/// Request parameter carrying the continuation token
pub const TOKEN_PARAM: &str = "NextToken";

/// Decode every element of a page; elements the decoder rejects are skipped
pub fn decode_page<T, D>(
    doc: &ResponseNode,
    container: &str,
    item: &str,
    context: &RequestContext,
    decode: &D,
) -> std::result::Result<Vec<T>, DecodeError>
where
    D: Fn(&ResponseNode, &RequestContext) -> std::result::Result<Option<T>, DecodeError>,
{
    let mut items = Vec::new();
    for element in doc.items(container, item) {
        match decode(element, context)? {
            Some(decoded) => items.push(decoded),
            None => tracing::debug!("skipping undecodable <{}> element", element.name()),
        }
    }
    Ok(items)
}

/// Drives one paginated listing. Not restartable: once the last page has
/// been returned every further call yields `None`.
pub struct Paginator<T, D> {
    client: QueryClient,
    kind: ResourceKind,
    operation: String,
    template: RequestDescriptor,
    decode: D,
    seen: HashSet<String>,
    next_token: Option<String>,
    finished: bool,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T, D> Paginator<T, D>
where
    D: Fn(&ResponseNode, &RequestContext) -> std::result::Result<Option<T>, DecodeError>,
{
    pub fn new(client: QueryClient, kind: ResourceKind, operation: &str, template: RequestDescriptor, decode: D) -> Self {
        Self {
            client,
            kind,
            operation: operation.to_string(),
            template,
            decode,
            seen: HashSet::new(),
            next_token: None,
            finished: false,
            _marker: std::marker::PhantomData,
        }
    }

    /// Fetch and decode the next page, or `None` once the listing is done
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.finished {
            return Ok(None);
        }

        let def = resource_def(self.kind)?;
        let request = match &self.next_token {
            Some(token) => self.template.with_param(TOKEN_PARAM, token),
            None => self.template.clone(),
        };

        let Some(doc) = self
            .client
            .call(self.kind, CallStyle::Lookup, &self.operation, "", request)
            .await?
        else {
            self.finished = true;
            return Ok(Some(Vec::new()));
        };

        let (container, item) = def.element_path();
        let items = decode_page(&doc, container, item, self.client.context(), &self.decode)
            .map_err(|e| e.into_adapter(&self.operation, ""))?;

        let token = def
            .token_field
            .as_deref()
            .and_then(|field| doc.find_text(field))
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => {
                if !self.seen.insert(token.to_string()) {
                    tracing::error!("{}: continuation token repeated, aborting listing", self.operation);
                    self.finished = true;
                    return Err(AdapterError::fatal(
                        &self.operation,
                        "",
                        format!("provider returned continuation token '{}' twice", token),
                    ));
                }
                tracing::debug!("{}: {} items, more pages follow", self.operation, items.len());
                self.next_token = Some(token.to_string());
            },
            None => {
                tracing::debug!("{}: {} items, last page", self.operation, items.len());
                self.finished = true;
            },
        }

        Ok(Some(items))
    }

    /// Fetch all pages and concatenate them in provider order
    pub async fn collect_all(mut self) -> Result<Vec<T>> {
        let mut all_items = Vec::new();
        while let Some(page) = self.next_page().await? {
            all_items.extend(page);
        }
        Ok(all_items)
    }

    /// Lazy element stream; pages are fetched only as the consumer drains
    /// the previous one
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        stream::try_unfold((self, VecDeque::new()), |(mut pager, mut buffered)| async move {
            loop {
                if let Some(item) = buffered.pop_front() {
                    return Ok(Some((item, (pager, buffered))));
                }
                match pager.next_page().await? {
                    Some(page) => buffered.extend(page),
                    None => return Ok(None),
                }
            }
        })
    }
}
