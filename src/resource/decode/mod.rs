//! Resource Decoders
//!
//! One pure function per resource kind turning a response element into a
//! typed model. Each decoder walks the element's direct children once and
//! dispatches on the child name through a name-to-handler table; unknown
//! names are ignored. A decoder returns `Ok(None)` when the element has no
//! usable identifier, so the caller skips it, and `Err` when a structured
//! field is unparsable.

pub mod address;
pub mod keypair;
pub mod monitoring;
pub mod server;
pub mod tags;
pub mod volume;

use crate::error::AdapterError;
use crate::provider::RequestContext;
use crate::query::xml::ResponseNode;
use chrono::{DateTime, NaiveDateTime, Utc};

/// Field-level decode failure; always Fatal for the call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("field '{field}' has invalid value '{value}'")]
    InvalidValue { field: String, value: String },
    #[error("field '{field}' has unparsable timestamp '{value}'")]
    Timestamp { field: String, value: String },
    #[error("required field '{0}' is missing")]
    Missing(String),
}

impl DecodeError {
    pub fn into_adapter(self, operation: &str, resource: &str) -> AdapterError {
        AdapterError::fatal(operation, resource, self.to_string())
    }
}

/// Signature shared by every element decoder
pub type DecodeFn<T> = fn(&ResponseNode, &RequestContext) -> Result<Option<T>, DecodeError>;

/// Handler for one child element, writing into a decoder's draft
pub type FieldHandler<D> = fn(&mut D, &ResponseNode) -> Result<(), DecodeError>;

/// Dispatch every direct child of `node` through `table`
/// (case-insensitive on the element name)
pub fn apply_fields<D>(table: &[(&str, FieldHandler<D>)], draft: &mut D, node: &ResponseNode) -> Result<(), DecodeError> {
    for child in node.children() {
        if let Some((_, handler)) = table.iter().find(|(name, _)| child.is_named(name)) {
            handler(draft, child)?;
        }
    }
    Ok(())
}

/// Text of a node as an owned string, absent when the node has no text
pub fn text(node: &ResponseNode) -> Option<String> {
    node.text().map(|s| s.to_string())
}

/// Numeric field; absent text stays absent
pub fn number<N: std::str::FromStr>(node: &ResponseNode) -> Result<Option<N>, DecodeError> {
    match node.text() {
        None => Ok(None),
        Some(value) => value.parse().map(Some).map_err(|_| DecodeError::InvalidValue {
            field: node.name().to_string(),
            value: value.to_string(),
        }),
    }
}

/// `true` only for a literal (case-insensitive) "true"
pub fn flag(node: &ResponseNode) -> bool {
    node.text().is_some_and(|t| t.eq_ignore_ascii_case("true"))
}

/// Length of `yyyy-MM-ddTHH:mm:ss.SSSZ`
const FIXED_TIMESTAMP_LEN: usize = 24;

/// Millisecond timestamp in the fixed `yyyy-MM-ddTHH:mm:ss.SSSZ` form
pub fn fixed_timestamp(node: &ResponseNode) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let Some(value) = node.text() else {
        return Ok(None);
    };
    let invalid = || DecodeError::Timestamp {
        field: node.name().to_string(),
        value: value.to_string(),
    };
    // `%.3f` alone would also take a missing or longer fraction
    let bytes = value.as_bytes();
    if bytes.len() != FIXED_TIMESTAMP_LEN || bytes[19] != b'.' || !bytes[20..23].iter().all(u8::is_ascii_digit) {
        return Err(invalid());
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.3fZ")
        .map(|naive| Some(naive.and_utc()))
        .map_err(|_| invalid())
}

/// RFC 3339 timestamp (CloudWatch style)
pub fn rfc3339_timestamp(node: &ResponseNode) -> Result<Option<DateTime<Utc>>, DecodeError> {
    let Some(value) = node.text() else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(value)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|_| DecodeError::Timestamp {
            field: node.name().to_string(),
            value: value.to_string(),
        })
}
