//! Vendor-neutral adapter for cloud volumes, elastic addresses, metric
//! alarms and SSH keypairs on top of a parameter-encoded, XML-answering
//! Query API.
//!
//! - [`query`] builds requests, reads responses, paginates, fans out and
//!   waits on dependencies
//! - [`resource`] holds the registry, models, decoders and adapters
//! - [`provider`] is the transport boundary
//! - [`error`] classifies provider faults

pub mod config;
pub mod error;
pub mod provider;
pub mod query;
pub mod resource;

pub use error::{AdapterError, ErrorClass, Result};
pub use resource::CloudAdapter;
