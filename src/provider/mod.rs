//! Provider transport boundary

pub mod client;
pub mod error;
pub mod http;
pub mod scripted;

pub use client::{check_acknowledged, Dialect, QueryClient, RequestContext, Transport};
pub use error::ProviderError;
pub use http::{Endpoints, HttpTransport};
pub use scripted::ScriptedTransport;
