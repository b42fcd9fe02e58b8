//! Query engine: request building, response access, pagination,
//! fan-out and pre-condition waits

pub mod address;
pub mod executor;
pub mod paginate;
pub mod params;
pub mod wait;
pub mod xml;

pub use address::{AddressRef, MatchField};
pub use executor::{FanOutExecutor, TaskHandle};
pub use paginate::Paginator;
pub use params::{RequestBuilder, RequestDescriptor, Service, WireFilter};
pub use wait::{wait_for_state, Readiness, WaitPolicy};
pub use xml::{ResponseNode, XmlError};
