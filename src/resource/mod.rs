//! Resource abstraction layer
//!
//! Resource kinds are described by a capability record loaded from embedded
//! JSON (`src/resources/kinds.json`): the service, the provider action of
//! every operation, the element path of list answers, the continuation
//! token field and the not-found codes. One generic adapter drives every
//! kind from that record.
//!
//! # Architecture
//!
//! - [`registry`] - Loads and caches resource kind definitions
//! - [`decode`] - Per-kind element decoders (name-to-handler tables)
//! - [`adapter`] - Generic adapter: list, get, execute, tags
//! - [`volumes`], [`addresses`], [`monitoring`], [`keypairs`] - Per-kind argument shaping
//! - [`servers`] - Dependent server probe for attach-style waits
//! - [`inventory`] - Process-wide adapter with concurrent inventory

pub mod adapter;
pub mod addresses;
pub mod decode;
pub mod filter;
pub mod inventory;
pub mod keypairs;
pub mod model;
pub mod monitoring;
pub mod registry;
pub mod servers;
pub mod volumes;

pub use filter::{AddressFilter, AlarmFilter, FilterOptions, KeypairFilter, MetricFilter, VolumeFilter};
pub use inventory::CloudAdapter;
pub use model::{Alarm, AlarmState, IpAddress, IpVersion, Keypair, Metric, Resource, ResourceStatus, Volume, VolumeState};
pub use registry::{get_registry, get_resource, Operation, ResourceKind};
