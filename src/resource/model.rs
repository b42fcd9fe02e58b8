//! Vendor-neutral resource models
//!
//! Every model is built fresh by a decoder for one call and handed to the
//! caller by value. Tags are kept in a `BTreeMap` so serialized output is
//! stable.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

pub type Tags = BTreeMap<String, String>;

// ============================================================================
// Volumes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeState {
    Pending,
    Available,
    Deleted,
}

impl VolumeState {
    /// Map a provider status string; unknown values are treated as deleted
    pub fn from_provider(status: &str) -> Self {
        match status {
            "creating" | "attaching" | "attached" | "detaching" | "detached" => Self::Pending,
            "available" | "in-use" => Self::Available,
            _ => Self::Deleted,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Hdd,
    Ssd,
}

impl MediaType {
    /// Derive from the provider product id
    pub fn for_product(product_id: &str) -> Self {
        match product_id {
            "standard" | "st1" | "sc1" => Self::Hdd,
            _ => Self::Ssd,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeFormat {
    Block,
    Nfs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Attachment {
    pub server_id: String,
    pub device: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Volume {
    pub id: String,
    pub region: String,
    pub name: String,
    pub description: String,
    pub data_center: Option<String>,
    pub size_gb: Option<u32>,
    pub iops: Option<u32>,
    pub product_id: String,
    pub media: MediaType,
    pub format: VolumeFormat,
    pub snapshot_id: Option<String>,
    pub state: VolumeState,
    pub created: Option<DateTime<Utc>>,
    pub encrypted: bool,
    pub attachment: Option<Attachment>,
    pub tags: Tags,
}

// ============================================================================
// Addresses
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IpVersion {
    V4,
    V6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressType {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpAddress {
    /// Allocation id, or the address literal for classic addresses
    pub id: String,
    pub region: String,
    pub address: String,
    pub private_address: Option<String>,
    pub version: IpVersion,
    pub address_type: AddressType,
    /// Allocated in the VPC domain
    pub for_vlan: bool,
    pub association_id: Option<String>,
    pub network_interface_id: Option<String>,
    pub server_id: Option<String>,
    pub tags: Tags,
}

impl IpAddress {
    pub fn is_assigned(&self) -> bool {
        self.server_id.is_some() || self.network_interface_id.is_some()
    }
}

// ============================================================================
// Monitoring
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmState {
    Ok,
    Alarm,
    InsufficientData,
}

impl AlarmState {
    /// Map a provider `StateValue`; unknown values count as insufficient data
    pub fn from_provider(value: &str) -> Self {
        match value {
            "OK" => Self::Ok,
            "ALARM" => Self::Alarm,
            _ => Self::InsufficientData,
        }
    }

    pub fn as_provider(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Alarm => "ALARM",
            Self::InsufficientData => "INSUFFICIENT_DATA",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alarm {
    /// Alarm ARN, or the name when the provider does not report one
    pub id: String,
    pub name: String,
    pub region: String,
    pub description: Option<String>,
    pub namespace: Option<String>,
    pub metric_name: Option<String>,
    pub dimensions: Tags,
    pub statistic: Option<String>,
    pub comparison_operator: Option<String>,
    pub threshold: Option<f64>,
    pub period: Option<u32>,
    pub evaluation_periods: Option<u32>,
    pub actions_enabled: bool,
    pub ok_actions: Vec<String>,
    pub alarm_actions: Vec<String>,
    pub insufficient_data_actions: Vec<String>,
    pub state: AlarmState,
    pub state_reason: Option<String>,
    pub state_reason_data: Option<String>,
    pub state_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metric {
    pub id: String,
    pub name: String,
    pub namespace: Option<String>,
    pub region: String,
    pub dimensions: Tags,
}

// ============================================================================
// Keypairs
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Keypair {
    pub id: String,
    pub name: String,
    pub fingerprint: String,
    pub owner: String,
    pub region: String,
    /// Only present in the answer to a create
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

// ============================================================================
// Servers (dependency of attach-style operations)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    Pending,
    Running,
    Stopping,
    Stopped,
    ShuttingDown,
    Terminated,
}

impl ServerState {
    pub fn from_provider(name: &str) -> Self {
        match name {
            "running" => Self::Running,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            _ => Self::Pending,
        }
    }
}

// ============================================================================
// Tagged variant and lightweight status
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    Volume(Volume),
    IpAddress(IpAddress),
    Alarm(Alarm),
    Metric(Metric),
    Keypair(Keypair),
}

impl Resource {
    pub fn id(&self) -> &str {
        match self {
            Self::Volume(v) => &v.id,
            Self::IpAddress(a) => &a.id,
            Self::Alarm(a) => &a.id,
            Self::Metric(m) => &m.id,
            Self::Keypair(k) => &k.id,
        }
    }

    pub fn region(&self) -> &str {
        match self {
            Self::Volume(v) => &v.region,
            Self::IpAddress(a) => &a.region,
            Self::Alarm(a) => &a.region,
            Self::Metric(m) => &m.region,
            Self::Keypair(k) => &k.region,
        }
    }

    /// Tags, where the kind carries any
    pub fn tags(&self) -> Option<&Tags> {
        match self {
            Self::Volume(v) => Some(&v.tags),
            Self::IpAddress(a) => Some(&a.tags),
            _ => None,
        }
    }
}

/// Identifier plus coarse lifecycle flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStatus<S> {
    pub id: String,
    pub state: S,
}

impl<S> ResourceStatus<S> {
    pub fn new(id: impl Into<String>, state: S) -> Self {
        Self { id: id.into(), state }
    }
}
