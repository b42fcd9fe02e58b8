//! Filter options
//!
//! A filter is checked twice: rendered into provider filter parameters for
//! the request, and re-checked against every decoded resource with
//! [`FilterOptions::matches`]. The wire side may be looser than `matches`
//! (some criteria have no wire form) but never stricter.

use crate::query::params::{RequestBuilder, WireFilter};
use crate::resource::model::{Alarm, AlarmState, IpAddress, Keypair, Metric, Tags, Volume};

/// Predicate bundle for one resource kind
pub trait FilterOptions<T> {
    /// Object-side test
    fn matches(&self, item: &T) -> bool;

    /// Add the wire-side form of this filter to a listing request
    fn apply_wire(&self, request: RequestBuilder) -> RequestBuilder {
        request
    }
}

/// Every filter tag is present with the same value
fn tags_match(wanted: &Tags, actual: &Tags) -> bool {
    wanted.iter().all(|(k, v)| actual.get(k) == Some(v))
}

fn tag_filters(tags: &Tags) -> Vec<WireFilter> {
    tags.iter().map(|(k, v)| WireFilter::tag(k, v)).collect()
}

// ============================================================================
// Volumes
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeFilter {
    pub tags: Tags,
    /// Case-insensitive substring of the volume name
    pub name: Option<String>,
    pub attached_to: Option<String>,
    pub data_center: Option<String>,
}

impl VolumeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn attached_to(mut self, server_id: &str) -> Self {
        self.attached_to = Some(server_id.to_string());
        self
    }

    pub fn in_data_center(mut self, data_center: &str) -> Self {
        self.data_center = Some(data_center.to_string());
        self
    }
}

impl FilterOptions<Volume> for VolumeFilter {
    fn matches(&self, volume: &Volume) -> bool {
        if !tags_match(&self.tags, &volume.tags) {
            return false;
        }
        if let Some(name) = &self.name {
            if !volume.name.to_lowercase().contains(&name.to_lowercase()) {
                return false;
            }
        }
        if let Some(server) = &self.attached_to {
            if volume.attachment.as_ref().map(|a| &a.server_id) != Some(server) {
                return false;
            }
        }
        if let Some(dc) = &self.data_center {
            if volume.data_center.as_ref() != Some(dc) {
                return false;
            }
        }
        true
    }

    fn apply_wire(&self, request: RequestBuilder) -> RequestBuilder {
        let mut filters = tag_filters(&self.tags);
        if let Some(server) = &self.attached_to {
            filters.push(WireFilter::new("attachment.instance-id", vec![server.clone()]));
        }
        if let Some(dc) = &self.data_center {
            filters.push(WireFilter::new("availability-zone", vec![dc.clone()]));
        }
        request.filters(&filters)
    }
}

// ============================================================================
// Addresses
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFilter {
    pub tags: Tags,
    /// Only addresses bound to neither a server nor a network interface
    pub unassigned_only: bool,
    /// Only VPC-domain addresses
    pub vpc_only: bool,
}

impl AddressFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(mut self, key: &str, value: &str) -> Self {
        self.tags.insert(key.to_string(), value.to_string());
        self
    }

    pub fn unassigned(mut self) -> Self {
        self.unassigned_only = true;
        self
    }

    pub fn vpc(mut self) -> Self {
        self.vpc_only = true;
        self
    }
}

impl FilterOptions<IpAddress> for AddressFilter {
    fn matches(&self, address: &IpAddress) -> bool {
        tags_match(&self.tags, &address.tags)
            && (!self.unassigned_only || !address.is_assigned())
            && (!self.vpc_only || address.for_vlan)
    }

    fn apply_wire(&self, request: RequestBuilder) -> RequestBuilder {
        let mut filters = tag_filters(&self.tags);
        if self.vpc_only {
            filters.push(WireFilter::new("domain", vec!["vpc".to_string()]));
        }
        request.filters(&filters)
    }
}

// ============================================================================
// Monitoring
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlarmFilter {
    pub state: Option<AlarmState>,
    pub alarm_names: Vec<String>,
}

impl AlarmFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_state(mut self, state: AlarmState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn named<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alarm_names.extend(names.into_iter().map(Into::into));
        self
    }
}

impl FilterOptions<Alarm> for AlarmFilter {
    fn matches(&self, alarm: &Alarm) -> bool {
        self.state.map_or(true, |s| s == alarm.state)
            && (self.alarm_names.is_empty() || self.alarm_names.contains(&alarm.name))
    }

    fn apply_wire(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .opt_param("StateValue", self.state.map(|s| s.as_provider()))
            .indexed("AlarmNames.member", &self.alarm_names)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricFilter {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub dimensions: Tags,
}

impl MetricFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn in_namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    pub fn with_dimension(mut self, name: &str, value: &str) -> Self {
        self.dimensions.insert(name.to_string(), value.to_string());
        self
    }
}

impl FilterOptions<Metric> for MetricFilter {
    fn matches(&self, metric: &Metric) -> bool {
        self.name.as_ref().map_or(true, |n| *n == metric.name)
            && self.namespace.as_ref().map_or(true, |ns| metric.namespace.as_ref() == Some(ns))
            && tags_match(&self.dimensions, &metric.dimensions)
    }

    fn apply_wire(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .opt_param("MetricName", self.name.as_deref())
            .opt_param("Namespace", self.namespace.as_deref())
            .dimensions(self.dimensions.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

// ============================================================================
// Keypairs
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeypairFilter {
    pub key_names: Vec<String>,
}

impl KeypairFilter {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl FilterOptions<Keypair> for KeypairFilter {
    fn matches(&self, keypair: &Keypair) -> bool {
        self.key_names.is_empty() || self.key_names.contains(&keypair.name)
    }

    fn apply_wire(&self, request: RequestBuilder) -> RequestBuilder {
        request.indexed("KeyName", &self.key_names)
    }
}
