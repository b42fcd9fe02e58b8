//! Parameter Builder
//!
//! Builds the ordered key/value parameter set of one Query API request.
//! Keys are emitted in insertion order so the upstream signer always sees
//! the same canonical sequence for the same intent.

use std::fmt;

/// Provider service a request is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Ec2,
    Monitoring,
}

impl Service {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ec2 => "ec2",
            Self::Monitoring => "monitoring",
        }
    }

    /// API version sent with every request of this service
    pub fn api_version(&self) -> &'static str {
        match self {
            Self::Ec2 => "2014-06-15",
            Self::Monitoring => "2010-08-01",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request: operation name plus ordered parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    service: Service,
    action: String,
    params: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn service(&self) -> Service {
        self.service
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Copy of this request with one more parameter, replacing any
    /// previous value for the same key
    pub fn with_param(&self, key: &str, value: &str) -> Self {
        let mut next = self.clone();
        upsert(&mut next.params, key, value);
        next
    }
}

/// One wire-side filter: `Filter.N.Name` plus its `Filter.N.Value.M` values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFilter {
    pub name: String,
    pub values: Vec<String>,
}

impl WireFilter {
    pub fn new(name: &str, values: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            values,
        }
    }

    /// Filter on tag equality: `tag:<key>` = value
    pub fn tag(key: &str, value: &str) -> Self {
        Self::new(&format!("tag:{}", key), vec![value.to_string()])
    }
}

/// Incremental builder for [`RequestDescriptor`]
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    service: Service,
    action: String,
    params: Vec<(String, String)>,
    filters: usize,
}

impl RequestBuilder {
    pub fn new(service: Service, action: &str) -> Self {
        Self {
            service,
            action: action.to_string(),
            params: Vec::new(),
            filters: 0,
        }
    }

    /// Scalar parameter
    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        upsert(&mut self.params, key, &value.to_string());
        self
    }

    /// Scalar parameter, omitted entirely when absent
    pub fn opt_param<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.param(key, v),
            None => self,
        }
    }

    /// `Prefix.1`, `Prefix.2`, ... (1-based)
    pub fn indexed<I, V>(mut self, prefix: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        for (i, value) in values.into_iter().enumerate() {
            upsert(&mut self.params, &format!("{}.{}", prefix, i + 1), &value.to_string());
        }
        self
    }

    /// `Prefix.N.<key field>` / `Prefix.N.<value field>` pairs; entries with
    /// no value only get the key field
    pub fn indexed_pairs<'a, I>(mut self, prefix: &str, key_field: &str, value_field: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        for (i, (key, value)) in pairs.into_iter().enumerate() {
            let n = i + 1;
            upsert(&mut self.params, &format!("{}.{}.{}", prefix, n, key_field), key);
            if let Some(value) = value {
                upsert(&mut self.params, &format!("{}.{}.{}", prefix, n, value_field), value);
            }
        }
        self
    }

    /// `Tag.N.Key` / `Tag.N.Value`
    pub fn tags<'a, I>(self, tags: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
    {
        self.indexed_pairs("Tag", "Key", "Value", tags)
    }

    /// `Dimensions.member.N.Name` / `Dimensions.member.N.Value`
    pub fn dimensions<'a, I>(self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        self.indexed_pairs(
            "Dimensions.member",
            "Name",
            "Value",
            dimensions.into_iter().map(|(k, v)| (k, Some(v))),
        )
    }

    /// `Filter.N.Name` / `Filter.N.Value.M`, numbering continues across calls
    pub fn filter(mut self, filter: &WireFilter) -> Self {
        self.filters += 1;
        let n = self.filters;
        upsert(&mut self.params, &format!("Filter.{}.Name", n), &filter.name);
        for (m, value) in filter.values.iter().enumerate() {
            upsert(&mut self.params, &format!("Filter.{}.Value.{}", n, m + 1), value);
        }
        self
    }

    pub fn filters<'a, I>(self, filters: I) -> Self
    where
        I: IntoIterator<Item = &'a WireFilter>,
    {
        filters.into_iter().fold(self, |b, f| b.filter(f))
    }

    pub fn build(self) -> RequestDescriptor {
        RequestDescriptor {
            service: self.service,
            action: self.action,
            params: self.params,
        }
    }
}

fn upsert(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some(entry) => entry.1 = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(req: &RequestDescriptor) -> Vec<&str> {
        req.params().iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_insertion_order_is_preserved() {
        let req = RequestBuilder::new(Service::Ec2, "AttachVolume")
            .param("VolumeId", "vol-1")
            .param("InstanceId", "i-1")
            .param("Device", "/dev/sdf")
            .build();
        assert_eq!(keys(&req), vec!["VolumeId", "InstanceId", "Device"]);
        assert_eq!(req.action(), "AttachVolume");
    }

    #[test]
    fn test_absent_scalars_are_omitted() {
        let req = RequestBuilder::new(Service::Ec2, "CreateVolume")
            .opt_param("SnapshotId", None::<String>)
            .param("Size", 8)
            .build();
        assert_eq!(keys(&req), vec!["Size"]);
        assert_eq!(req.get("Size"), Some("8"));
    }

    #[test]
    fn test_indexed_lists_are_one_based() {
        let req = RequestBuilder::new(Service::Monitoring, "DeleteAlarms")
            .indexed("AlarmNames.member", ["a", "b"])
            .build();
        assert_eq!(req.get("AlarmNames.member.1"), Some("a"));
        assert_eq!(req.get("AlarmNames.member.2"), Some("b"));
        assert_eq!(req.get("AlarmNames.member.0"), None);
    }

    #[test]
    fn test_tags_without_value_only_emit_key() {
        let req = RequestBuilder::new(Service::Ec2, "DeleteTags")
            .tags([("Name", None), ("env", Some("prod"))])
            .build();
        assert_eq!(keys(&req), vec!["Tag.1.Key", "Tag.2.Key", "Tag.2.Value"]);
    }

    #[test]
    fn test_filters_number_across_calls() {
        let req = RequestBuilder::new(Service::Ec2, "DescribeVolumes")
            .filter(&WireFilter::tag("env", "prod"))
            .filter(&WireFilter::new("availability-zone", vec!["a".into(), "b".into()]))
            .build();
        assert_eq!(req.get("Filter.1.Name"), Some("tag:env"));
        assert_eq!(req.get("Filter.1.Value.1"), Some("prod"));
        assert_eq!(req.get("Filter.2.Name"), Some("availability-zone"));
        assert_eq!(req.get("Filter.2.Value.2"), Some("b"));
    }

    #[test]
    fn test_with_param_replaces_in_place() {
        let req = RequestBuilder::new(Service::Monitoring, "ListMetrics")
            .param("Namespace", "AWS/EC2")
            .build();
        let first = req.with_param("NextToken", "t1");
        let second = first.with_param("NextToken", "t2");
        assert_eq!(keys(&second), vec!["Namespace", "NextToken"]);
        assert_eq!(second.get("NextToken"), Some("t2"));
        assert_eq!(req.get("NextToken"), None);
    }
}
