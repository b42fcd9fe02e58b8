//! Block volume adapter

use super::adapter::{KindSpec, ResourceAdapter};
use super::decode::volume;
use super::filter::{FilterOptions, VolumeFilter};
use super::model::{ResourceStatus, Tags, Volume, VolumeFormat, VolumeState};
use super::registry::{Operation, ResourceKind};
use super::servers::ServerProbe;
use crate::error::{AdapterError, CallStyle, Result};
use crate::provider::QueryClient;
use crate::query::wait::WaitPolicy;
use futures::Stream;

/// Product id whose IOPS are provisioned explicitly
pub const PROVISIONED_IOPS_PRODUCT: &str = "io1";

/// Arguments of [`VolumeAdapter::create`]
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCreateOptions {
    pub name: String,
    pub description: String,
    pub size_gb: u32,
    pub format: VolumeFormat,
    pub snapshot_id: Option<String>,
    pub data_center: Option<String>,
    pub product_id: Option<String>,
    pub iops: Option<u32>,
    pub metadata: Tags,
}

impl VolumeCreateOptions {
    pub fn new(name: &str, description: &str, size_gb: u32) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            size_gb,
            format: VolumeFormat::Block,
            snapshot_id: None,
            data_center: None,
            product_id: None,
            iops: None,
            metadata: Tags::new(),
        }
    }

    pub fn from_snapshot(mut self, snapshot_id: &str) -> Self {
        self.snapshot_id = Some(snapshot_id.to_string());
        self
    }

    pub fn in_data_center(mut self, data_center: &str) -> Self {
        self.data_center = Some(data_center.to_string());
        self
    }

    pub fn with_product(mut self, product_id: &str, iops: Option<u32>) -> Self {
        self.product_id = Some(product_id.to_string());
        self.iops = iops;
        self
    }

    pub fn with_format(mut self, format: VolumeFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: &str) -> Self {
        self.metadata.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Clone)]
pub struct VolumeAdapter {
    inner: ResourceAdapter<Volume>,
    servers: ServerProbe,
    wait: WaitPolicy,
    default_data_center: Option<String>,
}

impl VolumeAdapter {
    pub fn new(client: QueryClient) -> Self {
        Self {
            servers: ServerProbe::new(client.clone()),
            inner: ResourceAdapter::new(
                client,
                KindSpec {
                    kind: ResourceKind::Volume,
                    decode: volume::decode,
                },
            ),
            wait: WaitPolicy::default(),
            default_data_center: None,
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    /// Data center used when a create does not name one
    pub fn with_default_data_center(mut self, data_center: &str) -> Self {
        self.default_data_center = Some(data_center.to_string());
        self
    }

    /// Create a volume and return its id. Name, description and metadata
    /// are applied as tags afterwards; a tagging failure is logged but the
    /// volume id is still returned.
    pub async fn create(&self, options: &VolumeCreateOptions) -> Result<String> {
        let operation = self.inner.operation(Operation::Create);
        if options.format != VolumeFormat::Block {
            return Err(AdapterError::unsupported(&operation, "only block volumes are supported"));
        }
        let Some(data_center) = options
            .data_center
            .as_deref()
            .or(self.default_data_center.as_deref())
        else {
            return Err(AdapterError::fatal(&operation, &options.name, "unable to identify a launch data center"));
        };

        let iops = match options.product_id.as_deref() {
            Some(PROVISIONED_IOPS_PRODUCT) => options.iops.filter(|iops| *iops > 0),
            _ => None,
        };

        let request = self
            .inner
            .request(Operation::Create)?
            .opt_param("SnapshotId", options.snapshot_id.as_deref())
            .param("Size", options.size_gb)
            .param("AvailabilityZone", data_center)
            .opt_param("VolumeType", options.product_id.as_deref())
            .opt_param("Iops", iops)
            .build();

        let doc = self
            .inner
            .execute(Operation::Create, CallStyle::Create, &options.name, request)
            .await?
            .ok_or_else(|| AdapterError::fatal(&operation, &options.name, "empty response"))?;
        let Some(id) = doc.find_text("volumeId").map(|s| s.to_string()) else {
            return Err(AdapterError::fatal(&operation, &options.name, "no volume id in response"));
        };

        let mut tags: Vec<(&str, &str)> = vec![("Name", options.name.as_str()), ("Description", options.description.as_str())];
        tags.extend(options.metadata.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        if let Err(e) = self.inner.update_tags(&[&id], &tags).await {
            tracing::warn!("{}: volume {} created but tagging failed: {}", operation, id, e);
        }

        Ok(id)
    }

    pub async fn get(&self, volume_id: &str) -> Result<Option<Volume>> {
        let request = self
            .inner
            .request(Operation::Get)?
            .param("VolumeId.1", volume_id)
            .build();
        self.inner.get(volume_id, request, |v| v.id == volume_id).await
    }

    pub async fn list(&self, filter: Option<&VolumeFilter>) -> Result<Vec<Volume>> {
        let mut template = self.inner.request(Operation::List)?;
        if let Some(filter) = filter {
            template = filter.apply_wire(template);
        }
        self.inner.list(template.build(), filter).await
    }

    /// Lazy listing; pages are fetched as the stream is consumed
    pub fn stream(&self, filter: Option<VolumeFilter>) -> Result<impl Stream<Item = Result<Volume>>> {
        let mut template = self.inner.request(Operation::List)?;
        if let Some(filter) = &filter {
            template = filter.apply_wire(template);
        }
        Ok(self.inner.stream(template.build(), filter))
    }

    pub async fn list_status(&self) -> Result<Vec<ResourceStatus<VolumeState>>> {
        let template = self.inner.request(Operation::List)?.build();
        self.inner
            .paginate(Operation::List, template, volume::decode_status)
            .collect_all()
            .await
    }

    /// Attach once the server is running or stopped
    pub async fn attach(&self, volume_id: &str, server_id: &str, device: &str) -> Result<()> {
        let operation = self.inner.operation(Operation::Attach);
        self.servers
            .wait_until_actionable(&operation, server_id, self.wait)
            .await?;

        let request = self
            .inner
            .request(Operation::Attach)?
            .param("VolumeId", volume_id)
            .param("InstanceId", server_id)
            .param("Device", device)
            .build();
        self.inner
            .execute(Operation::Attach, CallStyle::Mutate, volume_id, request)
            .await
            .map(|_| ())
    }

    pub async fn detach(&self, volume_id: &str, force: bool) -> Result<()> {
        let request = self
            .inner
            .request(Operation::Detach)?
            .param("VolumeId", volume_id)
            .opt_param("Force", force.then_some("true"))
            .build();
        self.inner
            .execute(Operation::Detach, CallStyle::Mutate, volume_id, request)
            .await
            .map(|_| ())
    }

    /// Delete a volume; one that is already gone counts as removed
    pub async fn remove(&self, volume_id: &str) -> Result<()> {
        let request = self
            .inner
            .request(Operation::Remove)?
            .param("VolumeId", volume_id)
            .build();
        self.inner
            .execute(Operation::Remove, CallStyle::Remove, volume_id, request)
            .await
            .map(|_| ())
    }

    pub async fn update_tags(&self, volume_ids: &[&str], tags: &[(&str, &str)]) -> Result<()> {
        self.inner.update_tags(volume_ids, tags).await
    }

    pub async fn remove_tags(&self, volume_ids: &[&str], tags: &[(&str, Option<&str>)]) -> Result<()> {
        self.inner.remove_tags(volume_ids, tags).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::provider::{ProviderError, RequestContext, ScriptedTransport};
    use std::sync::Arc;
    use std::time::Duration;

    const CREATED: &str = "<CreateVolumeResponse><volumeId>vol-new</volumeId><size>8</size>\
        <status>creating</status></CreateVolumeResponse>";
    const TAGGED: &str = "<CreateTagsResponse><return>true</return></CreateTagsResponse>";

    fn adapter(transport: Arc<ScriptedTransport>) -> VolumeAdapter {
        VolumeAdapter::new(QueryClient::new(transport, RequestContext::new("us-east-1", "123")))
            .with_wait_policy(WaitPolicy::new(Duration::from_secs(20), Duration::from_secs(120)))
    }

    #[tokio::test]
    async fn test_create_builds_request_and_tags() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(CREATED).push_xml(TAGGED);

        let options = VolumeCreateOptions::new("data", "scratch space", 8)
            .in_data_center("us-east-1a")
            .with_product(PROVISIONED_IOPS_PRODUCT, Some(400))
            .with_metadata("env", "dev");
        let id = adapter(transport.clone()).create(&options).await.unwrap();
        assert_eq!(id, "vol-new");

        let requests = transport.requests();
        let create = &requests[0];
        assert_eq!(create.action(), "CreateVolume");
        let keys: Vec<&str> = create.params().iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["Size", "AvailabilityZone", "VolumeType", "Iops"]);
        assert_eq!(create.get("Iops"), Some("400"));

        let tag = &requests[1];
        assert_eq!(tag.action(), "CreateTags");
        assert_eq!(tag.get("ResourceId.1"), Some("vol-new"));
        assert_eq!(tag.get("Tag.1.Key"), Some("Name"));
        assert_eq!(tag.get("Tag.2.Value"), Some("scratch space"));
        assert_eq!(tag.get("Tag.3.Key"), Some("env"));
    }

    #[tokio::test]
    async fn test_iops_only_for_provisioned_product() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(CREATED).push_xml(TAGGED);
        let options = VolumeCreateOptions::new("data", "d", 8)
            .in_data_center("us-east-1a")
            .with_product("gp2", Some(400));
        adapter(transport.clone()).create(&options).await.unwrap();
        assert_eq!(transport.requests()[0].get("Iops"), None);
        assert_eq!(transport.requests()[0].get("VolumeType"), Some("gp2"));
    }

    #[tokio::test]
    async fn test_create_uses_default_data_center() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(CREATED).push_xml(TAGGED);
        let adapter = adapter(transport.clone()).with_default_data_center("us-east-1c");
        adapter.create(&VolumeCreateOptions::new("d", "d", 1)).await.unwrap();
        assert_eq!(transport.requests()[0].get("AvailabilityZone"), Some("us-east-1c"));
    }

    #[tokio::test]
    async fn test_create_preconditions() {
        let transport = Arc::new(ScriptedTransport::new());
        let adapter = adapter(transport.clone());

        let nfs = VolumeCreateOptions::new("d", "d", 1).with_format(VolumeFormat::Nfs);
        assert_eq!(adapter.create(&nfs).await.unwrap_err().class(), ErrorClass::Unsupported);

        let err = adapter.create(&VolumeCreateOptions::new("d", "d", 1)).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert!(err.to_string().contains("data center"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_create_without_id_is_fatal() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml("<CreateVolumeResponse><requestId>r</requestId></CreateVolumeResponse>");
        let options = VolumeCreateOptions::new("d", "d", 1).in_data_center("us-east-1a");
        let err = adapter(transport).create(&options).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
    }

    #[tokio::test]
    async fn test_not_found_on_create_is_fatal() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_error(ProviderError::new("InvalidVolume.NotFound", "snapshot volume missing"));
        let options = VolumeCreateOptions::new("d", "d", 1).in_data_center("us-east-1a");
        let err = adapter(transport).create(&options).await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(err.code(), Some("InvalidVolume.NotFound"));
    }

    #[tokio::test]
    async fn test_tagging_failure_still_returns_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_xml(CREATED)
            .push_error(ProviderError::new("InvalidParameterValue", "bad tag"));
        let options = VolumeCreateOptions::new("d", "d", 1).in_data_center("us-east-1a");
        assert_eq!(adapter(transport).create(&options).await.unwrap(), "vol-new");
    }

    #[tokio::test]
    async fn test_get_nonexistent_is_absent() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_error(ProviderError::new("InvalidVolume.NotFound", "The volume 'vol-x' does not exist."));
        assert_eq!(adapter(transport).get("vol-x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_matches_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(
            "<DescribeVolumesResponse><volumeSet>\
             <item><volumeId>vol-other</volumeId></item>\
             <item><volumeId>vol-1</volumeId><size>8</size></item>\
             </volumeSet></DescribeVolumesResponse>",
        );
        let v = adapter(transport.clone()).get("vol-1").await.unwrap().unwrap();
        assert_eq!(v.size_gb, Some(8));
        assert_eq!(transport.requests()[0].get("VolumeId.1"), Some("vol-1"));
    }

    #[tokio::test]
    async fn test_list_skips_elements_without_id() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(
            "<DescribeVolumesResponse><volumeSet>\
             <item><volumeId>vol-1</volumeId></item>\
             <item><size>8</size></item>\
             <item><volumeId>vol-3</volumeId></item>\
             </volumeSet></DescribeVolumesResponse>",
        );
        let ids: Vec<String> = adapter(transport).list(None).await.unwrap().into_iter().map(|v| v.id).collect();
        assert_eq!(ids, vec!["vol-1", "vol-3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_waits_for_server() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_xml("<R><instancesSet><item><instanceId>i-1</instanceId><instanceState><name>pending</name></instanceState></item></instancesSet></R>")
            .push_xml("<R><instancesSet><item><instanceId>i-1</instanceId><instanceState><name>running</name></instanceState></item></instancesSet></R>")
            .push_xml("<AttachVolumeResponse><status>attaching</status></AttachVolumeResponse>");

        adapter(transport.clone()).attach("vol-1", "i-1", "/dev/sdf").await.unwrap();
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        let attach = &requests[2];
        assert_eq!(attach.action(), "AttachVolume");
        assert_eq!(attach.get("Device"), Some("/dev/sdf"));
    }

    #[tokio::test]
    async fn test_detach_force_flag() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_xml("<DetachVolumeResponse><status>detaching</status></DetachVolumeResponse>")
            .push_xml("<DetachVolumeResponse><status>detaching</status></DetachVolumeResponse>");
        let adapter = adapter(transport.clone());
        adapter.detach("vol-1", false).await.unwrap();
        adapter.detach("vol-1", true).await.unwrap();
        assert_eq!(transport.requests()[0].get("Force"), None);
        assert_eq!(transport.requests()[1].get("Force"), Some("true"));
    }

    #[tokio::test]
    async fn test_remove() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_error(ProviderError::new("InvalidVolume.NotFound", "gone"))
            .push_xml("<DeleteVolumeResponse><return>false</return></DeleteVolumeResponse>");
        let adapter = adapter(transport);
        adapter.remove("vol-gone").await.unwrap();
        let err = adapter.remove("vol-busy").await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Denied);
        assert!(err.to_string().contains("vol-busy"));
    }

    #[tokio::test]
    async fn test_malformed_id_is_absent_only_for_get() {
        let rejected = || ProviderError::new("InvalidParameterValue", "Value (not-a-volume) for parameter volumeId is invalid");
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_error(rejected())
            .push_error(rejected())
            .push_error(ProviderError::new("InvalidParameterValue", "The filter 'availability-zone' value 'bogus' is invalid"));
        let adapter = adapter(transport);

        assert_eq!(adapter.get("not-a-volume").await.unwrap(), None);

        let err = adapter.remove("not-a-volume").await.unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
        assert_eq!(err.code(), Some("InvalidParameterValue"));

        let err = adapter
            .list(Some(&VolumeFilter::new().in_data_center("bogus")))
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
    }

    #[tokio::test]
    async fn test_remove_tags_over_many_ids() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml("<DeleteTagsResponse><return>true</return></DeleteTagsResponse>");
        adapter(transport.clone())
            .remove_tags(&["vol-1", "vol-2"], &[("env", None), ("team", Some("edge"))])
            .await
            .unwrap();
        let req = &transport.requests()[0];
        assert_eq!(req.action(), "DeleteTags");
        assert_eq!(req.get("ResourceId.2"), Some("vol-2"));
        assert_eq!(req.get("Tag.1.Value"), None);
        assert_eq!(req.get("Tag.2.Value"), Some("edge"));
    }

    #[tokio::test]
    async fn test_list_status() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(
            "<DescribeVolumesResponse><volumeSet>\
             <item><volumeId>vol-1</volumeId><status>available</status></item>\
             <item><volumeId>vol-2</volumeId><status>deleting</status></item>\
             </volumeSet></DescribeVolumesResponse>",
        );
        let statuses = adapter(transport).list_status().await.unwrap();
        assert_eq!(
            statuses,
            vec![
                ResourceStatus::new("vol-1", VolumeState::Available),
                ResourceStatus::new("vol-2", VolumeState::Deleted),
            ]
        );
    }
}
