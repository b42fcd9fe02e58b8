//! Elastic address adapter
//!
//! Addresses are referenced either by their literal (classic) or by an
//! allocation id (pool). Every operation classifies the reference with
//! [`AddressRef`] first and routes to the matching parameter keys.

use super::adapter::{KindSpec, ResourceAdapter};
use super::decode::address;
use super::filter::{AddressFilter, FilterOptions};
use super::model::{AddressType, IpAddress, IpVersion, ResourceStatus};
use super::registry::{Operation, ResourceKind};
use super::servers::ServerProbe;
use crate::error::{AdapterError, CallStyle, Result};
use crate::provider::QueryClient;
use crate::query::address::{AddressRef, MatchField};
use crate::query::executor::{FanOutExecutor, TaskHandle};
use crate::query::wait::WaitPolicy;
use crate::query::xml::ResponseNode;
use serde::Serialize;

/// Port forwarding rule. Never produced by this provider; kept so callers
/// get a typed empty listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardingRule {
    pub address: String,
    pub public_port: u16,
    pub private_port: u16,
    pub server_id: String,
}

#[derive(Clone)]
pub struct AddressAdapter {
    inner: ResourceAdapter<IpAddress>,
    servers: ServerProbe,
    wait: WaitPolicy,
}

impl AddressAdapter {
    pub fn new(client: QueryClient) -> Self {
        Self {
            servers: ServerProbe::new(client.clone()),
            inner: ResourceAdapter::new(
                client,
                KindSpec {
                    kind: ResourceKind::Address,
                    decode: address::decode,
                },
            ),
            wait: WaitPolicy::default(),
        }
    }

    pub fn with_wait_policy(mut self, wait: WaitPolicy) -> Self {
        self.wait = wait;
        self
    }

    fn named(&self, op: &str) -> String {
        format!("{}.{}", ResourceKind::Address.label(), op)
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Allocate an address of the given type; only public addresses exist
    pub async fn request(&self, address_type: AddressType) -> Result<String> {
        if address_type != AddressType::Public {
            return Err(AdapterError::unsupported(
                &self.inner.operation(Operation::Create),
                "only public addresses can be requested",
            ));
        }
        self.request_version(IpVersion::V4).await
    }

    /// Allocate a classic address. Returns the allocation id when the
    /// provider reports one, otherwise the literal.
    pub async fn request_version(&self, version: IpVersion) -> Result<String> {
        if version != IpVersion::V4 {
            return Err(AdapterError::unsupported(
                &self.inner.operation(Operation::Create),
                "only IPv4 addresses can be requested",
            ));
        }
        let request = self.inner.request(Operation::Create)?.build();
        let doc = self.allocate(request).await?;
        doc.find_text("allocationId")
            .or_else(|| doc.find_text("publicIp"))
            .map(|s| s.to_string())
            .ok_or_else(|| AdapterError::fatal(&self.inner.operation(Operation::Create), "", "no address in response"))
    }

    /// Allocate an address in the VPC domain
    pub async fn request_for_vlan(&self, version: IpVersion) -> Result<String> {
        let operation = self.inner.operation(Operation::Create);
        if version != IpVersion::V4 {
            return Err(AdapterError::unsupported(&operation, "only IPv4 addresses can be requested"));
        }
        let request = self.inner.request(Operation::Create)?.param("Domain", "vpc").build();
        let doc = self.allocate(request).await?;
        doc.find_text("allocationId")
            .map(|s| s.to_string())
            .ok_or_else(|| AdapterError::fatal(&operation, "", "no allocation id in response"))
    }

    /// Allocation into a specific VLAN is not available
    pub async fn request_for_vlan_id(&self, _version: IpVersion, vlan_id: &str) -> Result<String> {
        Err(AdapterError::unsupported(
            &self.inner.operation(Operation::Create),
            &format!("cannot request an address for VLAN {}", vlan_id),
        ))
    }

    async fn allocate(&self, request: crate::query::params::RequestDescriptor) -> Result<ResponseNode> {
        let operation = self.inner.operation(Operation::Create);
        self.inner
            .execute(Operation::Create, CallStyle::Create, "", request)
            .await?
            .ok_or_else(|| AdapterError::fatal(&operation, "", "empty response"))
    }

    // ========================================================================
    // Association
    // ========================================================================

    /// Associate an address with a server once the server is running or
    /// stopped
    pub async fn assign(&self, address_id: &str, server_id: &str) -> Result<()> {
        let operation = self.inner.operation(Operation::Attach);
        self.servers
            .wait_until_actionable(&operation, server_id, self.wait)
            .await?;

        let address = AddressRef::classify(address_id);
        let request = self
            .inner
            .request(Operation::Attach)?
            .param(address.key(), address.as_str())
            .param("InstanceId", server_id)
            .build();
        self.inner
            .execute(Operation::Attach, CallStyle::Mutate, address_id, request)
            .await
            .map(|_| ())
    }

    /// Associate a pool address with a network interface
    pub async fn assign_to_network_interface(&self, address_id: &str, interface_id: &str) -> Result<()> {
        let address = AddressRef::classify(address_id);
        if address.is_literal() {
            return Err(AdapterError::unsupported(
                &self.inner.operation(Operation::Attach),
                "network interfaces take allocation ids only",
            ));
        }
        let request = self
            .inner
            .request(Operation::Attach)?
            .param("AllocationId", address_id)
            .param("NetworkInterfaceId", interface_id)
            .build();
        self.inner
            .execute(Operation::Attach, CallStyle::Mutate, address_id, request)
            .await
            .map(|_| ())
    }

    /// Disassociate an address from whatever it is bound to. A pool id is
    /// first resolved to its current association.
    pub async fn release_from_server(&self, address_id: &str) -> Result<()> {
        let operation = self.inner.operation(Operation::Detach);
        let address = AddressRef::classify(address_id);

        let value = match &address {
            AddressRef::Pool(_) => {
                let Some(current) = self.get(address_id).await? else {
                    return Err(AdapterError::fatal(&operation, address_id, "address does not exist"));
                };
                let Some(association) = current.association_id else {
                    return Err(AdapterError::fatal(&operation, address_id, "not associated with any server"));
                };
                association
            },
            _ => address.as_str().to_string(),
        };

        let request = self
            .inner
            .request(Operation::Detach)?
            .param(address.disassociate_key(), value)
            .build();
        self.inner
            .execute(Operation::Detach, CallStyle::Mutate, address_id, request)
            .await
            .map(|_| ())
    }

    /// Release the address back to the provider; an address that is
    /// already gone counts as released
    pub async fn release_from_pool(&self, address_id: &str) -> Result<()> {
        let address = AddressRef::classify(address_id);
        let request = self
            .inner
            .request(Operation::Remove)?
            .param(address.key(), address.as_str())
            .build();
        self.inner
            .execute(Operation::Remove, CallStyle::Remove, address_id, request)
            .await
            .map(|_| ())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get(&self, address_id: &str) -> Result<Option<IpAddress>> {
        let address = AddressRef::classify(address_id);
        let request = self
            .inner
            .request(Operation::Get)?
            .param(&address.lookup_key(), address.as_str())
            .build();
        let field = address.match_field();
        self.inner
            .get(address_id, request, |a| match field {
                MatchField::PublicIp => a.address == address_id,
                MatchField::AllocationId => a.id == address_id,
            })
            .await
    }

    pub async fn list(&self, filter: Option<&AddressFilter>) -> Result<Vec<IpAddress>> {
        let mut template = self.inner.request(Operation::List)?;
        if let Some(filter) = filter {
            template = filter.apply_wire(template);
        }
        self.inner.list(template.build(), filter).await
    }

    /// Public pool of one address family
    pub async fn list_pool(&self, version: IpVersion, unassigned_only: bool) -> Result<Vec<IpAddress>> {
        if version != IpVersion::V4 {
            return Ok(Vec::new());
        }
        let filter = if unassigned_only {
            AddressFilter::new().unassigned()
        } else {
            AddressFilter::new()
        };
        self.list(Some(&filter)).await
    }

    /// [`list_pool`](Self::list_pool) on the fan-out executor
    pub fn list_pool_concurrently(
        &self,
        executor: &FanOutExecutor,
        version: IpVersion,
        unassigned_only: bool,
    ) -> TaskHandle<Vec<IpAddress>> {
        let adapter = self.clone();
        executor.submit(&self.named("listPool"), async move {
            adapter.list_pool(version, unassigned_only).await
        })
    }

    /// Private addresses are not managed here
    pub async fn list_private_pool(&self, _unassigned_only: bool) -> Result<Vec<IpAddress>> {
        Ok(Vec::new())
    }

    /// `(id, available)` for every address of the family
    pub async fn list_status(&self, version: IpVersion) -> Result<Vec<ResourceStatus<bool>>> {
        if version != IpVersion::V4 {
            return Ok(Vec::new());
        }
        let template = self.inner.request(Operation::List)?.build();
        self.inner
            .paginate(Operation::List, template, address::decode_status)
            .collect_all()
            .await
    }

    // ========================================================================
    // Forwarding
    // ========================================================================

    pub async fn forward(&self, _address_id: &str, _public_port: u16, _private_port: u16, _server_id: &str) -> Result<String> {
        Err(AdapterError::unsupported(&self.named("forward"), "port forwarding is not available"))
    }

    pub async fn stop_forward(&self, _rule_id: &str) -> Result<()> {
        Err(AdapterError::unsupported(&self.named("stopForward"), "port forwarding is not available"))
    }

    pub async fn list_rules(&self, _address_id: &str) -> Result<Vec<ForwardingRule>> {
        Ok(Vec::new())
    }

    // ========================================================================
    // Tags
    // ========================================================================

    pub async fn update_tags(&self, address_ids: &[&str], tags: &[(&str, &str)]) -> Result<()> {
        self.inner.update_tags(address_ids, tags).await
    }

    pub async fn remove_tags(&self, address_ids: &[&str], tags: &[(&str, Option<&str>)]) -> Result<()> {
        self.inner.remove_tags(address_ids, tags).await
    }
}
