//! Process-wide adapter
//!
//! Owns the query client, the fan-out executor and one adapter per
//! resource kind. Built once at startup; the executor lives as long as
//! the adapter does.

use super::addresses::AddressAdapter;
use super::keypairs::KeypairAdapter;
use super::model::Resource;
use super::monitoring::MonitoringAdapter;
use super::volumes::VolumeAdapter;
use crate::error::{AdapterError, Result};
use crate::provider::QueryClient;
use crate::query::executor::{join_all, FanOutExecutor};
use crate::query::wait::WaitPolicy;

#[derive(Clone)]
pub struct CloudAdapter {
    client: QueryClient,
    executor: FanOutExecutor,
    pub volumes: VolumeAdapter,
    pub addresses: AddressAdapter,
    pub monitoring: MonitoringAdapter,
    pub keypairs: KeypairAdapter,
}

impl CloudAdapter {
    pub fn new(client: QueryClient, executor: FanOutExecutor, wait: WaitPolicy) -> Self {
        Self {
            volumes: VolumeAdapter::new(client.clone()).with_wait_policy(wait),
            addresses: AddressAdapter::new(client.clone()).with_wait_policy(wait),
            monitoring: MonitoringAdapter::new(client.clone()),
            keypairs: KeypairAdapter::new(client.clone()),
            client,
            executor,
        }
    }

    /// Data center used for volume creates that do not name one
    pub fn with_default_data_center(mut self, data_center: &str) -> Self {
        self.volumes = self.volumes.with_default_data_center(data_center);
        self
    }

    pub fn client(&self) -> &QueryClient {
        &self.client
    }

    pub fn executor(&self) -> &FanOutExecutor {
        &self.executor
    }

    /// List volumes, addresses, keypairs and alarms concurrently.
    ///
    /// Every listing is joined even when an earlier one failed; the first
    /// failure in that order is returned with its own classification.
    pub async fn inventory(&self) -> Result<Vec<Resource>> {
        let volumes = self.volumes.clone();
        let addresses = self.addresses.clone();
        let keypairs = self.keypairs.clone();
        let monitoring = self.monitoring.clone();

        let handles = vec![
            self.executor.submit("Volume.list", async move {
                let found = volumes.list(None).await?;
                Ok::<_, AdapterError>(found.into_iter().map(Resource::Volume).collect::<Vec<_>>())
            }),
            self.executor.submit("IpAddress.list", async move {
                let found = addresses.list(None).await?;
                Ok::<_, AdapterError>(found.into_iter().map(Resource::IpAddress).collect::<Vec<_>>())
            }),
            self.executor.submit("Keypair.list", async move {
                let found = keypairs.list(None).await?;
                Ok::<_, AdapterError>(found.into_iter().map(Resource::Keypair).collect::<Vec<_>>())
            }),
            self.executor.submit("Alarm.list", async move {
                let found = monitoring.list_alarms(None).await?;
                Ok::<_, AdapterError>(found.into_iter().map(Resource::Alarm).collect::<Vec<_>>())
            }),
        ];

        let mut resources = Vec::new();
        let mut first_error = None;
        for result in join_all(handles).await {
            match result {
                Ok(batch) => resources.extend(batch),
                Err(e) => {
                    tracing::warn!("inventory listing failed: {}", e);
                    first_error.get_or_insert(e);
                },
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(resources),
        }
    }
}
