//! Dependent server probe
//!
//! Reads the lifecycle state of one server so attach-style operations can
//! wait for it to become actionable.

use super::adapter::{KindSpec, ResourceAdapter};
use super::decode::server;
use super::model::{ResourceStatus, ServerState};
use super::registry::{Operation, ResourceKind};
use crate::error::Result;
use crate::provider::QueryClient;
use crate::query::wait::{wait_for_state, Readiness, WaitPolicy};

/// Readiness of a server for attach/assign
pub fn actionable(state: &ServerState) -> Readiness {
    match state {
        ServerState::Running | ServerState::Stopped => Readiness::Ready,
        ServerState::ShuttingDown | ServerState::Terminated => Readiness::Terminal,
        ServerState::Pending | ServerState::Stopping => Readiness::Pending,
    }
}

#[derive(Clone)]
pub struct ServerProbe {
    inner: ResourceAdapter<ResourceStatus<ServerState>>,
}

impl ServerProbe {
    pub fn new(client: QueryClient) -> Self {
        Self {
            inner: ResourceAdapter::new(
                client,
                KindSpec {
                    kind: ResourceKind::Server,
                    decode: server::decode_status,
                },
            ),
        }
    }

    /// Current state, `None` when the server does not exist
    pub async fn state(&self, server_id: &str) -> Result<Option<ServerState>> {
        let request = self
            .inner
            .request(Operation::Get)?
            .param("InstanceId.1", server_id)
            .build();
        let status = self.inner.get(server_id, request, |s| s.id == server_id).await?;
        Ok(status.map(|s| s.state))
    }

    /// Block until the server is running or stopped
    pub async fn wait_until_actionable(&self, operation: &str, server_id: &str, policy: WaitPolicy) -> Result<ServerState> {
        wait_for_state(operation, server_id, policy, || self.state(server_id), actionable).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorClass;
    use crate::provider::{ProviderError, RequestContext, ScriptedTransport};
    use std::sync::Arc;
    use std::time::Duration;

    fn instance(state: &str) -> String {
        format!(
            "<DescribeInstancesResponse><reservationSet><item><instancesSet><item>\
             <instanceId>i-1</instanceId><instanceState><name>{}</name></instanceState>\
             </item></instancesSet></item></reservationSet></DescribeInstancesResponse>",
            state
        )
    }

    fn probe(transport: Arc<ScriptedTransport>) -> ServerProbe {
        ServerProbe::new(QueryClient::new(transport, RequestContext::new("us-east-1", "123")))
    }

    #[tokio::test]
    async fn test_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(&instance("stopped"));
        assert_eq!(probe(transport.clone()).state("i-1").await.unwrap(), Some(ServerState::Stopped));
        assert_eq!(transport.requests()[0].get("InstanceId.1"), Some("i-1"));
    }

    #[tokio::test]
    async fn test_missing_instance_is_absent() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_error(ProviderError::new("InvalidInstanceID.NotFound", "gone"));
        assert_eq!(probe(transport).state("i-1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_polls_until_running() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_xml(&instance("pending"))
            .push_error(ProviderError::new("RequestLimitExceeded", "slow down"))
            .push_xml(&instance("running"));

        let start = tokio::time::Instant::now();
        let state = probe(transport.clone())
            .wait_until_actionable("Volume.attach", "i-1", WaitPolicy::default())
            .await
            .unwrap();
        assert_eq!(state, ServerState::Running);
        assert_eq!(start.elapsed(), Duration::from_secs(40));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_aborts_on_termination() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_xml(&instance("shutting-down"));
        let err = probe(transport)
            .wait_until_actionable("IpAddress.attach", "i-1", WaitPolicy::default())
            .await
            .unwrap_err();
        assert_eq!(err.class(), ErrorClass::Fatal);
    }

    #[test]
    fn test_actionable_states() {
        assert_eq!(actionable(&ServerState::Running), Readiness::Ready);
        assert_eq!(actionable(&ServerState::Stopped), Readiness::Ready);
        assert_eq!(actionable(&ServerState::Stopping), Readiness::Pending);
        assert_eq!(actionable(&ServerState::Terminated), Readiness::Terminal);
    }
}
