//! Server state decoder (`instancesSet/item`), used only by the
//! pre-condition wait

use super::DecodeError;
use crate::provider::RequestContext;
use crate::query::xml::ResponseNode;
use crate::resource::model::{ResourceStatus, ServerState};

/// `(instance id, state)` from `instanceId` and `instanceState/name`
pub fn decode_status(node: &ResponseNode, _context: &RequestContext) -> Result<Option<ResourceStatus<ServerState>>, DecodeError> {
    let Some(id) = node.child_text("instanceId") else {
        return Ok(None);
    };
    let state = node
        .child("instanceState")
        .and_then(|s| s.child_text("name"))
        .map(ServerState::from_provider)
        .unwrap_or(ServerState::Pending);
    Ok(Some(ResourceStatus::new(id, state)))
}
