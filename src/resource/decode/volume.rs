//! Volume decoder (`volumeSet/item`)

use super::{apply_fields, fixed_timestamp, flag, number, tags, text, DecodeError, FieldHandler};
use crate::provider::RequestContext;
use crate::query::xml::ResponseNode;
use crate::resource::model::{
    Attachment, MediaType, ResourceStatus, Tags, Volume, VolumeFormat, VolumeState,
};
use chrono::{DateTime, Utc};

/// Artifact some providers prepend to device names
const DEVICE_PREFIX: &str = "unknown,requested:";

/// Product id assumed when the provider omits `volumeType`
pub const DEFAULT_PRODUCT: &str = "standard";

#[derive(Debug, Default)]
struct Draft {
    id: Option<String>,
    name: Option<String>,
    description: Option<String>,
    data_center: Option<String>,
    size_gb: Option<u32>,
    iops: Option<u32>,
    product_id: Option<String>,
    snapshot_id: Option<String>,
    state: Option<VolumeState>,
    created: Option<DateTime<Utc>>,
    encrypted: bool,
    attachment: Option<Attachment>,
    tags: Tags,
}

const FIELDS: &[(&str, FieldHandler<Draft>)] = &[
    ("volumeId", |d, n| {
        d.id = text(n);
        Ok(())
    }),
    ("name", |d, n| {
        d.name = text(n);
        Ok(())
    }),
    ("description", |d, n| {
        d.description = text(n);
        Ok(())
    }),
    ("size", |d, n| {
        d.size_gb = number(n)?;
        Ok(())
    }),
    ("snapshotId", |d, n| {
        d.snapshot_id = text(n);
        Ok(())
    }),
    ("availabilityZone", |d, n| {
        d.data_center = text(n);
        Ok(())
    }),
    ("volumeType", |d, n| {
        if let Some(product) = text(n) {
            d.product_id = Some(product);
        }
        Ok(())
    }),
    ("iops", |d, n| {
        d.iops = number(n)?;
        Ok(())
    }),
    ("createTime", |d, n| {
        d.created = fixed_timestamp(n)?;
        Ok(())
    }),
    ("status", |d, n| {
        d.state = n.text().map(VolumeState::from_provider);
        Ok(())
    }),
    ("encrypted", |d, n| {
        d.encrypted = flag(n);
        Ok(())
    }),
    ("tagSet", |d, n| {
        d.tags = tags::tag_set(n);
        Ok(())
    }),
    ("attachmentSet", |d, n| {
        d.attachment = attachment(n);
        Ok(())
    }),
];

/// First attachment item carrying an instance id
fn attachment(set: &ResponseNode) -> Option<Attachment> {
    set.children_named("item").find_map(|item| {
        let server_id = item.child_text("instanceId")?.to_string();
        let device = item.child_text("device").map(|d| d.strip_prefix(DEVICE_PREFIX).unwrap_or(d).to_string());
        Some(Attachment { server_id, device })
    })
}

/// Decode one volume element
pub fn decode(node: &ResponseNode, context: &RequestContext) -> Result<Option<Volume>, DecodeError> {
    let mut draft = Draft::default();
    apply_fields(FIELDS, &mut draft, node)?;

    let Some(id) = draft.id else {
        return Ok(None);
    };

    // Structural fields win; tags only fill what is still unset
    let name = draft
        .name
        .or_else(|| draft.tags.get("Name").cloned())
        .unwrap_or_else(|| id.clone());
    let description = draft
        .description
        .or_else(|| draft.tags.get("Description").cloned())
        .unwrap_or_else(|| name.clone());
    let product_id = draft.product_id.unwrap_or_else(|| DEFAULT_PRODUCT.to_string());

    Ok(Some(Volume {
        media: MediaType::for_product(&product_id),
        id,
        region: context.region.clone(),
        name,
        description,
        data_center: draft.data_center,
        size_gb: draft.size_gb,
        iops: draft.iops,
        product_id,
        format: VolumeFormat::Block,
        snapshot_id: draft.snapshot_id,
        state: draft.state.unwrap_or(VolumeState::Pending),
        created: draft.created,
        encrypted: draft.encrypted,
        attachment: draft.attachment,
        tags: draft.tags,
    }))
}

/// Lightweight status: id plus lifecycle state
pub fn decode_status(node: &ResponseNode, _context: &RequestContext) -> Result<Option<ResourceStatus<VolumeState>>, DecodeError> {
    let Some(id) = node.child_text("volumeId") else {
        return Ok(None);
    };
    let state = node
        .child_text("status")
        .map(VolumeState::from_provider)
        .unwrap_or(VolumeState::Pending);
    Ok(Some(ResourceStatus::new(id, state)))
}
