//! Keypair decoder (`keySet/item`, and the bare create/import answers)

use super::{apply_fields, text, DecodeError, FieldHandler};
use crate::provider::RequestContext;
use crate::query::xml::ResponseNode;
use crate::resource::model::Keypair;

#[derive(Debug, Default)]
struct Draft {
    name: Option<String>,
    fingerprint: Option<String>,
    material: Option<String>,
}

const FIELDS: &[(&str, FieldHandler<Draft>)] = &[
    ("keyName", |d, n| {
        d.name = text(n);
        Ok(())
    }),
    ("keyFingerprint", |d, n| {
        d.fingerprint = text(n);
        Ok(())
    }),
    ("keyMaterial", |d, n| {
        d.material = text(n);
        Ok(())
    }),
];

/// Decode one keypair; both name and fingerprint are required for a
/// usable entry. Owner and region come from the request context.
pub fn decode(node: &ResponseNode, context: &RequestContext) -> Result<Option<Keypair>, DecodeError> {
    let mut d = Draft::default();
    apply_fields(FIELDS, &mut d, node)?;

    let (Some(name), Some(fingerprint)) = (d.name, d.fingerprint) else {
        return Ok(None);
    };
    Ok(Some(Keypair {
        id: name.clone(),
        name,
        fingerprint,
        owner: context.account.clone(),
        region: context.region.clone(),
        private_key: d.material,
    }))
}
