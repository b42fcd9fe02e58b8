//! Elastic address decoder (`addressesSet/item`)

use super::{apply_fields, tags, text, DecodeError, FieldHandler};
use crate::provider::{Dialect, RequestContext};
use crate::query::address::AddressRef;
use crate::query::xml::ResponseNode;
use crate::resource::model::{AddressType, IpAddress, IpVersion, ResourceStatus, Tags};

#[derive(Debug, Default)]
struct Draft {
    public_ip: Option<String>,
    private_ip: Option<String>,
    allocation_id: Option<String>,
    association_id: Option<String>,
    network_interface_id: Option<String>,
    instance_id: Option<String>,
    for_vlan: bool,
    tags: Tags,
}

const FIELDS: &[(&str, FieldHandler<Draft>)] = &[
    ("publicIp", |d, n| {
        d.public_ip = text(n);
        Ok(())
    }),
    ("privateIpAddress", |d, n| {
        d.private_ip = text(n);
        Ok(())
    }),
    ("allocationId", |d, n| {
        d.allocation_id = text(n);
        Ok(())
    }),
    ("associationId", |d, n| {
        d.association_id = text(n);
        Ok(())
    }),
    ("networkInterfaceId", |d, n| {
        d.network_interface_id = text(n);
        Ok(())
    }),
    ("instanceId", |d, n| {
        d.instance_id = text(n).filter(|s| !s.is_empty());
        Ok(())
    }),
    ("domain", |d, n| {
        d.for_vlan = n.text().is_some_and(|s| s.eq_ignore_ascii_case("vpc"));
        Ok(())
    }),
    ("tagSet", |d, n| {
        d.tags = tags::tag_set(n);
        Ok(())
    }),
];

/// Eucalyptus reports unassigned addresses as `available (...)` and
/// assigned ones as `i-xxxx (owner)`
fn normalize_instance(instance_id: String, dialect: Dialect) -> Option<String> {
    if dialect != Dialect::Eucalyptus {
        return Some(instance_id);
    }
    if instance_id.starts_with("available") {
        return None;
    }
    match instance_id.find(' ') {
        Some(idx) if idx > 0 => Some(instance_id[..idx].to_string()),
        _ => Some(instance_id),
    }
}

/// Decode one address element. An element without `publicIp` is a
/// malformed answer, not a skippable one.
pub fn decode(node: &ResponseNode, context: &RequestContext) -> Result<Option<IpAddress>, DecodeError> {
    let mut draft = Draft::default();
    apply_fields(FIELDS, &mut draft, node)?;

    let Some(address) = draft.public_ip else {
        return Err(DecodeError::Missing("publicIp".to_string()));
    };

    let version = match AddressRef::classify(&address) {
        AddressRef::V6(..) => IpVersion::V6,
        _ => IpVersion::V4,
    };

    Ok(Some(IpAddress {
        id: draft.allocation_id.unwrap_or_else(|| address.clone()),
        region: context.region.clone(),
        address,
        private_address: draft.private_ip,
        version,
        address_type: AddressType::Public,
        for_vlan: draft.for_vlan,
        association_id: draft.association_id,
        network_interface_id: draft.network_interface_id,
        server_id: draft.instance_id.and_then(|id| normalize_instance(id, context.dialect)),
        tags: draft.tags,
    }))
}

/// `(id, available)`: available means bound to neither a server nor a
/// network interface
pub fn decode_status(node: &ResponseNode, context: &RequestContext) -> Result<Option<ResourceStatus<bool>>, DecodeError> {
    let mut draft = Draft::default();
    apply_fields(FIELDS, &mut draft, node)?;

    let instance = draft.instance_id.and_then(|id| normalize_instance(id, context.dialect));
    let available = instance.is_none() && draft.network_interface_id.is_none();

    Ok(draft
        .allocation_id
        .or(draft.public_ip)
        .map(|id| ResourceStatus::new(id, available)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VPC: &str = "<item>\
        <publicIp>203.0.113.25</publicIp>\
        <allocationId>eipalloc-08229861</allocationId>\
        <domain>vpc</domain>\
        <instanceId>i-0598c7d356eba48d7</instanceId>\
        <associationId>eipassoc-f0229899</associationId>\
        <networkInterfaceId>eni-ef229886</networkInterfaceId>\
        <networkInterfaceOwnerId>053230519467</networkInterfaceOwnerId>\
        <privateIpAddress>10.0.0.228</privateIpAddress>\
        <tagSet><item><key>team</key><value>edge</value></item></tagSet>\
        </item>";

    fn ctx(dialect: Dialect) -> RequestContext {
        RequestContext::new("us-west-2", "123").with_dialect(dialect)
    }

    fn decode_xml(xml: &str, dialect: Dialect) -> Result<Option<IpAddress>, DecodeError> {
        decode(&ResponseNode::parse(xml).unwrap(), &ctx(dialect))
    }

    #[test]
    fn test_every_field_is_mapped() {
        let a = decode_xml(VPC, Dialect::Aws).unwrap().unwrap();
        assert_eq!(a.id, "eipalloc-08229861");
        assert_eq!(a.address, "203.0.113.25");
        assert_eq!(a.private_address.as_deref(), Some("10.0.0.228"));
        assert!(a.for_vlan);
        assert_eq!(a.server_id.as_deref(), Some("i-0598c7d356eba48d7"));
        assert_eq!(a.association_id.as_deref(), Some("eipassoc-f0229899"));
        assert_eq!(a.network_interface_id.as_deref(), Some("eni-ef229886"));
        assert_eq!(a.version, IpVersion::V4);
        assert_eq!(a.address_type, AddressType::Public);
        assert_eq!(a.region, "us-west-2");
        assert_eq!(a.tags["team"], "edge");
        assert!(a.is_assigned());
    }

    #[test]
    fn test_handler_table_names() {
        let names: Vec<&str> = FIELDS.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "publicIp",
                "privateIpAddress",
                "allocationId",
                "associationId",
                "networkInterfaceId",
                "instanceId",
                "domain",
                "tagSet",
            ]
        );
    }

    #[test]
    fn test_classic_address_uses_literal_as_id() {
        let a = decode_xml("<item><publicIp>198.51.100.7</publicIp><domain>standard</domain><instanceId/></item>", Dialect::Aws)
            .unwrap()
            .unwrap();
        assert_eq!(a.id, "198.51.100.7");
        assert!(!a.for_vlan);
        assert_eq!(a.server_id, None);
        assert!(!a.is_assigned());
    }

    #[test]
    fn test_missing_public_ip_is_an_error() {
        let err = decode_xml("<item><allocationId>eipalloc-1</allocationId></item>", Dialect::Aws).unwrap_err();
        assert_eq!(err, DecodeError::Missing("publicIp".into()));
    }

    #[test]
    fn test_eucalyptus_instance_normalization() {
        let assigned = "<item><publicIp>10.1.1.1</publicIp><instanceId>i-12345678 (admin)</instanceId></item>";
        let free = "<item><publicIp>10.1.1.2</publicIp><instanceId>available (admin)</instanceId></item>";

        let a = decode_xml(assigned, Dialect::Eucalyptus).unwrap().unwrap();
        assert_eq!(a.server_id.as_deref(), Some("i-12345678"));
        let b = decode_xml(free, Dialect::Eucalyptus).unwrap().unwrap();
        assert_eq!(b.server_id, None);

        // Other dialects keep the value untouched
        let c = decode_xml(assigned, Dialect::Aws).unwrap().unwrap();
        assert_eq!(c.server_id.as_deref(), Some("i-12345678 (admin)"));
    }

    #[test]
    fn test_status() {
        let node = ResponseNode::parse(VPC).unwrap();
        let status = decode_status(&node, &ctx(Dialect::Aws)).unwrap().unwrap();
        assert_eq!(status, ResourceStatus::new("eipalloc-08229861", false));

        let node = ResponseNode::parse("<item><publicIp>198.51.100.7</publicIp></item>").unwrap();
        let status = decode_status(&node, &ctx(Dialect::Aws)).unwrap().unwrap();
        assert_eq!(status, ResourceStatus::new("198.51.100.7", true));

        let node = ResponseNode::parse("<item><domain>vpc</domain></item>").unwrap();
        assert_eq!(decode_status(&node, &ctx(Dialect::Aws)).unwrap(), None);
    }
}
