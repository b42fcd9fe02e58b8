//! Tag and dimension sets

use crate::query::xml::ResponseNode;
use crate::resource::model::Tags;

/// `tagSet/item/{key,value}`; items without a key are dropped and a
/// missing value is stored as empty
pub fn tag_set(node: &ResponseNode) -> Tags {
    pairs(node, "item", "key", "value")
}

/// `Dimensions/member/{Name,Value}`
pub fn dimensions(node: &ResponseNode) -> Tags {
    pairs(node, "member", "Name", "Value")
}

/// `<List><member>text</member>...</List>`
pub fn members(node: &ResponseNode) -> Vec<String> {
    node.children_named("member")
        .filter_map(|m| m.text())
        .map(|s| s.to_string())
        .collect()
}

fn pairs(node: &ResponseNode, item: &str, key: &str, value: &str) -> Tags {
    node.children()
        .iter()
        .filter(|c| c.is_named(item))
        .filter_map(|entry| {
            let key = entry.child_text(key)?;
            let value = entry.child_text(value).unwrap_or_default();
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}
