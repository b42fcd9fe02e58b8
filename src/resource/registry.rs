//! Resource Registry - Load resource kind definitions from JSON
//!
//! Each resource kind is described by a capability record: the service it
//! lives on, the provider action for every operation, where list elements
//! sit in a response, the continuation token field, and which provider
//! codes mean "no such resource".

use crate::error::AdapterError;
use crate::provider::ProviderError;
use crate::query::params::Service;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Embedded resource JSON files (compiled into the binary)
const RESOURCE_FILES: &[&str] = &[include_str!("../resources/kinds.json")];

/// Resource kinds known to the adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Volume,
    Address,
    Alarm,
    Metric,
    Keypair,
    Server,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        Self::Volume,
        Self::Address,
        Self::Alarm,
        Self::Metric,
        Self::Keypair,
        Self::Server,
    ];

    /// Key in the registry JSON
    pub fn key(&self) -> &'static str {
        match self {
            Self::Volume => "volume",
            Self::Address => "address",
            Self::Alarm => "alarm",
            Self::Metric => "metric",
            Self::Keypair => "keypair",
            Self::Server => "server",
        }
    }

    /// Prefix of operation names in logs and errors, e.g. `Volume.attach`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Volume => "Volume",
            Self::Address => "IpAddress",
            Self::Alarm => "Alarm",
            Self::Metric => "Metric",
            Self::Keypair => "Keypair",
            Self::Server => "Server",
        }
    }

    /// Operation name used in logs and errors
    pub fn operation(&self, op: Operation) -> String {
        format!("{}.{}", self.label(), op.key())
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Abstract operation, mapped per kind to a provider action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Import,
    Update,
    Remove,
    Attach,
    Detach,
    Enable,
    Disable,
    Tag,
    Untag,
}

impl Operation {
    pub fn key(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Get => "get",
            Self::Create => "create",
            Self::Import => "import",
            Self::Update => "update",
            Self::Remove => "remove",
            Self::Attach => "attach",
            Self::Detach => "detach",
            Self::Enable => "enable",
            Self::Disable => "disable",
            Self::Tag => "tag",
            Self::Untag => "untag",
        }
    }
}

/// One "not found" rule; every field that is set must match
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CodeMatch {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub code_prefix: Option<String>,
    #[serde(default)]
    pub message_contains: Option<String>,
    #[serde(default)]
    pub message_prefix: Option<String>,
    /// Only means "absent" for a single-resource get
    #[serde(default)]
    pub get_only: bool,
}

impl CodeMatch {
    pub fn matches(&self, err: &ProviderError) -> bool {
        let checks = [
            self.code.as_ref().map(|c| err.code == *c),
            self.code_prefix.as_ref().map(|p| err.code.starts_with(p.as_str())),
            self.message_contains.as_ref().map(|m| err.message.contains(m.as_str())),
            self.message_prefix.as_ref().map(|p| err.message.starts_with(p.as_str())),
        ];
        let mut any = false;
        for check in checks.into_iter().flatten() {
            if !check {
                return false;
            }
            any = true;
        }
        any
    }
}

/// Resource definition from JSON
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDef {
    pub display_name: String,
    pub service: Service,
    /// `container.item`, e.g. `volumeSet.item`
    pub response_path: String,
    /// Continuation token element; absent when the listing is single-page
    #[serde(default)]
    pub token_field: Option<String>,
    #[serde(default)]
    pub not_found: Vec<CodeMatch>,
    #[serde(default)]
    pub actions: HashMap<String, String>,
}

impl ResourceDef {
    /// Split `response_path` into (container, item)
    pub fn element_path(&self) -> (&str, &str) {
        match self.response_path.split_once('.') {
            Some((container, item)) => (container, item),
            None => (self.response_path.as_str(), "item"),
        }
    }

    /// Whether `err` reports the resource missing; `single_get` enables
    /// the get-only rules
    pub fn is_not_found(&self, err: &ProviderError, single_get: bool) -> bool {
        self.not_found
            .iter()
            .any(|m| (single_get || !m.get_only) && m.matches(err))
    }
}

/// Root structure of resources/*.json
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ResourceConfig {
    #[serde(default)]
    pub transient_codes: Vec<String>,
    #[serde(default)]
    pub denied_codes: Vec<String>,
    #[serde(default)]
    pub resources: HashMap<String, ResourceDef>,
}

/// Global registry loaded from JSON
static REGISTRY: OnceLock<ResourceConfig> = OnceLock::new();

/// Get the resource registry (loads from embedded JSON on first access)
pub fn get_registry() -> &'static ResourceConfig {
    REGISTRY.get_or_init(|| {
        let mut final_config = ResourceConfig::default();

        for content in RESOURCE_FILES {
            let partial: ResourceConfig = serde_json::from_str(content)
                .unwrap_or_else(|e| panic!("Failed to parse embedded resource JSON: {}", e));
            final_config.transient_codes.extend(partial.transient_codes);
            final_config.denied_codes.extend(partial.denied_codes);
            final_config.resources.extend(partial.resources);
        }

        final_config
    })
}

/// Get the definition of a resource kind
pub fn get_resource(kind: ResourceKind) -> Option<&'static ResourceDef> {
    get_registry().resources.get(kind.key())
}

/// Definition of a kind, as an adapter error when missing
pub fn resource_def(kind: ResourceKind) -> Result<&'static ResourceDef, AdapterError> {
    get_resource(kind).ok_or_else(|| {
        AdapterError::unsupported(kind.key(), &format!("no definition for resource kind '{}'", kind))
    })
}

/// Provider action for `op` on `kind`; unknown combinations are unsupported
pub fn action(kind: ResourceKind, op: Operation) -> Result<&'static str, AdapterError> {
    resource_def(kind)?
        .actions
        .get(op.key())
        .map(|s| s.as_str())
        .ok_or_else(|| {
            AdapterError::unsupported(
                &kind.operation(op),
                &format!("{} does not support '{}'", kind, op.key()),
            )
        })
}
