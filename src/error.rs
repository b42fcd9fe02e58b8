//! Error classification
//!
//! Provider faults are sorted into a small set of outcome classes. The
//! class decides what an adapter does: absorb (NotFound), refuse
//! (Denied), hand back to the caller for a possible retry (Transient), or
//! stop (Fatal). Unsupported is raised before any request is made.

use crate::provider::ProviderError;
use crate::resource::registry::{get_registry, resource_def, ResourceKind};

pub type Result<T> = std::result::Result<T, AdapterError>;

/// Outcome class of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    NotFound,
    Denied,
    Transient,
    Fatal,
    Unsupported,
}

/// Shape of the call that failed; the same code means different things
/// for a lookup and for a create
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStyle {
    /// list / status / attribute reads
    Lookup,
    /// single resource by id; also absorbs the kind's get-only rules
    Get,
    /// delete-style; a missing resource is already gone
    Remove,
    /// attach, detach, tag, update
    Mutate,
    /// create / allocate / import
    Create,
}

/// Classify a provider fault for a call on `kind`
pub fn classify(kind: ResourceKind, style: CallStyle, err: &ProviderError) -> ErrorClass {
    let registry = get_registry();

    if registry.transient_codes.iter().any(|c| *c == err.code) || err.status.is_some_and(|s| s >= 500) {
        return ErrorClass::Transient;
    }
    if registry.denied_codes.iter().any(|c| *c == err.code) {
        return ErrorClass::Denied;
    }

    let not_found = resource_def(kind)
        .map(|def| def.is_not_found(err, style == CallStyle::Get))
        .unwrap_or(false);
    if not_found {
        return match style {
            CallStyle::Lookup | CallStyle::Get | CallStyle::Remove => ErrorClass::NotFound,
            CallStyle::Mutate | CallStyle::Create => ErrorClass::Fatal,
        };
    }

    ErrorClass::Fatal
}

fn code_suffix(code: &Option<String>) -> String {
    code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default()
}

/// Failure surfaced to callers of the adapter
#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    #[error("{operation} {resource}: refused by the provider{}", code_suffix(.code))]
    Denied {
        operation: String,
        resource: String,
        code: Option<String>,
    },
    #[error("{operation} {resource}: {message}{}", code_suffix(.code))]
    Fatal {
        operation: String,
        resource: String,
        message: String,
        code: Option<String>,
    },
    #[error("{operation} {resource}: temporary provider failure: {source}")]
    Transient {
        operation: String,
        resource: String,
        #[source]
        source: ProviderError,
    },
    #[error("{operation}: not supported: {reason}")]
    Unsupported { operation: String, reason: String },
}

impl AdapterError {
    pub fn fatal(operation: &str, resource: &str, message: impl Into<String>) -> Self {
        Self::Fatal {
            operation: operation.to_string(),
            resource: resource.to_string(),
            message: message.into(),
            code: None,
        }
    }

    pub fn denied(operation: &str, resource: &str) -> Self {
        Self::Denied {
            operation: operation.to_string(),
            resource: resource.to_string(),
            code: None,
        }
    }

    pub fn unsupported(operation: &str, reason: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Wrap a provider fault that has already been classified. NotFound
    /// only reaches here when the caller chose not to absorb it.
    pub fn from_provider(operation: &str, resource: &str, class: ErrorClass, err: ProviderError) -> Self {
        match class {
            ErrorClass::Transient => Self::Transient {
                operation: operation.to_string(),
                resource: resource.to_string(),
                source: err,
            },
            ErrorClass::Denied => Self::Denied {
                operation: operation.to_string(),
                resource: resource.to_string(),
                code: Some(err.code),
            },
            ErrorClass::Unsupported => Self::Unsupported {
                operation: operation.to_string(),
                reason: err.message,
            },
            ErrorClass::NotFound | ErrorClass::Fatal => Self::Fatal {
                operation: operation.to_string(),
                resource: resource.to_string(),
                message: err.message,
                code: Some(err.code),
            },
        }
    }

    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Denied { .. } => ErrorClass::Denied,
            Self::Fatal { .. } => ErrorClass::Fatal,
            Self::Transient { .. } => ErrorClass::Transient,
            Self::Unsupported { .. } => ErrorClass::Unsupported,
        }
    }

    pub fn operation(&self) -> &str {
        match self {
            Self::Denied { operation, .. }
            | Self::Fatal { operation, .. }
            | Self::Transient { operation, .. }
            | Self::Unsupported { operation, .. } => operation,
        }
    }

    /// Provider diagnostic code, when the failure came from the provider
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Denied { code, .. } | Self::Fatal { code, .. } => code.as_deref(),
            Self::Transient { source, .. } => Some(&source.code),
            Self::Unsupported { .. } => None,
        }
    }
}
