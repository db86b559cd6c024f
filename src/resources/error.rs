use std::fmt;

use thiserror::Error;

use crate::kubernetes::model::{ClusterError, ObjectKey};
use crate::resources::request::{ResourceKind, VALID_KINDS};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Create,
    Get,
    Update,
    Delete,
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Verb::Create => "create",
            Verb::Get => "get",
            Verb::Update => "update",
            Verb::Delete => "delete",
        };
        f.write_str(verb)
    }
}

/// A request that cannot be turned into a cluster call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field '{field}' is required for kind '{kind}'")]
    MissingField { kind: &'static str, field: &'static str },

    #[error("unknown kind '{0}', valid kinds are: {}", VALID_KINDS.join(", "))]
    UnknownKind(String),

    #[error("replica count cannot be negative, got {0}")]
    NegativeReplicas(i32),

    #[error("field '{field}' must be a port between 1 and 65535, got {value}")]
    InvalidPort { field: &'static str, value: i32 },
}

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{kind} '{name}' not found in namespace '{namespace}'")]
    NotFound {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("{kind} '{name}' in namespace '{namespace}' was modified concurrently, update rejected")]
    Conflict {
        kind: ResourceKind,
        namespace: String,
        name: String,
    },

    #[error("deployment '{name}' in namespace '{namespace}' has no containers")]
    NoContainers { namespace: String, name: String },

    #[error("failed to list {kind} objects: {source}")]
    List {
        kind: ResourceKind,
        source: ClusterError,
    },

    #[error("failed to {verb} {kind} '{name}': {source}")]
    Call {
        verb: Verb,
        kind: ResourceKind,
        name: String,
        source: ClusterError,
    },
}

impl ResourceError {
    /// Wraps a failed cluster call with the verb and the object it targeted.
    ///
    /// Missing objects on reads, updates and deletes become [`ResourceError::NotFound`];
    /// version clashes on updates become [`ResourceError::Conflict`].
    pub fn from_call(
        verb: Verb,
        kind: ResourceKind,
        key: &ObjectKey,
        source: ClusterError,
    ) -> ResourceError {
        match source {
            ClusterError::NotFound(_) if verb != Verb::Create => ResourceError::NotFound {
                kind,
                namespace: key.namespace.clone(),
                name: key.name.clone(),
            },
            ClusterError::Conflict(..) if verb == Verb::Update => ResourceError::Conflict {
                kind,
                namespace: key.namespace.clone(),
                name: key.name.clone(),
            },
            source => ResourceError::Call {
                verb,
                kind,
                name: key.name.clone(),
                source,
            },
        }
    }
}
