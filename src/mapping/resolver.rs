//! Resolution of transformer type names to capabilities.
//!
//! Mapping items reference attribute transformers by name. The validator does not
//! know how names are turned into types; it asks a [`CapabilityResolver`]. Two
//! resolvers are provided:
//!
//! - [`TypeRegistry`] - production lookup over registered transformer factories and
//!   other known types. A name is capable only if it is registered, carries the
//!   attribute-transformer capability, and its factory produces an instance.
//! - [`StaticResolver`] - fixed table of answers, for tests and offline tooling.
//!
//! Every resolution failure is logged with its cause here and reported to the
//! caller only as [`Resolution::Unresolvable`].

use log::error;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Converts attribute values while they travel between the local store and an
/// external identity provider.
pub trait AttributeTransformer: Send + Sync {
    /// Transform values about to be sent to the external provider.
    fn before_propagation(&self, values: Vec<String>) -> Vec<String>;

    /// Transform values received from the external provider.
    fn before_pull(&self, values: Vec<String>) -> Vec<String>;
}

/// Capabilities a registered type may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Implements [`AttributeTransformer`]
    AttributeTransformer,
    /// Hooks invoked around identity-provider logins
    ProviderActions,
    /// Hooks invoked around propagation to external resources
    PropagationActions,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::AttributeTransformer => f.write_str("AttributeTransformer"),
            Capability::ProviderActions => f.write_str("ProviderActions"),
            Capability::PropagationActions => f.write_str("PropagationActions"),
        }
    }
}

/// Answer of a [`CapabilityResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The name identifies a loadable attribute transformer
    Capable,
    /// Not found, not loadable, or not an attribute transformer
    Unresolvable,
}

/// Decides whether a type name identifies an attribute transformer.
///
/// Implementations must be stateless from the caller's point of view: the same
/// name always yields the same answer, and calls may happen concurrently.
pub trait CapabilityResolver: Send + Sync {
    fn resolve(&self, type_name: &str) -> Resolution;
}

impl<R: CapabilityResolver + ?Sized> CapabilityResolver for Arc<R> {
    fn resolve(&self, type_name: &str) -> Resolution {
        (**self).resolve(type_name)
    }
}

/// Why a type name could not be resolved. Logged, never returned to callers.
#[derive(Debug, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("type '{type_name}' is not registered")]
    NotFound { type_name: String },

    #[error("type '{type_name}' does not implement {capability}")]
    MissingCapability {
        type_name: String,
        capability: Capability,
    },

    #[error("type '{type_name}' could not be loaded: {reason}")]
    LoadFailed { type_name: String, reason: String },
}

/// Produces a transformer instance, or the reason it cannot be loaded.
pub type TransformerFactory =
    Arc<dyn Fn() -> Result<Box<dyn AttributeTransformer>, String> + Send + Sync>;

enum RegisteredType {
    Transformer(TransformerFactory),
    Other(HashSet<Capability>),
}

/// Registry of known types, used as the production [`CapabilityResolver`].
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, RegisteredType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an attribute transformer under a type name.
    pub fn register_transformer<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn AttributeTransformer>, String> + Send + Sync + 'static,
    {
        self.types.insert(
            type_name.into(),
            RegisteredType::Transformer(Arc::new(factory)),
        );
    }

    /// Register a type that is known but implements other capabilities.
    pub fn register_type(&mut self, type_name: impl Into<String>, capabilities: &[Capability]) {
        self.types.insert(
            type_name.into(),
            RegisteredType::Other(capabilities.iter().copied().collect()),
        );
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Instantiate the transformer registered under `type_name`.
    pub fn instantiate(
        &self,
        type_name: &str,
    ) -> Result<Box<dyn AttributeTransformer>, ResolutionFailure> {
        match self.types.get(type_name) {
            None => Err(ResolutionFailure::NotFound {
                type_name: type_name.to_string(),
            }),
            Some(RegisteredType::Other(_)) => Err(ResolutionFailure::MissingCapability {
                type_name: type_name.to_string(),
                capability: Capability::AttributeTransformer,
            }),
            Some(RegisteredType::Transformer(factory)) => {
                factory().map_err(|reason| ResolutionFailure::LoadFailed {
                    type_name: type_name.to_string(),
                    reason,
                })
            }
        }
    }

    /// Capabilities implemented by a registered type.
    pub fn capabilities(&self, type_name: &str) -> HashSet<Capability> {
        match self.types.get(type_name) {
            Some(RegisteredType::Transformer(_)) => {
                HashSet::from([Capability::AttributeTransformer])
            }
            Some(RegisteredType::Other(capabilities)) => capabilities.clone(),
            None => HashSet::new(),
        }
    }
}

impl CapabilityResolver for TypeRegistry {
    fn resolve(&self, type_name: &str) -> Resolution {
        match self.instantiate(type_name) {
            Ok(_) => Resolution::Capable,
            Err(failure) => {
                error!("Invalid mapping item transformer specified: {}", failure);
                Resolution::Unresolvable
            }
        }
    }
}

/// Resolver answering from a fixed table; unknown names are unresolvable.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    capable: HashSet<String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a name as a capable transformer.
    pub fn capable(mut self, type_name: impl Into<String>) -> Self {
        self.capable.insert(type_name.into());
        self
    }

    pub fn with_capable<I, S>(mut self, type_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capable.extend(type_names.into_iter().map(Into::into));
        self
    }
}

impl CapabilityResolver for StaticResolver {
    fn resolve(&self, type_name: &str) -> Resolution {
        if self.capable.contains(type_name) {
            Resolution::Capable
        } else {
            error!("Invalid mapping item transformer specified: type '{}' is not registered", type_name);
            Resolution::Unresolvable
        }
    }
}
