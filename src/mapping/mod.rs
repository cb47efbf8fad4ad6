//! Identity-provider mapping configurations and their integrity rules.
//!
//! A [`MappingConfiguration`] describes how internal identity attributes
//! correspond to attributes of an external identity provider. Before such a
//! configuration can be stored it must pass the [`MappingValidator`], which
//! checks the structural invariants listed below. The [`ConfigValidationGate`]
//! enforces that nothing reaches storage without passing it.
//!
//! # Invariants
//!
//! - The key contains no markup.
//! - `selfRegUnmatching` and `createUnmatching` are not both set.
//! - A non-empty item list has exactly one connector object key item.
//! - No item is a password mapping.
//! - Every transformer named by an item resolves to an attribute transformer.
//!
//! # Example
//!
//! ```rust
//! use idm_core::mapping::{MappingConfiguration, MappingItem, MappingValidator, StaticResolver};
//!
//! let resolver = StaticResolver::new().capable("transformers.Lowercase");
//! let validator = MappingValidator::new(resolver);
//!
//! let config = MappingConfiguration::new("google", "Google")
//!     .with_item(MappingItem::new("username", "email").conn_object_key())
//!     .with_item(MappingItem::new("fullname", "name").with_transformer("transformers.Lowercase"));
//!
//! assert!(validator.validate(&config).is_valid());
//! ```

pub mod gate;
pub mod resolver;
pub mod validator;

pub use gate::{ConfigValidationGate, GateDecision, MAPPING_COLLECTION};
pub use resolver::{
    AttributeTransformer, Capability, CapabilityResolver, Resolution, ResolutionFailure,
    StaticResolver, TransformerFactory, TypeRegistry,
};
pub use validator::{MappingValidator, ValidationOutcome};

use serde::{Deserialize, Serialize};

/// Mapping between internal attributes and an external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfiguration {
    /// Unique identifying key
    pub key: String,
    /// Display name of the identity provider
    #[serde(default)]
    pub name: String,
    /// Ordered mapping items, owned by this configuration
    #[serde(default)]
    pub items: Vec<MappingItem>,
    /// Offer self registration when no local identity matches
    #[serde(default)]
    pub self_reg_unmatching: bool,
    /// Create a local identity when none matches
    #[serde(default)]
    pub create_unmatching: bool,
    /// Update the matching local identity on authentication
    #[serde(default)]
    pub update_matching: bool,
}

impl MappingConfiguration {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            items: Vec::new(),
            self_reg_unmatching: false,
            create_unmatching: false,
            update_matching: false,
        }
    }

    pub fn with_item(mut self, item: MappingItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn with_self_reg_unmatching(mut self, enabled: bool) -> Self {
        self.self_reg_unmatching = enabled;
        self
    }

    pub fn with_create_unmatching(mut self, enabled: bool) -> Self {
        self.create_unmatching = enabled;
        self
    }

    pub fn with_update_matching(mut self, enabled: bool) -> Self {
        self.update_matching = enabled;
        self
    }

    /// The item designated as connector object key, if exactly one exists.
    pub fn conn_object_key_item(&self) -> Option<&MappingItem> {
        let mut keys = self.items.iter().filter(|item| item.conn_object_key);
        match (keys.next(), keys.next()) {
            (Some(item), None) => Some(item),
            _ => None,
        }
    }
}

/// One attribute correspondence inside a [`MappingConfiguration`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingItem {
    /// Internal attribute name
    #[serde(default)]
    pub int_attr_name: String,
    /// Attribute name on the external provider
    #[serde(default)]
    pub ext_attr_name: String,
    /// Whether this item carries the external record identifier
    #[serde(default)]
    pub conn_object_key: bool,
    /// Whether this item maps a password
    #[serde(default)]
    pub password: bool,
    /// Names of the attribute transformers applied to this item, in order
    #[serde(default)]
    pub transformer_class_names: Vec<String>,
}

impl MappingItem {
    pub fn new(int_attr_name: impl Into<String>, ext_attr_name: impl Into<String>) -> Self {
        Self {
            int_attr_name: int_attr_name.into(),
            ext_attr_name: ext_attr_name.into(),
            ..Self::default()
        }
    }

    /// Mark this item as the connector object key.
    pub fn conn_object_key(mut self) -> Self {
        self.conn_object_key = true;
        self
    }

    /// Mark this item as a password mapping.
    pub fn password(mut self) -> Self {
        self.password = true;
        self
    }

    pub fn with_transformer(mut self, class_name: impl Into<String>) -> Self {
        self.transformer_class_names.push(class_name.into());
        self
    }
}

/// Whether the text contains an angle-bracket-delimited sequence such as `<b>`.
pub fn contains_markup(text: &str) -> bool {
    text.find('<')
        .is_some_and(|open| text[open + 1..].contains('>'))
}
