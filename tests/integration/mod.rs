//! Integration tests: components working together over storage.

pub mod mapping_gate;
pub mod propagation;
pub mod realm_tree;
