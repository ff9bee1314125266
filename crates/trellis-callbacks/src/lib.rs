//! # trellis-callbacks
//!
//! Static validation for callback bindings over a trellis component tree.
//!
//! A callback declares outputs, inputs, and state, each a reference to a
//! component identity plus a named property. Before the application runs,
//! [`validate_callback`] checks each registration for structural legality:
//! well-formed ids, existing components and properties, no colliding
//! outputs, and consistent wildcard usage. At invocation time,
//! [`validate_multi_return`] and [`fail_callback_output`] check that the
//! returned value tree matches the declared output shape and stays inside
//! the serializable grammar.
//!
//! The validator is pure: the only shared state is the per-application
//! [`CallbackRegistry`] of already-claimed outputs, which the dispatcher
//! appends to after a registration passes.

pub mod dependency;
pub mod error;
pub mod registry;
pub mod return_value;
pub mod validate;

pub use dependency::{
    Dependency, DependencyId, DependencyKind, PatternValue, Wildcard, pattern,
};
pub use error::CallbackError;
pub use registry::{AppConfig, CallbackRegistry};
pub use return_value::{OutputSpec, fail_callback_output, validate_multi_return};
pub use validate::{
    prevent_duplicate_outputs, prevent_inconsistent_wildcards, prevent_input_output_overlap,
    validate_callback, validate_callback_args,
};
