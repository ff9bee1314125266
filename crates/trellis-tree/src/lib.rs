//! # trellis-tree
//!
//! The component tree model underneath a trellis application:
//!
//! 1. **Identities**: a component is addressed either by a literal string id
//!    or by a keyed map of scalars (for dynamically generated instances).
//! 2. **Property grammar**: the closed set of values a component property may
//!    carry and still serialize, plus [`PropValue::Opaque`], the escape hatch
//!    for host values that do not serialize and must be caught by validation.
//! 3. **Traversal**: iterative depth-first walks over the `children` tree,
//!    with and without path descriptors, each node yielded exactly once.
//! 4. **Layout integrity**: the whole-tree checks run before an application
//!    is allowed to serve (presence, unique ids).

pub mod component;
pub mod error;
pub mod layout;
pub mod traverse;

pub use component::{Component, ComponentId, OpaqueValue, PropValue, ScalarId};
pub use error::TreeError;
pub use layout::validate_layout;
pub use traverse::{Traverse, TraverseWithPaths};
