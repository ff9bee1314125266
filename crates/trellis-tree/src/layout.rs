//! Whole-layout integrity checks run before an application serves.

use std::collections::BTreeSet;

use crate::component::Component;
use crate::error::TreeError;

/// Validate a layout tree as a whole: it must exist, and no two components
/// (root included) may resolve to the same string identity. Keyed ids are
/// compared in canonical string form, so a keyed id collides with an equal
/// keyed id regardless of construction order.
pub fn validate_layout(layout: Option<&Component>) -> Result<(), TreeError> {
    let layout = layout.ok_or(TreeError::NoLayout)?;

    let mut seen = BTreeSet::new();
    if let Some(id) = &layout.id {
        seen.insert(id.stringify());
    }
    for component in layout.traverse() {
        let Some(id) = &component.id else {
            continue;
        };
        let id = id.stringify();
        if !seen.insert(id.clone()) {
            return Err(TreeError::DuplicateId { id });
        }
    }
    Ok(())
}
