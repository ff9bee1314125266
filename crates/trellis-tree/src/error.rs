//! Error types for layout tree integrity checks.

/// Violations of the layout tree's structural invariants.
///
/// These indicate a programming error in the application definition; they
/// abort startup and are never retried.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// The layout was never assigned before the application tried to serve.
    #[error(
        "the layout was `None` at startup; \
         set the layout of your application before running the server"
    )]
    NoLayout,

    /// Two components in the tree resolve to the same string identity.
    #[error("duplicate component id found in the initial layout: `{id}`")]
    DuplicateId { id: String },
}

impl TreeError {
    /// Stable snake_case name of the error kind, for fixtures and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoLayout => "no_layout",
            Self::DuplicateId { .. } => "duplicate_id",
        }
    }
}
