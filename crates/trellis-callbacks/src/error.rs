//! Error types for callback registration and return-value validation.
//!
//! Every variant marks a programming error in the application definition:
//! terminal, reported on first violation, never batched and never retried.
//! Registration-time errors abort application startup; return-value errors
//! abort the single invocation and leave the server running.

/// Violations found while validating a callback registration or its
/// returned value.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// A callback was registered before the layout was assigned, with id
    /// validation enabled.
    #[error(
        "attempting to assign a callback but the layout has not been assigned; \
         assign the layout before registering callbacks, \
         or set `suppress_callback_exceptions`"
    )]
    LayoutUndefined,

    /// A callback with no inputs can never fire.
    #[error(
        "this callback has no `Input` elements; \
         without inputs it will never be called"
    )]
    MissingInputs,

    /// A dependency argument is structurally malformed.
    #[error("incorrect dependency type: {description}")]
    IncorrectType { description: String },

    /// The removed event system was referenced.
    #[error("events have been removed; use the associated property instead")]
    NonExistentEvent,

    /// A literal component id contains characters reserved for pattern ids.
    #[error(
        "the element `{id}` contains `{found}` in its id; \
         characters `.` and `{{` are not allowed in ids"
    )]
    InvalidComponentId { id: String, found: String },

    /// A literal component id is absent from the layout.
    #[error(
        "a callback references the component id `{id}` \
         but no component with that id exists in the layout\n\
         ids currently present in the layout: {layout_ids:?}\n\
         if the component is generated by another callback, \
         set `suppress_callback_exceptions`"
    )]
    NonExistentId { id: String, layout_ids: Vec<String> },

    /// A dependency names a property its component does not declare.
    #[error(
        "a callback references the property `{property}` \
         but component `{component_id}` does not have `{property}`\n\
         available properties: {available:?}"
    )]
    NonExistentProp {
        property: String,
        component_id: String,
        available: Vec<String>,
    },

    /// Two outputs collide, within one callback or against the registry.
    #[error("duplicate callback output: {description}")]
    DuplicateCallbackOutput { description: String },

    /// An input and an output of the same callback can resolve to the same
    /// component and property.
    #[error("{description}")]
    SameInputOutput { description: String },

    /// `ANY`/`ALLSMALLER` wildcard keys are not covered by the outputs'
    /// `ANY` keys.
    #[error("inconsistent callback wildcards: {description}")]
    InconsistentCallbackWildcards { description: String },

    /// The value returned by a callback does not fit the declared outputs.
    #[error("invalid callback return value: {description}")]
    InvalidCallbackReturnValue { description: String },
}

impl CallbackError {
    /// Stable snake_case name of the error kind, for fixtures and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LayoutUndefined => "layout_undefined",
            Self::MissingInputs => "missing_inputs",
            Self::IncorrectType { .. } => "incorrect_type",
            Self::NonExistentEvent => "non_existent_event",
            Self::InvalidComponentId { .. } => "invalid_component_id",
            Self::NonExistentId { .. } => "non_existent_id",
            Self::NonExistentProp { .. } => "non_existent_prop",
            Self::DuplicateCallbackOutput { .. } => "duplicate_callback_output",
            Self::SameInputOutput { .. } => "same_input_output",
            Self::InconsistentCallbackWildcards { .. } => "inconsistent_callback_wildcards",
            Self::InvalidCallbackReturnValue { .. } => "invalid_callback_return_value",
        }
    }
}
