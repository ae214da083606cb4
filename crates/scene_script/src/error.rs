//! Script boundary errors.

/// Errors reported back to a script.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// The object has no such property.
    #[error("{class} has no property '{name}'")]
    UnknownProperty {
        /// Class of the object.
        class: &'static str,
        /// Requested property.
        name: String,
    },

    /// The object has no such method.
    #[error("{class} has no method '{name}'")]
    UnknownMethod {
        /// Class of the object.
        class: &'static str,
        /// Requested method.
        name: String,
    },

    /// The property has no setter.
    #[error("property '{name}' of {class} is read-only")]
    ReadOnly {
        /// Class of the object.
        class: &'static str,
        /// The property.
        name: String,
    },

    /// A method argument had the wrong type or was missing.
    #[error("argument {index} of '{method}': expected {expected}, got {found}")]
    BadArgument {
        /// The method being called.
        method: String,
        /// Zero-based argument position.
        index: usize,
        /// Expected type label.
        expected: &'static str,
        /// Received type label.
        found: &'static str,
    },

    /// A value assigned to a property had the wrong type.
    #[error("property '{property}': expected {expected}, got {found}")]
    InvalidValue {
        /// The property being set.
        property: String,
        /// Expected type label.
        expected: &'static str,
        /// Received type label.
        found: &'static str,
    },

    /// The scene refused the operation, e.g. a reparent that would form a cycle.
    #[error("rejected: {0}")]
    Rejected(String),

    /// No component type is registered under this tag.
    #[error("unknown component type '{0}'")]
    UnknownComponentType(String),
}
