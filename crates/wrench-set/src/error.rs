//! Error types for widgets.

use wrench_set_core::HostError;

/// Errors returned by [`Element`](crate::Element) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    /// The element was built with `x_auto_init_element` and
    /// [`initialize_element`](crate::Element::initialize_element) has not run.
    #[error("Element has not been initialized")]
    NotInitialized,

    /// `initialize_element` was called a second time.
    #[error("Element is already initialized")]
    AlreadyInitialized,

    /// The element has been destroyed.
    #[error("Element has been destroyed")]
    Destroyed,

    /// A host tree operation failed.
    #[error(transparent)]
    Host(#[from] HostError),

    /// A selector could not be parsed.
    #[error(transparent)]
    Selector(#[from] wrench_set_selector::Error),

    /// Configuration could not be deserialized.
    #[error("Invalid element configuration: {0}")]
    Config(String),
}

/// Result type for widget operations.
pub type Result<T> = std::result::Result<T, ElementError>;
