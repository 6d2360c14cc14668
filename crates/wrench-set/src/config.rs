//! Element configuration.

use serde::Deserialize;
use wrench_set_core::NodeId;

use crate::error::{ElementError, Result};

/// Construction options for an [`Element`](crate::Element).
///
/// Every field has a default, so partial configurations are accepted from
/// code, JSON, or TOML. Field names in serialized form are camelCase, with
/// `innerHTML` spelled as in the DOM. `render_to` refers to a live node and
/// can only be set from code.
///
/// ```
/// use wrench_set::ElementConfig;
///
/// let config = ElementConfig::from_json(r#"{ "className": "bro jack", "elementType": "span" }"#).unwrap();
/// assert_eq!(config.element_type, "span");
/// assert_eq!(config.inner_html, "");
/// assert!(!config.x_auto_init_element);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementConfig {
    /// Tag of the node to create.
    pub element_type: String,
    /// Initial `class` attribute.
    pub class_name: String,
    /// Initial markup content.
    #[serde(rename = "innerHTML", alias = "innerHtml")]
    pub inner_html: String,
    /// Node to append the element to on initialization.
    #[serde(skip)]
    pub render_to: Option<NodeId>,
    /// When `true`, construction does not initialize the element and
    /// [`initialize_element`](crate::Element::initialize_element) must be
    /// called explicitly.
    pub x_auto_init_element: bool,
}

impl Default for ElementConfig {
    fn default() -> Self {
        Self {
            element_type: "div".to_string(),
            class_name: String::new(),
            inner_html: String::new(),
            render_to: None,
            x_auto_init_element: false,
        }
    }
}

impl ElementConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tag of the node to create.
    pub fn with_element_type(mut self, element_type: impl Into<String>) -> Self {
        self.element_type = element_type.into();
        self
    }

    /// Set the initial `class` attribute.
    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    /// Set the initial markup content.
    pub fn with_inner_html(mut self, inner_html: impl Into<String>) -> Self {
        self.inner_html = inner_html.into();
        self
    }

    /// Set the node to append to on initialization.
    pub fn with_render_to(mut self, parent: NodeId) -> Self {
        self.render_to = Some(parent);
        self
    }

    /// Defer initialization to an explicit `initialize_element` call.
    pub fn with_x_auto_init_element(mut self, deferred: bool) -> Self {
        self.x_auto_init_element = deferred;
        self
    }

    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ElementError::Config(e.to_string()))
    }

    /// Parse a configuration from TOML.
    pub fn from_toml(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| ElementError::Config(e.to_string()))
    }
}
