//! Tool descriptors and their provenance

use serde::{Deserialize, Serialize};

/// Where a tool descriptor came from.
///
/// Fixed when the descriptor is created; drives registry ordering and the
/// badge shown next to the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolOrigin {
    /// Shipped with the backend
    Builtin,
    /// Pasted source submitted by the user
    Custom,
    /// Source produced by the prompt pathway and then submitted
    Generated,
    /// Imported from a repository file reference
    Git,
}

impl ToolOrigin {
    pub fn is_builtin(&self) -> bool {
        match self {
            ToolOrigin::Builtin => true,
            ToolOrigin::Custom | ToolOrigin::Generated | ToolOrigin::Git => false,
        }
    }

    /// Badge text shown next to the tool name
    pub fn badge(&self) -> &'static str {
        match self {
            ToolOrigin::Builtin => "builtin",
            ToolOrigin::Custom => "custom",
            ToolOrigin::Generated => "generated",
            ToolOrigin::Git => "github",
        }
    }
}

/// One declared parameter of a tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: None,
            required: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = Some(true);
        self
    }
}

/// A tool known to the registry, keyed by `name`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    pub origin: ToolOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
}

impl ToolDescriptor {
    /// Create a descriptor with no parameters
    pub fn new(name: impl Into<String>, description: impl Into<String>, origin: ToolOrigin) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            origin,
            source_ref: None,
        }
    }

    pub fn with_parameter(mut self, parameter: ToolParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_source_ref(mut self, source_ref: impl Into<String>) -> Self {
        self.source_ref = Some(source_ref.into());
        self
    }

    /// Tool name with underscores shown as spaces
    pub fn display_name(&self) -> String {
        self.name.replace('_', " ")
    }
}
