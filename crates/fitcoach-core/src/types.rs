//! Chat, tool, and profile types shared across the workspace.

use serde::{Deserialize, Serialize};

/// Message role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A single conversation message in OpenAI wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into(), tool_call_id: None, tool_calls: None }
    }

    pub fn tool(content: impl Into<String>, tool_call_id: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: content.into(),
            tool_call_id: Some(tool_call_id.into()),
            tool_calls: None,
        }
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// JSON-encoded argument string, passed to the tool verbatim.
    pub arguments: String,
}

/// Tool definition advertised to the model (JSON-schema parameters).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Result of a tool execution. `output` is a JSON-encoded string.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub output: String,
}

/// One chat-completion response from a provider.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Generation parameters for a chat call.
#[derive(Debug, Clone)]
pub struct GenerateParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerateParams {
    fn default() -> Self {
        Self { temperature: 0.7, max_tokens: 1024 }
    }
}

/// User fitness profile, injected into every specialist agent turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub sex: String,
    pub age: u32,
    pub height_cm: f64,
    pub weight_kg: f64,
    pub activity: String,
    pub goal: String,
    #[serde(default)]
    pub conditions: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            sex: "F".into(),
            age: 30,
            height_cm: 165.0,
            weight_kg: 60.0,
            activity: "moderate".into(),
            goal: "recomp".into(),
            conditions: vec![],
        }
    }
}

impl Profile {
    /// Render the profile as a system message block for specialist agents.
    pub fn as_system_block(&self) -> String {
        format!(
            "User profile:\n- Sex: {}\n- Age: {}\n- Height: {}cm\n- Weight: {}kg\n- Activity level: {}\n- Goal: {}\n- Conditions/injuries: {}\n",
            self.sex,
            self.age,
            self.height_cm,
            self.weight_kg,
            self.activity,
            self.goal,
            if self.conditions.is_empty() { "none".to_string() } else { self.conditions.join(", ") },
        )
    }
}

/// Embedding model size selector. One persisted index is bound to exactly
/// one size; mixing sizes against an index fails loudly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSize {
    #[default]
    Small,
    Large,
}

impl std::str::FromStr for ModelSize {
    type Err = crate::error::FitCoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "small" => Ok(ModelSize::Small),
            "large" => Ok(ModelSize::Large),
            other => Err(crate::error::FitCoachError::Config(format!(
                "Unknown embedding model size: '{other}' (expected 'small' or 'large')"
            ))),
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSize::Small => write!(f, "small"),
            ModelSize::Large => write!(f, "large"),
        }
    }
}
