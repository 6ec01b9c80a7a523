use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stage coordinates, `[x, y, z]`.
pub type Vec3 = [f64; 3];

pub fn distance(a: Vec3, b: Vec3) -> f64 {
    let [dx, dy, dz] = sub(b, a);
    (dx * dx + dy * dy + dz * dz).sqrt()
}

pub(crate) fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn add_scaled(a: Vec3, d: Vec3, k: f64) -> Vec3 {
    [a[0] + d[0] * k, a[1] + d[1] * k, a[2] + d[2] * k]
}

/// Reads a position stored either as `[x, y, z]` or as `{x, y, z}`.
pub fn read_vec3(value: &Value) -> Option<Vec3> {
    match value {
        Value::Array(items) if items.len() == 3 => {
            let mut out = [0.0; 3];
            for (slot, item) in out.iter_mut().zip(items) {
                *slot = item.as_f64()?;
            }
            Some(out)
        }
        Value::Object(_) => {
            let p: PointerPosition = serde_json::from_value(value.clone()).ok()?;
            Some(p.into())
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl From<PointerPosition> for Vec3 {
    fn from(p: PointerPosition) -> Self {
        [p.x, p.y, p.z]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
    Tool,
}

/// One line of the conversation, in the shape the host's chat UI stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_tool_call: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            is_tool_call: false,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self::with_role(Role::Model, content)
    }

    /// The `[Performing: ...]` line shown while a tool call plays out.
    pub fn performing(actions: &[String]) -> Self {
        Self {
            is_tool_call: true,
            ..Self::model(format!("[Performing: {}]", actions.join(", ")))
        }
    }

    /// Result record answering a provider's tool call.
    pub fn tool_result(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::with_role(Role::Tool, content)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    Gemini,
    Custom,
    FunctionGemma,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmSettings {
    #[serde(default)]
    pub provider: LlmProvider,
    #[serde(default, alias = "api_key")]
    pub api_key: String,
    #[serde(default, alias = "base_url")]
    pub base_url: String,
    #[serde(default, alias = "model_name")]
    pub model_name: String,
}

/// Structured part of an LLM reply: what the penguin should do.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    #[serde(default)]
    pub actions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmResponse {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<ToolResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_tool_calls: Option<Value>,
}

pub const AVAILABLE_ACTIONS: &[&str] = &[
    "IDLE", "WALK", "RUN", "JUMP", "WAVE", "DANCE", "SPIN", "SHIVER", "SLEEP", "BOW", "NO", "YES",
    "EAT", "SURPRISE", "ANGRY", "SAD", "HAPPY", "LOOK_LEFT", "LOOK_RIGHT", "ROLL", "BACKFLIP",
    "CLAP", "THINK", "SIT", "FIGHT", "SWIM", "DAZZLE", "HIDE", "PEEK", "LOVE", "FLY",
    "RUN_ACROSS", "SLIDE", "KICK", "PUNCH", "KUNG_FU", "TAI_CHI", "MEDITATE", "BREAKDANCE",
    "BALLET", "SALSA", "HIP_HOP", "MOONWALK", "PRAY", "SALUTE", "CRY", "LAUGH", "YAWN", "SNEEZE",
    "SHOCKED",
];

pub const AVAILABLE_EXPRESSIONS: &[&str] = &[
    "NEUTRAL", "HAPPY", "SAD", "ANGRY", "SURPRISED", "EXCITED", "SLEEPY", "LOVING", "CONFUSED",
    "BLINK",
];

/// Body animations that count as idling for the boredom model.
pub const RESTING_ACTIONS: &[&str] = &["IDLE", "SLEEP", "WALK"];
