//! Wire models shared with API consumers.

use serde::{Deserialize, Serialize};

/// RFC9457-style problem document returned for every API error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// Problem type URI.
    #[serde(rename = "type")]
    pub kind: String,
    /// Short human-readable summary.
    pub title: String,
    /// HTTP status code mirrored into the body.
    pub status: u16,
    /// Optional detail message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Structured payload attached to permission denials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub denial: Option<DenialDetails>,
}

/// Machine-readable description of a denied entity action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DenialDetails {
    /// Acting user identifier.
    pub user: String,
    /// Capability character that was requested.
    pub requested: String,
    /// Friendly name of the entity.
    pub entity: String,
    /// Capability characters the user actually holds.
    pub granted: String,
}

/// State of one entity as reported by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityState {
    /// Slug identifying the entity.
    pub entity_id: String,
    /// Friendly name of the entity.
    pub name: String,
    /// `on`, `off`, or `unknown` when the state could not be determined.
    pub state: String,
    /// Whether the state is assumed rather than queried from a command.
    pub assumed_state: bool,
}

impl EntityState {
    pub(crate) fn label(state: Option<bool>) -> String {
        match state {
            Some(true) => "on".to_string(),
            Some(false) => "off".to_string(),
            None => "unknown".to_string(),
        }
    }
}
