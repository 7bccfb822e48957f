//! Typed request and response bodies for the endpoints under test.
//!
//! Response records keep every field optional: a missing field is a
//! contract violation the scenario reports, not a decode error.
//!
//! ```rust
//! use prodder::api::{LoginResponse, decode};
//! use serde_json::json;
//!
//! let body = json!({"user": {"id": 7}, "refreshToken": "r-1"});
//! let login: LoginResponse = decode(&body).expect("decodes");
//! assert!(login.access_token.is_none());
//! assert_eq!(login.user.and_then(|user| user.id).map(|id| id.to_string()), Some("7".to_string()));
//! ```

use std::fmt::{Display, Formatter};

use pcommon::ResourceId;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const HEALTH: &str = "/health";
pub const LOGIN: &str = "/api/auth/login";
pub const VALIDATE: &str = "/api/auth/validate";
pub const PROFILE: &str = "/api/auth/me";
pub const REFRESH: &str = "/api/auth/refresh";
pub const LOGOUT: &str = "/api/auth/logout";
pub const SESSIONS: &str = "/api/sessions";
pub const SIMPLE_CHAT: &str = "/api/chat/simple";
pub const CHAT_STREAM: &str = "/api/chat/stream";
pub const KNOWLEDGE_UPLOAD: &str = "/api/knowledge/upload";
pub const KNOWLEDGE_QUERY: &str = "/api/knowledge/query";
pub const KNOWLEDGE_CHAT: &str = "/api/knowledge/chat";
pub const KNOWLEDGE_STREAM_CHAT: &str = "/api/knowledge/stream-chat";
pub const DIAGNOSTIC_ENVIRONMENT: &str = "/api/diagnostic/environment";
pub const DIAGNOSTIC_DATABASE: &str = "/api/diagnostic/database";
pub const DIAGNOSTIC_SYSTEM: &str = "/api/diagnostic/system";

pub fn session_path(id: &ResourceId) -> String {
    format!("{SESSIONS}/{id}")
}

pub fn session_messages_path(id: &ResourceId) -> String {
    format!("{SESSIONS}/{id}/messages")
}

/// Decodes a parsed JSON body into one of the records below.
pub fn decode<T: DeserializeOwned>(body: &Value) -> Result<T, String> {
    T::deserialize(body).map_err(|err| format!("unexpected response shape: {err}"))
}

/// Identifiers arrive as strings from some backends and integers from others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Text(String),
    Number(i64),
}

impl Display for WireId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            WireId::Text(value) => f.write_str(value),
            WireId::Number(value) => write!(f, "{value}"),
        }
    }
}

impl From<WireId> for ResourceId {
    fn from(value: WireId) -> Self {
        ResourceId::new(value.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HealthResponse {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Option<WireId>,
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: Option<UserProfile>,
    pub is_new_user: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidateResponse {
    pub valid: Option<bool>,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessResponse {
    pub success: Option<bool>,
    pub deleted_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub message: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateSessionRequest<'a> {
    pub title: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateSessionRequest<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddMessageRequest<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionRecord {
    pub id: Option<WireId>,
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub id: Option<WireId>,
    pub file_id: Option<WireId>,
}

impl UploadResponse {
    pub fn stored_id(self) -> Option<ResourceId> {
        self.id.or(self.file_id).map(ResourceId::from)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeQueryRequest<'a> {
    pub query: &'a str,
    pub user_id: &'a str,
    pub limit: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeQueryResponse {
    pub results: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeChatRequest<'a> {
    pub message: &'a str,
    pub user_id: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeChatResponse {
    pub reply: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseDiagnostic {
    pub success: Option<bool>,
    pub error: Option<String>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// Encodes a request record; these records only hold strings and integers.
pub fn encode<T: Serialize>(body: &T) -> Value {
    serde_json::to_value(body).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_bodies_use_camel_case_keys() {
        assert_eq!(
            encode(&RefreshRequest { refresh_token: "r" }),
            json!({"refreshToken": "r"})
        );
        assert_eq!(
            encode(&KnowledgeQueryRequest {
                query: "q",
                user_id: "u",
                limit: 3
            }),
            json!({"query": "q", "userId": "u", "limit": 3})
        );
    }

    #[test]
    fn upload_prefers_id_over_file_id() {
        let upload: UploadResponse = decode(&json!({"fileId": "f-2"})).expect("decodes");
        assert_eq!(upload.stored_id(), Some(ResourceId::from("f-2")));

        let upload: UploadResponse = decode(&json!({"id": 9, "fileId": "f-2"})).expect("decodes");
        assert_eq!(upload.stored_id(), Some(ResourceId::from("9")));
    }

    #[test]
    fn wrong_field_type_is_reported_as_shape_error() {
        let err = decode::<SessionRecord>(&json!({"title": 5})).expect_err("must fail");
        assert!(err.starts_with("unexpected response shape"));
    }

    #[test]
    fn database_diagnostic_keeps_extra_fields() {
        let diagnostic: DatabaseDiagnostic =
            decode(&json!({"success": false, "error": "refused", "host": "db"})).expect("decodes");
        assert_eq!(diagnostic.success, Some(false));
        assert_eq!(diagnostic.details.get("host"), Some(&json!("db")));
    }
}
