//! Wire types exchanged with the backend service

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Invocation, Role, ToolOrigin, ToolParameter};

/// One history entry sent with `POST chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl ChatMessage {
    pub fn new(text: impl Into<String>, role: Role) -> Self {
        Self {
            text: text.into(),
            role: Some(role),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub messages: &'a [ChatMessage],
}

/// Decoded `POST chat` response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatReply {
    pub response: String,
    pub invocations: Vec<Invocation>,
    pub debug_logs: Vec<String>,
}

impl ChatReply {
    pub fn text(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            ..Default::default()
        }
    }

    pub fn with_invocation(mut self, invocation: Invocation) -> Self {
        self.invocations.push(invocation);
        self
    }

    pub fn with_debug_log(mut self, line: impl Into<String>) -> Self {
        self.debug_logs.push(line.into());
        self
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireChatResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<WireToolCall>>,
    #[serde(default)]
    debug_logs: Option<Vec<String>>,
}

impl From<WireChatResponse> for ChatReply {
    fn from(wire: WireChatResponse) -> Self {
        Self {
            response: wire.response.unwrap_or_default(),
            invocations: wire
                .tool_calls
                .unwrap_or_default()
                .into_iter()
                .map(Invocation::from)
                .collect(),
            debug_logs: wire.debug_logs.unwrap_or_default(),
        }
    }
}

/// A reported tool call, in either the flat or the OpenAI function shape
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireToolCall {
    #[serde(rename_all = "camelCase")]
    Flat {
        id: String,
        tool_name: String,
        #[serde(default)]
        arguments_payload: Option<Value>,
    },
    Function {
        #[serde(default)]
        id: String,
        function: WireFunction,
    },
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: Option<Value>,
}

impl From<WireToolCall> for Invocation {
    fn from(call: WireToolCall) -> Self {
        match call {
            WireToolCall::Flat {
                id,
                tool_name,
                arguments_payload,
            } => Invocation::new(id, tool_name, payload_text(arguments_payload)),
            WireToolCall::Function { id, function } => {
                Invocation::new(id, function.name, payload_text(function.arguments))
            }
        }
    }
}

/// Arguments stay opaque: strings are kept verbatim, anything else is re-serialized
fn payload_text(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// One entry of the `GET tools` listing.
///
/// Newer backends send an explicit `origin`; older ones only flag custom and
/// GitHub tools, which [`ToolListing::listed_origin`] maps onto an origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListing {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<ToolOrigin>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ref: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default, rename = "isGitHub")]
    pub is_github: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl ToolListing {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Vec::new(),
            origin: None,
            source_ref: None,
            is_custom: false,
            is_github: false,
            url: None,
        }
    }

    pub fn with_origin(mut self, origin: ToolOrigin) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn custom(mut self) -> Self {
        self.is_custom = true;
        self
    }

    pub fn github(mut self, url: impl Into<String>) -> Self {
        self.is_custom = true;
        self.is_github = true;
        self.url = Some(url.into());
        self
    }

    /// Origin as far as the listing itself can tell
    pub fn listed_origin(&self) -> ToolOrigin {
        match self.origin {
            Some(origin) => origin,
            None if self.is_github => ToolOrigin::Git,
            None if self.is_custom => ToolOrigin::Custom,
            None => ToolOrigin::Builtin,
        }
    }

    /// Source reference from either the explicit field or the legacy `url`
    pub fn listed_source_ref(&self) -> Option<&str> {
        self.source_ref.as_deref().or(self.url.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolListResponse {
    #[serde(default)]
    pub tools: Vec<ToolListing>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AddToolRequest<'a> {
    pub code: &'a str,
}

/// Response of `POST tools/add` and `POST tools/from-git`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddToolReply {
    pub name: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateToolRequest<'a> {
    pub prompt: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct GitImportRequest<'a> {
    pub url: &'a str,
}

/// Response of `POST tools/generate` and `GET tools/{name}/code`
#[derive(Debug, Deserialize)]
pub(crate) struct CodeResponse {
    pub code: String,
}

/// Error body of any non-success response
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    detail: Option<Value>,
}

impl ErrorBody {
    pub fn detail(self) -> Option<String> {
        match self.detail? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_shape() {
        let messages = vec![
            ChatMessage::new("hello", Role::User),
            ChatMessage::new("hi", Role::Assistant),
        ];
        let body = serde_json::to_value(ChatRequest { messages: &messages }).unwrap();
        assert_eq!(
            body,
            json!({"messages": [{"text": "hello", "role": "user"}, {"text": "hi", "role": "assistant"}]})
        );
    }

    #[test]
    fn test_chat_response_openai_shape() {
        let wire: WireChatResponse = serde_json::from_value(json!({
            "response": "Sent!",
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": {"name": "send_mail", "arguments": "{\"to\":\"me\"}"}
            }],
            "debug_logs": ["[DEBUG] [pocket_logger] sending"]
        }))
        .unwrap();

        let reply = ChatReply::from(wire);
        assert_eq!(reply.response, "Sent!");
        assert_eq!(reply.invocations, vec![Invocation::new("call_1", "send_mail", "{\"to\":\"me\"}")]);
        assert_eq!(reply.debug_logs.len(), 1);
    }

    #[test]
    fn test_chat_response_flat_shape() {
        let wire: WireChatResponse = serde_json::from_value(json!({
            "response": "ok",
            "tool_calls": [{"id": "1", "toolName": "send_mail", "argumentsPayload": "{}"}]
        }))
        .unwrap();

        let reply = ChatReply::from(wire);
        assert_eq!(reply.invocations, vec![Invocation::new("1", "send_mail", "{}")]);
        assert!(reply.debug_logs.is_empty());
    }

    #[test]
    fn test_chat_response_null_fields() {
        let wire: WireChatResponse =
            serde_json::from_value(json!({"response": "plain", "tool_calls": null})).unwrap();
        let reply = ChatReply::from(wire);
        assert!(reply.invocations.is_empty());
    }

    #[test]
    fn test_object_arguments_kept_as_text() {
        let wire: WireToolCall = serde_json::from_value(json!({
            "id": "x",
            "function": {"name": "take_a_picture", "arguments": {"mode": "selfie"}}
        }))
        .unwrap();
        let call = Invocation::from(wire);
        assert_eq!(call.arguments_payload, "{\"mode\":\"selfie\"}");
    }

    #[test]
    fn test_listing_legacy_flags() {
        let listing: ToolListing = serde_json::from_value(json!({
            "name": "weather.py",
            "description": "GitHub tool from: https://github.com/u/r/blob/main/weather.py",
            "parameters": [],
            "isCustom": true,
            "isGitHub": true,
            "url": "https://github.com/u/r/blob/main/weather.py"
        }))
        .unwrap();

        assert_eq!(listing.listed_origin(), ToolOrigin::Git);
        assert_eq!(listing.listed_source_ref(), Some("https://github.com/u/r/blob/main/weather.py"));

        let custom = ToolListing::new("joke", "tells jokes").custom();
        assert_eq!(custom.listed_origin(), ToolOrigin::Custom);
        assert_eq!(ToolListing::new("send_mail", "").listed_origin(), ToolOrigin::Builtin);
    }

    #[test]
    fn test_listing_explicit_origin_wins() {
        let listing: ToolListing = serde_json::from_value(json!({
            "name": "joke",
            "origin": "generated",
            "isCustom": true
        }))
        .unwrap();
        assert_eq!(listing.listed_origin(), ToolOrigin::Generated);
        assert!(listing.parameters.is_empty());
    }

    #[test]
    fn test_listing_parameters() {
        let listing: ToolListing = serde_json::from_value(json!({
            "name": "send_mail",
            "description": "Send mail",
            "parameters": [{"name": "to", "type": "str", "description": "", "required": true}]
        }))
        .unwrap();
        assert_eq!(listing.parameters[0].param_type, "str");
        assert_eq!(listing.parameters[0].required, Some(true));
    }

    #[test]
    fn test_error_body_detail() {
        let body: ErrorBody = serde_json::from_value(json!({"detail": "duplicate name"})).unwrap();
        assert_eq!(body.detail(), Some("duplicate name".to_string()));

        let body: ErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(body.detail(), None);

        let body: ErrorBody = serde_json::from_value(json!({"detail": [{"msg": "field required"}]})).unwrap();
        assert!(body.detail().unwrap().contains("field required"));
    }
}
