use serde::{Deserialize, Serialize};

/// Inbound body of `POST /ask`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    /// The message text, if present and not blank
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().filter(|m| !m.trim().is_empty())
    }
}

/// Successful body of `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
}

/// Chat Completions request shared by both providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    /// Omitted for Azure deployments, which imply the model
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Left unset so the model default applies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat Completions response. Only the fields the relay reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl ChatCompletionResponse {
    /// `choices[0].message.content`
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<ResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_blank_message() {
        let req: ChatRequest = serde_json::from_value(json!({ "message": "   " })).unwrap();
        assert!(req.message().is_none());

        let req: ChatRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.message().is_none());

        let req: ChatRequest = serde_json::from_value(json!({ "message": null })).unwrap();
        assert!(req.message().is_none());
    }

    #[test]
    fn test_chat_request_keeps_message_verbatim() {
        let req: ChatRequest =
            serde_json::from_value(json!({ "message": " Tell me about you " })).unwrap();
        assert_eq!(req.message(), Some(" Tell me about you "));
    }

    #[test]
    fn test_completion_request_omits_unset_fields() {
        let request = ChatCompletionRequest {
            model: None,
            messages: vec![ChatMessage::user("Hi")],
            max_tokens: Some(150),
            temperature: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "messages": [{ "role": "user", "content": "Hi" }],
                "max_tokens": 150
            })
        );
    }

    #[test]
    fn test_first_content() {
        let response: ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-test123",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "Hello!" },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 5, "completion_tokens": 2, "total_tokens": 7 }
        }))
        .unwrap();

        assert_eq!(response.first_content(), Some("Hello!"));
        assert_eq!(response.usage.unwrap().total_tokens, 7);
    }

    #[test]
    fn test_first_content_missing() {
        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(response.first_content().is_none());

        let response: ChatCompletionResponse =
            serde_json::from_value(json!({ "choices": [{ "message": { "role": "assistant" } }] }))
                .unwrap();
        assert!(response.first_content().is_none());
    }
}
