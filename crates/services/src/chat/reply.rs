//! Reply extraction from the chat endpoint's JSON body.
//!
//! The endpoint is not pinned to one response shape, so the known shapes are
//! listed explicitly and tried in order.

use serde_json::Value;

/// How deep nested `data` envelopes are followed.
const MAX_DATA_DEPTH: usize = 4;

/// A response shape the tutor endpoint is known to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySchema {
    /// `{"reply": "..."}`
    Reply,
    /// `{"message": "..."}`
    Message,
    /// `{"response": "..."}`
    Response,
    /// `{"answer": "..."}`
    Answer,
    /// `{"content": "..."}`
    Content,
    /// `{"data": {...}}`, any of these shapes one level down.
    Data,
    /// `{"choices": [{"message": {"content": "..."}}]}`
    ChoiceMessage,
    /// `{"choices": [{"text": "..."}]}`
    ChoiceText,
}

impl ReplySchema {
    /// Shapes in the order they are tried.
    pub const ORDER: [ReplySchema; 8] = [
        ReplySchema::Reply,
        ReplySchema::Message,
        ReplySchema::Response,
        ReplySchema::Answer,
        ReplySchema::Content,
        ReplySchema::Data,
        ReplySchema::ChoiceMessage,
        ReplySchema::ChoiceText,
    ];

    fn extract(self, body: &Value, depth: usize) -> Option<String> {
        match self {
            ReplySchema::Reply => text(body.get("reply")),
            ReplySchema::Message => text(body.get("message")),
            ReplySchema::Response => text(body.get("response")),
            ReplySchema::Answer => text(body.get("answer")),
            ReplySchema::Content => text(body.get("content")),
            ReplySchema::Data => {
                if depth >= MAX_DATA_DEPTH {
                    return None;
                }
                let data = body.get("data")?;
                text(Some(data)).or_else(|| extract_at(data, depth + 1).map(|(_, reply)| reply))
            }
            ReplySchema::ChoiceMessage => text(body.pointer("/choices/0/message/content")),
            ReplySchema::ChoiceText => text(body.pointer("/choices/0/text")),
        }
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    let s = value?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn extract_at(body: &Value, depth: usize) -> Option<(ReplySchema, String)> {
    ReplySchema::ORDER
        .into_iter()
        .find_map(|schema| schema.extract(body, depth).map(|reply| (schema, reply)))
}

/// First reply text found in `body`, with the shape that matched.
#[must_use]
pub fn extract_reply(body: &Value) -> Option<(ReplySchema, String)> {
    extract_at(body, 0)
}

/// Best-effort human-readable message for a failed request.
#[must_use]
pub fn error_message(raw: &str) -> Option<String> {
    if let Ok(body) = serde_json::from_str::<Value>(raw) {
        if let Some((_, message)) = extract_reply(&body) {
            return Some(message);
        }
        if let Some(message) = text(body.get("error"))
            .or_else(|| text(body.pointer("/error/message")))
            .or_else(|| text(body.get("detail")))
        {
            return Some(message);
        }
    }
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}
