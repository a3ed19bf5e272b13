use serde_json::{Map, Value};

/// Discriminator carried in the `type` field of every inbound frame.
///
/// Only `chat` gets special handling (persistence); everything else,
/// including types this server has never heard of, is relayed as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Chat,
    Typing,
    Other(String),
}

impl EventKind {
    fn from_tag(tag: &str) -> Self {
        match tag {
            "chat" => Self::Chat,
            "typing" => Self::Typing,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Chat => "chat",
            Self::Typing => "typing",
            Self::Other(tag) => tag,
        }
    }
}

/// Why an inbound frame was rejected at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("missing or non-string `{0}` field")]
    MissingField(&'static str),
}

/// A validated inbound frame.
///
/// The raw JSON object is kept alongside the extracted fields so that
/// forwarding preserves every key the client sent, recognized or not.
#[derive(Debug, Clone)]
pub struct Envelope {
    kind: EventKind,
    to: String,
    text: Option<String>,
    payload: Map<String, Value>,
}

impl Envelope {
    /// Parse and validate one frame. Every frame needs a string `type`
    /// and a string `to`; chat frames additionally need a string `text`.
    pub fn parse(raw: &str) -> Result<Self, EventError> {
        let value: Value = serde_json::from_str(raw)?;
        let Value::Object(payload) = value else {
            return Err(EventError::NotAnObject);
        };

        let kind = payload
            .get("type")
            .and_then(Value::as_str)
            .map(EventKind::from_tag)
            .ok_or(EventError::MissingField("type"))?;

        let to = payload
            .get("to")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(EventError::MissingField("to"))?;

        let text = payload
            .get("text")
            .and_then(Value::as_str)
            .map(str::to_owned);

        if kind == EventKind::Chat && text.is_none() {
            return Err(EventError::MissingField("text"));
        }

        Ok(Self {
            kind,
            to,
            text,
            payload,
        })
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// Target username.
    pub fn to(&self) -> &str {
        &self.to
    }

    /// Chat text. Always present when `kind()` is `Chat`.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The full payload with the authoritative sender identity stamped
    /// into `from`. This is the exact value relayed to the recipient;
    /// any `from` the client supplied itself is overwritten.
    pub fn stamped(&self, from: &str) -> Value {
        let mut payload = self.payload.clone();
        payload.insert("from".to_string(), Value::String(from.to_string()));
        Value::Object(payload)
    }
}
