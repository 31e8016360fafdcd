use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::de::{lenient_timestamp, null_as_default};
use crate::notice::Notice;

/// Stable identifier as sent by the chat backend.
/// Database rows carry numeric ids, bot payloads sometimes strings, so both
/// deserialize into the same string form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct StableId(String);

impl StableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StableId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StableId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for StableId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for StableId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Int(i64),
            Float(f64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Int(n) => Self(n.to_string()),
            Raw::Float(n) => Self(n.to_string()),
            Raw::Text(s) => Self(s),
        })
    }
}

/// A chat message as delivered by the backend. Read-only to the timeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    #[serde(default)]
    pub id: Option<StableId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub sender: String,
    #[serde(default)]
    pub sender_id: Option<StableId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,
    /// Pre-structured notice. Takes priority over legacy text parsing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed: Option<Notice>,
}

impl Message {
    pub fn new(sender: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<StableId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_sender_id(mut self, id: impl Into<StableId>) -> Self {
        self.sender_id = Some(id.into());
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sender identity: ids when both sides have one, display names otherwise.
    pub fn same_sender(&self, other: &Message) -> bool {
        match (&self.sender_id, &other.sender_id) {
            (Some(a), Some(b)) => a == b,
            _ => self.sender == other.sender,
        }
    }
}

/// File descriptor attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    #[serde(default)]
    pub id: Option<StableId>,
    #[serde(default, alias = "name", deserialize_with = "null_as_default")]
    pub filename: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "publicId")]
    pub file_id: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default, alias = "sizeBytes")]
    pub size: Option<u64>,
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "avif"];

impl Attachment {
    pub fn is_image(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            return mime.starts_with("image/");
        }
        self.filename
            .rsplit_once('.')
            .map(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    }
}

/// User profile as known to the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub id: Option<StableId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub display_name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub banner_url: Option<String>,
}

/// Profiles keyed by user id.
pub type ProfileMap = HashMap<StableId, Profile>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_from_backend_row() {
        let json = r#"{
            "id": 42,
            "channel": "general",
            "sender": "Person One",
            "senderId": "7",
            "content": null,
            "createdAt": "2025-03-03T18:30:00Z",
            "attachments": [{"filename": "a.png", "url": "/api/files/x"}]
        }"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, Some(StableId::from("42")));
        assert_eq!(msg.sender_id, Some(StableId::from("7")));
        assert_eq!(msg.content, "");
        assert!(msg.created_at.is_some());
        assert_eq!(msg.attachments.len(), 1);
        assert!(msg.embed.is_none());
    }

    #[test]
    fn corrupt_created_at_is_tolerated() {
        let msg: Message =
            serde_json::from_str(r#"{"sender":"a","content":"hi","createdAt":"not a date"}"#)
                .unwrap();
        assert_eq!(msg.created_at, None);
    }

    #[test]
    fn same_sender_prefers_ids() {
        let a = Message::new("Alice", "").with_sender_id("1");
        let renamed = Message::new("Alice W", "").with_sender_id("1");
        let impostor = Message::new("Alice", "").with_sender_id("2");
        let anonymous = Message::new("Alice", "");

        assert!(a.same_sender(&renamed));
        assert!(!a.same_sender(&impostor));
        // One side lacks an id: fall back to names.
        assert!(a.same_sender(&anonymous));
        assert!(!renamed.same_sender(&anonymous));
    }

    #[test]
    fn image_detection() {
        let by_mime = Attachment {
            filename: "blob".into(),
            mime_type: Some("image/gif".into()),
            ..Attachment::default()
        };
        let by_ext = Attachment {
            filename: "Screenshot.PNG".into(),
            ..Attachment::default()
        };
        let doc = Attachment {
            filename: "notes.txt".into(),
            ..Attachment::default()
        };
        assert!(by_mime.is_image());
        assert!(by_ext.is_image());
        assert!(!doc.is_image());
    }
}
