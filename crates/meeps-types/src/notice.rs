use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::de::{lenient_timestamp, null_as_default};

/// RGB accent color of a notice, stored as `0xRRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NoticeColor(pub u32);

impl NoticeColor {
    pub const WIN: Self = Self(0x28a745);
    pub const LOSE: Self = Self(0xe74c3c);
    pub const REMAKE: Self = Self(0xe67e22);
    /// Border color used when a notice carries no color.
    pub const ACCENT: Self = Self(0x6366f1);

    /// Parse `#rrggbb`, `rrggbb`, or `0xrrggbb`. Anything but one to six hex
    /// digits after the prefix is rejected.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let hex = text
            .strip_prefix('#')
            .or_else(|| text.strip_prefix("0x"))
            .unwrap_or(text);
        if hex.is_empty() || hex.len() > 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(Self)
    }

    pub fn css(&self) -> String {
        format!("#{:06x}", self.0 & 0xff_ffff)
    }
}

impl fmt::Display for NoticeColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.css())
    }
}

impl Serialize for NoticeColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.css())
    }
}

/// Bots send colors either as integers or as hex strings; unreadable values
/// become `None` so the notice still renders with the default accent.
fn lenient_color<'de, D>(deserializer: D) -> Result<Option<NoticeColor>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u32),
        Text(String),
        Other(serde_json::Value),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Int(n)) if n <= 0xff_ffff => Some(NoticeColor(n)),
        Some(Raw::Text(text)) => NoticeColor::parse(&text),
        _ => None,
    })
}

/// A structured display unit: title, description, fields, color, thumbnail.
///
/// Either posted directly by a bot or recovered from legacy plain text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "lenient_color", skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<NoticeColor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<NoticeField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Notice {
    /// True when the notice has nothing to show. Color and timestamp alone
    /// do not count as content.
    pub fn is_empty(&self) -> bool {
        let blank = |s: &Option<String>| s.as_deref().is_none_or(|s| s.trim().is_empty());
        blank(&self.title)
            && blank(&self.description)
            && blank(&self.text)
            && blank(&self.url)
            && blank(&self.thumbnail_url)
            && blank(&self.banner_url)
            && blank(&self.footer)
            && self.fields.is_empty()
    }

    pub fn accent(&self) -> NoticeColor {
        self.color_hex.unwrap_or(NoticeColor::ACCENT)
    }

    pub fn inline_fields(&self) -> impl Iterator<Item = &NoticeField> {
        self.fields.iter().filter(|f| f.inline)
    }

    pub fn block_fields(&self) -> impl Iterator<Item = &NoticeField> {
        self.fields.iter().filter(|f| !f.inline)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeField {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

impl NoticeField {
    pub fn inline(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline: true,
        }
    }
}
