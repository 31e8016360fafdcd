use serde::{Deserialize, Serialize};

use crate::de::null_as_default;
use crate::models::Message;

/// One page of history from the pagination boundary.
/// `items` are already time-ordered, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_more: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, has_more: bool) -> Self {
        Self { items, has_more }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_more: false,
        }
    }
}

/// `GET /api/messages` response body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagesResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub messages: Vec<Message>,
    /// Older backends omit this; the page-size heuristic applies then.
    #[serde(default)]
    pub has_more: Option<bool>,
}

impl MessagesResponse {
    /// Convert to a page. Without an explicit flag, a full page implies more.
    pub fn into_page(self, page_size: usize) -> Page<Message> {
        let has_more = self
            .has_more
            .unwrap_or(self.messages.len() >= page_size);
        Page::new(self.messages, has_more)
    }
}
