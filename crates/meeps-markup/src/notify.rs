use serde::Serialize;

use meeps_types::Message;

use crate::mention::{SlugDirectory, is_mentioned};

const TITLE: &str = "Meeps – mentioned you";
const PREVIEW_CHARS: usize = 80;
const DEFAULT_CHANNEL: &str = "general";

/// Desktop/push notification for a message that mentions the viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MentionNotification {
    pub title: String,
    pub body: String,
    /// Collapses repeated notifications for the same channel.
    pub tag: String,
}

/// Build a notification when `message` mentions the viewer.
///
/// Messages sent by the viewer never notify. Whether the app is in the
/// background is the caller's decision.
pub fn mention_notification(
    message: &Message,
    viewer_display_name: &str,
    directory: &SlugDirectory,
    channel: Option<&str>,
) -> Option<MentionNotification> {
    let viewer = viewer_display_name.trim();
    if !viewer.is_empty() && message.sender.trim() == viewer {
        return None;
    }
    if !is_mentioned(&message.content, viewer, directory) {
        return None;
    }

    let channel = channel
        .or(message.channel.as_deref())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_CHANNEL);
    let sender = Some(message.sender.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or("Someone");

    Some(MentionNotification {
        title: TITLE.to_string(),
        body: format!("#{}: {} – {}", channel, sender, preview(message)),
        tag: format!("mention-{}", channel),
    })
}

fn preview(message: &Message) -> String {
    let content = message.content.trim();
    if content.is_empty() {
        return if message.attachments.is_empty() {
            "New message".to_string()
        } else {
            "sent an attachment".to_string()
        };
    }
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}…", head)
    } else {
        head
    }
}
