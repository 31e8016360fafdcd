//! Render tree handed to the UI: days, then sender runs, then messages.
//!
//! Rebuilt from the raw message list on every pass; nothing here is
//! mutated in place.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use meeps_markup::{
    IconResolver, NoIcons, SlugDirectory, initials, is_mentioned, parse_legacy_notice,
    render_markdown, segment,
};
use meeps_types::{Message, Notice, Profile, ProfileMap, Segment, StableId};
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::attachments::{AttachmentView, resolve_attachment};
use crate::grouper::{DayKey, SenderRun, TimelineGrouper};

/// Senders whose plain-text posts may be legacy notices.
pub const DEFAULT_BOT_NAMES: &[&str] = &["Diana"];

/// Namespace for render keys of messages that have no id yet.
const KEY_NAMESPACE: Uuid = Uuid::from_u128(0x6d65_6570_735f_7469_6d65_6c69_6e65_6b79);

/// Everything `build_view` needs besides the messages.
pub struct ViewContext<'a, Tz: TimeZone = Local> {
    pub directory: &'a SlugDirectory,
    pub profiles: &'a ProfileMap,
    pub icons: &'a dyn IconResolver,
    pub grouper: TimelineGrouper<Tz>,
    /// "Today" in the grouper's zone, for divider labels.
    pub today: NaiveDate,
    pub viewer: Option<String>,
    pub viewer_id: Option<StableId>,
    pub bot_names: Vec<String>,
    pub attachment_base: Option<String>,
}

impl<'a> ViewContext<'a, Local> {
    pub fn new(directory: &'a SlugDirectory, profiles: &'a ProfileMap) -> Self {
        Self {
            directory,
            profiles,
            icons: &NoIcons,
            grouper: TimelineGrouper::local(),
            today: Local::now().date_naive(),
            viewer: None,
            viewer_id: None,
            bot_names: DEFAULT_BOT_NAMES.iter().map(|s| s.to_string()).collect(),
            attachment_base: None,
        }
    }
}

impl<'a, Tz: TimeZone> ViewContext<'a, Tz> {
    /// Switch zones; `today` is recomputed in the new zone.
    pub fn with_grouper<T: TimeZone>(self, grouper: TimelineGrouper<T>) -> ViewContext<'a, T> {
        let today = Utc::now().with_timezone(grouper.timezone()).date_naive();
        ViewContext {
            directory: self.directory,
            profiles: self.profiles,
            icons: self.icons,
            grouper,
            today,
            viewer: self.viewer,
            viewer_id: self.viewer_id,
            bot_names: self.bot_names,
            attachment_base: self.attachment_base,
        }
    }

    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn with_viewer(mut self, name: impl Into<String>, id: Option<StableId>) -> Self {
        self.viewer = Some(name.into());
        self.viewer_id = id;
        self
    }

    pub fn with_icons(mut self, icons: &'a dyn IconResolver) -> Self {
        self.icons = icons;
        self
    }

    pub fn with_bot_names(mut self, names: Vec<String>) -> Self {
        self.bot_names = names;
        self
    }

    pub fn with_attachment_base(mut self, base: impl Into<String>) -> Self {
        self.attachment_base = Some(base.into());
        self
    }

    fn is_bot(&self, sender: &str) -> bool {
        let sender = sender.trim();
        self.bot_names.iter().any(|b| b.trim().eq_ignore_ascii_case(sender))
    }

    fn is_self(&self, run: &SenderRun<'_>) -> bool {
        match (&self.viewer_id, run.sender_id) {
            (Some(viewer), Some(sender)) => viewer == sender,
            _ => self
                .viewer
                .as_deref()
                .is_some_and(|v| v.trim().eq_ignore_ascii_case(run.sender.trim())),
        }
    }

    fn profile_for(&self, run: &SenderRun<'_>) -> Option<&'a Profile> {
        if let Some(profile) = run.sender_id.and_then(|id| self.profiles.get(id)) {
            return Some(profile);
        }
        let sender = run.sender.trim().to_lowercase();
        self.profiles
            .iter()
            .filter(|(_, p)| p.display_name.trim().to_lowercase() == sender)
            .min_by(|a, b| a.0.cmp(b.0))
            .map(|(_, p)| p)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineView {
    pub days: Vec<DayView>,
    pub message_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub key: DayKey,
    /// Divider text; `None` for undated messages.
    pub label: Option<String>,
    pub runs: Vec<RunView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunView {
    pub sender: String,
    pub sender_id: Option<StableId>,
    pub avatar_url: Option<String>,
    pub initials: String,
    pub is_self: bool,
    /// `HH:MM` of the first message.
    pub time_label: Option<String>,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub key: String,
    pub id: Option<StableId>,
    pub created_at: Option<DateTime<Utc>>,
    pub mentions_viewer: bool,
    pub body: MessageBody,
    pub attachments: Vec<AttachmentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MessageBody {
    /// Structured notice, either sent as one or recovered from bot text.
    Notice { notice: Notice, legacy: bool },
    Markdown { html: String, segments: Vec<Segment> },
}

pub fn build_view<Tz: TimeZone>(messages: &[Message], ctx: &ViewContext<'_, Tz>) -> TimelineView {
    let mut keys = KeyAllocator::default();
    let days = ctx
        .grouper
        .group(messages)
        .iter()
        .map(|day| DayView {
            key: day.key,
            label: day_label(day.key, ctx.today),
            runs: ctx
                .grouper
                .runs(day)
                .iter()
                .map(|run| run_view(run, ctx, &mut keys))
                .collect(),
        })
        .collect();
    TimelineView {
        days,
        message_count: messages.len(),
    }
}

fn run_view<Tz: TimeZone>(
    run: &SenderRun<'_>,
    ctx: &ViewContext<'_, Tz>,
    keys: &mut KeyAllocator,
) -> RunView {
    let profile = ctx.profile_for(run);
    let display_name = profile
        .map(|p| p.display_name.as_str())
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(run.sender);
    RunView {
        sender: run.sender.to_string(),
        sender_id: run.sender_id.cloned(),
        avatar_url: profile
            .and_then(|p| p.avatar_url.clone())
            .filter(|u| !u.trim().is_empty()),
        initials: initials(display_name),
        is_self: ctx.is_self(run),
        time_label: run.head().created_at.map(|ts| {
            ts.with_timezone(ctx.grouper.timezone())
                .naive_local()
                .format("%H:%M")
                .to_string()
        }),
        messages: run
            .messages
            .iter()
            .map(|m| message_view(m, ctx, keys))
            .collect(),
    }
}

fn message_view<Tz: TimeZone>(
    message: &Message,
    ctx: &ViewContext<'_, Tz>,
    keys: &mut KeyAllocator,
) -> MessageView {
    let mentions_viewer = ctx
        .viewer
        .as_deref()
        .is_some_and(|viewer| is_mentioned(&message.content, viewer, ctx.directory));
    MessageView {
        key: keys.key_for(message),
        id: message.id.clone(),
        created_at: message.created_at,
        mentions_viewer,
        body: message_body(message, ctx),
        attachments: message
            .attachments
            .iter()
            .map(|a| resolve_attachment(a, ctx.attachment_base.as_deref()))
            .collect(),
    }
}

fn message_body<Tz: TimeZone>(message: &Message, ctx: &ViewContext<'_, Tz>) -> MessageBody {
    if let Some(notice) = message.embed.as_ref().filter(|n| !n.is_empty()) {
        return MessageBody::Notice {
            notice: notice.clone(),
            legacy: false,
        };
    }
    if ctx.is_bot(&message.sender) {
        match parse_legacy_notice(&message.content, message.created_at, ctx.icons) {
            Some(notice) => {
                return MessageBody::Notice {
                    notice,
                    legacy: true,
                };
            }
            None => debug!(
                "Bot message from {} is not a notice; rendering as text",
                message.sender
            ),
        }
    }
    MessageBody::Markdown {
        html: render_markdown(&message.content, ctx.directory),
        segments: segment(&message.content),
    }
}

/// Divider label for a day bucket.
pub fn day_label(key: DayKey, today: NaiveDate) -> Option<String> {
    let DayKey::Date(date) = key else {
        return None;
    };
    Some(if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%A, %B %-d, %Y").to_string()
    })
}

/// Hands out render keys, unique within one view.
#[derive(Default)]
struct KeyAllocator {
    used: HashMap<String, usize>,
}

impl KeyAllocator {
    fn key_for(&mut self, message: &Message) -> String {
        let base = match &message.id {
            Some(id) => id.to_string(),
            None => content_key(message),
        };
        let seen = self.used.entry(base.clone()).or_insert(0);
        *seen += 1;
        match *seen {
            1 => base,
            n => format!("{base}-{n}"),
        }
    }
}

/// Deterministic key for a message the server has not assigned an id to.
fn content_key(message: &Message) -> String {
    let created = message
        .created_at
        .map(|ts| ts.to_rfc3339())
        .unwrap_or_default();
    let name = format!("{}\u{1f}{}\u{1f}{}", message.sender, created, message.content);
    Uuid::new_v5(&KEY_NAMESPACE, name.as_bytes()).to_string()
}
