//! One channel's message list and older-history pagination.

use std::future::Future;

use meeps_types::{Message, Page, StableId};
use thiserror::Error;
use tracing::{debug, info};

use crate::merge::prepend_older;
use crate::scroll::{ScrollAnchor, Viewport};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history request failed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("history endpoint returned status {status}")]
    Status { status: u16 },
    #[error("malformed history page: {0}")]
    Decode(String),
}

/// Pagination boundary. Pages are time-ordered, oldest first; `before` is
/// the id of the oldest message currently shown.
pub trait HistorySource {
    fn fetch(
        &self,
        channel: &str,
        before: Option<&StableId>,
    ) -> impl Future<Output = Result<Page<Message>, HistoryError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// `count` older messages were spliced in above the current content.
    Prepended { count: usize },
    /// Another older-history request is still settling.
    Suppressed,
    /// The channel has no older history.
    Exhausted,
    /// The response arrived after a channel switch and was dropped.
    Discarded,
}

/// Ticket for an in-flight older-history request.
#[derive(Debug, Clone, PartialEq)]
pub struct OlderRequest {
    pub channel: String,
    pub before: Option<StableId>,
}

#[derive(Debug)]
pub struct Timeline {
    channel: String,
    messages: Vec<Message>,
    has_more: bool,
    anchor: ScrollAnchor,
}

impl Timeline {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            messages: Vec::new(),
            has_more: false,
            anchor: ScrollAnchor::new(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn anchor(&self) -> &ScrollAnchor {
        &self.anchor
    }

    /// Replace the list with the latest page and pin to the bottom.
    pub async fn load_initial<S: HistorySource>(
        &mut self,
        source: &S,
    ) -> Result<usize, HistoryError> {
        let page = source.fetch(&self.channel, None).await?;
        let count = page.items.len();
        self.messages = page.items;
        self.has_more = page.has_more;
        self.anchor.on_channel_switch();
        info!("Loaded {} messages for #{}", count, self.channel);
        Ok(count)
    }

    /// Move to another channel. Any pending prepend correction is dropped;
    /// follow with `load_initial`.
    pub fn switch_channel(&mut self, channel: impl Into<String>) {
        let channel = channel.into();
        info!("Switching channel: #{} -> #{}", self.channel, channel);
        self.channel = channel;
        self.messages.clear();
        self.has_more = false;
        self.anchor.on_channel_switch();
    }

    /// Start an older-history request. Returns `None` when there is no
    /// older history or another request is still settling.
    pub fn begin_load_older<V: Viewport + ?Sized>(&mut self, viewport: &V) -> Option<OlderRequest> {
        if !self.has_more {
            debug!("No older history for #{}", self.channel);
            return None;
        }
        if !self.anchor.on_prepend_begin(viewport) {
            return None;
        }
        Some(OlderRequest {
            channel: self.channel.clone(),
            before: self.oldest_id(),
        })
    }

    /// Splice a fetched older page in above the current content. Messages
    /// already shown are not duplicated. Call `prepend_settled` once the
    /// new content has been laid out.
    pub fn finish_load_older(&mut self, request: OlderRequest, page: Page<Message>) -> LoadOutcome {
        if request.channel != self.channel || !self.anchor.is_prepend_pending() {
            debug!(
                "Dropping stale older page for #{} ({} messages)",
                request.channel,
                page.items.len()
            );
            return LoadOutcome::Discarded;
        }

        let before = self.messages.len();
        self.messages = prepend_older(&page.items, &self.messages);
        let count = self.messages.len() - before;

        // A page that does not move the cursor would be requested again.
        let advanced = self.oldest_id() != request.before;
        self.has_more = page.has_more && advanced;
        if page.has_more && !advanced {
            debug!("Older page for #{} did not advance the cursor", self.channel);
        }

        if count == 0 {
            self.anchor.abort_prepend();
            return LoadOutcome::Exhausted;
        }
        debug!("Prepended {} older messages to #{}", count, self.channel);
        LoadOutcome::Prepended { count }
    }

    /// Cursor for the next older page: the oldest message carrying an id.
    fn oldest_id(&self) -> Option<StableId> {
        self.messages.iter().find_map(|m| m.id.clone())
    }

    /// The older-history request failed.
    pub fn abort_load_older(&mut self, request: &OlderRequest) {
        if request.channel == self.channel {
            self.anchor.abort_prepend();
        }
    }

    /// Fetch and splice the page before the oldest message shown.
    pub async fn load_older<S, V>(
        &mut self,
        source: &S,
        viewport: &V,
    ) -> Result<LoadOutcome, HistoryError>
    where
        S: HistorySource,
        V: Viewport + ?Sized,
    {
        if !self.has_more {
            return Ok(LoadOutcome::Exhausted);
        }
        let Some(request) = self.begin_load_older(viewport) else {
            return Ok(LoadOutcome::Suppressed);
        };
        match source.fetch(&request.channel, request.before.as_ref()).await {
            Ok(page) => Ok(self.finish_load_older(request, page)),
            Err(e) => {
                self.abort_load_older(&request);
                Err(e)
            }
        }
    }

    /// The prepended content has been laid out; keeps it pinned on screen.
    pub fn prepend_settled<V: Viewport + ?Sized>(&mut self, viewport: &mut V) -> Option<f64> {
        self.anchor.on_prepend_end(viewport)
    }

    /// A live message arrived. Returns false when it belongs to another
    /// channel or is already shown.
    pub fn push<V: Viewport + ?Sized>(&mut self, message: Message, viewport: &V) -> bool {
        if message.channel.as_deref().is_some_and(|c| c != self.channel) {
            return false;
        }
        if let Some(id) = &message.id {
            if self.messages.iter().any(|m| m.id.as_ref() == Some(id)) {
                debug!("Ignoring duplicate live message {}", id);
                return false;
            }
        }
        self.anchor.on_append(viewport);
        self.messages.push(message);
        true
    }

    /// Layout-complete signal from the host.
    pub fn settle<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        self.anchor.on_layout_settled(viewport);
    }

    pub fn jump_to_bottom<V: Viewport + ?Sized>(&mut self, viewport: &mut V) {
        self.anchor.jump_to_bottom(viewport);
    }
}
