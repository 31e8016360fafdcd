/// Meeps timeline engine.
///
/// - `grouper`: day buckets and same-sender runs
/// - `scroll`: viewport anchoring across append / prepend / channel switch
/// - `history`: one channel's message list and older-history pagination
/// - `merge`: idempotent seen-id merging for polled lists
/// - `matches`: the match feed built on `merge`
/// - `attachments`: attachment link resolution
/// - `view`: the render tree handed to the UI

pub mod attachments;
pub mod grouper;
pub mod history;
pub mod matches;
pub mod merge;
pub mod scroll;
pub mod view;

pub use attachments::{AttachmentView, resolve_attachment};
pub use grouper::{DayGroup, DayKey, RUN_GAP_MS, SenderRun, TimelineGrouper};
pub use history::{HistoryError, HistorySource, LoadOutcome, OlderRequest, Timeline};
pub use matches::{MatchFeed, MatchFilters, MatchSummary, sort_for_display};
pub use merge::{Identified, fresh_items, merge_unseen, prepend_older};
pub use scroll::{AnchorState, NEAR_BOTTOM_PX, ScrollAnchor, ScrollState, Viewport};
pub use view::{DayView, MessageBody, MessageView, RunView, TimelineView, ViewContext, build_view};
