//! Match feed: the bot's recent games, with live polling and a staged
//! "new matches" affordance.

use std::cmp::Reverse;

use chrono::{DateTime, Utc};
use meeps_types::de::{lenient_timestamp, null_as_default};
use meeps_types::{ConfigError, ConfigStore, ConfigStoreExt};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::merge::{Identified, fresh_items, merge_unseen};

pub const LIVE_LIMIT: usize = 5;
pub const PAGE_LIMIT: usize = 20;

pub const FILTERS_KEY: &str = "matches.filters";
const ALL: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub game_creation: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub summoner_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub champion: String,
    /// `Win`, `Lose` or `Remake`.
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: String,
    #[serde(default)]
    pub queue_name: Option<String>,
}

impl Identified for MatchSummary {
    type Id = String;

    fn stable_id(&self) -> Option<&String> {
        (!self.match_id.is_empty()).then_some(&self.match_id)
    }
}

/// Newest first; matches without a creation time go last. Stable for ties.
pub fn sort_for_display(matches: &mut [MatchSummary]) {
    matches.sort_by_key(|m| Reverse(m.game_creation.map(|t| t.timestamp_millis()).unwrap_or(0)));
}

/// Remembered match-list filters. Each field is `all` or a concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchFilters {
    pub player: String,
    pub match_type: String,
    pub result: String,
}

impl Default for MatchFilters {
    fn default() -> Self {
        Self {
            player: ALL.into(),
            match_type: ALL.into(),
            result: ALL.into(),
        }
    }
}

impl MatchFilters {
    pub fn is_unfiltered(&self) -> bool {
        self.player == ALL && self.match_type == ALL && self.result == ALL
    }

    pub fn load(store: &dyn ConfigStore) -> Self {
        store.get_as(FILTERS_KEY).unwrap_or_default()
    }

    pub fn save(&self, store: &mut dyn ConfigStore) -> Result<(), ConfigError> {
        store.set_as(FILTERS_KEY, self)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MatchFeed {
    displayed: Vec<MatchSummary>,
    live: Vec<MatchSummary>,
    staged: Vec<MatchSummary>,
    filters: MatchFilters,
}

impl MatchFeed {
    pub fn new(filters: MatchFilters) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }

    pub fn filters(&self) -> &MatchFilters {
        &self.filters
    }

    /// Changing filters drops anything staged under the old ones.
    pub fn set_filters(&mut self, filters: MatchFilters) {
        if filters != self.filters {
            self.staged.clear();
            self.filters = filters;
        }
    }

    /// History page, newest first.
    pub fn displayed(&self) -> &[MatchSummary] {
        &self.displayed
    }

    /// Live tab, newest first.
    pub fn live(&self) -> &[MatchSummary] {
        &self.live
    }

    pub fn staged_count(&self) -> usize {
        self.staged.len()
    }

    /// Replace the history page with a freshly loaded one.
    pub fn replace(&mut self, mut page: Vec<MatchSummary>) {
        sort_for_display(&mut page);
        page.truncate(PAGE_LIMIT);
        self.displayed = page;
        self.staged.clear();
    }

    /// Merge a live poll straight into the live tab. Returns how many
    /// matches were new.
    pub fn poll_live(&mut self, incoming: &[MatchSummary]) -> usize {
        let fresh = fresh_items(incoming, &self.live).len();
        if fresh > 0 {
            self.live = merged(incoming, &self.live, LIVE_LIMIT);
        }
        fresh
    }

    /// Record unseen matches from a history poll without showing them.
    /// Polls are ignored while filters are active.
    pub fn stage(&mut self, incoming: &[MatchSummary]) -> usize {
        if !self.filters.is_unfiltered() {
            debug!("Match poll ignored: filters active");
            return self.staged.len();
        }
        let fresh: Vec<MatchSummary> = fresh_items(incoming, &self.displayed)
            .into_iter()
            .cloned()
            .collect();
        if !fresh.is_empty() {
            self.staged = fresh;
        }
        self.staged.len()
    }

    /// The viewer clicked "N new matches".
    pub fn show_staged(&mut self) -> usize {
        let staged = std::mem::take(&mut self.staged);
        let before = self.displayed.clone();
        self.displayed = merged(&staged, &before, PAGE_LIMIT);
        fresh_items(&staged, &before).len()
    }
}

/// Merge, order for display, then cap, so the newest survive the cut
/// whatever order the backend sent them in.
fn merged(incoming: &[MatchSummary], existing: &[MatchSummary], cap: usize) -> Vec<MatchSummary> {
    let mut list = merge_unseen(incoming, existing, usize::MAX);
    sort_for_display(&mut list);
    list.truncate(cap);
    list
}
