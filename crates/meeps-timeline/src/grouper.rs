//! Day and sender-run segmentation of an ordered message list.
//!
//! Input is assumed ordered by `created_at` (ties in arrival order). Grouping
//! never reorders: flattening the days, or the runs of a day, gives back the
//! input sequence. Output borrows from the input and is rebuilt on every
//! render pass.

use chrono::{Local, NaiveDate, TimeDelta, TimeZone};
use serde::Serialize;

use meeps_types::{Message, StableId};

/// Largest gap, in milliseconds, between two messages of the same run.
pub const RUN_GAP_MS: i64 = 120_000;

/// Calendar day of a message in the viewer's zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(tag = "kind", content = "date", rename_all = "camelCase")]
pub enum DayKey {
    Date(NaiveDate),
    /// Messages without a timestamp. Renders no date divider.
    Undated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    pub key: DayKey,
    pub messages: Vec<&'a Message>,
}

/// Consecutive messages from one sender, confined to one day.
/// Only the first message renders the sender header.
#[derive(Debug, Clone, PartialEq)]
pub struct SenderRun<'a> {
    pub sender: &'a str,
    pub sender_id: Option<&'a StableId>,
    pub messages: Vec<&'a Message>,
}

impl<'a> SenderRun<'a> {
    fn start(message: &'a Message) -> Self {
        Self {
            sender: &message.sender,
            sender_id: message.sender_id.as_ref(),
            messages: vec![message],
        }
    }

    /// The message carrying the run header.
    pub fn head(&self) -> &'a Message {
        self.messages[0]
    }

    fn last(&self) -> &'a Message {
        self.messages[self.messages.len() - 1]
    }
}

#[derive(Debug, Clone)]
pub struct TimelineGrouper<Tz: TimeZone = Local> {
    tz: Tz,
    run_gap: TimeDelta,
}

impl Default for TimelineGrouper<Local> {
    fn default() -> Self {
        Self::new(Local)
    }
}

impl TimelineGrouper<Local> {
    /// Grouper for the viewer's local zone.
    pub fn local() -> Self {
        Self::default()
    }
}

impl<Tz: TimeZone> TimelineGrouper<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            run_gap: TimeDelta::milliseconds(RUN_GAP_MS),
        }
    }

    pub fn with_run_gap(mut self, run_gap: TimeDelta) -> Self {
        self.run_gap = run_gap;
        self
    }

    pub fn timezone(&self) -> &Tz {
        &self.tz
    }

    pub fn day_key(&self, message: &Message) -> DayKey {
        match message.created_at {
            Some(ts) => DayKey::Date(ts.with_timezone(&self.tz).date_naive()),
            None => DayKey::Undated,
        }
    }

    /// Partition messages into day buckets. Each bucket is a maximal stretch
    /// of consecutive messages sharing a day key. An undated stretch between
    /// two messages of the same day joins that day, so no day gets a second
    /// divider.
    pub fn group<'a>(&self, messages: &'a [Message]) -> Vec<DayGroup<'a>> {
        let mut days: Vec<DayGroup<'a>> = Vec::new();
        for message in messages {
            let key = self.day_key(message);
            if Self::closes_undated_gap(&days, key) {
                let undated = days.pop();
                if let (Some(undated), Some(day)) = (undated, days.last_mut()) {
                    day.messages.extend(undated.messages);
                }
            }
            match days.last_mut() {
                Some(day) if day.key == key => day.messages.push(message),
                _ => days.push(DayGroup {
                    key,
                    messages: vec![message],
                }),
            }
        }
        days
    }

    fn closes_undated_gap(days: &[DayGroup<'_>], key: DayKey) -> bool {
        match days {
            [.., before, last] => {
                last.key == DayKey::Undated && key != DayKey::Undated && before.key == key
            }
            _ => false,
        }
    }

    /// Split one day's messages into sender runs.
    pub fn runs<'a>(&self, day: &DayGroup<'a>) -> Vec<SenderRun<'a>> {
        let mut runs: Vec<SenderRun<'a>> = Vec::new();
        for &message in &day.messages {
            match runs.last_mut() {
                Some(run) if self.continues_run(run.last(), message) => run.messages.push(message),
                _ => runs.push(SenderRun::start(message)),
            }
        }
        runs
    }

    /// Same sender and within the gap. A missing timestamp on either side
    /// counts as no gap.
    pub fn continues_run(&self, last: &Message, next: &Message) -> bool {
        if !last.same_sender(next) {
            return false;
        }
        match (last.created_at, next.created_at) {
            (Some(a), Some(b)) => b.signed_duration_since(a) <= self.run_gap,
            _ => true,
        }
    }
}
