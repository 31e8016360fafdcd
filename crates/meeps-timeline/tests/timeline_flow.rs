use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use meeps_markup::SlugDirectory;
use meeps_timeline::{
    HistoryError, HistorySource, LoadOutcome, Timeline, TimelineGrouper, ViewContext, Viewport,
    build_view,
};
use meeps_types::{Message, Page, ProfileMap, StableId};

struct FakeSource {
    /// Keyed by the `before` cursor.
    pages: HashMap<Option<String>, Page<Message>>,
    calls: AtomicUsize,
}

impl FakeSource {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    fn page(mut self, before: Option<&str>, ids: &[u32], has_more: bool) -> Self {
        let items = ids.iter().map(|id| message(*id)).collect();
        self.pages
            .insert(before.map(str::to_string), Page::new(items, has_more));
        self
    }
}

impl HistorySource for FakeSource {
    async fn fetch(
        &self,
        _channel: &str,
        before: Option<&StableId>,
    ) -> Result<Page<Message>, HistoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let key = before.map(|id| id.as_str().to_string());
        self.pages
            .get(&key)
            .cloned()
            .ok_or(HistoryError::Status { status: 404 })
    }
}

struct FakeViewport {
    top: f64,
    height: f64,
    client: f64,
}

impl Viewport for FakeViewport {
    fn scroll_top(&self) -> f64 {
        self.top
    }

    fn scroll_height(&self) -> f64 {
        self.height
    }

    fn client_height(&self) -> f64 {
        self.client
    }

    fn set_scroll_top(&mut self, top: f64) {
        self.top = top.clamp(0.0, (self.height - self.client).max(0.0));
    }
}

fn at(minutes: u32) -> DateTime<Utc> {
    // 2025-03-03 12:00:00 UTC
    DateTime::from_timestamp(1_741_003_200 + i64::from(minutes) * 60, 0).unwrap()
}

fn message(id: u32) -> Message {
    Message::new("alice", format!("message {id}"))
        .with_id(id.to_string())
        .with_sender_id("7")
        .at(at(id))
}

fn settle_twice(timeline: &mut Timeline, vp: &mut FakeViewport) {
    timeline.settle(vp);
    timeline.settle(vp);
}

fn ids(timeline: &Timeline) -> Vec<String> {
    timeline
        .messages()
        .iter()
        .filter_map(|m| m.id.as_ref().map(|id| id.to_string()))
        .collect()
}

#[tokio::test]
async fn paginates_older_history_and_keeps_position() {
    let source = FakeSource::new()
        .page(None, &[4, 5, 6], true)
        .page(Some("4"), &[1, 2, 3, 4], false);
    let mut vp = FakeViewport {
        top: 0.0,
        height: 900.0,
        client: 400.0,
    };
    let mut timeline = Timeline::new("general");

    assert_eq!(timeline.load_initial(&source).await.unwrap(), 3);
    timeline.settle(&mut vp);
    timeline.settle(&mut vp);
    assert_eq!(vp.top, 500.0);

    // Scrolled to the top, older history requested.
    vp.top = 20.0;
    let outcome = timeline.load_older(&source, &vp).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Prepended { count: 3 });
    assert_eq!(ids(&timeline), ["1", "2", "3", "4", "5", "6"]);

    // A second trigger before layout settles is dropped without a fetch.
    let calls = source.calls.load(Ordering::SeqCst);
    assert_eq!(
        timeline.load_older(&source, &vp).await.unwrap(),
        LoadOutcome::Exhausted
    );
    assert_eq!(source.calls.load(Ordering::SeqCst), calls);

    vp.height = 1200.0;
    assert_eq!(timeline.prepend_settled(&mut vp), Some(300.0));
    assert_eq!(vp.top, 320.0);
}

#[tokio::test]
async fn overlapping_older_requests_are_suppressed() {
    let source = FakeSource::new()
        .page(None, &[4, 5, 6], true)
        .page(Some("4"), &[1, 2, 3], true);
    let mut vp = FakeViewport {
        top: 0.0,
        height: 900.0,
        client: 400.0,
    };
    let mut timeline = Timeline::new("general");
    timeline.load_initial(&source).await.unwrap();
    settle_twice(&mut timeline, &mut vp);
    vp.top = 0.0;

    let first = timeline.load_older(&source, &vp).await.unwrap();
    assert_eq!(first, LoadOutcome::Prepended { count: 3 });
    let calls = source.calls.load(Ordering::SeqCst);

    let second = timeline.load_older(&source, &vp).await.unwrap();
    assert_eq!(second, LoadOutcome::Suppressed);
    assert_eq!(source.calls.load(Ordering::SeqCst), calls);
}

#[tokio::test]
async fn failed_fetch_releases_the_anchor() {
    let source = FakeSource::new().page(None, &[4, 5, 6], true);
    let mut vp = FakeViewport {
        top: 0.0,
        height: 900.0,
        client: 400.0,
    };
    let mut timeline = Timeline::new("general");
    timeline.load_initial(&source).await.unwrap();
    settle_twice(&mut timeline, &mut vp);

    let err = timeline.load_older(&source, &vp).await.unwrap_err();
    assert!(matches!(err, HistoryError::Status { status: 404 }));
    assert!(!timeline.anchor().is_prepend_pending());
    assert!(timeline.begin_load_older(&vp).is_some());
}

#[tokio::test]
async fn live_messages_follow_the_bottom_and_render() {
    let source = FakeSource::new().page(None, &[1, 2], false);
    let mut vp = FakeViewport {
        top: 0.0,
        height: 600.0,
        client: 400.0,
    };
    let mut timeline = Timeline::new("general");
    timeline.load_initial(&source).await.unwrap();
    timeline.settle(&mut vp);
    timeline.settle(&mut vp);
    assert_eq!(vp.top, 200.0);

    assert!(timeline.push(message(3), &vp));
    assert!(!timeline.push(message(3), &vp));
    vp.height = 700.0;
    timeline.settle(&mut vp);
    assert_eq!(vp.top, 300.0);
    assert!(!timeline.anchor().has_new_content_below());

    let dir = SlugDirectory::from_names(["alice"]);
    let profiles = ProfileMap::new();
    let ctx = ViewContext::new(&dir, &profiles)
        .with_grouper(TimelineGrouper::new(FixedOffset::east_opt(0).unwrap()))
        .with_today(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap())
        .with_viewer("alice", Some(StableId::from("7")));
    let view = build_view(timeline.messages(), &ctx);

    assert_eq!(view.message_count, 3);
    assert_eq!(view.days.len(), 1);
    assert_eq!(view.days[0].label.as_deref(), Some("Today"));
    assert_eq!(view.days[0].runs.len(), 1);
    assert!(view.days[0].runs[0].is_self);
    let keys: Vec<&str> = view.days[0].runs[0]
        .messages
        .iter()
        .map(|m| m.key.as_str())
        .collect();
    assert_eq!(keys, ["1", "2", "3"]);
}

#[tokio::test]
async fn channel_switch_drops_state() {
    let source = FakeSource::new().page(None, &[1, 2], true);
    let mut vp = FakeViewport {
        top: 0.0,
        height: 600.0,
        client: 400.0,
    };
    let mut timeline = Timeline::new("general");
    timeline.load_initial(&source).await.unwrap();
    settle_twice(&mut timeline, &mut vp);
    let request = timeline.begin_load_older(&vp).unwrap();

    timeline.switch_channel("random");
    assert_eq!(timeline.channel(), "random");
    assert!(timeline.messages().is_empty());
    assert_eq!(
        timeline.finish_load_older(request, Page::new(vec![message(0)], false)),
        LoadOutcome::Discarded
    );

    timeline.load_initial(&source).await.unwrap();
    assert_eq!(ids(&timeline), ["1", "2"]);
}

#[tokio::test]
async fn older_history_waits_for_initial_bottom_pin() {
    let source = FakeSource::new()
        .page(None, &[4, 5, 6], true)
        .page(Some("4"), &[1, 2, 3], false);
    let mut vp = FakeViewport {
        top: 0.0,
        height: 900.0,
        client: 400.0,
    };
    let mut timeline = Timeline::new("general");
    timeline.load_initial(&source).await.unwrap();

    assert_eq!(
        timeline.load_older(&source, &vp).await.unwrap(),
        LoadOutcome::Suppressed
    );
    settle_twice(&mut timeline, &mut vp);
    assert_eq!(vp.top, 500.0);
}
