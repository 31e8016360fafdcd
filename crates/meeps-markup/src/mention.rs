//! Mention segmentation.
//!
//! A mention starts at `@` and runs through the longest stretch of
//! non-whitespace characters. Trailing punctuation is part of the slug
//! (`@Bob!` is slug `Bob!`); the tests below pin that behavior.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use meeps_types::{ProfileMap, Segment};

static MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"@\S+").expect("mention pattern is valid"));

/// Slug that addresses everybody in the channel.
pub const EVERYONE: &str = "everyone";

/// Split content into ordered text and mention segments.
///
/// Always returns at least one segment; empty input yields a single empty
/// text segment. Joining the segments back (mentions as `@slug`) reproduces
/// the input exactly.
pub fn segment(content: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for m in MENTION_RE.find_iter(content) {
        if m.start() > last {
            segments.push(Segment::text(&content[last..m.start()]));
        }
        // Skip the leading '@' (one byte).
        segments.push(Segment::mention(&content[m.start() + 1..m.end()]));
        last = m.end();
    }

    if last < content.len() {
        segments.push(Segment::text(&content[last..]));
    }
    if segments.is_empty() {
        segments.push(Segment::text(""));
    }
    segments
}

/// Iterate the mention slugs in `content` without building segments.
pub fn mention_slugs(content: &str) -> impl Iterator<Item = &str> {
    MENTION_RE.find_iter(content).map(|m| &m.as_str()[1..])
}

/// Display name to slug: trimmed, whitespace runs replaced by `_`.
pub fn slug_for(display_name: &str) -> String {
    display_name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// Whether `content` mentions the viewer, either by name slug, through the
/// slug directory, or via `@everyone`. Comparison is case-insensitive.
pub fn is_mentioned(content: &str, viewer_display_name: &str, directory: &SlugDirectory) -> bool {
    let viewer = viewer_display_name.trim();
    let viewer_slug = slug_for(viewer).to_lowercase();
    let viewer_lower = viewer.to_lowercase();

    mention_slugs(content).any(|slug| {
        if slug.eq_ignore_ascii_case(EVERYONE) {
            return true;
        }
        if viewer.is_empty() {
            return false;
        }
        if slug.to_lowercase() == viewer_slug {
            return true;
        }
        directory
            .lookup(slug)
            .is_some_and(|name| name.trim().to_lowercase() == viewer_lower)
    })
}

/// Slug to display-name table used to label mention badges.
#[derive(Debug, Clone)]
pub struct SlugDirectory {
    names: HashMap<String, String>,
    /// Lowercased slug to name; the first name registered for a folded slug wins.
    folded: HashMap<String, String>,
}

impl Default for SlugDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl SlugDirectory {
    /// A directory that knows only `everyone`.
    pub fn new() -> Self {
        let mut dir = Self {
            names: HashMap::new(),
            folded: HashMap::new(),
        };
        dir.insert_slug(EVERYONE.to_string(), EVERYONE.to_string());
        dir
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut dir = Self::new();
        for name in names {
            dir.insert(name.as_ref());
        }
        dir
    }

    /// Directory covering the viewer, everyone present, and all known profiles.
    pub fn from_profiles<'a>(
        viewer: Option<&str>,
        present: impl IntoIterator<Item = &'a str>,
        profiles: &ProfileMap,
    ) -> Self {
        let mut dir = Self::new();
        if let Some(viewer) = viewer {
            dir.insert(viewer);
        }
        for name in present {
            dir.insert(name);
        }
        // Sorted so the first-registered rule does not depend on hash order.
        let mut names: Vec<&str> = profiles.values().map(|p| p.display_name.as_str()).collect();
        names.sort_unstable();
        for name in names {
            dir.insert(name);
        }
        dir
    }

    pub fn insert(&mut self, display_name: &str) {
        let slug = slug_for(display_name);
        if slug.is_empty() {
            return;
        }
        self.insert_slug(slug, display_name.trim().to_string());
    }

    /// Register a slug that does not derive from the display name.
    pub fn insert_alias(&mut self, slug: &str, display_name: &str) {
        if slug.is_empty() {
            return;
        }
        self.insert_slug(slug.to_string(), display_name.trim().to_string());
    }

    fn insert_slug(&mut self, slug: String, name: String) {
        self.folded
            .entry(slug.to_lowercase())
            .or_insert_with(|| name.clone());
        self.names.insert(slug, name);
    }

    /// Exact slug first, then a case-insensitive match.
    pub fn lookup(&self, slug: &str) -> Option<&str> {
        self.names
            .get(slug)
            .or_else(|| self.folded.get(&slug.to_lowercase()))
            .map(String::as_str)
    }

    /// Display name for a slug, falling back to the slug with `_` as spaces.
    pub fn resolve(&self, slug: &str) -> String {
        match self.lookup(slug) {
            Some(name) => name.to_string(),
            None => slug.replace('_', " "),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
