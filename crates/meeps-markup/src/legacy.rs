//! Recovery of structured notices from legacy bot markdown.
//!
//! Before notices were posted as structured payloads, the match bot wrote
//! them as blank-line separated markdown blocks:
//!
//! ```text
//! **Title**
//!
//! Description
//!
//! **Field name** field value
//!
//! [Link](https://...)
//! ```
//!
//! Parsing never fails. Blocks that match nothing are skipped, and input that
//! yields neither a title nor a field is reported as `None` so the caller can
//! render it as ordinary markdown.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use meeps_types::{Notice, NoticeColor, NoticeField};

use crate::icons::IconResolver;

static BLOCK_SEPARATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n(?:[ \t]*\n)+").expect("block separator pattern is valid"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\*\*(.+)\*\*$").expect("title pattern is valid"));
static BARE_LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[.+\]\(.+\)$").expect("bare link pattern is valid"));
static URL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[([^\]]*)\]\((https?://[^)]+)\)$").expect("url link pattern is valid")
});
static FIELD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\*\*(.+?)\*\*\s+(.+)$").expect("field pattern is valid"));

/// Thumbnail candidates collected while walking fields.
#[derive(Debug, Default)]
struct Thumbnails {
    champion: Option<String>,
    rank_change: Option<String>,
    rank: Option<String>,
}

impl Thumbnails {
    fn rank(&self) -> Option<&String> {
        self.rank_change.as_ref().or(self.rank.as_ref())
    }

    fn pick(&self, rank_change_title: bool) -> Option<String> {
        if rank_change_title {
            if let Some(rank) = self.rank() {
                return Some(rank.clone());
            }
        }
        self.champion.as_ref().or(self.rank()).cloned()
    }
}

/// Parser for legacy bot notices.
pub struct LegacyNoticeParser<'a> {
    icons: &'a dyn IconResolver,
}

impl<'a> LegacyNoticeParser<'a> {
    pub fn new(icons: &'a dyn IconResolver) -> Self {
        Self { icons }
    }

    pub fn parse(&self, content: &str, created_at: Option<DateTime<Utc>>) -> Option<Notice> {
        let normalized = content.replace("\r\n", "\n");
        let trimmed = normalized.trim();
        if trimmed.is_empty() {
            return None;
        }

        let blocks: Vec<&str> = BLOCK_SEPARATOR_RE
            .split(trimmed)
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .collect();

        let mut notice = Notice {
            timestamp: created_at,
            ..Notice::default()
        };
        let mut i = 0;

        if let Some(title) = blocks.first().and_then(|b| title_of(b)) {
            notice.title = Some(title);
            i += 1;
        }

        if let Some(block) = blocks.get(i) {
            if !block.starts_with("**") && !BARE_LINK_RE.is_match(block) {
                notice.description = Some(block.to_string());
                i += 1;
            }
        }

        let mut thumbs = Thumbnails::default();
        for block in &blocks[i.min(blocks.len())..] {
            if let Some(caps) = URL_LINK_RE.captures(block) {
                // First link wins; later links are ignored, not treated as fields.
                if notice.url.is_none() {
                    notice.url = Some(caps[2].to_string());
                }
                continue;
            }

            let Some(caps) = FIELD_RE.captures(block) else {
                debug!("Skipping unrecognized legacy block {:?}", block);
                continue;
            };
            let name = caps[1].trim();
            let value = caps[2].trim();
            if name.is_empty() || value.is_empty() {
                continue;
            }

            self.infer_from_field(&mut notice, &mut thumbs, name, value);
            notice.fields.push(NoticeField::inline(name, value));
        }

        let title_lower = notice.title.as_deref().map(str::to_lowercase);
        let rank_change_title = title_lower
            .as_deref()
            .is_some_and(|t| t.contains("promotion") || t.contains("demotion"));
        if let Some(t) = title_lower.as_deref() {
            if t.contains("promotion") {
                notice.color_hex = notice.color_hex.or(Some(NoticeColor::WIN));
            } else if t.contains("demotion") {
                notice.color_hex = notice.color_hex.or(Some(NoticeColor::LOSE));
            }
        }
        notice.thumbnail_url = thumbs.pick(rank_change_title);

        if notice.title.is_none() && notice.fields.is_empty() {
            debug!("Content is not a legacy notice");
            return None;
        }
        Some(notice)
    }

    fn infer_from_field(
        &self,
        notice: &mut Notice,
        thumbs: &mut Thumbnails,
        name: &str,
        value: &str,
    ) {
        let name = name.to_lowercase();

        if notice.color_hex.is_none() && name.contains("result") {
            notice.color_hex = result_color(value);
        }
        if thumbs.champion.is_none() && name.contains("champ") {
            thumbs.champion = self.icons.champion_icon_url(value);
        }
        if name.contains("rank change") || name.contains("rank update") {
            if thumbs.rank_change.is_none() {
                thumbs.rank_change = self.icons.rank_emblem_url(value);
            }
        } else if thumbs.rank.is_none() && name.contains("rank") {
            thumbs.rank = self.icons.rank_emblem_url(value);
        }
    }
}

/// Parse legacy notice text with the given icon resolver.
pub fn parse_legacy_notice(
    content: &str,
    created_at: Option<DateTime<Utc>>,
    icons: &dyn IconResolver,
) -> Option<Notice> {
    LegacyNoticeParser::new(icons).parse(content, created_at)
}

/// A block that is exactly one bold span.
fn title_of(block: &str) -> Option<String> {
    let caps = TITLE_RE.captures(block)?;
    let inner = caps[1].trim();
    if inner.is_empty() || inner.contains("**") {
        return None;
    }
    Some(inner.to_string())
}

fn result_color(value: &str) -> Option<NoticeColor> {
    let v = value.to_lowercase();
    if v.contains("win") {
        Some(NoticeColor::WIN)
    } else if v.contains("lose") || v.contains("loss") {
        Some(NoticeColor::LOSE)
    } else if v.contains("remake") {
        Some(NoticeColor::REMAKE)
    } else {
        None
    }
}

/// Plain-text form of a notice, as posted alongside structured notices for
/// clients that cannot render them.
pub fn to_legacy_markdown(notice: &Notice) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(title) = notice.title.as_deref().filter(|t| !t.trim().is_empty()) {
        parts.push(format!("**{}**", title));
    }
    if let Some(description) = notice.description.as_deref().filter(|d| !d.trim().is_empty()) {
        parts.push(description.to_string());
    }
    if let Some(text) = notice.text.as_deref().filter(|t| !t.trim().is_empty()) {
        parts.push(text.to_string());
    }
    for field in &notice.fields {
        let name = field.name.replace("**", "");
        let value = field.value.replace("**", "");
        let (name, value) = (name.trim(), value.trim());
        if !name.is_empty() && !value.is_empty() {
            parts.push(format!("**{}** {}", name, value));
        }
    }
    if let Some(url) = notice.url.as_deref().filter(|u| !u.trim().is_empty()) {
        parts.push(format!("[Link]({})", url));
    }
    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    /// Deterministic resolver so tests can see which candidate won.
    struct FakeIcons;

    impl IconResolver for FakeIcons {
        fn champion_icon_url(&self, champion: &str) -> Option<String> {
            Some(format!("champ:{}", champion))
        }

        fn rank_emblem_url(&self, rank: &str) -> Option<String> {
            let tier = rank.split_whitespace().next()?;
            (tier != "Unranked").then(|| format!("rank:{}", tier))
        }
    }

    fn parse(content: &str) -> Option<Notice> {
        parse_legacy_notice(content, None, &FakeIcons)
    }

    #[test]
    fn match_result_notice() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 3, 18, 30, 0).unwrap();
        let input = "**Match Result**\n\nYou won!\n\n**Result** Win";
        let notice = parse_legacy_notice(input, Some(ts), &FakeIcons).unwrap();
        assert_eq!(notice.title.as_deref(), Some("Match Result"));
        assert_eq!(notice.description.as_deref(), Some("You won!"));
        assert_eq!(notice.fields, vec![NoticeField::inline("Result", "Win")]);
        assert_eq!(notice.color_hex, Some(NoticeColor::WIN));
        assert_eq!(notice.timestamp, Some(ts));
    }

    #[test]
    fn plain_text_is_not_a_notice() {
        assert_eq!(parse("not a notice at all"), None);
        assert_eq!(parse(""), None);
        assert_eq!(parse("  \n\n  "), None);
        assert_eq!(parse("first paragraph\n\nsecond paragraph"), None);
    }

    #[test]
    fn first_link_wins() {
        let notice = parse("**T**\n\n[A](https://a.example)\n\n[B](https://b.example)").unwrap();
        assert_eq!(notice.url.as_deref(), Some("https://a.example"));
        assert_eq!(notice.description, None);
        assert!(notice.fields.is_empty());
    }

    #[test]
    fn non_http_links_are_skipped() {
        let notice = parse("**T**\n\n**KDA** 1/2/3\n\n[x](javascript:alert(1))").unwrap();
        assert_eq!(notice.url, None);
        assert_eq!(notice.fields.len(), 1);
    }

    #[test]
    fn malformed_blocks_are_skipped() {
        let notice = parse("**T**\n\ndesc\n\njust text\n\n**Empty**\n\n**  ** value").unwrap();
        assert_eq!(notice.description.as_deref(), Some("desc"));
        assert!(notice.fields.is_empty());
    }

    #[test]
    fn fields_without_title() {
        let notice = parse("**Champion** Ahri\n\n**KDA** 10/2/8").unwrap();
        assert_eq!(notice.title, None);
        assert_eq!(notice.description, None);
        assert_eq!(notice.fields.len(), 2);
        assert_eq!(notice.thumbnail_url.as_deref(), Some("champ:Ahri"));
    }

    #[test]
    fn two_bold_spans_are_a_field_not_a_title() {
        let notice = parse("**A** and **B**").unwrap();
        assert_eq!(notice.title, None);
        assert_eq!(notice.fields, vec![NoticeField::inline("A", "and **B**")]);
    }

    #[test]
    fn result_colors() {
        let lose = parse("**T**\n\n**Result** Loss").unwrap();
        assert_eq!(lose.color_hex, Some(NoticeColor::LOSE));
        let remake = parse("**T**\n\n**Game Result** Remake").unwrap();
        assert_eq!(remake.color_hex, Some(NoticeColor::REMAKE));
        let unknown = parse("**T**\n\n**Result** Pending").unwrap();
        assert_eq!(unknown.color_hex, None);
    }

    #[test]
    fn first_decisive_result_field_sets_color() {
        let notice = parse("**T**\n\n**Result** Remake\n\n**Result** Win").unwrap();
        assert_eq!(notice.color_hex, Some(NoticeColor::REMAKE));
        let notice = parse("**T**\n\n**Result** Pending\n\n**Result** Win").unwrap();
        assert_eq!(notice.color_hex, Some(NoticeColor::WIN));
    }

    #[test]
    fn promotion_prefers_rank_emblem_and_defaults_green() {
        let notice =
            parse("**Promotion!**\n\nClimbed.\n\n**Champion** Ahri\n\n**Rank Change** Platinum 4")
                .unwrap();
        assert_eq!(notice.color_hex, Some(NoticeColor::WIN));
        assert_eq!(notice.thumbnail_url.as_deref(), Some("rank:Platinum"));
    }

    #[test]
    fn demotion_keeps_explicit_result_color() {
        let notice = parse("**Demotion**\n\n**Result** Win\n\n**Rank** Gold 1").unwrap();
        assert_eq!(notice.color_hex, Some(NoticeColor::WIN));
        assert_eq!(notice.thumbnail_url.as_deref(), Some("rank:Gold"));

        let notice = parse("**Demotion**\n\n**Rank** Gold 1").unwrap();
        assert_eq!(notice.color_hex, Some(NoticeColor::LOSE));
    }

    #[test]
    fn rank_change_field_beats_generic_rank_field() {
        let notice =
            parse("**Promotion**\n\n**Rank** Gold 1\n\n**Rank Update** Platinum 4").unwrap();
        assert_eq!(notice.thumbnail_url.as_deref(), Some("rank:Platinum"));
    }

    #[test]
    fn champion_preferred_outside_rank_changes() {
        let notice = parse("**Match Result**\n\n**Rank** Gold 1\n\n**Champ** Lee Sin").unwrap();
        assert_eq!(notice.thumbnail_url.as_deref(), Some("champ:Lee Sin"));
        let notice = parse("**Match Result**\n\n**Rank** Gold 1").unwrap();
        assert_eq!(notice.thumbnail_url.as_deref(), Some("rank:Gold"));
        let notice = parse("**Match Result**\n\n**Rank** Unranked").unwrap();
        assert_eq!(notice.thumbnail_url, None);
    }

    #[test]
    fn crlf_and_extra_blank_lines() {
        let notice = parse("**Match Result**\r\n\r\n\r\nYou won!\r\n \r\n**Result** Win").unwrap();
        assert_eq!(notice.title.as_deref(), Some("Match Result"));
        assert_eq!(notice.description.as_deref(), Some("You won!"));
        assert_eq!(notice.fields.len(), 1);
    }

    #[test]
    fn multiline_field_values() {
        let notice = parse("**T**\n\n**Items** Boots\nSword").unwrap();
        assert_eq!(notice.fields[0].value, "Boots\nSword");
    }

    #[test]
    fn legacy_markdown_parses_back() {
        let original = Notice {
            title: Some("Ranked Solo - Victory".into()),
            description: Some("Great game.".into()),
            url: Some("https://example.com/match/1".into()),
            fields: vec![
                NoticeField::inline("**Champion**", "Ahri"),
                NoticeField::inline("Result", "Win"),
                NoticeField::inline("Blank", "  "),
            ],
            ..Notice::default()
        };
        let text = to_legacy_markdown(&original);
        assert_eq!(
            text,
            concat!(
                "**Ranked Solo - Victory**\n\nGreat game.\n\n",
                "**Champion** Ahri\n\n**Result** Win\n\n",
                "[Link](https://example.com/match/1)",
            )
        );

        let parsed = parse(&text).unwrap();
        assert_eq!(parsed.title, original.title);
        assert_eq!(parsed.description, original.description);
        assert_eq!(parsed.url, original.url);
        assert_eq!(parsed.fields.len(), 2);
        assert_eq!(parsed.color_hex, Some(NoticeColor::WIN));
        assert_eq!(parsed.thumbnail_url.as_deref(), Some("champ:Ahri"));
    }
}
