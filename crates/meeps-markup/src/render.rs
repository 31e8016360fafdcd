//! CommonMark rendering with mention interception.
//!
//! Mentions are turned into badges while walking the parser's event stream,
//! before the HTML writer sees any link, so a mention can never come out as
//! an anchor. Raw HTML in message text is escaped.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream, html};
use tracing::trace;

use meeps_types::Segment;

use crate::links::LinkTarget;
use crate::mention::{SlugDirectory, segment};

/// What an open link or image turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wrapper {
    Anchor,
    Mention,
    /// Target not navigable: the label renders as plain text.
    Unlinked,
    Image,
}

/// Render message markdown to HTML.
pub fn render_markdown(content: &str, directory: &SlugDirectory) -> String {
    let mut opts = Options::empty();
    opts.insert(Options::ENABLE_STRIKETHROUGH);
    opts.insert(Options::ENABLE_TABLES);
    opts.insert(Options::ENABLE_TASKLISTS);

    let parser = TextMergeStream::new(Parser::new_ext(content, opts));

    let mut events: Vec<Event<'_>> = Vec::new();
    let mut wrappers: Vec<Wrapper> = Vec::new();
    let mut code_depth = 0usize;

    for event in parser {
        match event {
            Event::End(TagEnd::Link) => {
                if wrappers.pop() == Some(Wrapper::Anchor) {
                    events.push(Event::InlineHtml(CowStr::Borrowed("</a>")));
                }
            }
            // A mention badge already carries its label.
            _ if wrappers.last() == Some(&Wrapper::Mention) => {}
            Event::Start(Tag::Link { dest_url, title, .. }) => {
                let target = LinkTarget::classify(&dest_url);
                match &target {
                    LinkTarget::Mention(slug) => {
                        events.push(Event::InlineHtml(mention_badge(slug, directory).into()));
                        wrappers.push(Wrapper::Mention);
                    }
                    t if t.is_navigable() => {
                        events.push(Event::InlineHtml(anchor_open(t, &title).into()));
                        wrappers.push(Wrapper::Anchor);
                    }
                    _ => {
                        trace!("Dropping link to non-navigable target '{}'", dest_url);
                        wrappers.push(Wrapper::Unlinked);
                    }
                }
            }
            Event::Start(Tag::Image { ref dest_url, .. }) => {
                if matches!(LinkTarget::classify(dest_url), LinkTarget::Web(_)) {
                    events.push(event);
                    wrappers.push(Wrapper::Image);
                } else {
                    wrappers.push(Wrapper::Unlinked);
                }
            }
            Event::End(TagEnd::Image) => {
                if wrappers.pop() == Some(Wrapper::Image) {
                    events.push(event);
                }
            }
            Event::Start(Tag::CodeBlock(_)) => {
                code_depth += 1;
                events.push(event);
            }
            Event::End(TagEnd::CodeBlock) => {
                code_depth = code_depth.saturating_sub(1);
                events.push(event);
            }
            Event::Text(text) if code_depth == 0 && !inside_link(&wrappers) => {
                push_segments(&mut events, &text, directory);
            }
            Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
            other => events.push(other),
        }
    }

    let mut out = String::new();
    html::push_html(&mut out, events.into_iter());
    out
}

/// Link labels and image alt text keep their mentions as plain text.
fn inside_link(wrappers: &[Wrapper]) -> bool {
    wrappers
        .iter()
        .any(|w| matches!(w, Wrapper::Anchor | Wrapper::Image))
}

fn push_segments<'a>(events: &mut Vec<Event<'a>>, text: &str, directory: &SlugDirectory) {
    for seg in segment(text) {
        match seg {
            Segment::Text { value } => {
                if !value.is_empty() {
                    events.push(Event::Text(value.into()));
                }
            }
            Segment::Mention { slug } => {
                events.push(Event::InlineHtml(mention_badge(&slug, directory).into()));
            }
        }
    }
}

fn mention_badge(slug: &str, directory: &SlugDirectory) -> String {
    format!(
        r#"<span class="mention" data-mention="{}">@{}</span>"#,
        escape_html(slug),
        escape_html(&directory.resolve(slug))
    )
}

fn anchor_open(target: &LinkTarget, title: &str) -> String {
    let href = target.href().unwrap_or_default();
    let mut tag = format!(r#"<a href="{}""#, escape_html(href));
    if !title.is_empty() {
        tag.push_str(&format!(r#" title="{}""#, escape_html(title)));
    }
    if target.opens_new_tab() {
        tag.push_str(r#" target="_blank" rel="noopener noreferrer""#);
    }
    tag.push('>');
    tag
}

/// Escape text for use in HTML content and double-quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir() -> SlugDirectory {
        SlugDirectory::from_names(["Person One", "Bob"])
    }

    #[test]
    fn text_mentions_become_badges() {
        let out = render_markdown("hello @Person_One", &dir());
        assert!(out.contains(
            r#"<span class="mention" data-mention="Person_One">@Person One</span>"#
        ));
        assert!(!out.contains("<a"));
    }

    #[test]
    fn mention_links_are_intercepted() {
        let out = render_markdown("[@whoever](mention:Bob) hi", &dir());
        assert!(out.contains(r#"<span class="mention" data-mention="Bob">@Bob</span>"#));
        assert!(!out.contains("<a"));
        assert!(!out.contains("whoever"));
        assert!(out.contains(" hi"));
    }

    #[test]
    fn web_links_open_in_new_tab() {
        let out = render_markdown("[site](https://example.com)", &dir());
        assert!(out.contains(
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">site</a>"#
        ));
    }

    #[test]
    fn unsafe_links_lose_their_anchor() {
        let out = render_markdown("[click](javascript:alert(1))", &dir());
        assert!(!out.contains("<a"));
        assert!(out.contains("click"));
    }

    #[test]
    fn raw_html_is_escaped() {
        let out = render_markdown("<script>alert(1)</script>", &dir());
        assert!(!out.contains("<script>"));
        assert!(out.contains("&lt;script&gt;"));
    }

    #[test]
    fn code_keeps_mentions_literal() {
        let inline = render_markdown("`@Bob`", &dir());
        assert!(inline.contains("<code>@Bob</code>"));
        assert!(!inline.contains("data-mention"));

        let block = render_markdown("```\n@Bob\n```", &dir());
        assert!(!block.contains("data-mention"));
    }

    #[test]
    fn mentions_inside_link_labels_stay_text() {
        let out = render_markdown("[ask @Bob](https://example.com)", &dir());
        assert!(!out.contains("data-mention"));
        assert!(out.contains(">ask @Bob</a>"));
    }

    #[test]
    fn badge_escapes_slug() {
        let out = render_markdown("@a\"b", &SlugDirectory::new());
        assert!(out.contains(r#"data-mention="a&quot;b""#));
    }
}
