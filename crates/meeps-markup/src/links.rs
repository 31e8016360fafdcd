use serde::Serialize;

/// Pseudo-scheme used for links that encode a mention.
pub const MENTION_SCHEME: &str = "mention:";

/// What a link-like target points at.
///
/// Mentions are recognized here, before any anchor exists, so a renderer can
/// emit a badge instead of a clickable link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "camelCase")]
pub enum LinkTarget {
    Web(String),
    Fragment(String),
    Mailto(String),
    Tel(String),
    Mention(String),
    /// Any other scheme (`javascript:`, `data:`, relative paths, ...).
    Blocked,
}

impl LinkTarget {
    pub fn classify(href: &str) -> Self {
        let href = href.trim();
        if href.is_empty() {
            return Self::Blocked;
        }
        let lower = href.to_ascii_lowercase();

        if lower.starts_with(MENTION_SCHEME) {
            let slug = href[MENTION_SCHEME.len()..].trim_start_matches('@');
            return if slug.is_empty() {
                Self::Blocked
            } else {
                Self::Mention(slug.to_string())
            };
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Web(href.to_string());
        }
        if href.starts_with('#') {
            return Self::Fragment(href.to_string());
        }
        if lower.starts_with("mailto:") {
            return Self::Mailto(href.to_string());
        }
        if lower.starts_with("tel:") {
            return Self::Tel(href.to_string());
        }
        Self::Blocked
    }

    /// Whether following this target is allowed at all.
    pub fn is_navigable(&self) -> bool {
        matches!(
            self,
            Self::Web(_) | Self::Fragment(_) | Self::Mailto(_) | Self::Tel(_)
        )
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            Self::Web(h) | Self::Fragment(h) | Self::Mailto(h) | Self::Tel(h) => Some(h),
            Self::Mention(_) | Self::Blocked => None,
        }
    }

    /// Web links open in a new tab; in-page and app links do not.
    pub fn opens_new_tab(&self) -> bool {
        matches!(self, Self::Web(_))
    }
}
