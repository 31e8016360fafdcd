//! Icon URL collaborators for bot notices.
//!
//! Champion and rank-emblem URLs come from the public Data Dragon and
//! Community Dragon CDNs. Name normalization lives here and nowhere else.

use meeps_types::{ConfigStore, ConfigStoreExt};

/// Resolves display strings to icon URLs.
pub trait IconResolver {
    fn champion_icon_url(&self, champion: &str) -> Option<String>;
    fn rank_emblem_url(&self, rank: &str) -> Option<String>;
}

/// Resolver that knows no icons.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIcons;

impl IconResolver for NoIcons {
    fn champion_icon_url(&self, _champion: &str) -> Option<String> {
        None
    }

    fn rank_emblem_url(&self, _rank: &str) -> Option<String> {
        None
    }
}

const DDRAGON_CDN: &str = "https://ddragon.leagueoflegends.com/cdn";
const CDRAGON_RANKED: &str = concat!(
    "https://raw.communitydragon.org/latest/plugins/",
    "rcp-fe-lol-static-assets/global/default/ranked-emblem"
);

const RANK_TIERS: &[&str] = &[
    "iron",
    "bronze",
    "silver",
    "gold",
    "platinum",
    "emerald",
    "diamond",
    "master",
    "grandmaster",
    "challenger",
];

/// Display names whose Data Dragon id is not the PascalCased name.
const CHAMPION_ID_OVERRIDES: &[(&str, &str)] = &[
    ("monkey king", "MonkeyKing"),
    ("wukong", "MonkeyKing"),
    ("nunu & willump", "Nunu"),
    ("dr. mundo", "DrMundo"),
    ("cho'gath", "Chogath"),
    ("rek'sai", "RekSai"),
    ("jarvan iv", "JarvanIV"),
    ("master yi", "MasterYi"),
    ("miss fortune", "MissFortune"),
    ("tahm kench", "TahmKench"),
    ("xin zhao", "XinZhao"),
    ("twisted fate", "TwistedFate"),
    ("lee sin", "LeeSin"),
    ("aurelion sol", "AurelionSol"),
    ("bel'veth", "Belveth"),
    ("kog'maw", "KogMaw"),
    ("vel'koz", "Velkoz"),
    ("renata glasc", "Renata"),
];

/// Data Dragon backed resolver.
#[derive(Debug, Clone)]
pub struct DataDragonIcons {
    version: String,
}

impl Default for DataDragonIcons {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VERSION)
    }
}

impl DataDragonIcons {
    pub const DEFAULT_VERSION: &'static str = "14.24.1";
    /// Config key holding the asset version.
    pub const VERSION_KEY: &'static str = "icons.ddragon_version";

    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
        }
    }

    /// Read the asset version from the config store, defaulting when unset.
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let version = store
            .get_as::<String>(Self::VERSION_KEY)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| Self::DEFAULT_VERSION.to_string());
        Self::new(version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Champion display name to Data Dragon id (`Miss Fortune` -> `MissFortune`).
    pub fn champion_id(display_name: &str) -> Option<String> {
        let trimmed = display_name.trim();
        if trimmed.is_empty() {
            return None;
        }
        let normalized = trimmed.to_lowercase();
        if let Some((_, id)) = CHAMPION_ID_OVERRIDES
            .iter()
            .find(|(name, _)| *name == normalized)
        {
            return Some(id.to_string());
        }

        let stripped: String = trimmed
            .chars()
            .filter(|c| !matches!(c, '\'' | '\u{2019}' | '.'))
            .collect();
        let id: String = stripped.split_whitespace().map(capitalize).collect();
        (!id.is_empty()).then_some(id)
    }

    /// First word of a rank string when it names a tier (`Platinum 1` -> `platinum`).
    pub fn rank_tier(rank: &str) -> Option<String> {
        let tier = rank.split_whitespace().next()?.to_lowercase();
        RANK_TIERS.contains(&tier.as_str()).then_some(tier)
    }
}

impl IconResolver for DataDragonIcons {
    fn champion_icon_url(&self, champion: &str) -> Option<String> {
        let id = Self::champion_id(champion)?;
        Some(format!("{}/{}/img/champion/{}.png", DDRAGON_CDN, self.version, id))
    }

    fn rank_emblem_url(&self, rank: &str) -> Option<String> {
        let tier = Self::rank_tier(rank)?;
        Some(format!("{}/emblem-{}.png", CDRAGON_RANKED, tier))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Image source with a single fallback.
///
/// A failed load swaps in the fallback once; a second failure hides the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconSlot {
    Primary {
        src: String,
        fallback: Option<String>,
    },
    Fallback(String),
    Hidden,
}

impl IconSlot {
    pub fn new(primary: Option<String>, fallback: Option<String>) -> Self {
        match (primary, fallback) {
            (Some(src), fallback) => Self::Primary { src, fallback },
            (None, Some(fallback)) => Self::Fallback(fallback),
            (None, None) => Self::Hidden,
        }
    }

    pub fn src(&self) -> Option<&str> {
        match self {
            Self::Primary { src, .. } => Some(src),
            Self::Fallback(src) => Some(src),
            Self::Hidden => None,
        }
    }

    /// Record a load error for the current source.
    pub fn on_error(&mut self) {
        *self = match std::mem::replace(self, Self::Hidden) {
            Self::Primary {
                fallback: Some(fallback),
                ..
            } => Self::Fallback(fallback),
            _ => Self::Hidden,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeps_types::MemoryConfigStore;
    use serde_json::Value;

    #[test]
    fn champion_ids() {
        assert_eq!(DataDragonIcons::champion_id("Ahri").as_deref(), Some("Ahri"));
        assert_eq!(DataDragonIcons::champion_id("miss fortune").as_deref(), Some("MissFortune"));
        assert_eq!(DataDragonIcons::champion_id("Cho'Gath").as_deref(), Some("Chogath"));
        assert_eq!(DataDragonIcons::champion_id("Nunu & Willump").as_deref(), Some("Nunu"));
        assert_eq!(DataDragonIcons::champion_id("Kai'Sa").as_deref(), Some("Kaisa"));
        assert_eq!(DataDragonIcons::champion_id("  "), None);
    }

    #[test]
    fn rank_emblems() {
        let icons = DataDragonIcons::default();
        assert_eq!(
            icons.rank_emblem_url("Platinum 1").as_deref(),
            Some(concat!(
                "https://raw.communitydragon.org/latest/plugins/",
                "rcp-fe-lol-static-assets/global/default/ranked-emblem/emblem-platinum.png"
            ))
        );
        assert_eq!(icons.rank_emblem_url("Unranked"), None);
        assert_eq!(icons.rank_emblem_url(""), None);
    }

    #[test]
    fn version_comes_from_store() {
        let mut store = MemoryConfigStore::new();
        assert_eq!(
            DataDragonIcons::from_store(&store).version(),
            DataDragonIcons::DEFAULT_VERSION
        );
        store.set(DataDragonIcons::VERSION_KEY, Value::from("15.2.1"));
        let icons = DataDragonIcons::from_store(&store);
        assert_eq!(
            icons.champion_icon_url("Lee Sin").as_deref(),
            Some("https://ddragon.leagueoflegends.com/cdn/15.2.1/img/champion/LeeSin.png")
        );
    }

    #[test]
    fn icon_slot_falls_back_once_then_hides() {
        let mut slot = IconSlot::new(Some("a.png".into()), Some("b.png".into()));
        assert_eq!(slot.src(), Some("a.png"));
        slot.on_error();
        assert_eq!(slot.src(), Some("b.png"));
        slot.on_error();
        assert_eq!(slot.src(), None);
        slot.on_error();
        assert_eq!(slot, IconSlot::Hidden);

        let mut lone = IconSlot::new(Some("a.png".into()), None);
        lone.on_error();
        assert_eq!(lone, IconSlot::Hidden);
        assert_eq!(IconSlot::new(None, Some("b.png".into())).src(), Some("b.png"));
    }
}
