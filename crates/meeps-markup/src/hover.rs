use serde::Serialize;

use meeps_types::{Profile, ProfileMap};

use crate::mention::SlugDirectory;

/// Payload for the hover card shown over a mention badge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileCard {
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub initials: String,
}

impl ProfileCard {
    /// Card for a name with no known profile.
    pub fn name_only(display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        let initials = initials(&display_name);
        Self {
            display_name,
            avatar_url: None,
            banner_url: None,
            initials,
        }
    }

    fn from_profile(display_name: String, profile: &Profile) -> Self {
        Self {
            avatar_url: profile.avatar_url.clone().filter(|u| !u.is_empty()),
            banner_url: profile.banner_url.clone().filter(|u| !u.is_empty()),
            ..Self::name_only(display_name)
        }
    }
}

/// Maps a hovered mention slug to a profile card.
pub struct MentionHoverResolver<'a> {
    directory: &'a SlugDirectory,
    profiles: &'a ProfileMap,
}

impl<'a> MentionHoverResolver<'a> {
    pub fn new(directory: &'a SlugDirectory, profiles: &'a ProfileMap) -> Self {
        Self { directory, profiles }
    }

    /// Resolve a slug (with or without the leading `@`).
    ///
    /// Returns `None` only when the slug resolves to no name at all; a name
    /// without a matching profile still gets a minimal card.
    pub fn resolve(&self, slug: &str) -> Option<ProfileCard> {
        let slug = slug.trim().trim_start_matches('@');
        if slug.is_empty() {
            return None;
        }
        let name = self.directory.resolve(slug);
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        Some(match self.find_profile(name) {
            Some(profile) => {
                ProfileCard::from_profile(profile.display_name.trim().to_string(), profile)
            }
            None => ProfileCard::name_only(name),
        })
    }

    /// Case-insensitive display-name match. Ties go to the lowest id so the
    /// result does not depend on map iteration order.
    fn find_profile(&self, name: &str) -> Option<&'a Profile> {
        let wanted = name.to_lowercase();
        self.profiles
            .iter()
            .filter(|(_, p)| p.display_name.trim().to_lowercase() == wanted)
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, p)| p)
    }
}

/// Up to two uppercase initials from the words of a name, `?` when empty.
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "?".to_string()
    } else {
        letters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meeps_types::StableId;

    fn profiles() -> ProfileMap {
        let mut map = ProfileMap::new();
        map.insert(
            StableId::from("1"),
            Profile {
                id: Some(StableId::from("1")),
                display_name: "Person One".into(),
                avatar_url: Some("https://cdn.example/a.png".into()),
                banner_url: Some(String::new()),
            },
        );
        map
    }

    #[test]
    fn resolves_known_profile() {
        let dir = SlugDirectory::from_names(["Person One"]);
        let profiles = profiles();
        let resolver = MentionHoverResolver::new(&dir, &profiles);

        let card = resolver.resolve("@person_one").unwrap();
        assert_eq!(card.display_name, "Person One");
        assert_eq!(card.avatar_url.as_deref(), Some("https://cdn.example/a.png"));
        assert_eq!(card.banner_url, None);
        assert_eq!(card.initials, "PO");
    }

    #[test]
    fn profile_found_through_slug_fallback() {
        // Not in the directory: the slug itself becomes the name.
        let dir = SlugDirectory::new();
        let profiles = profiles();
        let card = MentionHoverResolver::new(&dir, &profiles)
            .resolve("Person_One")
            .unwrap();
        assert_eq!(card.avatar_url.as_deref(), Some("https://cdn.example/a.png"));
    }

    #[test]
    fn unknown_name_gets_minimal_card() {
        let dir = SlugDirectory::new();
        let profiles = ProfileMap::new();
        let card = MentionHoverResolver::new(&dir, &profiles)
            .resolve("Ghost_User")
            .unwrap();
        assert_eq!(card, ProfileCard::name_only("Ghost User"));
    }

    #[test]
    fn empty_slugs_resolve_to_nothing() {
        let dir = SlugDirectory::new();
        let profiles = ProfileMap::new();
        let resolver = MentionHoverResolver::new(&dir, &profiles);
        assert_eq!(resolver.resolve(""), None);
        assert_eq!(resolver.resolve("@"), None);
        assert_eq!(resolver.resolve("___"), None);
    }

    #[test]
    fn initials_rules() {
        assert_eq!(initials("Person One Two"), "PO");
        assert_eq!(initials("diana"), "D");
        assert_eq!(initials("   "), "?");
        assert_eq!(initials(""), "?");
    }
}
