/// Meeps markup: turns raw message text into display structures.
///
/// - `mention`: text/mention segmentation and the slug directory
/// - `links`: classification of link targets (mentions are never anchors)
/// - `render`: CommonMark rendering with mention interception
/// - `legacy`: recovery of bot notices from pre-embed markdown
/// - `icons`: champion / rank emblem URL collaborators
/// - `hover`: mention hover cards
/// - `notify`: mention notification payloads

pub mod hover;
pub mod icons;
pub mod legacy;
pub mod links;
pub mod mention;
pub mod notify;
pub mod render;

pub use hover::{MentionHoverResolver, ProfileCard, initials};
pub use icons::{DataDragonIcons, IconResolver, IconSlot, NoIcons};
pub use legacy::{parse_legacy_notice, to_legacy_markdown};
pub use links::LinkTarget;
pub use mention::{SlugDirectory, is_mentioned, segment, slug_for};
pub use notify::{MentionNotification, mention_notification};
pub use render::render_markdown;
