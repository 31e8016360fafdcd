/// Meeps shared types.
///
/// The data model consumed by the timeline engine: messages as delivered by
/// the chat backend, structured notices posted by the match bot, the segment
/// tree produced from message text, and the config-store seam used for the
/// few pieces of remembered client state.

pub mod api;
pub mod config;
pub mod de;
pub mod models;
pub mod notice;
pub mod segment;

pub use api::{MessagesResponse, Page};
pub use config::{ConfigError, ConfigStore, ConfigStoreExt, FileConfigStore, MemoryConfigStore};
pub use models::{Attachment, Message, Profile, ProfileMap, StableId};
pub use notice::{Notice, NoticeColor, NoticeField};
pub use segment::Segment;
