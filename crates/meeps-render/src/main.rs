mod http;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use serde::Deserialize;
use tracing::info;

use meeps_markup::{DataDragonIcons, SlugDirectory, mention_notification};
use meeps_timeline::{Timeline, ViewContext, build_view};
use meeps_types::de::null_as_default;
use meeps_types::{FileConfigStore, Message, Profile, ProfileMap, StableId};

use crate::http::HttpHistorySource;

/// `{ "messages": [...], "profiles": [...] }`
#[derive(Debug, Default, Deserialize)]
struct RenderInput {
    #[serde(default, deserialize_with = "null_as_default")]
    messages: Vec<Message>,
    #[serde(default, deserialize_with = "null_as_default")]
    profiles: Vec<Profile>,
}

struct Settings {
    viewer_name: Option<String>,
    viewer_id: Option<StableId>,
    channel: String,
    api_base: Option<String>,
    attachment_base: Option<String>,
    bot_names: Vec<String>,
    config_path: PathBuf,
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Settings {
    fn from_env() -> Self {
        let api_base = non_empty_var("MEEPS_API_BASE");
        Self {
            viewer_name: non_empty_var("MEEPS_VIEWER_NAME"),
            viewer_id: non_empty_var("MEEPS_VIEWER_ID").map(StableId::new),
            channel: non_empty_var("MEEPS_CHANNEL").unwrap_or_else(|| "general".into()),
            attachment_base: non_empty_var("MEEPS_ATTACHMENT_BASE").or_else(|| api_base.clone()),
            api_base,
            bot_names: non_empty_var("MEEPS_BOT_NAMES")
                .unwrap_or_else(|| "Diana".into())
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(String::from)
                .collect(),
            config_path: non_empty_var("MEEPS_CONFIG_PATH")
                .unwrap_or_else(|| "meeps-config.json".into())
                .into(),
        }
    }
}

fn read_input(path: &Path) -> anyhow::Result<RenderInput> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a render input", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging; stdout carries the render tree
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meeps=debug".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::from_env();
    let store = FileConfigStore::load(&settings.config_path)?;
    let icons = DataDragonIcons::from_store(&store);
    info!("Champion icons from Data Dragon {}", icons.version());

    let input = match std::env::args_os().nth(1) {
        Some(path) => read_input(Path::new(&path))?,
        None => match &settings.api_base {
            Some(base) => {
                let source = HttpHistorySource::new(base);
                let mut timeline = Timeline::new(settings.channel.clone());
                timeline
                    .load_initial(&source)
                    .await
                    .with_context(|| {
                        format!("failed to load #{} from {}", settings.channel, base)
                    })?;
                RenderInput {
                    messages: timeline.messages().to_vec(),
                    profiles: Vec::new(),
                }
            }
            None => bail!("no input: pass a messages file or set MEEPS_API_BASE"),
        },
    };

    let profiles: ProfileMap = input
        .profiles
        .into_iter()
        .filter_map(|p| p.id.clone().map(|id| (id, p)))
        .collect();
    let directory = SlugDirectory::from_profiles(
        settings.viewer_name.as_deref(),
        input.messages.iter().map(|m| m.sender.as_str()),
        &profiles,
    );

    if let Some(viewer) = &settings.viewer_name {
        for message in &input.messages {
            if let Some(note) =
                mention_notification(message, viewer, &directory, Some(settings.channel.as_str()))
            {
                info!("{}: {}", note.title, note.body);
            }
        }
    }

    let mut ctx = ViewContext::new(&directory, &profiles)
        .with_icons(&icons)
        .with_bot_names(settings.bot_names);
    if let Some(viewer) = settings.viewer_name {
        ctx = ctx.with_viewer(viewer, settings.viewer_id);
    }
    if let Some(base) = settings.attachment_base {
        ctx = ctx.with_attachment_base(base);
    }

    let view = build_view(&input.messages, &ctx);
    info!(
        "Rendered {} messages in {} day(s)",
        view.message_count,
        view.days.len()
    );
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
