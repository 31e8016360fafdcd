//! Attachment link resolution.

use meeps_types::Attachment;
use serde::Serialize;

const FILES_PATH: &str = "/api/files/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AttachmentView {
    #[serde(rename_all = "camelCase")]
    Link {
        filename: String,
        url: String,
        is_image: bool,
    },
    /// The file is gone; shown as the filename with an "(expired)" marker.
    Expired { filename: String },
}

impl AttachmentView {
    pub fn filename(&self) -> &str {
        match self {
            Self::Link { filename, .. } | Self::Expired { filename } => filename,
        }
    }
}

fn is_absolute(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Absolute URLs are used as-is; relative ones are joined to `base`;
/// otherwise the file id is served from `{base}/api/files/{id}`.
pub fn resolve_attachment(attachment: &Attachment, base: Option<&str>) -> AttachmentView {
    let filename = if attachment.filename.trim().is_empty() {
        "attachment".to_string()
    } else {
        attachment.filename.clone()
    };
    let base = base.map(str::trim).filter(|b| !b.is_empty());
    let url = attachment.url.as_deref().map(str::trim).filter(|u| !u.is_empty());
    let file_id = attachment.file_id.as_deref().map(str::trim).filter(|f| !f.is_empty());

    let resolved = match (url, base, file_id) {
        (Some(url), _, _) if is_absolute(url) => Some(url.to_string()),
        (Some(url), Some(base), _) => Some(join(base, url)),
        (_, Some(base), Some(id)) => Some(join(base, &format!("{FILES_PATH}{id}"))),
        _ => None,
    };

    match resolved {
        Some(url) => AttachmentView::Link {
            is_image: attachment.is_image(),
            filename,
            url,
        },
        None => AttachmentView::Expired { filename },
    }
}
