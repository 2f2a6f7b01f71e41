//! Input validation for new memes and comments.
use meme_arena_shared::types::MediaRef;

use crate::ArenaError;

/// Media content types a meme may reference.
pub const ALLOWED_CONTENT_TYPES: [&str; 7] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "video/mp4",
    "video/webm",
];

/// Returns the trimmed title, or a validation error if it is blank.
pub fn validate_title(title: &str) -> Result<String, ArenaError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ArenaError::validation("a title is required"));
    }
    Ok(title.to_string())
}

/// Checks that media is present, of an accepted type, and within `max_bytes`.
///
/// The content type is compared case-insensitively and returned normalised.
pub fn validate_media(media: Option<MediaRef>, max_bytes: u64) -> Result<MediaRef, ArenaError> {
    let Some(media) = media else {
        return Err(ArenaError::validation("a media file is required"));
    };
    if media.url.trim().is_empty() {
        return Err(ArenaError::validation("a media file is required"));
    }

    let content_type = media.content_type.trim().to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ArenaError::validation(format!(
            "unsupported media type '{}', expected an image (jpeg, png, gif, webp) or video (mp4, webm)",
            media.content_type
        )));
    }
    if media.size_bytes > max_bytes {
        return Err(ArenaError::validation(format!(
            "media is {} bytes, the limit is {} bytes",
            media.size_bytes, max_bytes
        )));
    }

    Ok(MediaRef {
        url: media.url.trim().to_string(),
        content_type,
        size_bytes: media.size_bytes,
    })
}

/// Trims tags and drops empty or repeated ones, keeping first occurrence order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

/// Returns the trimmed comment text, or a validation error if it is blank.
pub fn validate_comment_text(text: &str) -> Result<String, ArenaError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ArenaError::validation("a comment cannot be empty"));
    }
    Ok(text.to_string())
}
