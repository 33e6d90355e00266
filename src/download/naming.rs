//! Deterministic file names for saved pages and assets
//!
//! Names have the shape `<stem>_<hash><ext>`, where `stem` is the sanitized
//! last path segment and `hash` a hex prefix of the SHA-256 of the canonical
//! URL. Widening the prefix is how name collisions are resolved.

use crate::url::NormalizedUrl;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

/// Hash prefix widths tried in order when a name is already claimed
pub const HASH_WIDTHS: [usize; 3] = [8, 16, 64];

/// Longest stem kept in a file name, in bytes
///
/// Percent-encoded segments grow threefold once sanitized; the hash keeps
/// truncated names distinct.
pub const MAX_STEM_BYTES: usize = 100;

static UNSAFE_CHARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^\w\-.]").expect("BUG: hardcoded unsafe-character pattern is invalid")
});

/// Hex prefix of the SHA-256 of `identifier`, `width` characters long
pub fn short_hash(identifier: &str, width: usize) -> String {
    let digest = hex::encode(Sha256::digest(identifier.as_bytes()));
    digest[..width.min(digest.len())].to_string()
}

/// Sanitized last path segment of a URL with its extension removed
pub fn split_file_name(url: &NormalizedUrl) -> String {
    let segment = url
        .as_url()
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");

    let cleaned = UNSAFE_CHARS.replace_all(segment, "_");
    let stem = match cleaned.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => cleaned.to_string(),
    };

    if stem.is_empty() {
        "index".to_string()
    } else {
        truncate_on_char_boundary(stem, MAX_STEM_BYTES)
    }
}

fn truncate_on_char_boundary(mut text: String, max_bytes: usize) -> String {
    if text.len() > max_bytes {
        let mut end = max_bytes;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.truncate(end);
    }
    text
}

/// File name for a downloaded asset at the given hash width
pub fn asset_file_name(url: &NormalizedUrl, extension: &str, width: usize) -> String {
    format!(
        "{}_{}{}",
        split_file_name(url),
        short_hash(url.as_str(), width),
        extension
    )
}

/// File name for a page's extracted text
pub fn content_file_name(url: &NormalizedUrl) -> String {
    asset_file_name(url, ".txt", HASH_WIDTHS[0])
}
