//! Output file naming for downloaded tracks.

use std::path::{Component, Path, PathBuf};

use url::Url;

use super::constants::{DEFAULT_EXTENSION, PARTIAL_SUFFIX};
use crate::catalog::FileDescriptor;

/// Longest stem kept before the extension.
const MAX_STEM_CHARS: usize = 180;

/// Extension (without dot) from the last path segment of `url`.
pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index + 1..];
    if ext.is_empty() || ext.len() > 8 || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Replaces path separators, reserved and control characters.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}

/// Final file name for `file` downloaded from `location`.
///
/// Uses `<display name> [<store>-<track_id>]` when the name is known,
/// else `<store>-<track_id>`. The id tag keeps names distinct for distinct
/// file ids, so two in-flight transfers never share a path.
pub(crate) fn output_file_name(file: &FileDescriptor, location: &str) -> String {
    let tag = format!("{}-{}", file.store, file.track_id);
    let stem = match file
        .name
        .as_deref()
        .map(sanitize_filename)
        .filter(|name| name != "_")
    {
        Some(name) => {
            let name: String = name.chars().take(MAX_STEM_CHARS).collect();
            format!("{} [{tag}]", name.trim_end())
        }
        None => tag,
    };
    let ext = extension_from_url(location).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    format!("{stem}.{ext}")
}

/// Sibling path used while the transfer is still running.
pub(crate) fn partial_path(final_path: &Path) -> PathBuf {
    let mut name = final_path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    final_path.with_file_name(name)
}
