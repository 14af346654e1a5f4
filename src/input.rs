//! Turning positional arguments into one batch of URLs.
//!
//! An argument ending in `.txt` is a URL list: one URL per line, blank
//! lines and `#` comments ignored. Anything else is taken as a URL.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

/// Extension marking a batch list file.
const BATCH_EXTENSION: &str = "txt";

/// A batch list file could not be read.
#[derive(Debug, thiserror::Error)]
#[error("cannot read URL list {path}: {source}")]
pub struct InputError {
    /// The list file.
    pub path: PathBuf,
    /// Underlying IO error.
    #[source]
    pub source: std::io::Error,
}

/// Whether `arg` names a batch list file.
#[must_use]
pub fn is_batch_file(arg: &str) -> bool {
    Path::new(arg)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BATCH_EXTENSION))
}

/// URLs in a batch list, in file order.
#[must_use]
pub fn parse_url_list(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Expands `args` into a deduplicated URL batch, preserving first-seen order.
///
/// # Errors
///
/// Returns [`InputError`] when a batch list file cannot be read.
#[instrument(level = "debug", skip(args), fields(args = args.len()))]
pub fn expand_inputs(args: &[String]) -> Result<Vec<String>, InputError> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for arg in args {
        let candidates = if is_batch_file(arg) {
            let path = PathBuf::from(arg);
            let contents = std::fs::read_to_string(&path).map_err(|source| InputError {
                path: path.clone(),
                source,
            })?;
            let listed = parse_url_list(&contents);
            debug!(path = %path.display(), urls = listed.len(), "read URL list");
            listed
        } else {
            let url = arg.trim();
            if url.is_empty() {
                continue;
            }
            vec![url.to_string()]
        };

        for url in candidates {
            if seen.insert(url.clone()) {
                urls.push(url);
            }
        }
    }

    Ok(urls)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_is_batch_file_is_case_insensitive() {
        assert!(is_batch_file("links.txt"));
        assert!(is_batch_file("LINKS.TXT"));
        assert!(!is_batch_file("https://www.beatport.com/track/x/1"));
        assert!(!is_batch_file("notes.md"));
    }

    #[test]
    fn test_parse_url_list_skips_blanks_and_comments() {
        let urls = parse_url_list("  https://a/1  \n\n# comment\nhttps://a/2\r\n");
        assert_eq!(urls, vec!["https://a/1", "https://a/2"]);
    }

    #[test]
    fn test_expand_inputs_mixes_urls_and_lists_without_duplicates() {
        let temp = TempDir::new().unwrap();
        let list = temp.path().join("batch.txt");
        std::fs::write(&list, "https://a/2\nhttps://a/1\nhttps://a/3\n").unwrap();

        let args = vec![
            "https://a/1".to_string(),
            list.display().to_string(),
            "https://a/2".to_string(),
        ];
        let urls = expand_inputs(&args).unwrap();
        assert_eq!(urls, vec!["https://a/1", "https://a/2", "https://a/3"]);
    }

    #[test]
    fn test_expand_inputs_missing_list_is_error() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.txt");
        let error = expand_inputs(&[missing.display().to_string()]).unwrap_err();
        assert_eq!(error.path, missing);
        assert!(error.to_string().contains("nope.txt"));
    }

    #[test]
    fn test_expand_inputs_empty_args() {
        assert!(expand_inputs(&[]).unwrap().is_empty());
    }
}
