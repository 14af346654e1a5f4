//! Store web link recognition.

use url::Url;

use super::{ResolveError, Store};

/// What a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    /// A single track.
    Track,
    /// A release (album/EP) with one or more tracks.
    Release,
    /// A curated chart.
    Chart,
    /// A user playlist.
    Playlist,
}

impl LinkKind {
    fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "track" => Some(Self::Track),
            "release" => Some(Self::Release),
            "chart" => Some(Self::Chart),
            "playlist" | "playlists" => Some(Self::Playlist),
            _ => None,
        }
    }

    /// API collection name for listing this kind's tracks.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Track => "tracks",
            Self::Release => "releases",
            Self::Chart => "charts",
            Self::Playlist => "playlists",
        }
    }
}

/// A parsed store link such as `https://www.beatport.com/release/name/123`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Store the link belongs to.
    pub store: Store,
    /// Kind of catalog entity.
    pub kind: LinkKind,
    /// Numeric entity id (last path segment).
    pub id: u64,
}

impl Link {
    /// Parses a store web link.
    ///
    /// Accepts `/<kind>/<slug>/<id>`, `/<kind>/<id>` and an optional
    /// two-letter locale prefix (`/de/track/...`).
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::InvalidUrl`] for unparsable input and
    /// [`ResolveError::UnsupportedLink`] for foreign hosts or unknown kinds.
    pub fn parse(raw: &str) -> Result<Self, ResolveError> {
        let url = Url::parse(raw.trim()).map_err(|e| ResolveError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        let store = url
            .host_str()
            .and_then(Store::from_host)
            .ok_or_else(|| ResolveError::unsupported(raw))?;

        let mut segments: Vec<&str> = url
            .path_segments()
            .map(|parts| parts.filter(|part| !part.is_empty()).collect())
            .unwrap_or_default();

        if segments
            .first()
            .is_some_and(|first| first.len() == 2 && first.chars().all(|c| c.is_ascii_alphabetic()))
        {
            segments.remove(0);
        }

        if segments.len() < 2 {
            return Err(ResolveError::unsupported(raw));
        }

        let kind = LinkKind::from_segment(segments[0]).ok_or_else(|| ResolveError::unsupported(raw))?;
        let id = segments[segments.len() - 1]
            .parse::<u64>()
            .map_err(|_| ResolveError::unsupported(raw))?;

        Ok(Self { store, kind, id })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_track_link() {
        let link = Link::parse("https://www.beatport.com/track/some-track/17606729").unwrap();
        assert_eq!(link.store, Store::Beatport);
        assert_eq!(link.kind, LinkKind::Track);
        assert_eq!(link.id, 17_606_729);
    }

    #[test]
    fn test_parse_release_link_on_secondary_store() {
        let link = Link::parse("https://www.beatsource.com/release/name/4242").unwrap();
        assert_eq!(link.store, Store::Beatsource);
        assert_eq!(link.kind, LinkKind::Release);
        assert_eq!(link.id, 4242);
    }

    #[test]
    fn test_parse_skips_locale_prefix() {
        let link = Link::parse("https://www.beatport.com/de/chart/weekend/99").unwrap();
        assert_eq!(link.kind, LinkKind::Chart);
        assert_eq!(link.id, 99);
    }

    #[test]
    fn test_parse_playlist_share_link() {
        let link = Link::parse("https://www.beatport.com/playlists/share/555").unwrap();
        assert_eq!(link.kind, LinkKind::Playlist);
        assert_eq!(link.id, 555);
    }

    #[test]
    fn test_parse_tolerates_trailing_slash_and_query() {
        let link = Link::parse("https://beatport.com/track/x/12/?utm=a").unwrap();
        assert_eq!(link.id, 12);
    }

    #[test]
    fn test_parse_rejects_foreign_host() {
        let result = Link::parse("https://example.com/track/x/1");
        assert!(matches!(result, Err(ResolveError::UnsupportedLink { .. })));
    }

    #[test]
    fn test_parse_rejects_unknown_kind() {
        let result = Link::parse("https://www.beatport.com/artist/name/1");
        assert!(matches!(result, Err(ResolveError::UnsupportedLink { .. })));
    }

    #[test]
    fn test_parse_rejects_non_numeric_id() {
        let result = Link::parse("https://www.beatport.com/track/name/abc");
        assert!(matches!(result, Err(ResolveError::UnsupportedLink { .. })));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let result = Link::parse("not a url");
        assert!(matches!(result, Err(ResolveError::InvalidUrl { .. })));
    }
}
