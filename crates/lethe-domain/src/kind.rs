//! Media kind module - which catalog system owns an item

/// Kind of a media item
///
/// The kind decides which catalog store owns the item's files and which
/// provider identifier is carried as its external id:
/// - Series: owned by the series store, identified by TVDB id
/// - Movie: owned by the movie store, identified by TMDB id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Television series
    Series,

    /// Feature film
    Movie,
}

impl MediaKind {
    /// Get the kind name as reported by the library index
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Series => "Series",
            MediaKind::Movie => "Movie",
        }
    }

    /// Parse a kind from the library index's item type name
    ///
    /// Anything other than a series or a movie (episodes, box sets, music)
    /// is not managed by Lethe and yields `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "series" => Some(MediaKind::Series),
            "movie" => Some(MediaKind::Movie),
            _ => None,
        }
    }

    /// Provider name whose identifier is used as the external id
    pub fn provider(&self) -> &'static str {
        match self {
            MediaKind::Series => "Tvdb",
            MediaKind::Movie => "Tmdb",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unsupported media kind: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(MediaKind::parse("Series"), Some(MediaKind::Series));
        assert_eq!(MediaKind::parse("movie"), Some(MediaKind::Movie));
        assert_eq!(MediaKind::parse("BoxSet"), None);
        assert_eq!(MediaKind::parse("Episode"), None);
    }

    #[test]
    fn test_provider_per_kind() {
        assert_eq!(MediaKind::Series.provider(), "Tvdb");
        assert_eq!(MediaKind::Movie.provider(), "Tmdb");
    }

    #[test]
    fn test_from_str_error() {
        let err = "Audio".parse::<MediaKind>().unwrap_err();
        assert!(err.contains("Audio"));
    }
}
