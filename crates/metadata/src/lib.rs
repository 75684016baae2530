use std::path::Path;

use lofty::error::LoftyError;
use lofty::prelude::{ItemKey, TaggedFileExt};
use lofty::tag::Tag;

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TagInfo {
    pub artist: Option<String>,
    pub album_artist: Option<String>,
    pub album: Option<String>,
    pub title: Option<String>,
    pub track_no: Option<u32>,
}

#[derive(Debug)]
pub enum MetadataError {
    Io(std::io::Error),
    Lofty(LoftyError),
}

impl std::fmt::Display for MetadataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataError::Io(err) => write!(f, "io error: {}", err),
            MetadataError::Lofty(err) => write!(f, "tag error: {}", err),
        }
    }
}

impl std::error::Error for MetadataError {}

impl From<std::io::Error> for MetadataError {
    fn from(err: std::io::Error) -> Self {
        MetadataError::Io(err)
    }
}

impl From<LoftyError> for MetadataError {
    fn from(err: LoftyError) -> Self {
        MetadataError::Lofty(err)
    }
}

pub fn read_tags(path: &Path) -> Result<TagInfo, MetadataError> {
    let tagged_file = lofty::read_from_path(path)?;

    let tag = match tagged_file.primary_tag().or_else(|| tagged_file.first_tag()) {
        Some(tag) => tag,
        None => return Ok(TagInfo::default()),
    };

    Ok(TagInfo {
        artist: joined_values(tag, &ItemKey::TrackArtist),
        album_artist: first_value(tag, &ItemKey::AlbumArtist),
        album: first_value(tag, &ItemKey::AlbumTitle),
        title: first_value(tag, &ItemKey::TrackTitle),
        track_no: tag.get_string(&ItemKey::TrackNumber).and_then(parse_track_no),
    })
}

fn first_value(tag: &Tag, key: &ItemKey) -> Option<String> {
    tag.get_string(key).map(|v| v.to_string())
}

// Several artist frames become one comma-delimited credit list.
fn joined_values(tag: &Tag, key: &ItemKey) -> Option<String> {
    let values: Vec<&str> = tag.get_strings(key).collect();
    join_credits(&values)
}

fn join_credits(values: &[&str]) -> Option<String> {
    match values {
        [] => None,
        [single] => Some(single.to_string()),
        many => Some(many.join(", ")),
    }
}

fn parse_track_no(text: &str) -> Option<u32> {
    let head = text.split('/').next().unwrap_or(text).trim();
    head.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::{join_credits, parse_track_no};

    #[test]
    fn track_number_ignores_total() {
        assert_eq!(parse_track_no("3/12"), Some(3));
        assert_eq!(parse_track_no(" 7 "), Some(7));
        assert_eq!(parse_track_no("A1"), None);
    }

    #[test]
    fn multiple_artists_are_joined() {
        assert_eq!(join_credits(&[]), None);
        assert_eq!(join_credits(&["Solo"]).as_deref(), Some("Solo"));
        assert_eq!(join_credits(&["A", "B"]).as_deref(), Some("A, B"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = super::read_tags(std::path::Path::new("/nonexistent/track.flac"));
        assert!(result.is_err());
    }
}
