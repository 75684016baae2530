mod m3u;
mod reader;

use std::path::Path;
use std::str::FromStr;

use common::{FieldTag, FormatTemplate, Song, KEY_SEP, UNKNOWN_VALUE};

pub use m3u::{write_m3u, write_m3u_to, write_missing, write_missing_to};
pub use reader::{read_csv, read_csv_from, CsvLayout};

/// One row of an input playlist.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlaylistEntry {
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub title: String,
    pub track_no: Option<u32>,
}

impl PlaylistEntry {
    /// Builds the query key for this entry, one segment per format field.
    pub fn key(&self, format: &FormatTemplate) -> String {
        let mut key = String::new();
        for (i, field) in format.fields().iter().enumerate() {
            if i > 0 {
                key.push(KEY_SEP);
            }
            let value = match field {
                FieldTag::Artist => self.artist.clone(),
                FieldTag::AlbumArtist => self.album_artist.clone(),
                FieldTag::Album => self.album.clone(),
                FieldTag::Title => self.title.clone(),
                FieldTag::Track => self.track_no.map(|n| n.to_string()).unwrap_or_default(),
            };
            if value.trim().is_empty() {
                key.push_str(UNKNOWN_VALUE);
            } else {
                key.push_str(&value);
            }
        }
        key
    }
}

pub fn key_list(entries: &[PlaylistEntry], format: &FormatTemplate) -> Vec<String> {
    entries.iter().map(|entry| entry.key(format)).collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Csv,
    Exportify,
}

impl InputKind {
    /// Uses `explicit` when given, otherwise the extension of `path`.
    pub fn resolve(explicit: Option<&str>, path: &Path) -> Result<Self, PlaylistError> {
        resolve_kind(explicit, path)
    }

    fn layout(self) -> CsvLayout {
        match self {
            InputKind::Csv => CsvLayout::Default,
            InputKind::Exportify => CsvLayout::Exportify,
        }
    }
}

impl FromStr for InputKind {
    type Err = PlaylistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CSV" => Ok(InputKind::Csv),
            "EXPORTIFY" => Ok(InputKind::Exportify),
            _ => Err(PlaylistError::UnknownInputKind(s.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    M3u,
}

impl OutputKind {
    pub fn resolve(explicit: Option<&str>, path: &Path) -> Result<Self, PlaylistError> {
        resolve_kind(explicit, path)
    }
}

impl FromStr for OutputKind {
    type Err = PlaylistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M3U" | "M3U8" => Ok(OutputKind::M3u),
            _ => Err(PlaylistError::UnknownOutputKind(s.to_string())),
        }
    }
}

fn resolve_kind<T: FromStr<Err = PlaylistError>>(
    explicit: Option<&str>,
    path: &Path,
) -> Result<T, PlaylistError> {
    match explicit.map(str::trim).filter(|value| !value.is_empty()) {
        Some(kind) => kind.parse(),
        None => path
            .extension()
            .map(|ext| ext.to_string_lossy().to_string())
            .unwrap_or_default()
            .parse(),
    }
}

pub fn read_playlist(path: &Path, kind: InputKind) -> Result<Vec<PlaylistEntry>, PlaylistError> {
    read_csv(path, kind.layout())
}

pub fn write_playlist(
    path: &Path,
    kind: OutputKind,
    songs: &[Option<&Song>],
) -> Result<(), PlaylistError> {
    match kind {
        OutputKind::M3u => write_m3u(path, songs),
    }
}

#[derive(Debug)]
pub enum PlaylistError {
    Io(std::io::Error),
    Csv(csv::Error),
    InvalidHeader,
    UnknownInputKind(String),
    UnknownOutputKind(String),
}

impl std::fmt::Display for PlaylistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaylistError::Io(err) => write!(f, "io error: {}", err),
            PlaylistError::Csv(err) => write!(f, "csv error: {}", err),
            PlaylistError::InvalidHeader => {
                write!(f, "input csv does not include a recognized header")
            }
            PlaylistError::UnknownInputKind(kind) => write!(f, "invalid input type: {:?}", kind),
            PlaylistError::UnknownOutputKind(kind) => {
                write!(f, "invalid output type: {:?}", kind)
            }
        }
    }
}

impl std::error::Error for PlaylistError {}

impl From<std::io::Error> for PlaylistError {
    fn from(err: std::io::Error) -> Self {
        PlaylistError::Io(err)
    }
}

impl From<csv::Error> for PlaylistError {
    fn from(err: csv::Error) -> Self {
        PlaylistError::Csv(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> PlaylistEntry {
        PlaylistEntry {
            artist: "Band A".to_string(),
            album_artist: String::new(),
            album: "Album X".to_string(),
            title: "Song/1".to_string(),
            track_no: Some(4),
        }
    }

    #[test]
    fn key_follows_format_order() {
        let key = entry().key(&FormatTemplate::default());
        let segments: Vec<&str> = key.split(KEY_SEP).collect();
        assert_eq!(segments, vec!["Band A", "Album X", "Song/1"]);
    }

    #[test]
    fn empty_values_become_placeholder() {
        let format = FormatTemplate::new(vec![FieldTag::AlbumArtist, FieldTag::Track]);
        let mut missing = entry();
        missing.track_no = None;
        assert_eq!(
            key_list(&[entry(), missing], &format),
            vec![
                format!("{}{}4", UNKNOWN_VALUE, KEY_SEP),
                format!("{}{}{}", UNKNOWN_VALUE, KEY_SEP, UNKNOWN_VALUE),
            ]
        );
    }

    #[test]
    fn kinds_resolve_from_option_or_extension() {
        assert_eq!(
            InputKind::resolve(None, Path::new("list.CSV")).unwrap(),
            InputKind::Csv
        );
        assert_eq!(
            InputKind::resolve(Some("exportify"), Path::new("list.csv")).unwrap(),
            InputKind::Exportify
        );
        assert!(matches!(
            InputKind::resolve(None, Path::new("list.json")),
            Err(PlaylistError::UnknownInputKind(_))
        ));
        assert_eq!(
            OutputKind::resolve(None, Path::new("out.m3u")).unwrap(),
            OutputKind::M3u
        );
        assert!(matches!(
            OutputKind::resolve(Some("pls"), Path::new("out.m3u")),
            Err(PlaylistError::UnknownOutputKind(_))
        ));
    }
}
