use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Separator between the segments of a query key. Never expected inside tag values.
pub const KEY_SEP: char = '\x1f';

/// Placeholder for metadata that is missing on either side of a match.
pub const UNKNOWN_VALUE: &str = "Unknown";

pub const DEFAULT_MINIMUM_MATCH_ALLOWANCE: f64 = 0.9;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SongId(pub u64);

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub path: PathBuf,
    pub relpath: String,
    pub title: String,
    pub artist: String,
    pub album_artist: String,
    pub album: String,
    pub track_no: Option<u32>,
}

impl Song {
    pub fn extension(&self) -> Option<&str> {
        file_extension(&self.relpath)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTag {
    Artist,
    AlbumArtist,
    Album,
    Title,
    Track,
}

impl FromStr for FieldTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Artist" => Ok(FieldTag::Artist),
            "AlbumArtist" => Ok(FieldTag::AlbumArtist),
            "Album" => Ok(FieldTag::Album),
            "Title" => Ok(FieldTag::Title),
            "Track" => Ok(FieldTag::Track),
            other => Err(format!("unknown format field: {:?}", other)),
        }
    }
}

/// Ordered field layout of a query key.
///
/// Accepts either a list of field names or the `/`-joined form
/// (`"Artist/Album/Title"`) when deserialized.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "FormatRepr", into = "Vec<FieldTag>")]
pub struct FormatTemplate(Vec<FieldTag>);

#[derive(Deserialize)]
#[serde(untagged)]
enum FormatRepr {
    Joined(String),
    Fields(Vec<FieldTag>),
}

impl FormatTemplate {
    pub fn new(fields: Vec<FieldTag>) -> Self {
        Self(fields)
    }

    pub fn fields(&self) -> &[FieldTag] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FormatTemplate {
    fn default() -> Self {
        Self(vec![FieldTag::Artist, FieldTag::Album, FieldTag::Title])
    }
}

impl FromStr for FormatTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s
            .split('/')
            .filter(|part| !part.trim().is_empty())
            .map(FieldTag::from_str)
            .collect::<Result<Vec<_>, _>>()?;
        if fields.is_empty() {
            return Err("format has no fields".to_string());
        }
        Ok(Self(fields))
    }
}

impl TryFrom<FormatRepr> for FormatTemplate {
    type Error = String;

    fn try_from(value: FormatRepr) -> Result<Self, Self::Error> {
        match value {
            FormatRepr::Joined(text) => text.parse(),
            FormatRepr::Fields(fields) if fields.is_empty() => {
                Err("format has no fields".to_string())
            }
            FormatRepr::Fields(fields) => Ok(Self(fields)),
        }
    }
}

impl From<FormatTemplate> for Vec<FieldTag> {
    fn from(value: FormatTemplate) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct ConverterConfig {
    pub paths: Vec<PathBuf>,
    pub format: FormatTemplate,
    pub minimum_match_allowance: f64,
    pub filetype_bonuses: HashMap<String, f64>,
    pub split_character: char,
    pub escape_character: char,
    pub special_cases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub db_file: Option<PathBuf>,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        let mut filetype_bonuses = HashMap::new();
        filetype_bonuses.insert("FLAC".to_string(), 0.2);
        filetype_bonuses.insert("OGG".to_string(), 0.1);
        Self {
            paths: Vec::new(),
            format: FormatTemplate::default(),
            minimum_match_allowance: DEFAULT_MINIMUM_MATCH_ALLOWANCE,
            filetype_bonuses,
            split_character: ',',
            escape_character: '\\',
            special_cases: Vec::new(),
            db_file: None,
        }
    }
}

impl ConverterConfig {
    /// Uppercases bonus keys and drops empty special cases.
    pub fn normalized(mut self) -> Self {
        self.filetype_bonuses = self
            .filetype_bonuses
            .into_iter()
            .map(|(ext, bonus)| (ext.trim().trim_start_matches('.').to_ascii_uppercase(), bonus))
            .collect();
        self.special_cases.retain(|case| !case.is_empty());
        self
    }

    /// Bonus for the song's file type, zero when none is configured.
    pub fn filetype_bonus(&self, song: &Song) -> f64 {
        song.extension()
            .and_then(|ext| self.filetype_bonuses.get(&ext.to_ascii_uppercase()))
            .copied()
            .unwrap_or(0.0)
    }
}

/// Renders a query key with `/` between segments for messages and reports.
pub fn display_key(key: &str) -> String {
    key.replace(KEY_SEP, "/")
}

/// Tail of `path` after its last `.`, if that tail belongs to the file name.
pub fn file_extension(path: &str) -> Option<&str> {
    let (_, ext) = path.rsplit_once('.')?;
    if ext.is_empty() || ext.contains(&['/', '\\'][..]) {
        return None;
    }
    Some(ext)
}

pub fn relpath_from(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(path_to_slash_string(rel))
}

fn path_to_slash_string(path: &Path) -> String {
    let parts: Vec<String> = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    parts.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_last_dot_suffix() {
        assert_eq!(file_extension("Music/a.b/track.flac"), Some("flac"));
        assert_eq!(file_extension("Music/Album v1.0/track"), None);
        assert_eq!(file_extension("noext"), None);
        assert_eq!(file_extension("trailing."), None);
    }

    #[test]
    fn display_key_uses_slashes() {
        let key = format!("A{}B{}C", KEY_SEP, KEY_SEP);
        assert_eq!(display_key(&key), "A/B/C");
    }

    fn song(relpath: &str) -> Song {
        Song {
            relpath: relpath.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn bonus_lookup_is_case_insensitive() {
        let config = ConverterConfig::default();
        assert_eq!(config.filetype_bonus(&song("x/a.flac")), 0.2);
        assert_eq!(config.filetype_bonus(&song("x/a.OGG")), 0.1);
        assert_eq!(config.filetype_bonus(&song("x/a.mp3")), 0.0);
        assert_eq!(config.filetype_bonus(&song("x.v2/a")), 0.0);
        assert_eq!(song("Music/b.flac").extension(), Some("flac"));
    }

    #[test]
    fn format_parses_joined_and_list_forms() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: FormatTemplate,
        }

        let joined: Wrapper = toml::from_str("format = \"Artist/Album/Title\"").unwrap();
        assert_eq!(joined.format, FormatTemplate::default());

        let list: Wrapper = toml::from_str("format = [\"AlbumArtist\", \"Title\"]").unwrap();
        assert_eq!(list.format.fields(), &[FieldTag::AlbumArtist, FieldTag::Title]);

        assert!(toml::from_str::<Wrapper>("format = \"Artist/Genre\"").is_err());
    }

    #[test]
    fn config_reads_pascal_case_keys() {
        let config: ConverterConfig = toml::from_str(
            r#"
            Paths = ["/music"]
            MinimumMatchAllowance = 0.5
            SplitCharacter = ";"
            SpecialCases = ["Tyler, The Creator", ""]

            [FiletypeBonuses]
            flac = 0.3
            ".m4a" = 0.05
            "#,
        )
        .unwrap();
        let config = config.normalized();

        assert_eq!(config.paths, vec![PathBuf::from("/music")]);
        assert_eq!(config.minimum_match_allowance, 0.5);
        assert_eq!(config.split_character, ';');
        assert_eq!(config.escape_character, '\\');
        assert_eq!(config.special_cases, vec!["Tyler, The Creator".to_string()]);
        assert_eq!(config.filetype_bonus(&song("a.flac")), 0.3);
        assert_eq!(config.filetype_bonus(&song("a.m4a")), 0.05);
        assert_eq!(config.format, FormatTemplate::default());
    }

    #[test]
    fn relpath_uses_forward_slashes() {
        let root = Path::new("/music");
        let path = Path::new("/music/Artist/Album/01.flac");
        assert_eq!(relpath_from(root, path).as_deref(), Some("Artist/Album/01.flac"));
        assert_eq!(relpath_from(root, Path::new("/other/x.flac")), None);
    }
}
