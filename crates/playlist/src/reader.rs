use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::{PlaylistEntry, PlaylistError};

/// Column naming scheme of a CSV playlist export.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CsvLayout {
    Default,
    Exportify,
}

struct Columns {
    artist: &'static str,
    album_artist: &'static str,
    title: &'static str,
    album: &'static str,
    track_no: &'static str,
}

impl CsvLayout {
    fn columns(self) -> Columns {
        match self {
            CsvLayout::Default => Columns {
                artist: "Artist",
                album_artist: "AlbumArtist",
                title: "Title",
                album: "Album",
                track_no: "Track Number",
            },
            CsvLayout::Exportify => Columns {
                artist: "Artist Name(s)",
                album_artist: "Album Artist Name(s)",
                title: "Track Name",
                album: "Album Name",
                track_no: "Track Number",
            },
        }
    }
}

#[derive(Default)]
struct HeaderIndex {
    artist: Option<usize>,
    album_artist: Option<usize>,
    title: Option<usize>,
    album: Option<usize>,
    track_no: Option<usize>,
}

impl HeaderIndex {
    fn from_headers(headers: &csv::StringRecord, columns: &Columns) -> Result<Self, PlaylistError> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let index = HeaderIndex {
            artist: position(columns.artist),
            album_artist: position(columns.album_artist),
            title: position(columns.title),
            album: position(columns.album),
            track_no: position(columns.track_no),
        };
        if index.artist.is_none()
            && index.album_artist.is_none()
            && index.title.is_none()
            && index.album.is_none()
            && index.track_no.is_none()
        {
            return Err(PlaylistError::InvalidHeader);
        }
        Ok(index)
    }
}

pub fn read_csv(path: &Path, layout: CsvLayout) -> Result<Vec<PlaylistEntry>, PlaylistError> {
    let file = File::open(path)?;
    let entries = read_csv_from(file, layout)?;
    info!("Read {} entries from {:?}", entries.len(), path);
    Ok(entries)
}

pub fn read_csv_from<R: Read>(
    input: R,
    layout: CsvLayout,
) -> Result<Vec<PlaylistEntry>, PlaylistError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input);
    let header = HeaderIndex::from_headers(reader.headers()?, &layout.columns())?;

    let mut entries = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .map(|value| value.to_string())
                .unwrap_or_default()
        };

        let track_text = field(header.track_no);
        let track_no = match track_text.trim() {
            "" => None,
            text => match text.parse::<u32>() {
                Ok(number) => Some(number),
                Err(_) => {
                    warn!("Row {}: track number {:?} is not a valid integer", row + 1, text);
                    None
                }
            },
        };

        entries.push(PlaylistEntry {
            artist: field(header.artist),
            album_artist: field(header.album_artist),
            album: field(header.album),
            title: field(header.title),
            track_no,
        });
    }

    Ok(entries)
}
