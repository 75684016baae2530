use std::collections::HashSet;
use std::path::{Path, PathBuf};

use common::{relpath_from, Song, UNKNOWN_VALUE};
use metadata::{read_tags, MetadataError, TagInfo};
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::index::LibraryIndex;
use crate::LibraryError;

pub const AUDIO_EXTENSIONS: &[&str] = &["OGG", "MP3", "M4A", "FLAC", "WAV", "AIFF"];

/// Reads the tags of one audio file.
pub trait TagSource: Sync {
    fn read(&self, path: &Path) -> Result<TagInfo, MetadataError>;
}

/// Tag source backed by lofty.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyTags;

impl TagSource for LoftyTags {
    fn read(&self, path: &Path) -> Result<TagInfo, MetadataError> {
        read_tags(path)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub seen: usize,
    pub added: usize,
    pub skipped: usize,
}

#[derive(Debug)]
struct PendingFile {
    path: PathBuf,
    relpath: String,
}

impl PendingFile {
    fn into_song(self, info: TagInfo) -> Song {
        Song {
            path: self.path,
            relpath: self.relpath,
            title: info.title.unwrap_or_default(),
            artist: info.artist.unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
            album_artist: info.album_artist.unwrap_or_else(|| UNKNOWN_VALUE.to_string()),
            album: info.album.unwrap_or_default(),
            track_no: info.track_no,
        }
    }
}

/// Adds every audio file under `roots` that is not indexed yet.
///
/// Roots are made absolute first, so stored song paths are absolute.
/// Files are keyed by `<root name>/<path under root>`. Tags are read on the
/// rayon pool; insertion happens afterwards on the calling thread in walk
/// order. Any walk or tag error aborts before the index is touched.
pub fn scan_roots(
    index: &mut LibraryIndex,
    roots: &[PathBuf],
    tags: &dyn TagSource,
) -> Result<ScanStats, LibraryError> {
    let mut stats = ScanStats::default();
    let mut queued = HashSet::new();
    let mut pending = Vec::new();

    for root in roots {
        info!("Reading {:?}", root);
        let root = std::path::absolute(root)?;
        let label = root_label(&root);
        for path in collect_audio_files(&root)? {
            stats.seen += 1;
            let relpath = match relpath_from(&root, &path) {
                Some(rel) => format!("{}/{}", label, rel),
                None => continue,
            };
            if index.contains(&relpath) || !queued.insert(relpath.clone()) {
                stats.skipped += 1;
                continue;
            }
            pending.push(PendingFile { path, relpath });
        }
    }

    debug!("{} new files to read", pending.len());
    let songs = read_pending(pending, tags)?;
    for song in songs {
        index.insert(song)?;
        stats.added += 1;
    }

    info!(
        "Scan finished: {} files, {} added, {} already indexed",
        stats.seen, stats.added, stats.skipped
    );
    Ok(stats)
}

fn read_pending(pending: Vec<PendingFile>, tags: &dyn TagSource) -> Result<Vec<Song>, LibraryError> {
    // Indexed collect keeps walk order; the first failure stops the collect.
    pending
        .into_par_iter()
        .map(|file| match tags.read(&file.path) {
            Ok(info) => Ok(file.into_song(info)),
            Err(source) => Err(LibraryError::Tags {
                path: file.path,
                source,
            }),
        })
        .collect()
}

fn collect_audio_files(root: &Path) -> Result<Vec<PathBuf>, LibraryError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if is_audio_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_uppercase())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

fn root_label(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .or_else(|| {
            root.canonicalize()
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().to_string()))
        })
        .unwrap_or_else(|| ".".to_string())
}
