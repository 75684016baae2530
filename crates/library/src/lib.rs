mod index;
mod matcher;
mod scan;
mod snapshot;
mod split;

use std::path::PathBuf;

use common::{ConverterConfig, SongId};
use metadata::MetadataError;
use redb::{CommitError, DatabaseError, StorageError, TableError, TransactionError};
use tracing::info;

pub use index::LibraryIndex;
pub use matcher::{
    score_candidates, select_best, MatchError, Matcher, ALBUM_ARTIST_WEIGHT, ALBUM_WEIGHT,
    ARTIST_WEIGHT, TITLE_WEIGHT,
};
pub use scan::{scan_roots, LoftyTags, ScanStats, TagSource, AUDIO_EXTENSIONS};
pub use snapshot::SnapshotStore;
pub use split::{split_field, FieldSplitter};

/// A library index together with the snapshot it is persisted to.
#[derive(Debug)]
pub struct Library {
    index: LibraryIndex,
    store: Option<SnapshotStore>,
}

impl Library {
    /// Hydrates the index from `db_path` when a usable snapshot exists.
    pub fn load(config: &ConverterConfig, db_path: Option<PathBuf>) -> Result<Self, LibraryError> {
        let splitter = FieldSplitter::from_config(config);
        let store = db_path.map(SnapshotStore::new);
        let index = match &store {
            Some(store) => store.load(splitter.clone())?,
            None => None,
        };
        let index = index.unwrap_or_else(|| LibraryIndex::new(splitter));
        Ok(Self { index, store })
    }

    /// Loads the snapshot, indexes every configured search path and writes
    /// the result back.
    pub fn load_or_scan(
        config: &ConverterConfig,
        db_path: Option<PathBuf>,
        tags: &dyn TagSource,
    ) -> Result<(Self, ScanStats), LibraryError> {
        let mut library = Self::load(config, db_path)?;
        info!("Building index...");
        let stats = library.scan(&config.paths, tags)?;
        info!("Writing index...");
        library.save()?;
        Ok((library, stats))
    }

    pub fn scan(&mut self, roots: &[PathBuf], tags: &dyn TagSource) -> Result<ScanStats, LibraryError> {
        scan_roots(&mut self.index, roots, tags)
    }

    pub fn save(&self) -> Result<(), LibraryError> {
        match &self.store {
            Some(store) => store.save(&self.index),
            None => Ok(()),
        }
    }

    pub fn index(&self) -> &LibraryIndex {
        &self.index
    }
}

#[derive(Debug)]
pub enum LibraryError {
    Io(std::io::Error),
    Tags { path: PathBuf, source: MetadataError },
    Walk(walkdir::Error),
    Redb(redb::Error),
    Bincode(Box<bincode::ErrorKind>),
    DuplicatePath(String),
    DuplicateId(SongId),
}

impl std::fmt::Display for LibraryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LibraryError::Io(err) => write!(f, "io error: {}", err),
            LibraryError::Tags { path, source } => {
                write!(f, "failed to read tags from {:?}: {}", path, source)
            }
            LibraryError::Walk(err) => write!(f, "directory walk error: {}", err),
            LibraryError::Redb(err) => write!(f, "db error: {}", err),
            LibraryError::Bincode(err) => write!(f, "bincode error: {}", err),
            LibraryError::DuplicatePath(path) => write!(f, "path already indexed: {}", path),
            LibraryError::DuplicateId(id) => write!(f, "song id already used: {}", id),
        }
    }
}

impl std::error::Error for LibraryError {}

impl From<std::io::Error> for LibraryError {
    fn from(err: std::io::Error) -> Self {
        LibraryError::Io(err)
    }
}

impl From<walkdir::Error> for LibraryError {
    fn from(err: walkdir::Error) -> Self {
        LibraryError::Walk(err)
    }
}

impl From<redb::Error> for LibraryError {
    fn from(err: redb::Error) -> Self {
        LibraryError::Redb(err)
    }
}

impl From<DatabaseError> for LibraryError {
    fn from(err: DatabaseError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TableError> for LibraryError {
    fn from(err: TableError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<TransactionError> for LibraryError {
    fn from(err: TransactionError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<StorageError> for LibraryError {
    fn from(err: StorageError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<CommitError> for LibraryError {
    fn from(err: CommitError) -> Self {
        LibraryError::Redb(err.into())
    }
}

impl From<Box<bincode::ErrorKind>> for LibraryError {
    fn from(err: Box<bincode::ErrorKind>) -> Self {
        LibraryError::Bincode(err)
    }
}
