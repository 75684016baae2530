use std::fs;
use std::path::{Path, PathBuf};

use common::{Song, SongId};
use redb::{Database, ReadableTable, TableDefinition, TableError, TableHandle, WriteTransaction};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::index::LibraryIndex;
use crate::split::FieldSplitter;
use crate::LibraryError;

const SNAPSHOT_VERSION: u32 = 1;

const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const SONGS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("songs");

const META_VERSION_KEY: &str = "version";
const META_NEXT_ID_KEY: &str = "next_id";

/// Persists the song collection between runs.
///
/// Only songs and the identifier counter are stored; the secondary
/// indices are rebuilt on load with the splitter of the current run.
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn load(&self, splitter: FieldSplitter) -> Result<Option<LibraryIndex>, LibraryError> {
        if !self.path.exists() {
            info!("No snapshot at {:?}; starting empty", self.path);
            return Ok(None);
        }

        let db = Database::open(&self.path)?;
        let read_txn = db.begin_read()?;
        let meta = match read_txn.open_table(META_TABLE) {
            Ok(table) => table,
            Err(TableError::TableDoesNotExist(_)) => {
                warn!("Snapshot {:?} has no metadata; rebuilding", self.path);
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let version: Option<u32> = match meta.get(META_VERSION_KEY)? {
            Some(value) => Some(decode_value(value.value())?),
            None => None,
        };
        if version != Some(SNAPSHOT_VERSION) {
            warn!("Snapshot version mismatch ({:?}); rebuilding", version);
            return Ok(None);
        }
        let next_id: u64 = match meta.get(META_NEXT_ID_KEY)? {
            Some(value) => decode_value(value.value())?,
            None => 0,
        };

        let mut index = LibraryIndex::new(splitter);
        match read_txn.open_table(SONGS_TABLE) {
            Ok(songs) => {
                for entry in songs.iter()? {
                    let entry = entry?;
                    let id = SongId(entry.0.value());
                    let song: Song = decode_value(entry.1.value())?;
                    index.restore(id, song)?;
                }
            }
            Err(TableError::TableDoesNotExist(_)) => {}
            Err(err) => return Err(err.into()),
        }
        index.reserve_ids_until(next_id);

        info!("Loaded {} songs from {:?}", index.len(), self.path);
        Ok(Some(index))
    }

    pub fn save(&self, index: &LibraryIndex) -> Result<(), LibraryError> {
        let db = open_or_create_db(&self.path)?;
        let write_txn = db.begin_write()?;

        clear_table(&write_txn, META_TABLE)?;
        clear_table(&write_txn, SONGS_TABLE)?;
        {
            let mut meta = write_txn.open_table(META_TABLE)?;
            let version = encode_value(&SNAPSHOT_VERSION)?;
            meta.insert(META_VERSION_KEY, version.as_slice())?;
            let next_id = encode_value(&index.next_id())?;
            meta.insert(META_NEXT_ID_KEY, next_id.as_slice())?;

            let mut songs = write_txn.open_table(SONGS_TABLE)?;
            for (id, song) in index.songs() {
                let bytes = encode_value(song)?;
                songs.insert(id.0, bytes.as_slice())?;
            }
        }
        write_txn.commit()?;

        info!("Wrote {} songs to {:?}", index.len(), self.path);
        Ok(())
    }
}

fn open_or_create_db(path: &Path) -> Result<Database, LibraryError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    if path.exists() {
        Ok(Database::open(path)?)
    } else {
        Ok(Database::create(path)?)
    }
}

fn clear_table(txn: &WriteTransaction, table: impl TableHandle) -> Result<(), LibraryError> {
    match txn.delete_table(table) {
        Ok(_) => Ok(()),
        Err(TableError::TableDoesNotExist(_)) => Ok(()),
        Err(err) => Err(err.into()),
    }
}

fn encode_value<T: Serialize>(value: &T) -> Result<Vec<u8>, LibraryError> {
    Ok(bincode::serialize(value)?)
}

fn decode_value<T: for<'de> Deserialize<'de>>(bytes: &[u8]) -> Result<T, LibraryError> {
    Ok(bincode::deserialize(bytes)?)
}
