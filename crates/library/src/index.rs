use std::collections::{BTreeSet, HashMap};

use common::{FieldTag, Song, SongId, UNKNOWN_VALUE};
use tracing::debug;

use crate::split::FieldSplitter;
use crate::LibraryError;

/// In-memory song collection with secondary indices by artist, album artist,
/// album and title, plus the relative-path map used by incremental scans.
#[derive(Clone, Debug)]
pub struct LibraryIndex {
    songs: HashMap<SongId, Song>,
    artists: HashMap<String, BTreeSet<SongId>>,
    album_artists: HashMap<String, BTreeSet<SongId>>,
    albums: HashMap<String, BTreeSet<SongId>>,
    titles: HashMap<String, BTreeSet<SongId>>,
    paths: HashMap<String, SongId>,
    next_id: u64,
    splitter: FieldSplitter,
}

impl LibraryIndex {
    pub fn new(splitter: FieldSplitter) -> Self {
        Self {
            songs: HashMap::new(),
            artists: HashMap::new(),
            album_artists: HashMap::new(),
            albums: HashMap::new(),
            titles: HashMap::new(),
            paths: HashMap::new(),
            next_id: 0,
            splitter,
        }
    }

    /// Adds `song` under its relative path and returns the new identifier.
    ///
    /// A path that is already indexed is rejected before anything is mutated.
    pub fn insert(&mut self, song: Song) -> Result<SongId, LibraryError> {
        if self.paths.contains_key(&song.relpath) {
            return Err(LibraryError::DuplicatePath(song.relpath));
        }
        let id = SongId(self.next_id);
        self.next_id += 1;
        self.store(id, song);
        Ok(id)
    }

    /// Re-adds a song loaded from a snapshot under its original identifier.
    pub(crate) fn restore(&mut self, id: SongId, song: Song) -> Result<(), LibraryError> {
        if self.paths.contains_key(&song.relpath) {
            return Err(LibraryError::DuplicatePath(song.relpath));
        }
        if self.songs.contains_key(&id) {
            return Err(LibraryError::DuplicateId(id));
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.store(id, song);
        Ok(())
    }

    pub(crate) fn reserve_ids_until(&mut self, next_id: u64) {
        self.next_id = self.next_id.max(next_id);
    }

    fn store(&mut self, id: SongId, song: Song) {
        for artist in self.splitter.split(&song.artist) {
            add_artist(&mut self.artists, &artist, id);
        }
        for artist in self.splitter.split(&song.album_artist) {
            add_artist(&mut self.album_artists, &artist, id);
        }
        add_value(&mut self.albums, &song.album, id);
        add_value(&mut self.titles, &song.title, id);

        debug!("Indexed {} as {}", song.relpath, id);
        self.paths.insert(song.relpath.clone(), id);
        self.songs.insert(id, song);
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains_key(path)
    }

    pub fn lookup(&self, path: &str) -> Option<SongId> {
        self.paths.get(path).copied()
    }

    pub fn song(&self, id: SongId) -> Option<&Song> {
        self.songs.get(&id)
    }

    pub fn songs(&self) -> impl Iterator<Item = (SongId, &Song)> {
        self.songs.iter().map(|(id, song)| (*id, song))
    }

    /// Identifiers whose `field` equals `value` exactly. `Track` is not indexed.
    pub fn ids_for(&self, field: FieldTag, value: &str) -> Option<&BTreeSet<SongId>> {
        let map = match field {
            FieldTag::Artist => &self.artists,
            FieldTag::AlbumArtist => &self.album_artists,
            FieldTag::Album => &self.albums,
            FieldTag::Title => &self.titles,
            FieldTag::Track => return None,
        };
        map.get(value)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn splitter(&self) -> &FieldSplitter {
        &self.splitter
    }
}

fn add_artist(index: &mut HashMap<String, BTreeSet<SongId>>, value: &str, id: SongId) {
    if value.trim() == UNKNOWN_VALUE {
        return;
    }
    add_value(index, value, id);
}

fn add_value(index: &mut HashMap<String, BTreeSet<SongId>>, value: &str, id: SongId) {
    let key = value.trim();
    if key.is_empty() {
        return;
    }
    index.entry(key.to_string()).or_default().insert(id);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song(relpath: &str, artist: &str, album: &str, title: &str) -> Song {
        Song {
            path: format!("/music/{}", relpath).into(),
            relpath: relpath.to_string(),
            title: title.to_string(),
            artist: artist.to_string(),
            album_artist: String::new(),
            album: album.to_string(),
            track_no: None,
        }
    }

    fn assert_consistent(index: &LibraryIndex) {
        let maps = [
            (FieldTag::Artist, &index.artists),
            (FieldTag::AlbumArtist, &index.album_artists),
            (FieldTag::Album, &index.albums),
            (FieldTag::Title, &index.titles),
        ];
        for (field, map) in maps {
            for (value, ids) in map {
                for id in ids {
                    let song = index.song(*id).expect("indexed id has a song");
                    let matches = match field {
                        FieldTag::Artist => index
                            .splitter
                            .split(&song.artist)
                            .iter()
                            .any(|part| part.trim() == value.as_str()),
                        FieldTag::AlbumArtist => index
                            .splitter
                            .split(&song.album_artist)
                            .iter()
                            .any(|part| part.trim() == value.as_str()),
                        FieldTag::Album => song.album.trim() == value.as_str(),
                        FieldTag::Title => song.title.trim() == value.as_str(),
                        FieldTag::Track => false,
                    };
                    assert!(matches, "{:?} {:?} does not match song {}", field, value, id);
                }
            }
        }
        for (path, id) in &index.paths {
            assert_eq!(&index.songs[id].relpath, path);
        }
        assert_eq!(index.paths.len(), index.songs.len());
    }

    #[test]
    fn insert_assigns_increasing_ids() {
        let mut index = LibraryIndex::new(FieldSplitter::default());
        let first = index.insert(song("a.flac", "A", "X", "One")).unwrap();
        let second = index.insert(song("b.flac", "A", "X", "Two")).unwrap();
        assert_eq!(first, SongId(0));
        assert_eq!(second, SongId(1));
        assert_eq!(index.next_id(), 2);
        assert!(index.contains("a.flac"));
        assert_eq!(index.lookup("b.flac"), Some(second));
        assert_eq!(index.lookup("c.flac"), None);
    }

    #[test]
    fn duplicate_path_is_rejected_without_mutation() {
        let mut index = LibraryIndex::new(FieldSplitter::default());
        index.insert(song("a.flac", "A", "X", "One")).unwrap();
        let err = index.insert(song("a.flac", "B", "Y", "Two")).unwrap_err();
        assert!(matches!(err, LibraryError::DuplicatePath(path) if path == "a.flac"));
        assert_eq!(index.len(), 1);
        assert_eq!(index.next_id(), 1);
        assert!(index.ids_for(FieldTag::Artist, "B").is_none());
        assert!(index.ids_for(FieldTag::Album, "Y").is_none());
    }

    #[test]
    fn artist_credits_are_split_and_trimmed() {
        let mut index = LibraryIndex::new(FieldSplitter::default());
        let id = index
            .insert(song("a.flac", "Band A,  Guest B", " Album X ", "Song"))
            .unwrap();
        assert!(index.ids_for(FieldTag::Artist, "Band A").unwrap().contains(&id));
        assert!(index.ids_for(FieldTag::Artist, "Guest B").unwrap().contains(&id));
        assert!(index.ids_for(FieldTag::Artist, "Band A,  Guest B").is_none());
        assert!(index.ids_for(FieldTag::Album, "Album X").unwrap().contains(&id));
        assert_consistent(&index);
    }

    #[test]
    fn unknown_artist_is_not_indexed() {
        let mut index = LibraryIndex::new(FieldSplitter::default());
        let mut unknown = song("a.flac", UNKNOWN_VALUE, "Album", "Title");
        unknown.album_artist = UNKNOWN_VALUE.to_string();
        let id = index.insert(unknown).unwrap();
        assert!(index.ids_for(FieldTag::Artist, UNKNOWN_VALUE).is_none());
        assert!(index.ids_for(FieldTag::AlbumArtist, UNKNOWN_VALUE).is_none());
        assert!(index.ids_for(FieldTag::Album, "Album").unwrap().contains(&id));
        assert!(index.song(id).is_some());
    }

    #[test]
    fn shared_values_collect_every_id() {
        let mut index = LibraryIndex::new(FieldSplitter::default());
        let a = index.insert(song("a.flac", "A", "X", "Same")).unwrap();
        let b = index.insert(song("b.mp3", "B", "Y", "Same")).unwrap();
        let ids: Vec<SongId> = index
            .ids_for(FieldTag::Title, "Same")
            .unwrap()
            .iter()
            .copied()
            .collect();
        assert_eq!(ids, vec![a, b]);
        assert!(index.ids_for(FieldTag::Track, "1").is_none());
        assert_consistent(&index);
    }

    #[test]
    fn restore_keeps_ids_and_advances_counter() {
        let mut index = LibraryIndex::new(FieldSplitter::default());
        index.restore(SongId(7), song("a.flac", "A", "X", "One")).unwrap();
        assert_eq!(index.next_id(), 8);
        let err = index.restore(SongId(7), song("b.flac", "A", "X", "Two"));
        assert!(matches!(err, Err(LibraryError::DuplicateId(SongId(7)))));
        let next = index.insert(song("c.flac", "A", "X", "Three")).unwrap();
        assert_eq!(next, SongId(8));
        index.reserve_ids_until(20);
        assert_eq!(index.insert(song("d.flac", "A", "X", "Four")).unwrap(), SongId(20));
        assert_consistent(&index);
    }
}
