use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use common::{display_key, Song};
use tracing::info;

use crate::PlaylistError;

/// Writes one relative path per matched song; unmatched entries are skipped.
pub fn write_m3u(path: &Path, songs: &[Option<&Song>]) -> Result<(), PlaylistError> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = write_m3u_to(&mut out, songs)?;
    out.flush()?;
    info!("Wrote {} entries to {:?}", written, path);
    Ok(())
}

pub fn write_m3u_to<W: Write>(out: &mut W, songs: &[Option<&Song>]) -> Result<usize, PlaylistError> {
    let mut written = 0;
    for song in songs.iter().flatten() {
        writeln!(out, "{}", song.relpath)?;
        written += 1;
    }
    Ok(written)
}

/// Lists the query keys that found no song.
pub fn write_missing(
    path: &Path,
    keys: &[String],
    songs: &[Option<&Song>],
) -> Result<(), PlaylistError> {
    let mut out = BufWriter::new(File::create(path)?);
    let missing = write_missing_to(&mut out, keys, songs)?;
    out.flush()?;
    info!("Listed {} missing entries in {:?}", missing, path);
    Ok(())
}

pub fn write_missing_to<W: Write>(
    out: &mut W,
    keys: &[String],
    songs: &[Option<&Song>],
) -> Result<usize, PlaylistError> {
    writeln!(out, "Couldn't find:")?;
    let mut missing = 0;
    for (key, song) in keys.iter().zip(songs) {
        if song.is_none() {
            writeln!(out, "{}", display_key(key))?;
            missing += 1;
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::KEY_SEP;

    fn song(relpath: &str) -> Song {
        Song {
            relpath: relpath.to_string(),
            ..Song::default()
        }
    }

    #[test]
    fn m3u_lists_matches_in_order() {
        let a = song("Music/a.flac");
        let b = song("Music/b.mp3");
        let mut out = Vec::new();
        let written = write_m3u_to(&mut out, &[Some(&a), None, Some(&b)]).unwrap();
        assert_eq!(written, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "Music/a.flac\nMusic/b.mp3\n");
    }

    #[test]
    fn missing_list_renders_unmatched_keys() {
        let a = song("Music/a.flac");
        let keys = vec![
            format!("A{}X{}One", KEY_SEP, KEY_SEP),
            format!("B{}Y{}Two", KEY_SEP, KEY_SEP),
        ];
        let mut out = Vec::new();
        let missing = write_missing_to(&mut out, &keys, &[Some(&a), None]).unwrap();
        assert_eq!(missing, 1);
        assert_eq!(String::from_utf8(out).unwrap(), "Couldn't find:\nB/Y/Two\n");
    }

    #[test]
    fn m3u_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.m3u");
        let a = song("Music/a.flac");
        write_m3u(&path, &[Some(&a)]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Music/a.flac\n");
    }
}
