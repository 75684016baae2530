use std::collections::HashMap;

use common::{display_key, ConverterConfig, FieldTag, FormatTemplate, SongId, KEY_SEP};
use tracing::{debug, info, warn};

use crate::index::LibraryIndex;

pub const ARTIST_WEIGHT: f64 = 0.3;
pub const ALBUM_ARTIST_WEIGHT: f64 = 0.3;
pub const ALBUM_WEIGHT: f64 = 0.5;
pub const TITLE_WEIGHT: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    SegmentCount { expected: usize, found: usize },
}

impl std::fmt::Display for MatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchError::SegmentCount { expected, found } => write!(
                f,
                "query key has {} segments, format expects {}",
                found, expected
            ),
        }
    }
}

impl std::error::Error for MatchError {}

/// Accumulates per-song scores for a query key laid out as `format`.
///
/// Songs without any matching field are absent from the result.
pub fn score_candidates(
    index: &LibraryIndex,
    key: &str,
    format: &FormatTemplate,
) -> Result<HashMap<SongId, f64>, MatchError> {
    let segments: Vec<&str> = key.split(KEY_SEP).collect();
    if segments.len() != format.len() {
        return Err(MatchError::SegmentCount {
            expected: format.len(),
            found: segments.len(),
        });
    }

    let mut scores: HashMap<SongId, f64> = HashMap::new();
    for (field, segment) in format.fields().iter().zip(segments) {
        match field {
            FieldTag::Artist | FieldTag::AlbumArtist => {
                let weight = if *field == FieldTag::Artist {
                    ARTIST_WEIGHT
                } else {
                    ALBUM_ARTIST_WEIGHT
                };
                for value in index.splitter().split(segment) {
                    accrue(&mut scores, index, *field, value.trim(), weight);
                }
            }
            FieldTag::Album => accrue(&mut scores, index, *field, segment.trim(), ALBUM_WEIGHT),
            FieldTag::Title => accrue(&mut scores, index, *field, segment.trim(), TITLE_WEIGHT),
            FieldTag::Track => {}
        }
    }

    Ok(scores)
}

fn accrue(
    scores: &mut HashMap<SongId, f64>,
    index: &LibraryIndex,
    field: FieldTag,
    value: &str,
    weight: f64,
) {
    if let Some(ids) = index.ids_for(field, value) {
        for id in ids {
            *scores.entry(*id).or_insert(0.0) += weight;
        }
    }
}

/// Picks the candidate with the greatest score after filetype bonuses.
///
/// Equal scores resolve to the lowest identifier. The winner must strictly
/// exceed the configured minimum allowance.
pub fn select_best(
    index: &LibraryIndex,
    candidates: &HashMap<SongId, f64>,
    config: &ConverterConfig,
) -> Option<SongId> {
    let mut best: Option<(SongId, f64)> = None;
    for (id, score) in candidates {
        let bonus = index
            .song(*id)
            .map(|song| config.filetype_bonus(song))
            .unwrap_or(0.0);
        let adjusted = score + bonus;
        let better = match best {
            None => true,
            Some((best_id, best_score)) => {
                adjusted > best_score || (adjusted == best_score && *id < best_id)
            }
        };
        if better {
            best = Some((*id, adjusted));
        }
    }

    let (id, score) = best?;
    if score > config.minimum_match_allowance {
        Some(id)
    } else {
        None
    }
}

#[derive(Clone, Debug)]
pub struct Matcher {
    config: ConverterConfig,
}

impl Matcher {
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    pub fn match_key(&self, index: &LibraryIndex, key: &str) -> Result<Option<SongId>, MatchError> {
        let candidates = score_candidates(index, key, &self.config.format)?;
        Ok(select_best(index, &candidates, &self.config))
    }

    /// Matches every key in order. Malformed keys are logged and left unmatched.
    pub fn match_keys(&self, index: &LibraryIndex, keys: &[String]) -> Vec<Option<SongId>> {
        let mut matched = 0usize;
        let results: Vec<Option<SongId>> = keys
            .iter()
            .map(|key| match self.match_key(index, key) {
                Ok(Some(id)) => {
                    matched += 1;
                    debug!("Matched {:?} to {}", display_key(key), id);
                    Some(id)
                }
                Ok(None) => {
                    debug!("No match for {:?}", display_key(key));
                    None
                }
                Err(err) => {
                    warn!("Skipping {:?}: {}", display_key(key), err);
                    None
                }
            })
            .collect();
        info!("Matched {} of {} playlist entries", matched, keys.len());
        results
    }
}
