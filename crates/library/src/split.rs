use std::ops::Range;

use common::ConverterConfig;

/// Splits multi-valued fields such as artist credits.
#[derive(Clone, Debug)]
pub struct FieldSplitter {
    delimiter: char,
    escape: char,
    protected: Vec<String>,
}

impl FieldSplitter {
    pub fn new(delimiter: char, escape: char, protected: Vec<String>) -> Self {
        let protected = protected.into_iter().filter(|p| !p.is_empty()).collect();
        Self {
            delimiter,
            escape,
            protected,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(
            config.split_character,
            config.escape_character,
            config.special_cases.clone(),
        )
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn split(&self, value: &str) -> Vec<String> {
        split_field(value, self.delimiter, self.escape, &self.protected)
    }
}

impl Default for FieldSplitter {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

/// Splits `value` on unescaped, unprotected `delimiter` occurrences.
///
/// An escape directly before the delimiter yields a literal delimiter.
/// A protected substring that contains the delimiter shields every
/// delimiter inside it; one that does not (a suffix like `Jr.`) shields
/// the delimiter right before it, so `Smith, Jr.` stays whole.
/// Parts are not trimmed.
pub fn split_field(value: &str, delimiter: char, escape: char, protected: &[String]) -> Vec<String> {
    let shielded = shielded_ranges(value, delimiter, protected);
    let is_shielded = |idx: usize| shielded.iter().any(|range| range.contains(&idx));

    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = value.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        if ch == escape && escape != delimiter {
            if let Some(&(_, next)) = chars.peek() {
                if next == delimiter {
                    current.push(delimiter);
                    chars.next();
                    continue;
                }
            }
            current.push(ch);
            continue;
        }

        if ch == delimiter && !is_shielded(idx) {
            parts.push(std::mem::take(&mut current));
            continue;
        }

        current.push(ch);
    }

    parts.push(current);
    parts
}

fn shielded_ranges(value: &str, delimiter: char, protected: &[String]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    for pattern in protected {
        if pattern.is_empty() {
            continue;
        }
        let spans_delimiter = pattern.contains(delimiter);
        for (start, matched) in value.match_indices(pattern.as_str()) {
            if spans_delimiter {
                ranges.push(start..start + matched.len());
            } else if let Some(idx) = delimiter_before(value, start, delimiter) {
                ranges.push(idx..idx + delimiter.len_utf8());
            }
        }
    }
    ranges
}

// Byte offset of `delimiter` if it precedes `start` with only whitespace between.
fn delimiter_before(value: &str, start: usize, delimiter: char) -> Option<usize> {
    let (idx, ch) = value[..start]
        .char_indices()
        .rev()
        .find(|(_, ch)| !ch.is_whitespace())?;
    (ch == delimiter).then_some(idx)
}
