//! Normalized word store with length-and-pattern lookup and a tier-aware
//! candidate ranking. The index is read-only after construction and can be
//! shared freely between generation attempts.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

use float_ord::FloatOrd;
use smallvec::SmallVec;
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::types::{letter_from_char, Difficulty, GlobalWordId, Letter};
use crate::MAX_WORD_LENGTH;

/// Given a raw surface form, produce the normalized uppercase A-Z string used
/// everywhere in the engine. Diacritics are folded to their base letter
/// (ă/â -> A, î -> I, ș -> S, ț -> T and so on); a surface containing
/// anything that doesn't fold to A-Z is rejected.
#[must_use]
pub fn normalize_word(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.nfd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_ascii_alphabetic() {
            out.push(ch.to_ascii_uppercase());
        } else {
            return None;
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("can't read dictionary file: {0}")]
    InvalidPath(String),

    #[error("dictionary is missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("dictionary contains no usable entries")]
    Empty,
}

/// A per-row problem recorded during loading. Rows with problems are skipped
/// rather than failing the whole load; collection stops after a cap.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub reason: String,
}

const MAX_ROW_ERRORS: usize = 100;

/// An entry handed to the in-memory source.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub surface: String,
    pub frequency: f32,
    pub is_compound: bool,
    pub is_stopword: bool,
    pub difficulty_score: Option<f32>,
}

impl RawEntry {
    /// Convenience constructor for tests and programmatic word lists.
    #[must_use]
    pub fn new(surface: &str, frequency: f32, difficulty_score: f32) -> RawEntry {
        RawEntry {
            surface: surface.to_string(),
            frequency,
            is_compound: false,
            is_stopword: false,
            difficulty_score: Some(difficulty_score),
        }
    }
}

/// Where the dictionary content comes from.
pub enum DictionarySource {
    /// A tab-separated file with a header row.
    File(PathBuf),
    /// The same format, already in memory.
    Contents(&'static str),
    /// Programmatic entries, bypassing the TSV layer.
    Memory(Vec<RawEntry>),
}

/// A single indexed word.
#[derive(Debug, Clone)]
pub struct WordEntry {
    /// Normalized uppercase A-Z surface.
    pub surface: String,
    /// The surface decoded to letter ids.
    pub letters: SmallVec<[Letter; MAX_WORD_LENGTH]>,
    pub frequency: f32,
    pub difficulty_score: f32,
    pub is_compound: bool,
    pub is_stopword: bool,
}

impl WordEntry {
    #[must_use]
    pub fn len(&self) -> usize {
        self.letters.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.letters.is_empty()
    }

    /// Rank this entry for the given difficulty tier. Base quality comes from
    /// frequency with penalties for compounds and stopwords; affinity rewards
    /// closeness to the tier center; the direction term keeps off-tier words
    /// ordered correctly (EASY prefers lower scores, HARD higher).
    #[must_use]
    pub fn score(&self, tier: Difficulty) -> f32 {
        let mut base = self.frequency;
        if self.is_compound {
            base -= 0.15;
        }
        if self.is_stopword {
            base -= 0.30;
        }
        let base = base.clamp(0.0, 1.0);

        let affinity = (1.0 - 3.5 * (self.difficulty_score - tier.center()).abs()).max(0.0);

        let direction = match tier {
            Difficulty::Easy => 1.0 - self.difficulty_score,
            Difficulty::Hard => self.difficulty_score,
            Difficulty::Medium => 0.5,
        };

        0.15 * base + 0.55 * affinity + 0.30 * direction
    }
}

struct Accumulated {
    frequency: f32,
    difficulty_score: Option<f32>,
    is_compound: bool,
    is_stopword: bool,
}

/// The dictionary index: words bucketed by length with a positional letter
/// index for pattern queries.
pub struct Dictionary {
    /// All loaded words, bucketed by length; `words[n]` holds the words of
    /// length `n`, so the first two buckets are always empty.
    words: Vec<Vec<WordEntry>>,

    /// Map from a normalized surface to the id of the entry representing it.
    id_by_surface: HashMap<String, GlobalWordId>,

    /// For `(length, position, letter)`, the sorted ids of words of that
    /// length carrying that letter at that position.
    position_index: HashMap<(usize, usize, Letter), Vec<usize>>,

    row_errors: Vec<RowError>,
}

impl Dictionary {
    pub fn load(source: DictionarySource) -> Result<Dictionary, LoadError> {
        let mut row_errors = Vec::new();
        let raw_entries = match source {
            DictionarySource::File(path) => {
                let contents = fs::read_to_string(&path)
                    .map_err(|_| LoadError::InvalidPath(path.to_string_lossy().into()))?;
                parse_tsv(&contents, &mut row_errors)?
            }
            DictionarySource::Contents(contents) => parse_tsv(contents, &mut row_errors)?,
            DictionarySource::Memory(entries) => entries,
        };

        let mut accumulated: HashMap<String, Accumulated> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for raw in raw_entries {
            let Some(surface) = normalize_word(&raw.surface) else {
                if row_errors.len() < MAX_ROW_ERRORS {
                    row_errors.push(RowError {
                        line: 0,
                        reason: format!("unnormalizable surface: {:?}", raw.surface),
                    });
                }
                continue;
            };
            if surface.len() < 2 || surface.len() > MAX_WORD_LENGTH {
                continue;
            }

            match accumulated.get_mut(&surface) {
                Some(existing) => {
                    // Inflected forms collapse into one record: keep the
                    // highest-frequency metadata and OR the flags.
                    if raw.frequency > existing.frequency {
                        existing.frequency = raw.frequency;
                        existing.difficulty_score = raw.difficulty_score;
                    }
                    existing.is_compound |= raw.is_compound;
                    existing.is_stopword |= raw.is_stopword;
                }
                None => {
                    order.push(surface.clone());
                    accumulated.insert(
                        surface,
                        Accumulated {
                            frequency: raw.frequency,
                            difficulty_score: raw.difficulty_score,
                            is_compound: raw.is_compound,
                            is_stopword: raw.is_stopword,
                        },
                    );
                }
            }
        }

        let mut dictionary = Dictionary {
            words: vec![Vec::new(); MAX_WORD_LENGTH + 1],
            id_by_surface: HashMap::new(),
            position_index: HashMap::new(),
            row_errors,
        };

        for surface in order {
            let acc = &accumulated[&surface];
            let letters: SmallVec<[Letter; MAX_WORD_LENGTH]> = surface
                .chars()
                .map(|ch| letter_from_char(ch).expect("normalized surface is A-Z"))
                .collect();
            let length = letters.len();
            let word_id = dictionary.words[length].len();

            for (position, &letter) in letters.iter().enumerate() {
                dictionary
                    .position_index
                    .entry((length, position, letter))
                    .or_default()
                    .push(word_id);
            }

            dictionary
                .id_by_surface
                .insert(surface.clone(), (length, word_id));
            dictionary.words[length].push(WordEntry {
                surface,
                letters,
                frequency: acc.frequency,
                difficulty_score: acc
                    .difficulty_score
                    .unwrap_or(1.0 - acc.frequency)
                    .clamp(0.0, 1.0),
                is_compound: acc.is_compound,
                is_stopword: acc.is_stopword,
            });
        }

        if dictionary.id_by_surface.is_empty() {
            return Err(LoadError::Empty);
        }

        Ok(dictionary)
    }

    /// Problems skipped during loading, capped at a fixed count.
    #[must_use]
    pub fn row_errors(&self) -> &[RowError] {
        &self.row_errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.id_by_surface.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id_by_surface.is_empty()
    }

    /// All words of the given length, in load order.
    #[must_use]
    pub fn bucket(&self, length: usize) -> &[WordEntry] {
        self.words.get(length).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn entry(&self, id: GlobalWordId) -> &WordEntry {
        &self.words[id.0][id.1]
    }

    /// Is the (normalizable) word present?
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.lookup_by_surface(word).is_some()
    }

    #[must_use]
    pub fn lookup_by_surface(&self, word: &str) -> Option<&WordEntry> {
        let surface = normalize_word(word)?;
        self.id_by_surface.get(&surface).map(|&id| self.entry(id))
    }

    /// Word ids of the given length matching every `(position, letter)`
    /// constraint, in id order. An empty constraint list matches the whole
    /// bucket.
    fn matching_ids(&self, length: usize, fixed: &[(usize, Letter)]) -> Vec<usize> {
        debug_assert!(
            fixed.iter().all(|&(position, _)| position < length),
            "pattern position out of range for length {length}"
        );

        if fixed.is_empty() {
            return (0..self.bucket(length).len()).collect();
        }

        // Start from the scarcest position set and verify the rest directly
        // against the stored letters.
        let mut seed: Option<&Vec<usize>> = None;
        for &(position, letter) in fixed {
            match self.position_index.get(&(length, position, letter)) {
                None => return Vec::new(),
                Some(ids) => {
                    if seed.map_or(true, |best| ids.len() < best.len()) {
                        seed = Some(ids);
                    }
                }
            }
        }

        let bucket = self.bucket(length);
        seed.expect("at least one constraint")
            .iter()
            .copied()
            .filter(|&id| {
                fixed
                    .iter()
                    .all(|&(position, letter)| bucket[id].letters[position] == letter)
            })
            .collect()
    }

    /// Every entry of the given length matching the pattern and not banned,
    /// ordered by non-increasing tier score (ties broken by surface).
    #[must_use]
    pub fn candidates(
        &self,
        length: usize,
        fixed: &[(usize, Letter)],
        banned: &HashSet<String>,
        tier: Difficulty,
    ) -> Vec<&WordEntry> {
        let bucket = self.bucket(length);
        let mut matches: Vec<&WordEntry> = self
            .matching_ids(length, fixed)
            .into_iter()
            .map(|id| &bucket[id])
            .filter(|entry| !banned.contains(&entry.surface))
            .collect();

        matches.sort_by(|a, b| {
            FloatOrd(b.score(tier))
                .cmp(&FloatOrd(a.score(tier)))
                .then_with(|| a.surface.cmp(&b.surface))
        });
        matches
    }

    /// `candidates` with a strict upper bound on difficulty score.
    #[must_use]
    pub fn candidates_filtered(
        &self,
        length: usize,
        fixed: &[(usize, Letter)],
        banned: &HashSet<String>,
        tier: Difficulty,
        max_difficulty: f32,
    ) -> Vec<&WordEntry> {
        let mut matches = self.candidates(length, fixed, banned, tier);
        matches.retain(|entry| entry.difficulty_score < max_difficulty);
        matches
    }

    /// Fast existence check used by crossing-feasibility probes.
    #[must_use]
    pub fn has_candidates(
        &self,
        length: usize,
        fixed: &[(usize, Letter)],
        banned: &HashSet<String>,
    ) -> bool {
        let bucket = self.bucket(length);
        self.matching_ids(length, fixed)
            .into_iter()
            .any(|id| !banned.contains(&bucket[id].surface))
    }

    #[must_use]
    pub fn count_candidates(
        &self,
        length: usize,
        fixed: &[(usize, Letter)],
        banned: &HashSet<String>,
    ) -> usize {
        let bucket = self.bucket(length);
        self.matching_ids(length, fixed)
            .into_iter()
            .filter(|&id| !banned.contains(&bucket[id].surface))
            .count()
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

fn parse_tsv(contents: &str, row_errors: &mut Vec<RowError>) -> Result<Vec<RawEntry>, LoadError> {
    let mut lines = contents.lines().enumerate();
    let Some((_, header)) = lines.next() else {
        return Err(LoadError::Empty);
    };

    let columns: Vec<&str> = header.split('\t').map(str::trim).collect();
    let find = |name: &str| columns.iter().position(|&col| col == name);

    let surface_col = find("surface").ok_or(LoadError::MissingColumn("surface"))?;
    let frequency_col = find("frequency").ok_or(LoadError::MissingColumn("frequency"))?;
    let compound_col = find("is_compound");
    let stopword_col = find("is_stopword");
    let adult_col = find("is_adult");
    // Older dictionary files predate the difficulty column; its absence is
    // handled downstream by synthesizing 1 - frequency.
    let difficulty_col = find("difficulty_score");

    let mut entries = Vec::new();
    for (line_idx, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();

        let field = |col: Option<usize>| col.and_then(|c| fields.get(c)).map(|s| s.trim());
        let Some(surface) = field(Some(surface_col)).filter(|s| !s.is_empty()) else {
            if row_errors.len() < MAX_ROW_ERRORS {
                row_errors.push(RowError {
                    line: line_idx + 1,
                    reason: "missing surface".into(),
                });
            }
            continue;
        };

        if field(adult_col).map_or(false, parse_bool) {
            continue;
        }

        let frequency = field(Some(frequency_col))
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        entries.push(RawEntry {
            surface: surface.to_string(),
            frequency,
            is_compound: field(compound_col).map_or(false, parse_bool),
            is_stopword: field(stopword_col).map_or(false, parse_bool),
            difficulty_score: field(difficulty_col).and_then(|s| s.parse::<f32>().ok()),
        });
    }

    Ok(entries)
}
