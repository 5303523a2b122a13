//! Theme-word and clue-text capabilities. The engine consumes an ordered list
//! of theme entries and, after filling, asks a clue emitter for text; both
//! seams are traits so sourcing (static table, LLM, user list) varies without
//! touching the core.

use std::collections::HashMap;

use lazy_static::lazy_static;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::types::{Difficulty, Direction, SlotId};

/// Where a slot's word came from.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    /// Supplied directly by the user; crossing feasibility checks are skipped
    /// for these.
    User,
    /// The built-in static bucket table.
    Dummy,
    /// An LLM-backed provider.
    Gemini,
    /// Chosen by the fill solver.
    Fill,
}

/// A word offered to the generator before layout, with an optional
/// pre-assigned clue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeEntry {
    pub word: String,
    pub clue: Option<String>,
    pub source: SourceTag,
}

impl ThemeEntry {
    #[must_use]
    pub fn user(word: &str) -> ThemeEntry {
        ThemeEntry {
            word: word.to_string(),
            clue: None,
            source: SourceTag::User,
        }
    }
}

/// Produces an ordered list of theme entries for one generation attempt.
pub trait ThemeProvider {
    fn theme_entries(&mut self, limit: usize) -> Vec<ThemeEntry>;
}

/// Provider with no entries; the grid is filled from the dictionary alone.
pub struct EmptyThemeProvider;

impl ThemeProvider for EmptyThemeProvider {
    fn theme_entries(&mut self, _limit: usize) -> Vec<ThemeEntry> {
        Vec::new()
    }
}

/// Passes through a user-supplied word list in order.
pub struct UserListProvider {
    entries: Vec<ThemeEntry>,
}

impl UserListProvider {
    #[must_use]
    pub fn new(words: &[String]) -> UserListProvider {
        UserListProvider {
            entries: words.iter().map(|w| ThemeEntry::user(w)).collect(),
        }
    }

    #[must_use]
    pub fn from_entries(entries: Vec<ThemeEntry>) -> UserListProvider {
        UserListProvider { entries }
    }
}

impl ThemeProvider for UserListProvider {
    fn theme_entries(&mut self, limit: usize) -> Vec<ThemeEntry> {
        self.entries.iter().take(limit).cloned().collect()
    }
}

lazy_static! {
    /// Placeholder theme vocabulary, tiered by difficulty.
    static ref THEME_BUCKETS: HashMap<&'static str, HashMap<Difficulty, Vec<&'static str>>> = {
        let mut buckets = HashMap::new();

        let mut mitologie = HashMap::new();
        mitologie.insert(Difficulty::Easy, vec![
            "APOLON", "ARES", "ATHENA", "HERA", "IRIS", "HERMES", "ODIN", "THOR",
            "DIANA", "EROS", "AURORA", "TITAN", "ATLAS", "PAN", "ZEUS", "POSEIDON",
            "ISIS", "RA",
        ]);
        mitologie.insert(Difficulty::Medium, vec![
            "ANUBIS", "FREIA", "MINERVA", "CERES", "NEMESIS", "HELIOS", "SIRENA",
            "FAUN", "OSIRIS", "DEMETER", "JANUS", "BALDER", "TETHYS",
        ]);
        mitologie.insert(Difficulty::Hard, vec![
            "HESTIA", "SATIR", "EOL", "MORPHEU", "ORACOL", "NEREIDA", "LIBER",
            "CHARON", "ERINIE", "HYPERION", "PROTEU",
        ]);
        buckets.insert("mitologie", mitologie);

        let mut istorie = HashMap::new();
        istorie.insert(Difficulty::Easy, vec![
            "REGAT", "ARMATA", "REGE", "PATRIA", "SENAT", "FORT", "OPERA", "PACT",
            "COLONIE", "CRONICA", "STEAG", "SCUT", "HARTA", "CRUCE",
        ]);
        istorie.insert(Difficulty::Medium, vec![
            "LEGIE", "TRON", "VOIEVOD", "ARHIVA", "ARMURA", "CANON", "DOMNIE",
            "TRIBUT", "LEGAT", "TABELA", "DINASTIE", "HERALD",
        ]);
        istorie.insert(Difficulty::Hard, vec![
            "CRONIC", "CASTRA", "ARCA", "DICTUM", "RELICVA", "PORTIC", "CRONICAR",
            "EDICT", "SIGILIU", "PAPIRUS", "TRIREMA",
        ]);
        buckets.insert("istorie", istorie);

        let mut natura = HashMap::new();
        natura.insert(Difficulty::Easy, vec![
            "MUNTE", "BRAD", "LUP", "CERB", "PLOAIE", "CAMP", "IARBA", "PAMANT",
            "OCEAN", "DELTA", "FRUNZA", "LAC", "NISIP", "VANT",
        ]);
        natura.insert(Difficulty::Medium, vec![
            "CODRU", "IZVOR", "STANCA", "LUNCA", "PODIS", "OGOR", "APUS",
            "CASCADA", "FAG", "DESERT", "GROTA", "PENINSULA",
        ]);
        natura.insert(Difficulty::Hard, vec![
            "VALURI", "ALBIA", "MOLID", "TRESTIE", "ARIN", "GORUN", "ESTUAR",
            "ZADA", "LIMAN",
        ]);
        buckets.insert("natura", natura);

        buckets
    };

    static ref FALLBACK_BUCKET: HashMap<Difficulty, Vec<&'static str>> = {
        let mut bucket = HashMap::new();
        bucket.insert(Difficulty::Easy, vec![
            "ROMA", "DUNARE", "SOLAR", "VIATA", "LUMEA", "PIATA", "PORT", "CETATE",
        ]);
        bucket.insert(Difficulty::Medium, vec![
            "CARPA", "RITUAL", "LEGAT", "CLIPA", "CAMPIE", "RAZBOI", "ACORD",
        ]);
        bucket.insert(Difficulty::Hard, vec!["PATRU", "POD", "CLASA", "COLINA"]);
        bucket
    };
}

/// Serves placeholder theme words from the static buckets, preferring the
/// requested tier and shuffling with its own seeded RNG.
pub struct StaticBucketProvider {
    theme: String,
    difficulty: Difficulty,
    rng: SmallRng,
}

impl StaticBucketProvider {
    #[must_use]
    pub fn new(theme: &str, difficulty: Difficulty, seed: u64) -> StaticBucketProvider {
        StaticBucketProvider {
            theme: theme.trim().to_lowercase(),
            difficulty,
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl ThemeProvider for StaticBucketProvider {
    fn theme_entries(&mut self, limit: usize) -> Vec<ThemeEntry> {
        let bucket = THEME_BUCKETS
            .get(self.theme.as_str())
            .unwrap_or(&FALLBACK_BUCKET);

        let mut on_tier: Vec<&str> = bucket
            .get(&self.difficulty)
            .map(|words| words.clone())
            .unwrap_or_default();
        let mut off_tier: Vec<&str> = Vec::new();
        for tier in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
            if tier != self.difficulty {
                if let Some(words) = bucket.get(&tier) {
                    off_tier.extend(words.iter().copied());
                }
            }
        }

        on_tier.shuffle(&mut self.rng);
        off_tier.shuffle(&mut self.rng);

        on_tier
            .into_iter()
            .chain(off_tier)
            .take(limit)
            .map(|word| ThemeEntry {
                word: word.to_string(),
                clue: Some(format!("Rezerva {}: {}", self.theme, word.to_lowercase())),
                source: SourceTag::Dummy,
            })
            .collect()
    }
}

/// One slot needing clue text after the fill.
#[derive(Debug, Clone)]
pub struct ClueRequest {
    pub slot_id: SlotId,
    pub word: String,
    pub direction: Direction,
}

/// Returns clue text per slot id; the engine attaches whatever comes back
/// without inspection.
pub trait ClueEmitter {
    fn emit(&self, requests: &[ClueRequest]) -> HashMap<SlotId, String>;
}

/// Fallback clue writer: the word plus a direction marker.
pub struct TemplateClueEmitter;

impl ClueEmitter for TemplateClueEmitter {
    fn emit(&self, requests: &[ClueRequest]) -> HashMap<SlotId, String> {
        requests
            .iter()
            .map(|request| {
                let mut chars = request.word.chars();
                let pretty: String = chars
                    .next()
                    .map(|first| first.to_string() + &chars.as_str().to_lowercase())
                    .unwrap_or_default();
                let marker = match request.direction {
                    Direction::Across => "oriz.",
                    Direction::Down => "vert.",
                };
                (request.slot_id, format!("{pretty} ({marker})"))
            })
            .collect()
    }
}
