//! Fill-scoped word store. Candidate surfaces from the dictionary, generated
//! two-letter combinations and pre-placed theme words are interned into
//! per-length buckets so the solver can work with dense integer ids.

use std::collections::HashMap;

use smallvec::SmallVec;

use crate::types::{GlobalWordId, Letter};
use crate::MAX_SLOT_LENGTH;

#[derive(Debug, Clone)]
pub(crate) struct FillWord {
    pub surface: String,
    pub letters: SmallVec<[Letter; MAX_SLOT_LENGTH]>,
    /// Tier score at model-build time, used when ordering slot options;
    /// neutral for generated two-letter combinations and theme surfaces.
    pub score: f32,
}

pub(crate) struct Lexicon {
    /// Words bucketed by length; ids are indices into the bucket.
    pub words: Vec<Vec<FillWord>>,
    id_by_surface: HashMap<String, GlobalWordId>,
}

impl Lexicon {
    #[must_use]
    pub fn new(max_length: usize) -> Lexicon {
        Lexicon {
            words: vec![Vec::new(); max_length + 1],
            id_by_surface: HashMap::new(),
        }
    }

    /// Intern a surface, returning the existing id when it's already present.
    pub fn intern(&mut self, surface: &str, letters: &[Letter], score: f32) -> GlobalWordId {
        if let Some(&id) = self.id_by_surface.get(surface) {
            return id;
        }
        let length = letters.len();
        let word_id = self.words[length].len();
        self.words[length].push(FillWord {
            surface: surface.to_string(),
            letters: SmallVec::from_slice(letters),
            score,
        });
        self.id_by_surface.insert(surface.to_string(), (length, word_id));
        (length, word_id)
    }

    #[must_use]
    pub fn bucket_len(&self, length: usize) -> usize {
        self.words.get(length).map_or(0, Vec::len)
    }
}
