//! Backtracking search over the fill model, following the adaptive-strategy
//! playbook: arc consistency after every decision, `dom/wdeg` variable
//! ordering with adaptive branching, weighted-random candidate choice, and a
//! growing backtrack cap handled by the caller's restart loop.

use float_ord::FloatOrd;
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use std::time::Instant;

use crate::types::{SlotId, WordId};

use super::propagation::{letter_counts, maintain, LetterCounts, Mode};
use super::FillModel;

/// If the previously-attempted slot is within this distance of the best
/// (lowest-priority-value) slot, stick with the previous one.
pub(crate) const ADAPTIVE_BRANCHING_THRESHOLD: f32 = 0.15;

/// How many search states pass between deadline checks.
pub(crate) const INTERRUPT_FREQUENCY: usize = 16;

/// How the highest-ranked slots are weighted when choosing what to fill next.
pub(crate) const RANDOM_SLOT_WEIGHTS: [u8; 3] = [4, 2, 1];

/// How the highest-ranked words are weighted when choosing a candidate.
pub(crate) const RANDOM_WORD_WEIGHTS: [u8; 3] = [4, 2, 1];

/// A slot assignment made during the fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Choice {
    pub slot: SlotId,
    pub word: WordId,
}

#[derive(Debug)]
pub(crate) enum SearchFailure {
    /// Proven unsolvable; retrying with another seed cannot help.
    Unsat,
    Timeout,
    BacktrackLimit,
}

#[derive(Debug, Default, Clone)]
#[allow(dead_code)]
pub(crate) struct SearchStatistics {
    pub states: usize,
    pub backtracks: usize,
    pub restricted_branchings: usize,
}

/// Live per-slot state during a fill attempt.
#[derive(Clone)]
pub(crate) struct SlotState {
    pub id: SlotId,
    pub length: usize,

    /// Which options have been eliminated, indexed by `WordId`:
    /// `Some(Some(id))` means "eliminated because of the choice in slot
    /// `id`", `Some(None)` means "eliminated unconditionally", `None` means
    /// "still available (or never an option)".
    #[allow(clippy::option_option)]
    pub eliminations: Vec<Option<Option<SlotId>>>,

    /// For each cell, how many remaining options carry each letter there.
    pub counts: LetterCounts,

    pub remaining: usize,

    /// The word explicitly chosen for this slot, shadowing `eliminations`
    /// and `counts` which keep their pre-choice values for cheap undo.
    pub fixed_word: Option<WordId>,
    pub fixed_counts: Option<LetterCounts>,
}

impl SlotState {
    pub fn add_elimination(&mut self, model: &FillModel, word_id: WordId, blamed: Option<SlotId>) {
        #[cfg(feature = "check_invariants")]
        assert!(
            self.fixed_word.is_none() && self.fixed_counts.is_none(),
            "editing eliminations for a fixed slot"
        );

        self.eliminations[word_id] = Some(blamed);
        self.remaining -= 1;

        let word = &model.lexicon.words[self.length][word_id];
        for (cell, &letter) in word.letters.iter().enumerate() {
            self.counts[cell][letter as usize] -= 1;
        }
    }

    pub fn remove_elimination(&mut self, model: &FillModel, word_id: WordId) {
        #[cfg(feature = "check_invariants")]
        assert!(
            self.fixed_word.is_none() && self.fixed_counts.is_none(),
            "editing eliminations for a fixed slot"
        );

        self.eliminations[word_id] = None;
        self.remaining += 1;

        let word = &model.lexicon.words[self.length][word_id];
        for (cell, &letter) in word.letters.iter().enumerate() {
            self.counts[cell][letter as usize] += 1;
        }
    }

    /// Remove all eliminations blamed on the last choice in the given slot.
    pub fn clear_blamed(&mut self, model: &FillModel, slot_id: SlotId) {
        for word_id in 0..self.eliminations.len() {
            if self.eliminations[word_id] == Some(Some(slot_id)) {
                self.remove_elimination(model, word_id);
            }
        }
    }

    pub fn choose(&mut self, model: &FillModel, word_id: WordId) {
        self.fixed_word = Some(word_id);
        self.fixed_counts = Some(letter_counts(&model.lexicon, self.length, &[word_id]));
    }

    /// Undo a choice. Backtracking is strictly linear, so the shadowed
    /// eliminations and counts are still correct.
    pub fn clear_choice(&mut self) {
        self.fixed_word = None;
        self.fixed_counts = None;
    }

    /// The single remaining word, whether chosen explicitly or implied by
    /// propagation.
    pub fn single_choice(&self, model: &FillModel) -> Option<Choice> {
        self.fixed_word
            .map(|word| Choice {
                slot: self.id,
                word,
            })
            .or_else(|| {
                if self.remaining == 1 {
                    model.options[self.id]
                        .iter()
                        .copied()
                        .find(|&word| self.eliminations[word].is_none())
                        .map(|word| Choice {
                            slot: self.id,
                            word,
                        })
                } else {
                    None
                }
            })
    }
}

/// The `wdeg` weight of a slot: the summed weights of its crossings into
/// still-undetermined slots.
fn slot_weight(
    model: &FillModel,
    states: &[SlotState],
    crossing_weights: &[f32],
    slot_id: SlotId,
) -> f32 {
    model.slots[slot_id]
        .crossings
        .iter()
        .map(|crossing| match crossing {
            Some(crossing)
                if states[crossing.other_slot].fixed_word.is_none()
                    && states[crossing.other_slot].remaining > 1 =>
            {
                crossing_weights[crossing.crossing_id]
            }
            _ => 0.0,
        })
        .sum()
}

pub(crate) fn slot_weights(
    model: &FillModel,
    states: &[SlotState],
    crossing_weights: &[f32],
) -> Vec<f32> {
    (0..states.len())
        .map(|slot_id| slot_weight(model, states, crossing_weights, slot_id))
        .collect()
}

/// `dom/wdeg` priority; lower is a better candidate to fill next.
fn slot_priority(states: &[SlotState], weights: &[f32], slot_id: SlotId) -> f32 {
    states[slot_id].remaining as f32 / weights[slot_id]
}

fn choose_next_slot(
    states: &[SlotState],
    weights: &[f32],
    last_slot: Option<SlotId>,
    rng: &mut SmallRng,
    dist: &WeightedIndex<u8>,
    statistics: &mut SearchStatistics,
) -> Option<SlotId> {
    let mut best_priority: Option<f32> = None;
    let mut last_priority: Option<f32> = None;

    let mut open: Vec<SlotId> = (0..states.len())
        .filter(|&slot_id| states[slot_id].fixed_word.is_none() && states[slot_id].remaining > 1)
        .collect();

    if open.is_empty() {
        return None;
    }

    open.sort_by_cached_key(|&slot_id| {
        let priority = slot_priority(states, weights, slot_id);
        if best_priority.map_or(true, |best| best > priority) {
            best_priority = Some(priority);
        }
        if last_slot == Some(slot_id) {
            last_priority = Some(priority);
        }
        FloatOrd(priority)
    });

    // Stay on the previous slot when the best alternative is barely better.
    if let (Some(best), Some(last_slot), Some(last)) = (best_priority, last_slot, last_priority) {
        if last - best < ADAPTIVE_BRANCHING_THRESHOLD {
            statistics.restricted_branchings += 1;
            return Some(last_slot);
        }
    }

    Some(open[dist.sample(rng).min(open.len() - 1)])
}

/// Search for a complete assignment, bounded by the deadline and the
/// backtrack cap. Crossing weights persist across calls so later seeds learn
/// from earlier wipeouts.
pub(crate) fn search(
    model: &FillModel,
    base: &[SlotState],
    crossing_weights: &mut [f32],
    deadline: Instant,
    max_backtracks: usize,
    rng_seed: u64,
) -> Result<(Vec<Choice>, SearchStatistics), SearchFailure> {
    let mut rng: SmallRng = SeedableRng::seed_from_u64(rng_seed);
    let mut statistics = SearchStatistics::default();
    let mut states: Vec<SlotState> = base.to_vec();

    let mut choices: Vec<Choice> = Vec::with_capacity(states.len());
    let mut last_slot: Option<SlotId> = None;
    let mut last_word_idx: Option<usize> = None;

    let slot_dist = WeightedIndex::new(RANDOM_SLOT_WEIGHTS).expect("static weights");
    let word_dist = WeightedIndex::new(RANDOM_WORD_WEIGHTS).expect("static weights");

    loop {
        statistics.states += 1;
        if statistics.states % INTERRUPT_FREQUENCY == 0 && Instant::now() > deadline {
            return Err(SearchFailure::Timeout);
        }

        let weights = slot_weights(model, &states, crossing_weights);
        let Some(slot_id) = choose_next_slot(
            &states,
            &weights,
            last_slot,
            &mut rng,
            &slot_dist,
            &mut statistics,
        ) else {
            // Nothing left to decide: every slot is fixed or down to one
            // option.
            let result = states
                .iter()
                .map(|state| {
                    state
                        .single_choice(model)
                        .expect("finished slot has a single choice")
                })
                .collect();
            return Ok((result, statistics));
        };

        // When staying on the same slot, resume from where we left off.
        let starting_idx = if last_slot == Some(slot_id) {
            last_word_idx.unwrap_or(0)
        } else {
            0
        };

        let word_candidates: Vec<(usize, WordId)> = model.options[slot_id]
            .iter()
            .copied()
            .enumerate()
            .skip(starting_idx)
            .filter(|&(_, word)| states[slot_id].eliminations[word].is_none())
            .take(RANDOM_WORD_WEIGHTS.len())
            .collect();

        assert!(
            !word_candidates.is_empty(),
            "no candidate available for an open slot"
        );

        let (_, word) = word_candidates[word_dist.sample(&mut rng).min(word_candidates.len() - 1)];
        last_slot = Some(slot_id);
        last_word_idx = Some(word_candidates[0].0);

        let choice = Choice {
            slot: slot_id,
            word,
        };

        if maintain(
            model,
            &mut states,
            crossing_weights,
            &weights,
            &Mode::Choice(choice),
        ) {
            choices.push(choice);
            continue;
        }

        // The choice wiped out a domain somewhere; rule it out instead, and
        // keep unwinding decisions until an elimination propagates cleanly.
        let mut undoing = choice;
        loop {
            statistics.backtracks += 1;

            if maintain(
                model,
                &mut states,
                crossing_weights,
                &weights,
                &Mode::Elimination(undoing, choices.last().map(|c| c.slot)),
            ) {
                break;
            }

            let Some(previous) = choices.pop() else {
                // Neither assigning nor forbidding the word works with no
                // prior decisions: the model is unsolvable.
                return Err(SearchFailure::Unsat);
            };
            undoing = previous;

            states[undoing.slot].clear_choice();
            for state in &mut states {
                if state.id != undoing.slot && state.fixed_word.is_none() {
                    state.clear_blamed(model, undoing.slot);
                }
            }

            if statistics.backtracks > max_backtracks {
                return Err(SearchFailure::BacktrackLimit);
            }

            last_slot = None;
            last_word_idx = None;
        }
    }
}
