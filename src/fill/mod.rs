//! Constraint-satisfaction fill: one variable per letter cell with an A-Z
//! domain, per-slot allowed-word lists, crossing agreement, and pairwise
//! uniqueness between same-length slots. Solved with arc-consistency
//! propagation and a backtracking search portfolio running one seed per
//! worker under a shared deadline; rounds are joined before a winner is
//! picked, so equal seeds give equal fills regardless of thread timing.

mod lexicon;
mod propagation;
mod search;

use std::collections::{HashMap, HashSet};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::dictionary::Dictionary;
use crate::error::Error;
use crate::grid::{Grid, Slot};
use crate::types::{letter_to_char, letters_of, Difficulty, GridCoord, Letter, SlotId, WordId, ALPHABET};

use lexicon::Lexicon;
use propagation::{letter_counts, maintain, Mode};
use search::{search, slot_weights, Choice, SearchFailure, SearchStatistics, SlotState};

/// Starting backtrack cap for each search seed; grown on every exhausted
/// round.
const INITIAL_BACKTRACK_LIMIT: usize = 500;
const RETRY_GROWTH_FACTOR: f32 = 1.1;

/// A crossing between two slots at one shared cell.
#[derive(Debug, Clone)]
pub(crate) struct Crossing {
    pub other_slot: SlotId,
    pub other_cell: usize,
    pub crossing_id: usize,
}

/// Static per-slot data for the model.
#[derive(Debug, Clone)]
pub(crate) struct SlotModel {
    pub id: SlotId,
    pub length: usize,
    pub crossings: Vec<Option<Crossing>>,
}

pub(crate) struct FillModel {
    pub lexicon: Lexicon,
    pub slots: Vec<SlotModel>,
    pub options: Vec<Vec<WordId>>,
    pub fixed: Vec<Option<WordId>>,
    pub crossing_count: usize,
}

/// Solver inputs beyond the frozen grid and slot set.
#[derive(Debug, Clone)]
pub struct FillParams {
    pub tier: Difficulty,
    /// Strict upper bound on candidate difficulty scores, when set.
    pub max_difficulty: Option<f32>,
    /// How many slots may fall back to the unfiltered candidate list when
    /// their filtered list is empty.
    pub relaxed_slot_limit: usize,
    pub timeout: Duration,
    pub workers: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Default)]
pub struct FillStatistics {
    pub rounds: usize,
    pub states: usize,
    pub backtracks: usize,
    pub slot_count: usize,
    /// Slots that used the unfiltered candidate list under a difficulty
    /// bound.
    pub relaxed_slots: usize,
}

pub struct FillOutcome {
    /// The chosen surface for every slot, in slot order.
    pub words: Vec<(SlotId, String)>,
    pub statistics: FillStatistics,
}

/// Fill every slot of the frozen layout. Returns `FillUnsat` when the model
/// is proven unsolvable (including strict-filter rejections) and
/// `FillTimeout` when the deadline expires first.
pub fn solve(
    grid: &Grid,
    slots: &[Slot],
    dictionary: &Dictionary,
    used_words: &HashSet<String>,
    params: &FillParams,
) -> Result<FillOutcome, Error> {
    if slots.is_empty() {
        return Ok(FillOutcome {
            words: Vec::new(),
            statistics: FillStatistics::default(),
        });
    }

    let deadline = Instant::now() + params.timeout;
    let (mut model, relaxed_slots) = build_model(grid, slots, dictionary, used_words, params)?;
    order_slot_options(&mut model);

    let mut statistics = FillStatistics {
        slot_count: slots.len(),
        relaxed_slots,
        ..FillStatistics::default()
    };

    let mut states = initial_states(&model);
    let mut crossing_weights: Vec<f32> = vec![1.0; model.crossing_count];

    // Establishing initial consistency also applies the uniqueness rule to
    // the pre-placed theme words. Failure here is a proof, not a timeout.
    let weights = slot_weights(&model, &states, &crossing_weights);
    if !maintain(
        &model,
        &mut states,
        &mut crossing_weights,
        &weights,
        &Mode::Initial,
    ) {
        return Err(Error::FillUnsat);
    }

    let mut max_backtracks = INITIAL_BACKTRACK_LIMIT;
    let mut round = 0usize;
    loop {
        if Instant::now() >= deadline {
            return Err(Error::FillTimeout);
        }

        let seeds: Vec<u64> = (0..params.workers.max(1))
            .map(|worker| params.seed.wrapping_add((round * params.workers.max(1) + worker) as u64))
            .collect();

        let outcomes: Vec<(Result<(Vec<Choice>, SearchStatistics), SearchFailure>, Vec<f32>)> =
            thread::scope(|scope| {
                let model_ref = &model;
                let states_ref = &states;
                let handles: Vec<_> = seeds
                    .iter()
                    .map(|&seed| {
                        let mut worker_weights = crossing_weights.clone();
                        scope.spawn(move || {
                            let result = search(
                                model_ref,
                                states_ref,
                                &mut worker_weights,
                                deadline,
                                max_backtracks,
                                seed,
                            );
                            (result, worker_weights)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().expect("search worker panicked"))
                    .collect()
            });

        // Decide in seed order so the outcome matches a sequential run.
        let mut learned_weights: Option<Vec<f32>> = None;
        for (result, worker_weights) in outcomes {
            if learned_weights.is_none() {
                learned_weights = Some(worker_weights);
            }
            match result {
                Ok((choices, search_statistics)) => {
                    statistics.rounds = round + 1;
                    statistics.states = search_statistics.states;
                    statistics.backtracks = search_statistics.backtracks;
                    info!(
                        "fill solved: {} slots, {} states, {} backtracks, round {}",
                        slots.len(),
                        statistics.states,
                        statistics.backtracks,
                        statistics.rounds
                    );
                    let words = choices
                        .into_iter()
                        .map(|choice| {
                            let length = model.slots[choice.slot].length;
                            (
                                choice.slot,
                                model.lexicon.words[length][choice.word].surface.clone(),
                            )
                        })
                        .collect();
                    return Ok(FillOutcome { words, statistics });
                }
                Err(SearchFailure::Timeout) => return Err(Error::FillTimeout),
                Err(SearchFailure::Unsat) => return Err(Error::FillUnsat),
                Err(SearchFailure::BacktrackLimit) => {}
            }
        }

        if let Some(weights) = learned_weights {
            crossing_weights = weights;
        }
        max_backtracks = (max_backtracks + 1)
            .max((max_backtracks as f32 * RETRY_GROWTH_FACTOR) as usize);
        round += 1;
    }
}

/// Build the lexicon, per-slot options and crossing structure. Returns the
/// number of slots that needed the relaxed fallback.
fn build_model(
    grid: &Grid,
    slots: &[Slot],
    dictionary: &Dictionary,
    used_words: &HashSet<String>,
    params: &FillParams,
) -> Result<(FillModel, usize), Error> {
    let max_length = slots.iter().map(|s| s.length).max().unwrap_or(0);
    let mut lexicon = Lexicon::new(max_length);
    let mut options: Vec<Vec<WordId>> = Vec::with_capacity(slots.len());
    let mut fixed: Vec<Option<WordId>> = Vec::with_capacity(slots.len());
    let mut relaxed_slots = 0usize;

    for slot in slots {
        let cells = slot.cells();
        let pattern = grid.fixed_letters(&cells);

        if pattern.len() == slot.length {
            // Pre-placed (theme) slot: a constant in the model.
            let surface = grid.read_word(&cells).expect("complete slot");
            let letters = letters_of(&surface).expect("grid letters are A-Z");
            let (_, word_id) = lexicon.intern(&surface, &letters, 0.0);
            options.push(vec![word_id]);
            fixed.push(Some(word_id));
            continue;
        }
        fixed.push(None);

        if slot.length == 2 {
            // Two-letter slots are free variables: any combination agreeing
            // with the crossings, as long as no string repeats.
            let choose = |cell: usize| -> Vec<Letter> {
                pattern
                    .iter()
                    .find(|&&(i, _)| i == cell)
                    .map_or_else(|| (0..ALPHABET as Letter).collect(), |&(_, l)| vec![l])
            };
            let mut ids = Vec::new();
            for &a in &choose(0) {
                for &b in &choose(1) {
                    let surface: String = [letter_to_char(a), letter_to_char(b)].iter().collect();
                    if used_words.contains(&surface) {
                        continue;
                    }
                    let (_, word_id) = lexicon.intern(&surface, &[a, b], 0.5);
                    ids.push(word_id);
                }
            }
            if ids.is_empty() {
                return Err(Error::FillUnsat);
            }
            options.push(ids);
            continue;
        }

        let candidates = match params.max_difficulty {
            Some(bound) => {
                let filtered = dictionary.candidates_filtered(
                    slot.length,
                    &pattern,
                    used_words,
                    params.tier,
                    bound,
                );
                if filtered.is_empty() {
                    relaxed_slots += 1;
                    if relaxed_slots > params.relaxed_slot_limit {
                        debug!(
                            "slot at {:?} has no candidates under {bound} and the relaxed budget is spent",
                            slot.start
                        );
                        return Err(Error::FillUnsat);
                    }
                    dictionary.candidates(slot.length, &pattern, used_words, params.tier)
                } else {
                    filtered
                }
            }
            None => dictionary.candidates(slot.length, &pattern, used_words, params.tier),
        };
        if candidates.is_empty() {
            return Err(Error::FillUnsat);
        }
        let ids = candidates
            .iter()
            .map(|entry| {
                lexicon
                    .intern(&entry.surface, &entry.letters, entry.score(params.tier))
                    .1
            })
            .collect();
        options.push(ids);
    }

    // Crossings: map each coordinate to the (slot, cell) pairs through it.
    let mut by_coord: HashMap<GridCoord, Vec<(SlotId, usize)>> = HashMap::new();
    for (slot_id, slot) in slots.iter().enumerate() {
        for (cell_idx, coord) in slot.cells().into_iter().enumerate() {
            by_coord.entry(coord).or_default().push((slot_id, cell_idx));
        }
    }

    // Crossing ids are shared between the two slots that meet in a cell; the
    // cache lets the second visitor reuse the first one's id.
    let mut crossing_id_cache: Vec<(SlotId, SlotId)> = Vec::new();
    let slot_models: Vec<SlotModel> = slots
        .iter()
        .enumerate()
        .map(|(slot_id, slot)| {
            let crossings = slot
                .cells()
                .iter()
                .map(|coord| {
                    let others: Vec<_> = by_coord[coord]
                        .iter()
                        .filter(|&&(other, _)| other != slot_id)
                        .collect();
                    match others.as_slice() {
                        [] => None,
                        [&(other_slot, other_cell)] => {
                            let crossing_id = crossing_id_cache
                                .iter()
                                .position(|&pair| pair == (slot_id, other_slot))
                                .unwrap_or_else(|| {
                                    crossing_id_cache.push((other_slot, slot_id));
                                    crossing_id_cache.len() - 1
                                });
                            Some(Crossing {
                                other_slot,
                                other_cell,
                                crossing_id,
                            })
                        }
                        _ => unreachable!("more than two slots crossing in one cell"),
                    }
                })
                .collect();
            SlotModel {
                id: slot_id,
                length: slot.length,
                crossings,
            }
        })
        .collect();

    let crossing_count = crossing_id_cache.len();
    Ok((
        FillModel {
            lexicon,
            slots: slot_models,
            options,
            fixed,
            crossing_count,
        },
        relaxed_slots,
    ))
}

/// Reorder each slot's options so the most promising words come first: a
/// balance of fillability (how many crossing options stay compatible with
/// each letter) and tier score.
fn order_slot_options(model: &mut FillModel) {
    let counts_by_slot: Vec<_> = model
        .slots
        .iter()
        .map(|slot| letter_counts(&model.lexicon, slot.length, &model.options[slot.id]))
        .collect();

    let FillModel {
        ref lexicon,
        ref slots,
        ref mut options,
        ..
    } = *model;

    for slot in slots {
        let slot_options = &mut options[slot.id];
        slot_options.sort_by_cached_key(|&word_id| {
            let word = &lexicon.words[slot.length][word_id];

            // Average the logs of the compatible crossing-option counts;
            // the difference between 1 and 5 options matters much more than
            // between 100 and 500.
            let fill_score = slot
                .crossings
                .iter()
                .zip(&word.letters)
                .map(|(crossing, &letter)| match crossing {
                    Some(crossing) => {
                        let counts = &counts_by_slot[crossing.other_slot];
                        (counts[crossing.other_cell][letter as usize].max(1) as f32).log10()
                    }
                    None => 0.0,
                })
                .sum::<f32>()
                / slot.length as f32;

            -((fill_score * 900.0) as i64 + (word.score * 500.0) as i64)
        });
    }
}

fn initial_states(model: &FillModel) -> Vec<SlotState> {
    model
        .slots
        .iter()
        .map(|slot| {
            let counts = letter_counts(&model.lexicon, slot.length, &model.options[slot.id]);
            let fixed_word = model.fixed[slot.id];
            SlotState {
                id: slot.id,
                length: slot.length,
                eliminations: vec![None; model.lexicon.bucket_len(slot.length)],
                remaining: model.options[slot.id].len(),
                fixed_word,
                fixed_counts: fixed_word.map(|_| counts.clone()),
                counts,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::tests::{dense_dictionary, memory_dictionary};
    use crate::grid::Slot;
    use crate::types::Direction;

    fn params(tier: Difficulty, max_difficulty: Option<f32>, relaxed: usize) -> FillParams {
        FillParams {
            tier,
            max_difficulty,
            relaxed_slot_limit: relaxed,
            timeout: Duration::from_secs(20),
            workers: 2,
            seed: 1,
        }
    }

    fn word_square_slots() -> Vec<Slot> {
        let mut slots = Vec::new();
        for row in 0..3 {
            slots.push(Slot {
                id: slots.len(),
                start: (row, 0),
                direction: Direction::Across,
                length: 3,
            });
        }
        for col in 0..3 {
            slots.push(Slot {
                id: slots.len(),
                start: (0, col),
                direction: Direction::Down,
                length: 3,
            });
        }
        slots
    }

    fn apply_words(grid: &mut Grid, slots: &[Slot], words: &[(SlotId, String)]) {
        for &(slot_id, ref word) in words {
            let cells = slots[slot_id].cells();
            for (i, letter) in letters_of(word).expect("A-Z word").into_iter().enumerate() {
                grid.place_letter(cells[i].0, cells[i].1, letter)
                    .expect("crossings agree");
            }
        }
    }

    #[test]
    fn test_word_square_fill() {
        let dictionary = dense_dictionary(&['A', 'E', 'S'], 3..=3);
        let slots = word_square_slots();
        let mut grid = Grid::new(3, 3);
        let used = HashSet::new();

        let outcome = solve(
            &grid,
            &slots,
            &dictionary,
            &used,
            &params(Difficulty::Medium, None, 0),
        )
        .expect("square is fillable");

        assert_eq!(outcome.words.len(), 6);
        // Crossings agree (apply_words panics otherwise) and words are
        // pairwise distinct.
        apply_words(&mut grid, &slots, &outcome.words);
        let unique: HashSet<&String> = outcome.words.iter().map(|(_, w)| w).collect();
        assert_eq!(unique.len(), 6);
        for (_, word) in &outcome.words {
            assert!(dictionary.contains(word));
        }
    }

    #[test]
    fn test_fill_respects_theme_constants() {
        let dictionary = dense_dictionary(&['A', 'E', 'S'], 3..=3);
        let slots = word_square_slots();
        let mut grid = Grid::new(3, 3);
        // Pre-place the top row; the fill must keep it.
        for (i, letter) in letters_of("SEA").unwrap().into_iter().enumerate() {
            grid.place_letter(0, i, letter).unwrap();
        }
        let mut used = HashSet::new();
        used.insert("SEA".to_string());

        let outcome = solve(
            &grid,
            &slots,
            &dictionary,
            &used,
            &params(Difficulty::Medium, None, 0),
        )
        .expect("square with a constant row is fillable");

        let top = outcome
            .words
            .iter()
            .find(|&&(slot_id, _)| slot_id == 0)
            .expect("slot 0 present");
        assert_eq!(top.1, "SEA");
        // No other slot may repeat the constant.
        assert_eq!(
            outcome.words.iter().filter(|(_, w)| w == "SEA").count(),
            1
        );
    }

    #[test]
    fn test_unsat_when_uniqueness_is_impossible() {
        // Two disjoint 3-slots but only one 3-letter word to go around.
        let dictionary = memory_dictionary(&[("AAA", 0.5, 0.4)]);
        let slots = vec![
            Slot {
                id: 0,
                start: (0, 0),
                direction: Direction::Across,
                length: 3,
            },
            Slot {
                id: 1,
                start: (2, 0),
                direction: Direction::Across,
                length: 3,
            },
        ];
        let grid = Grid::new(3, 3);
        let used = HashSet::new();

        let result = solve(
            &grid,
            &slots,
            &dictionary,
            &used,
            &params(Difficulty::Medium, None, 0),
        );
        assert!(matches!(result, Err(Error::FillUnsat)));
    }

    #[test]
    fn test_strict_difficulty_bound_holds() {
        let dictionary = dense_dictionary(&['A', 'E', 'S'], 3..=3);
        let slots = word_square_slots();
        let grid = Grid::new(3, 3);
        let used = HashSet::new();

        let outcome = solve(
            &grid,
            &slots,
            &dictionary,
            &used,
            &params(Difficulty::Easy, Some(0.30), 0),
        )
        .expect("easy square is fillable");

        for (_, word) in &outcome.words {
            let entry = dictionary.lookup_by_surface(word).expect("dictionary word");
            assert!(
                entry.difficulty_score < 0.30,
                "{word} has difficulty {}",
                entry.difficulty_score
            );
        }
        assert_eq!(outcome.statistics.relaxed_slots, 0);
    }

    #[test]
    fn test_relaxed_slot_budget() {
        // Every 3-letter word is hard, so a strict bound finds nothing.
        let dictionary = memory_dictionary(&[
            ("AAE", 0.5, 0.8),
            ("AEA", 0.5, 0.8),
            ("EAA", 0.5, 0.8),
            ("AEE", 0.5, 0.8),
            ("EAE", 0.5, 0.8),
            ("EEA", 0.5, 0.8),
        ]);
        let slots = vec![Slot {
            id: 0,
            start: (0, 0),
            direction: Direction::Across,
            length: 3,
        }];
        let grid = Grid::new(3, 3);
        let used = HashSet::new();

        // Budget of zero: rejected outright.
        let result = solve(
            &grid,
            &slots,
            &dictionary,
            &used,
            &params(Difficulty::Easy, Some(0.30), 0),
        );
        assert!(matches!(result, Err(Error::FillUnsat)));

        // With a budget the slot falls back to the unfiltered list.
        let outcome = solve(
            &grid,
            &slots,
            &dictionary,
            &used,
            &params(Difficulty::Easy, Some(0.30), 2),
        )
        .expect("relaxed fill succeeds");
        assert_eq!(outcome.statistics.relaxed_slots, 1);
    }
}
