//! Arc-consistency propagation for the fill model. The grid is consistent
//! when every remaining option is supported by at least one compatible
//! option in each crossing slot, and when every slot reduced to a single
//! option has had that word removed from all other same-length slots (the
//! uniqueness rule). Both rules are applied until a fixed point.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use float_ord::FloatOrd;
use smallvec::{smallvec, SmallVec};

use crate::types::{SlotId, WordId, ALPHABET};
use crate::MAX_SLOT_LENGTH;

use super::lexicon::Lexicon;
use super::search::{Choice, SlotState};
use super::FillModel;

/// For each cell of a slot, how many live options carry each letter there.
pub(crate) type LetterCounts = Vec<[u32; ALPHABET]>;

/// How much each crossing's weight decays when a new wipeout is recorded,
/// prioritizing recent information over older information.
pub(crate) const WEIGHT_AGE_FACTOR: f32 = 0.99;

pub(crate) fn letter_counts(lexicon: &Lexicon, length: usize, options: &[WordId]) -> LetterCounts {
    let mut counts: LetterCounts = vec![[0; ALPHABET]; length];
    for &word_id in options {
        let word = &lexicon.words[length][word_id];
        for (cell, &letter) in word.letters.iter().enumerate() {
            counts[cell][letter as usize] += 1;
        }
    }
    counts
}

/// Returned when consistency is impossible: how much responsibility each
/// crossing carries for the domain wipeout.
pub(crate) struct PropagationFailure {
    pub weight_updates: HashMap<usize, f32>,
}

/// What triggered this propagation pass.
pub(crate) enum Mode {
    /// Establish consistency across the whole grid.
    Initial,
    /// A word was just chosen for a slot.
    Choice(Choice),
    /// A word was just ruled out for a slot, blamed on the given slot.
    Elimination(Choice, Option<SlotId>),
}

/// Working ledger for one slot during a propagation pass. Nothing here
/// touches the caller's `SlotState`s until the pass succeeds.
struct WorkingSlot {
    eliminated: HashSet<WordId>,
    blame: SmallVec<[u32; MAX_SLOT_LENGTH]>,
    remaining: usize,
    counts: Option<LetterCounts>,
    queued_cells: Option<SmallVec<[usize; MAX_SLOT_LENGTH]>>,
    needs_singleton: bool,
}

fn ensure_counts(states: &[SlotState], working: &mut [WorkingSlot], slot_id: SlotId) {
    if working[slot_id].counts.is_none() {
        let source = states[slot_id]
            .fixed_counts
            .clone()
            .unwrap_or_else(|| states[slot_id].counts.clone());
        working[slot_id].counts = Some(source);
    }
}

#[allow(clippy::too_many_arguments)]
fn eliminate(
    model: &FillModel,
    states: &[SlotState],
    working: &mut [WorkingSlot],
    fixed: &[bool],
    initial_counts: &[usize],
    slot_id: SlotId,
    word_id: WordId,
    blamed_cell: Option<usize>,
) -> Result<(), PropagationFailure> {
    let slot = &model.slots[slot_id];

    working[slot_id].eliminated.insert(word_id);
    working[slot_id].remaining -= 1;
    if let Some(cell) = blamed_cell {
        working[slot_id].blame[cell] += 1;
    }

    // A wiped-out domain ends the pass; report how much each crossing
    // contributed, as the share of this slot's options it removed.
    if working[slot_id].remaining == 0 {
        let initial = initial_counts[slot_id] as f32;
        return Err(PropagationFailure {
            weight_updates: slot
                .crossings
                .iter()
                .enumerate()
                .filter_map(|(cell, crossing)| {
                    crossing.as_ref().map(|crossing| {
                        (
                            crossing.crossing_id,
                            working[slot_id].blame[cell] as f32 / initial,
                        )
                    })
                })
                .collect(),
        });
    }

    if working[slot_id].remaining == 1 {
        working[slot_id].needs_singleton = true;
    }

    // Update this slot's letter counts; a count hitting zero may invalidate
    // options in the crossing slot, so enqueue the cell for propagation.
    ensure_counts(states, working, slot_id);
    let word = &model.lexicon.words[slot.length][word_id];
    let mut zeroed: SmallVec<[(usize, u8); MAX_SLOT_LENGTH]> = smallvec![];
    {
        let counts = working[slot_id].counts.as_mut().expect("counts ensured");
        for (cell, &letter) in word.letters.iter().enumerate() {
            counts[cell][letter as usize] -= 1;
            if counts[cell][letter as usize] == 0 && blamed_cell != Some(cell) {
                zeroed.push((cell, letter));
            }
        }
    }

    for (cell, letter) in zeroed {
        let Some(crossing) = &slot.crossings[cell] else {
            continue;
        };
        if fixed[crossing.other_slot] {
            continue;
        }
        ensure_counts(states, working, crossing.other_slot);
        let support = working[crossing.other_slot].counts.as_ref().expect("counts ensured")
            [crossing.other_cell][letter as usize];
        if support > 0 {
            let queued = working[slot_id]
                .queued_cells
                .get_or_insert_with(SmallVec::new);
            if !queued.contains(&cell) {
                queued.push(cell);
            }
        }
    }

    Ok(())
}

fn single_option(
    model: &FillModel,
    states: &[SlotState],
    working: &[WorkingSlot],
    slot_id: SlotId,
) -> Option<WordId> {
    states[slot_id].fixed_word.or_else(|| {
        model.options[slot_id]
            .iter()
            .copied()
            .find(|&word| {
                states[slot_id].eliminations[word].is_none()
                    && !working[slot_id].eliminated.contains(&word)
            })
    })
}

/// Determine the eliminations needed to reach consistency, or the weight
/// updates explaining why none exists.
#[allow(clippy::too_many_arguments)]
fn establish(
    model: &FillModel,
    states: &[SlotState],
    initial_counts: &[usize],
    crossing_weights: &[f32],
    slot_weights: &[f32],
    fixed: &[bool],
    evaluating_slot: Option<SlotId>,
) -> Result<Vec<Vec<WordId>>, PropagationFailure> {
    let slot_count = model.slots.len();
    let mut working: Vec<WorkingSlot> = model
        .slots
        .iter()
        .map(|slot| WorkingSlot {
            eliminated: HashSet::new(),
            blame: smallvec![0; slot.length],
            remaining: initial_counts[slot.id],
            counts: None,
            queued_cells: None,
            needs_singleton: false,
        })
        .collect();

    // With a known trigger slot the rest of the grid is already consistent
    // and only its cells need requeueing; otherwise examine everything.
    let initial_slots: Vec<SlotId> = evaluating_slot
        .map_or_else(|| (0..slot_count).collect(), |slot_id| vec![slot_id]);
    for slot_id in initial_slots {
        working[slot_id].queued_cells = Some(
            model.slots[slot_id]
                .crossings
                .iter()
                .enumerate()
                .filter(|(_, crossing)| {
                    crossing
                        .as_ref()
                        .map_or(false, |crossing| !fixed[crossing.other_slot])
                })
                .map(|(cell, _)| cell)
                .collect(),
        );
        if working[slot_id].remaining == 1 {
            working[slot_id].needs_singleton = true;
        }
    }

    loop {
        // Standard AC pass: drain queues, lowest dom/wdeg first, examining
        // each queued cell's crossing in descending crossing weight.
        loop {
            let slot_id = (0..slot_count)
                .filter(|&slot_id| working[slot_id].queued_cells.is_some())
                .min_by_key(|&slot_id| {
                    FloatOrd(working[slot_id].remaining as f32 / slot_weights[slot_id])
                });
            let Some(slot_id) = slot_id else {
                break;
            };

            let mut cells = working[slot_id]
                .queued_cells
                .take()
                .expect("queued slot has cells");
            cells.sort_by_cached_key(|&cell| {
                let crossing_id = model.slots[slot_id].crossings[cell]
                    .as_ref()
                    .expect("queued cell has a crossing")
                    .crossing_id;
                Reverse(FloatOrd(crossing_weights[crossing_id]))
            });

            for cell in cells {
                let crossing = model.slots[slot_id].crossings[cell]
                    .clone()
                    .expect("queued cell has a crossing");
                let other = crossing.other_slot;
                let other_length = model.slots[other].length;
                ensure_counts(states, &mut working, slot_id);

                for &option_word in &model.options[other] {
                    if states[other].eliminations[option_word].is_some()
                        || working[other].eliminated.contains(&option_word)
                    {
                        continue;
                    }
                    let letter =
                        model.lexicon.words[other_length][option_word].letters[crossing.other_cell];
                    let support = working[slot_id].counts.as_ref().expect("counts ensured")[cell]
                        [letter as usize];
                    if support == 0 {
                        eliminate(
                            model,
                            states,
                            &mut working,
                            fixed,
                            initial_counts,
                            other,
                            option_word,
                            Some(crossing.other_cell),
                        )?;
                    }
                }
            }
        }

        // Uniqueness pass: each slot locked to one word bans that word from
        // every other slot of the same length.
        let singles: Vec<SlotId> = working
            .iter_mut()
            .enumerate()
            .filter(|(_, w)| w.needs_singleton)
            .map(|(slot_id, w)| {
                w.needs_singleton = false;
                slot_id
            })
            .collect();

        for slot_id in singles {
            let length = model.slots[slot_id].length;
            let word_id = single_option(model, states, &working, slot_id)
                .expect("singleton slot has one option");

            for other in 0..slot_count {
                if other == slot_id || fixed[other] || model.slots[other].length != length {
                    continue;
                }
                if states[other].eliminations[word_id].is_some()
                    || working[other].eliminated.contains(&word_id)
                {
                    continue;
                }
                if !model.options[other].contains(&word_id) {
                    continue;
                }
                eliminate(
                    model,
                    states,
                    &mut working,
                    fixed,
                    initial_counts,
                    other,
                    word_id,
                    None,
                )?;
            }
        }

        if working
            .iter()
            .all(|w| w.queued_cells.is_none() && !w.needs_singleton)
        {
            break;
        }
    }

    Ok(working
        .into_iter()
        .map(|w| w.eliminated.into_iter().collect())
        .collect())
}

/// Apply the given trigger provisionally, propagate, and either keep the
/// resulting eliminations or revert the trigger and age the crossing
/// weights. Returns whether consistency held.
pub(crate) fn maintain(
    model: &FillModel,
    states: &mut [SlotState],
    crossing_weights: &mut [f32],
    slot_weights: &[f32],
    mode: &Mode,
) -> bool {
    match mode {
        Mode::Choice(choice) => states[choice.slot].choose(model, choice.word),
        Mode::Elimination(choice, blamed) => {
            states[choice.slot].add_elimination(model, choice.word, *blamed);
        }
        Mode::Initial => {}
    }

    let initial_counts: Vec<usize> = states
        .iter()
        .map(|state| {
            if state.fixed_word.is_some() {
                1
            } else {
                state.remaining
            }
        })
        .collect();

    // Initially only verbatim-provided slots count as fixed; a slot that
    // merely happens to have one option can still lose it to a crossing.
    // Later on, any single-option slot is already pruned against the rest of
    // the grid and can be treated as settled.
    let fixed: Vec<bool> = match mode {
        Mode::Initial => states.iter().map(|s| s.fixed_word.is_some()).collect(),
        _ => initial_counts.iter().map(|&count| count == 1).collect(),
    };

    let evaluating_slot = match mode {
        Mode::Initial => None,
        Mode::Choice(choice) | Mode::Elimination(choice, _) => Some(choice.slot),
    };

    let blamed_slot = match mode {
        Mode::Initial => None,
        Mode::Choice(choice) => Some(choice.slot),
        Mode::Elimination(_, blamed) => *blamed,
    };

    match establish(
        model,
        states,
        &initial_counts,
        crossing_weights,
        slot_weights,
        &fixed,
        evaluating_slot,
    ) {
        Ok(eliminations) => {
            for (slot_id, words) in eliminations.into_iter().enumerate() {
                for word_id in words {
                    states[slot_id].add_elimination(model, word_id, blamed_slot);
                }
            }
            true
        }
        Err(PropagationFailure { weight_updates }) => {
            match mode {
                Mode::Choice(choice) => states[choice.slot].clear_choice(),
                Mode::Elimination(choice, _) => {
                    states[choice.slot].remove_elimination(model, choice.word);
                }
                Mode::Initial => {}
            }
            for (crossing_id, weight) in crossing_weights.iter_mut().enumerate() {
                *weight = 1.0
                    + ((*weight - 1.0) * WEIGHT_AGE_FACTOR)
                    + weight_updates.get(&crossing_id).unwrap_or(&0.0);
            }
            false
        }
    }
}
