//! Layout construction: freezes the cell-type grid so that the slot set is
//! structurally legal and dictionary-feasible. Works by rejection, not
//! repair: any dead end raises `LayoutInfeasible` and the orchestrator
//! retries the whole attempt with a fresh seed.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::dictionary::Dictionary;
use crate::error::Error;
use crate::grid::{Grid, Slot};
use crate::types::{CellKind, Direction, GridCoord};

/// Long runs are cut down in two passes with shrinking caps, which keeps
/// per-slot candidate pools large without over-fragmenting the grid.
const PARTITION_PASSES: [usize; 2] = [10, 8];

/// Bound on the heal/partition/license fixed-point iterations.
const MAX_ROUNDS: usize = 200;

/// Freeze the grid's cell types and return the registered slot set.
pub fn build_layout(
    grid: &mut Grid,
    dictionary: &Dictionary,
    used_words: &HashSet<String>,
    theme_surfaces: &HashSet<String>,
) -> Result<Vec<Slot>, Error> {
    heal_orphans(grid)?;

    for max_len in PARTITION_PASSES {
        for _ in 0..MAX_ROUNDS {
            if partition_pass(grid, max_len) {
                heal_orphans(grid)?;
            } else {
                break;
            }
        }
    }

    ensure_licensing(grid)?;

    // Every clue box must license something; a box that ended up licensing
    // nothing means this layout is a dud.
    for row in 0..grid.height() {
        for col in 0..grid.width() {
            if grid.kind(row, col) == CellKind::ClueBox && !grid.clue_box_licenses_slot(row, col) {
                return Err(Error::LayoutInfeasible(format!(
                    "clue box at ({row}, {col}) licenses no slot"
                )));
            }
        }
    }

    verify_feasibility(grid, dictionary, used_words, theme_surfaces)?;

    Ok(grid.register_slots())
}

/// Convert cells that belong to no run of length >= 2 in either direction
/// into clue boxes. A cell that can't legally convert sinks the layout.
fn heal_orphans(grid: &mut Grid) -> Result<(), Error> {
    for _ in 0..MAX_ROUNDS {
        let mut changed = false;
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                if grid.kind(row, col) != CellKind::Empty {
                    continue;
                }
                let across = grid
                    .maximal_run(row, col, Direction::Across)
                    .map_or(0, |run| run.len());
                let down = grid
                    .maximal_run(row, col, Direction::Down)
                    .map_or(0, |run| run.len());
                if across >= 2 || down >= 2 {
                    continue;
                }
                match grid.place_clue_box(row, col) {
                    Ok(()) => {
                        debug!("healed isolated cell at ({row}, {col})");
                        changed = true;
                    }
                    Err(e) => {
                        return Err(Error::LayoutInfeasible(format!(
                            "isolated cell at ({row}, {col}) cannot become a clue box: {e}"
                        )));
                    }
                }
            }
        }
        if !changed {
            return Ok(());
        }
    }
    Ok(())
}

/// Rank cut positions inside a run of length `length`: prefer central cuts
/// and avoid positions that leave a 3-run, which starves candidate pools.
fn ranked_cut_positions(length: usize) -> Vec<usize> {
    let mut positions: Vec<usize> = (2..=length - 2).collect();
    positions.sort_by_key(|&i| {
        let central = (2 * i as i64 - length as i64).abs();
        let three_run = if i == 3 || length - i == 3 { 20 } else { 0 };
        central + three_run
    });
    positions
}

/// Cut every run longer than `max_len` that still has an empty cell to cut
/// at. Returns whether anything changed.
fn partition_pass(grid: &mut Grid, max_len: usize) -> bool {
    let mut changed = false;
    for direction in [Direction::Across, Direction::Down] {
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                if !grid.is_run_start(row, col, direction) {
                    continue;
                }
                let run = grid
                    .maximal_run(row, col, direction)
                    .expect("run start is playable");
                if run.len() <= max_len {
                    continue;
                }
                // Fully lettered runs (theme words) are never cut.
                if run.cells.iter().all(|&(r, c)| grid.letter(r, c).is_some()) {
                    continue;
                }

                for i in ranked_cut_positions(run.len()) {
                    let (cut_row, cut_col) = run.cells[i];
                    if grid.kind(cut_row, cut_col) != CellKind::Empty {
                        continue;
                    }
                    if grid.place_clue_box(cut_row, cut_col).is_ok() {
                        debug!(
                            "partitioned {} run of {} at ({row}, {col}) with a box at ({cut_row}, {cut_col})",
                            direction,
                            run.len()
                        );
                        changed = true;
                        break;
                    }
                }
            }
        }
    }
    changed
}

/// Walk every run of length >= 2 and make sure its first cell has a
/// direction-legal clue box. Plants one where possible; converts the start
/// cell itself when no neighbor position works; rejects when neither does.
fn ensure_licensing(grid: &mut Grid) -> Result<(), Error> {
    for _ in 0..MAX_ROUNDS {
        let mut changed = false;
        for direction in [Direction::Across, Direction::Down] {
            for row in 0..grid.height() {
                for col in 0..grid.width() {
                    if !grid.is_run_start(row, col, direction) {
                        continue;
                    }
                    let run = grid
                        .maximal_run(row, col, direction)
                        .expect("run start is playable");
                    if run.len() < 2 || grid.licensed(run.start, direction) {
                        continue;
                    }

                    let mut planted = false;
                    for &(dr, dc) in &direction.clue_offsets() {
                        if let Some((r, c)) = grid.offset(run.start, dr, dc) {
                            if grid.place_clue_box(r, c).is_ok() {
                                planted = true;
                                break;
                            }
                        }
                    }
                    if planted {
                        changed = true;
                        continue;
                    }

                    // No neighbor position works; eliminating the start cell
                    // removes the unlicensable slot instead.
                    if grid.kind(row, col) == CellKind::Empty
                        && grid.place_clue_box(row, col).is_ok()
                    {
                        debug!(
                            "converted unlicensable {} start at ({row}, {col}) into a clue box",
                            direction
                        );
                        changed = true;
                        continue;
                    }

                    return Err(Error::LayoutInfeasible(format!(
                        "{direction} run at ({row}, {col}) cannot be licensed"
                    )));
                }
            }
        }
        if changed {
            heal_orphans(grid)?;
        } else {
            return Ok(());
        }
    }
    Err(Error::LayoutInfeasible(
        "licensing did not reach a fixed point".into(),
    ))
}

/// Reject the layout when any slot has no way to be filled: a complete run
/// must already spell a dictionary (or theme) word, an incomplete run of
/// length >= 3 must have at least one candidate, and no complete word may
/// appear twice. Two-letter runs stay free variables for the solver.
fn verify_feasibility(
    grid: &Grid,
    dictionary: &Dictionary,
    used_words: &HashSet<String>,
    theme_surfaces: &HashSet<String>,
) -> Result<(), Error> {
    let mut complete_seen: HashMap<String, GridCoord> = HashMap::new();

    for slot in grid.register_slots() {
        let cells = slot.cells();
        let fixed = grid.fixed_letters(&cells);

        if fixed.len() == slot.length {
            let word = grid.read_word(&cells).expect("complete slot");
            if let Some(&other) = complete_seen.get(&word) {
                return Err(Error::LayoutInfeasible(format!(
                    "word {word} appears at both {other:?} and {:?}",
                    slot.start
                )));
            }
            complete_seen.insert(word.clone(), slot.start);

            if slot.length >= 3 && !theme_surfaces.contains(&word) && !dictionary.contains(&word) {
                return Err(Error::LayoutInfeasible(format!(
                    "pre-filled run {word} at {:?} is not a dictionary word",
                    slot.start
                )));
            }
            continue;
        }

        if slot.length >= 3 && !dictionary.has_candidates(slot.length, &fixed, used_words) {
            return Err(Error::LayoutInfeasible(format!(
                "{} slot of length {} at {:?} has no candidates",
                slot.direction, slot.length, slot.start
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::tests::{dense_dictionary, memory_dictionary};
    use crate::dictionary::{Dictionary, DictionarySource, RawEntry};

    /// A sparse dictionary with a handful of words per length; enough for
    /// layout feasibility on empty grids, where patterns are unconstrained.
    fn sparse_dictionary(max_len: usize) -> Dictionary {
        let alphabet = ['A', 'E', 'I', 'L', 'N', 'R', 'S', 'T'];
        let mut entries = Vec::new();
        for length in 2..=max_len {
            for variant in 0..24 {
                let surface: String = (0..length)
                    .map(|i| alphabet[(variant * 5 + i * 3 + length) % alphabet.len()])
                    .collect();
                entries.push(RawEntry::new(&surface, 0.5, 0.4));
            }
        }
        Dictionary::load(DictionarySource::Memory(entries)).unwrap()
    }

    #[test]
    fn test_ranked_cut_positions() {
        // Length 14: central cuts first; 2*i == 14 exactly at i = 7.
        let ranked = ranked_cut_positions(14);
        assert_eq!(ranked[0], 7);
        assert!(ranked.contains(&2) && ranked.contains(&12));
        // Positions leaving a 3-run sink to the back half.
        let pos_3 = ranked.iter().position(|&i| i == 3).unwrap();
        let pos_4 = ranked.iter().position(|&i| i == 4).unwrap();
        assert!(pos_4 < pos_3);
    }

    #[test]
    fn test_layout_on_blank_grid() {
        let dictionary = sparse_dictionary(12);
        let used = HashSet::new();
        let theme = HashSet::new();

        let mut grid = Grid::new(10, 15);
        grid.place_clue_box(0, 0).unwrap();
        let slots = build_layout(&mut grid, &dictionary, &used, &theme).unwrap();

        assert!(!slots.is_empty());
        for slot in &slots {
            assert!(slot.length >= 2);
            assert!(grid.licensed(slot.start, slot.direction));
        }
        grid.validate_structure().expect("frozen layout validates");
    }

    #[test]
    fn test_layout_partitions_long_runs() {
        let dictionary = sparse_dictionary(12);
        let used = HashSet::new();
        let theme = HashSet::new();

        let mut grid = Grid::new(12, 12);
        grid.place_clue_box(0, 0).unwrap();
        let slots = build_layout(&mut grid, &dictionary, &used, &theme).unwrap();
        let longest = slots.iter().map(|s| s.length).max().unwrap();
        assert!(longest <= 10, "longest slot is {longest}");
    }

    #[test]
    fn test_layout_rejects_unfillable_pattern() {
        // Nothing of length 3 exists, so any 3-slot the layout produces is a
        // dead end; smaller grids always produce one.
        let dictionary = memory_dictionary(&[("ABCD", 0.5, 0.4)]);
        let used = HashSet::new();
        let theme = HashSet::new();

        let mut grid = Grid::new(6, 6);
        grid.place_clue_box(0, 0).unwrap();
        let result = build_layout(&mut grid, &dictionary, &used, &theme);
        assert!(matches!(result, Err(Error::LayoutInfeasible(_))));
    }

    #[test]
    fn test_layout_keeps_theme_letters() {
        let dictionary = dense_dictionary(&['A', 'E', 'S', 'T'], 2..=8);
        let mut used = HashSet::new();
        let mut theme = HashSet::new();
        used.insert("TESTA".to_string());
        theme.insert("TESTA".to_string());

        let mut grid = Grid::new(8, 8);
        grid.place_clue_box(0, 0).unwrap();
        // Seed a theme word by hand with its boundary boxes.
        for (i, letter) in crate::types::letters_of("TESTA").unwrap().into_iter().enumerate() {
            grid.place_letter(2, 1 + i, letter).unwrap();
        }
        grid.place_clue_box(2, 0).unwrap();
        grid.place_clue_box(2, 6).unwrap();

        let slots = build_layout(&mut grid, &dictionary, &used, &theme).unwrap();
        let cells: Vec<_> = (0..5).map(|i| (2usize, 1 + i)).collect();
        assert_eq!(grid.read_word(&cells), Some("TESTA".into()));
        assert!(slots
            .iter()
            .any(|s| s.start == (2, 1) && s.direction == Direction::Across && s.length == 5));
    }
}
