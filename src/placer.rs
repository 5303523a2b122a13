//! Blocker-rectangle and theme-word placement. Both run on the mutable grid
//! before the layout freeze; theme placement simulates each candidate with a
//! snapshot and keeps the first position that survives every check.

use std::collections::HashSet;

use log::{debug, info};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::dictionary::{normalize_word, Dictionary};
use crate::error::Error;
use crate::grid::{BlockerRect, Grid};
use crate::theme::{SourceTag, ThemeEntry};
use crate::types::{letters_of, CellKind, Direction, GridCoord, Letter};
use crate::MAX_SLOT_LENGTH;

/// Blocker dimensions fall in this band, clamped by grid size.
const MIN_BLOCKER_SIZE: usize = 3;
const MAX_BLOCKER_SIZE: usize = 6;

/// How the blocker rectangle is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockerConfig {
    /// No blocker zone at all.
    None,
    /// Size and anchor drawn from the attempt RNG.
    Random,
    /// Size pinned by the caller; anchor pinned too when `row`/`col` are set.
    Pinned(BlockerSpec),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockerSpec {
    pub height: usize,
    pub width: usize,
    pub row: Option<usize>,
    pub col: Option<usize>,
}

fn corner_anchors(grid: &Grid, height: usize, width: usize) -> [GridCoord; 5] {
    let last_row = grid.height() - height;
    let last_col = grid.width() - width;
    [
        (0, 0),
        (0, last_col),
        (last_row, 0),
        (last_row, last_col),
        (last_row / 2, last_col / 2),
    ]
}

/// Apply the configured blocker (if any) and plant the corner licensing clue
/// boxes. With no blocker the top-left cell becomes the mandatory clue box.
pub fn apply_blocker(
    grid: &mut Grid,
    config: &BlockerConfig,
    rng: &mut SmallRng,
) -> Result<Option<BlockerRect>, Error> {
    match config {
        BlockerConfig::None => {
            grid.place_clue_box(0, 0)
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            Ok(None)
        }
        BlockerConfig::Random => {
            let max_height = MAX_BLOCKER_SIZE.min(grid.height() / 2);
            let max_width = MAX_BLOCKER_SIZE.min(grid.width() / 2);
            if max_height < MIN_BLOCKER_SIZE || max_width < MIN_BLOCKER_SIZE {
                debug!("grid too small for a blocker zone; skipping");
                grid.place_clue_box(0, 0)
                    .map_err(|e| Error::InvalidConfig(e.to_string()))?;
                return Ok(None);
            }
            let height = rng.gen_range(MIN_BLOCKER_SIZE..=max_height);
            let width = rng.gen_range(MIN_BLOCKER_SIZE..=max_width);
            let &(row, col) = corner_anchors(grid, height, width)
                .choose(rng)
                .expect("anchor list is non-empty");
            let rect = BlockerRect {
                row,
                col,
                height,
                width,
            };
            info!(
                "placing blocker zone at ({}, {}) size {}x{}",
                row, col, height, width
            );
            grid.set_blocker(rect)?;
            Ok(Some(rect))
        }
        BlockerConfig::Pinned(spec) => {
            if spec.height > grid.height() || spec.width > grid.width() {
                return Err(Error::BlockerOutOfBounds(format!(
                    "{}x{} blocker in a {}x{} grid",
                    spec.height,
                    spec.width,
                    grid.height(),
                    grid.width()
                )));
            }
            let (row, col) = match (spec.row, spec.col) {
                (Some(row), Some(col)) => (row, col),
                _ => {
                    let &(anchor_row, anchor_col) =
                        corner_anchors(grid, spec.height, spec.width)
                            .choose(rng)
                            .expect("anchor list is non-empty");
                    (spec.row.unwrap_or(anchor_row), spec.col.unwrap_or(anchor_col))
                }
            };
            let rect = BlockerRect {
                row,
                col,
                height: spec.height,
                width: spec.width,
            };
            grid.set_blocker(rect)?;
            Ok(Some(rect))
        }
    }
}

/// A theme word the placer managed to seat.
#[derive(Debug, Clone)]
pub struct PlacedThemeWord {
    pub surface: String,
    pub start: GridCoord,
    pub direction: Direction,
    pub clue: Option<String>,
    pub source: SourceTag,
}

/// Outcome of theme seeding, including the coverage bookkeeping the sealed
/// result reports.
#[derive(Debug, Clone, Default)]
pub struct ThemePlacement {
    pub placed: Vec<PlacedThemeWord>,
    pub requested: usize,
    pub target: usize,
    pub letters: usize,
}

impl ThemePlacement {
    #[must_use]
    pub fn surfaces(&self) -> HashSet<String> {
        self.placed.iter().map(|p| p.surface.clone()).collect()
    }
}

enum Reject {
    Boundary,
    Licensing,
    Conflict,
    Crossing,
}

/// Seed theme words onto the grid in list order. The target count is 40% of
/// the expected slot count (capped by the list), with a floor of two placed
/// words unless `words_only` disables the minimum.
pub fn place_theme_words(
    grid: &mut Grid,
    dictionary: &Dictionary,
    entries: &[ThemeEntry],
    words_only: bool,
    rng: &mut SmallRng,
) -> Result<ThemePlacement, Error> {
    let mut placement = ThemePlacement {
        requested: entries.len(),
        ..ThemePlacement::default()
    };
    if entries.is_empty() {
        return Ok(placement);
    }

    // Normalize up front, dropping entries the grid can never host.
    let mut seen: HashSet<String> = HashSet::new();
    let mut pending: Vec<(String, &ThemeEntry)> = Vec::new();
    for entry in entries {
        let Some(surface) = normalize_word(&entry.word) else {
            debug!("skipping unnormalizable theme word {:?}", entry.word);
            continue;
        };
        if surface.len() < 2 || surface.len() > MAX_SLOT_LENGTH.min(grid.width().max(grid.height()))
        {
            continue;
        }
        if seen.insert(surface.clone()) {
            pending.push((surface, entry));
        }
    }

    let expected_slots = grid.playable_count() / 3;
    let target = pending.len().min((expected_slots as f32 * 0.4) as usize);
    let required = if words_only { 0 } else { target.min(2) };
    placement.target = target;

    // Letter membership per pending word, for the crossing-potential score.
    let letter_sets: Vec<[bool; 26]> = pending
        .iter()
        .map(|(surface, _)| {
            let mut set = [false; 26];
            for letter in letters_of(surface).expect("normalized surface") {
                set[letter as usize] = true;
            }
            set
        })
        .collect();

    let mut used_words: HashSet<String> = HashSet::new();
    let mut placed_cells: Vec<GridCoord> = Vec::new();
    let mut occupied: HashSet<(GridCoord, Direction, usize)> = HashSet::new();

    for index in 0..pending.len() {
        if placement.placed.len() >= target {
            break;
        }
        let (surface, entry) = &pending[index];
        let letters = letters_of(surface).expect("normalized surface");

        let mut candidates = candidate_positions(grid, &letters);
        candidates.shuffle(rng);
        candidates.sort_by_key(|&(start, direction)| {
            -position_score(
                grid,
                &letters,
                start,
                direction,
                &letter_sets[index + 1..],
                &placed_cells,
            )
        });

        let mut seated = false;
        for (start, direction) in candidates {
            let token = grid.snapshot();
            match try_place(
                grid,
                dictionary,
                &letters,
                surface,
                start,
                direction,
                entry.source == SourceTag::User,
                &used_words,
                &occupied,
            ) {
                Ok(()) => {
                    grid.commit(token);
                    used_words.insert(surface.clone());
                    occupied.insert((start, direction, letters.len()));
                    placed_cells.extend(word_cells(start, direction, letters.len()));
                    placement.letters += letters.len();
                    placement.placed.push(PlacedThemeWord {
                        surface: surface.clone(),
                        start,
                        direction,
                        clue: entry.clue.clone(),
                        source: entry.source,
                    });
                    debug!(
                        "placed theme word {surface} at ({}, {}) {direction}",
                        start.0, start.1
                    );
                    seated = true;
                    break;
                }
                Err(_) => grid.rollback(token),
            }
        }
        if !seated {
            debug!("no position found for theme word {surface}");
        }
    }

    info!(
        "placed {}/{} theme words ({} letters)",
        placement.placed.len(),
        placement.target,
        placement.letters
    );

    if placement.placed.len() < required {
        return Err(Error::ThemePlacementFailed(format!(
            "placed {} of {} required theme words",
            placement.placed.len(),
            required
        )));
    }
    Ok(placement)
}

fn word_cells(start: GridCoord, direction: Direction, length: usize) -> Vec<GridCoord> {
    let (dr, dc) = direction.step();
    (0..length)
        .map(|i| {
            (
                (start.0 as isize + dr * i as isize) as usize,
                (start.1 as isize + dc * i as isize) as usize,
            )
        })
        .collect()
}

/// Positions where the word fits geometrically: in bounds, over playable
/// cells without letter conflicts, and not extending an existing run at
/// either end.
fn candidate_positions(grid: &Grid, letters: &[Letter]) -> Vec<(GridCoord, Direction)> {
    let mut out = Vec::new();
    for direction in [Direction::Across, Direction::Down] {
        let (dr, dc) = direction.step();
        for row in 0..grid.height() {
            for col in 0..grid.width() {
                let start = (row, col);
                let end_row = row as isize + dr * (letters.len() as isize - 1);
                let end_col = col as isize + dc * (letters.len() as isize - 1);
                if end_row as usize >= grid.height() || end_col as usize >= grid.width() {
                    continue;
                }

                let fits = letters.iter().enumerate().all(|(i, &letter)| {
                    let r = (row as isize + dr * i as isize) as usize;
                    let c = (col as isize + dc * i as isize) as usize;
                    let cell = grid.cell(r, c);
                    cell.is_playable() && cell.letter.map_or(true, |existing| existing == letter)
                });
                if !fits {
                    continue;
                }

                // The run must not continue past either end of the word.
                if let Some(prev) = grid.offset(start, -dr, -dc) {
                    if grid.kind(prev.0, prev.1) == CellKind::Letter {
                        continue;
                    }
                }
                let end = (end_row as usize, end_col as usize);
                if let Some(next) = grid.offset(end, dr, dc) {
                    if grid.kind(next.0, next.1) == CellKind::Letter {
                        continue;
                    }
                }

                out.push((start, direction));
            }
        }
    }
    out
}

/// Rank a candidate position: interlock with existing letters dominates,
/// then crossing potential against still-pending theme words, then proximity
/// to what's already on the board. Equal scores keep their shuffled order.
fn position_score(
    grid: &Grid,
    letters: &[Letter],
    start: GridCoord,
    direction: Direction,
    pending_letter_sets: &[[bool; 26]],
    placed_cells: &[GridCoord],
) -> i64 {
    let cells = word_cells(start, direction, letters.len());

    let mut interlock = 0i64;
    let mut potential = 0i64;
    for (i, &(r, c)) in cells.iter().enumerate() {
        if grid.letter(r, c) == Some(letters[i]) {
            interlock += 1;
        }
        for set in pending_letter_sets {
            if set[letters[i] as usize] {
                potential += 1;
            }
        }
    }

    let distance = placed_cells
        .iter()
        .flat_map(|&(pr, pc)| {
            cells.iter().map(move |&(r, c)| {
                (pr as i64 - r as i64).abs().max((pc as i64 - c as i64).abs())
            })
        })
        .min()
        .unwrap_or(0);

    interlock * 1000 + potential * 10 - distance
}

fn start_has_clue_capacity(grid: &Grid, start: GridCoord, direction: Direction) -> bool {
    direction.clue_offsets().iter().any(|&(dr, dc)| {
        grid.offset(start, dr, dc).map_or(false, |(r, c)| {
            grid.kind(r, c) == CellKind::ClueBox || grid.can_place_clue_box(r, c)
        })
    })
}

#[allow(clippy::too_many_arguments)]
fn try_place(
    grid: &mut Grid,
    dictionary: &Dictionary,
    letters: &[Letter],
    surface: &str,
    start: GridCoord,
    direction: Direction,
    is_user: bool,
    used_words: &HashSet<String>,
    occupied: &HashSet<(GridCoord, Direction, usize)>,
) -> Result<(), Reject> {
    let (dr, dc) = direction.step();
    let cells = word_cells(start, direction, letters.len());

    if occupied.contains(&(start, direction, letters.len())) {
        return Err(Reject::Conflict);
    }

    // Leading boundary: an empty predecessor becomes the licensing clue box.
    if let Some(prev) = grid.offset(start, -dr, -dc) {
        match grid.kind(prev.0, prev.1) {
            CellKind::Letter => return Err(Reject::Boundary),
            CellKind::Empty => {
                grid.place_clue_box(prev.0, prev.1)
                    .map_err(|_| Reject::Boundary)?;
            }
            _ => {}
        }
    }

    for (i, &(r, c)) in cells.iter().enumerate() {
        grid.place_letter(r, c, letters[i]).map_err(|_| Reject::Conflict)?;
    }

    // Licensing may already be satisfied by the leading box or a neighbor.
    if !grid.licensed(start, direction) {
        let mut planted = false;
        for &(odr, odc) in &direction.clue_offsets() {
            if let Some((r, c)) = grid.offset(start, odr, odc) {
                if grid.place_clue_box(r, c).is_ok() {
                    planted = true;
                    break;
                }
            }
        }
        if !planted {
            return Err(Reject::Licensing);
        }
    }

    // Trailing boundary.
    let end = *cells.last().expect("word has cells");
    if let Some(next) = grid.offset(end, dr, dc) {
        match grid.kind(next.0, next.1) {
            CellKind::Letter => return Err(Reject::Boundary),
            CellKind::Empty => {
                grid.place_clue_box(next.0, next.1)
                    .map_err(|_| Reject::Boundary)?;
            }
            _ => {}
        }
    }

    // Examine every crossing run the word now participates in.
    let crossing = direction.perpendicular();
    for &(r, c) in &cells {
        let run = grid
            .maximal_run(r, c, crossing)
            .expect("word cell is playable");
        if run.len() < 2 {
            continue;
        }
        if occupied.contains(&(run.start, crossing, run.len())) {
            continue;
        }

        if !grid.licensed(run.start, crossing)
            && !start_has_clue_capacity(grid, run.start, crossing)
        {
            return Err(Reject::Licensing);
        }

        let fixed = grid.fixed_letters(&run.cells);
        if fixed.len() == run.len() {
            let crossing_word = grid.read_word(&run.cells).expect("complete run");
            if crossing_word != surface && used_words.contains(&crossing_word) {
                return Err(Reject::Crossing);
            }
            if run.len() >= 3
                && !is_user
                && crossing_word != surface
                && !dictionary.contains(&crossing_word)
            {
                return Err(Reject::Crossing);
            }
        } else if run.len() >= 3
            && !is_user
            && !dictionary.has_candidates(run.len(), &fixed, used_words)
        {
            return Err(Reject::Crossing);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::tests::dense_dictionary;
    use crate::types::letter_to_char;
    use rand::SeedableRng;

    fn rng(seed: u64) -> SmallRng {
        SmallRng::seed_from_u64(seed)
    }

    #[test]
    fn test_apply_blocker_none_plants_corner() {
        let mut grid = Grid::new(8, 8);
        let rect = apply_blocker(&mut grid, &BlockerConfig::None, &mut rng(1)).unwrap();
        assert!(rect.is_none());
        assert_eq!(grid.kind(0, 0), CellKind::ClueBox);
    }

    #[test]
    fn test_apply_blocker_random_in_bounds() {
        for seed in 0..20 {
            let mut grid = Grid::new(10, 14);
            let rect = apply_blocker(&mut grid, &BlockerConfig::Random, &mut rng(seed))
                .unwrap()
                .expect("blocker placed");
            assert!(rect.height >= 3 && rect.height <= 5);
            assert!(rect.width >= 3 && rect.width <= 6);
            assert!(rect.row + rect.height <= 10);
            assert!(rect.col + rect.width <= 14);
            // The corner rule holds whichever anchor was drawn.
            if rect.covers_origin() {
                assert!(
                    grid.kind(0, rect.width) == CellKind::ClueBox
                        || grid.kind(rect.height, 0) == CellKind::ClueBox
                );
            } else {
                assert_eq!(grid.kind(0, 0), CellKind::ClueBox);
            }
        }
    }

    #[test]
    fn test_apply_blocker_pinned_out_of_bounds() {
        let mut grid = Grid::new(8, 8);
        let spec = BlockerSpec {
            height: 5,
            width: 5,
            row: Some(6),
            col: Some(0),
        };
        assert!(matches!(
            apply_blocker(&mut grid, &BlockerConfig::Pinned(spec), &mut rng(1)),
            Err(Error::BlockerOutOfBounds(_))
        ));
    }

    #[test]
    fn test_theme_words_recorded_at_positions() {
        let dictionary = dense_dictionary(&['A', 'E', 'S', 'T'], 2..=7);
        let mut grid = Grid::new(7, 7);
        grid.place_clue_box(0, 0).unwrap();

        let entries = vec![
            ThemeEntry::user("TEST"),
            ThemeEntry::user("SEAT"),
            ThemeEntry::user("EAST"),
        ];
        let placement =
            place_theme_words(&mut grid, &dictionary, &entries, true, &mut rng(7)).unwrap();
        assert_eq!(placement.placed.len(), 3);

        for placed in &placement.placed {
            let cells = word_cells(placed.start, placed.direction, placed.surface.len());
            let word: String = cells
                .iter()
                .map(|&(r, c)| letter_to_char(grid.letter(r, c).expect("letter present")))
                .collect();
            assert_eq!(word, placed.surface);
            assert!(grid.licensed(placed.start, placed.direction));
        }
    }

    #[test]
    fn test_user_word_outside_dictionary_places() {
        // TTTT is not in the dictionary; user sourcing skips the membership
        // check as long as crossings stay feasible.
        let mut entries = Vec::new();
        for length in 2..=6 {
            crate::dictionary::tests::cartesian_entries(&['A', 'E', 'S', 'T'], length, &mut entries);
        }
        entries.retain(|e| e.surface != "TTTT");
        let dictionary =
            crate::dictionary::Dictionary::load(crate::dictionary::DictionarySource::Memory(
                entries,
            ))
            .unwrap();
        assert!(!dictionary.contains("TTTT"));

        let mut grid = Grid::new(6, 6);
        grid.place_clue_box(0, 0).unwrap();
        let placement = place_theme_words(
            &mut grid,
            &dictionary,
            &[ThemeEntry::user("TTTT")],
            true,
            &mut rng(9),
        )
        .unwrap();
        assert_eq!(placement.placed.len(), 1);
    }

    #[test]
    fn test_duplicate_theme_words_collapse() {
        let dictionary = dense_dictionary(&['A', 'E', 'S', 'T'], 2..=6);
        let mut grid = Grid::new(6, 6);
        grid.place_clue_box(0, 0).unwrap();
        let entries = vec![ThemeEntry::user("TEST"), ThemeEntry::user("test")];
        let placement =
            place_theme_words(&mut grid, &dictionary, &entries, true, &mut rng(3)).unwrap();
        assert_eq!(placement.placed.len(), 1);
    }

    #[test]
    fn test_empty_theme_list_is_fine() {
        let dictionary = dense_dictionary(&['A', 'E'], 2..=4);
        let mut grid = Grid::new(6, 6);
        grid.place_clue_box(0, 0).unwrap();
        let placement = place_theme_words(&mut grid, &dictionary, &[], false, &mut rng(1)).unwrap();
        assert!(placement.placed.is_empty());
        assert_eq!(placement.target, 0);
    }
}
