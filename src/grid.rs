//! The grid state machine: cell array, snapshot journal, run scanning, slot
//! registry and structural validators. Slots reference cells by coordinates,
//! never by pointer, so snapshots are plain value copies of touched cells.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{Error, Invariant};
use crate::types::{letter_to_char, CellKind, Direction, GridCoord, Letter, SlotId};

/// Error raised when a clue box cannot be planted at a position.
#[derive(Debug, Error)]
pub enum ClueBoxError {
    #[error("clue box out of bounds at ({0}, {1})")]
    OutOfBounds(usize, usize),

    #[error("cell ({0}, {1}) is not empty")]
    Occupied(usize, usize),

    #[error("clue box at ({0}, {1}) would touch another clue box")]
    Adjacency(usize, usize),

    #[error("clue box at ({0}, {1}) would enter the bottom-right corner")]
    CornerZone(usize, usize),
}

/// Error raised when a letter cannot be written to a cell.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("letter out of bounds at ({0}, {1})")]
    OutOfBounds(usize, usize),

    #[error("cell ({0}, {1}) is not playable")]
    NotPlayable(usize, usize),

    #[error("letter conflict at ({0}, {1})")]
    Conflict(usize, usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: CellKind,
    pub letter: Option<Letter>,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        kind: CellKind::Empty,
        letter: None,
    };

    #[must_use]
    pub fn is_playable(self) -> bool {
        matches!(self.kind, CellKind::Empty | CellKind::Letter)
    }
}

/// The inert rectangle reserved before layout begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockerRect {
    pub row: usize,
    pub col: usize,
    pub height: usize,
    pub width: usize,
}

impl BlockerRect {
    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row >= self.row
            && row < self.row + self.height
            && col >= self.col
            && col < self.col + self.width
    }

    #[must_use]
    pub fn covers_origin(&self) -> bool {
        self.contains(0, 0)
    }
}

/// A registered slot: a maximal playable run of length >= 2, frozen by the
/// layout builder and read-only during fill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub start: GridCoord,
    pub direction: Direction,
    pub length: usize,
}

impl Slot {
    /// The coordinates of each cell of this slot, in slot order.
    #[must_use]
    pub fn cells(&self) -> Vec<GridCoord> {
        let (dr, dc) = self.direction.step();
        (0..self.length)
            .map(|i| {
                (
                    (self.start.0 as isize + dr * i as isize) as usize,
                    (self.start.1 as isize + dc * i as isize) as usize,
                )
            })
            .collect()
    }
}

/// A maximal run of playable cells read from the live grid.
#[derive(Debug, Clone)]
pub struct RunShape {
    pub start: GridCoord,
    pub direction: Direction,
    pub cells: Vec<GridCoord>,
}

impl RunShape {
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Token returned by `snapshot`, consumed by `rollback` or `commit`.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotToken(usize);

pub struct Grid {
    height: usize,
    width: usize,
    cells: Vec<Cell>,
    /// Stack of sparse undo frames; each frame records the prior value of
    /// every cell first touched while that frame was open.
    journal: Vec<Vec<(usize, Cell)>>,
    blocker: Option<BlockerRect>,
}

impl Grid {
    #[must_use]
    pub fn new(height: usize, width: usize) -> Grid {
        Grid {
            height,
            width,
            cells: vec![Cell::EMPTY; height * width],
            journal: Vec::new(),
            blocker: None,
        }
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn blocker(&self) -> Option<BlockerRect> {
        self.blocker
    }

    #[must_use]
    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.height && col < self.width
    }

    /// Apply a signed offset to a coordinate, returning `None` off-grid.
    #[must_use]
    pub fn offset(&self, coord: GridCoord, dr: isize, dc: isize) -> Option<GridCoord> {
        let row = coord.0 as isize + dr;
        let col = coord.1 as isize + dc;
        if row >= 0 && col >= 0 && (row as usize) < self.height && (col as usize) < self.width {
            Some((row as usize, col as usize))
        } else {
            None
        }
    }

    fn idx(&self, row: usize, col: usize) -> usize {
        debug_assert!(self.in_bounds(row, col));
        row * self.width + col
    }

    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        self.cells[self.idx(row, col)]
    }

    #[must_use]
    pub fn kind(&self, row: usize, col: usize) -> CellKind {
        self.cell(row, col).kind
    }

    #[must_use]
    pub fn letter(&self, row: usize, col: usize) -> Option<Letter> {
        self.cell(row, col).letter
    }

    fn set_cell(&mut self, row: usize, col: usize, cell: Cell) {
        let idx = self.idx(row, col);
        if let Some(frame) = self.journal.last_mut() {
            if !frame.iter().any(|&(recorded, _)| recorded == idx) {
                frame.push((idx, self.cells[idx]));
            }
        }
        self.cells[idx] = cell;
    }

    // ------------------------------------------------------------------
    // Snapshots
    // ------------------------------------------------------------------

    /// Open a new undo frame; mutations are recorded sparsely until the frame
    /// is rolled back or committed.
    pub fn snapshot(&mut self) -> SnapshotToken {
        self.journal.push(Vec::new());
        SnapshotToken(self.journal.len() - 1)
    }

    /// Undo every mutation made since (and including) the given frame.
    pub fn rollback(&mut self, token: SnapshotToken) {
        while self.journal.len() > token.0 {
            let frame = self.journal.pop().expect("journal frame");
            for (idx, cell) in frame.into_iter().rev() {
                self.cells[idx] = cell;
            }
        }
    }

    /// Keep every mutation made since the given frame, folding the undo
    /// records into the enclosing frame so outer rollbacks stay correct.
    pub fn commit(&mut self, token: SnapshotToken) {
        while self.journal.len() > token.0 {
            let frame = self.journal.pop().expect("journal frame");
            if let Some(parent) = self.journal.last_mut() {
                for (idx, cell) in frame {
                    if !parent.iter().any(|&(recorded, _)| recorded == idx) {
                        parent.push((idx, cell));
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    /// Mark the rectangle as a blocker zone and plant the licensing clue
    /// boxes its position forces: the top-left cell when it stays playable,
    /// or the cells just past a top-left blocker's edges.
    pub fn set_blocker(&mut self, rect: BlockerRect) -> Result<(), Error> {
        if rect.height == 0
            || rect.width == 0
            || rect.row + rect.height > self.height
            || rect.col + rect.width > self.width
        {
            return Err(Error::BlockerOutOfBounds(format!(
                "{}x{} at ({}, {}) does not fit a {}x{} grid",
                rect.height, rect.width, rect.row, rect.col, self.height, self.width
            )));
        }

        let token = self.snapshot();
        let previous_blocker = self.blocker;

        for row in rect.row..rect.row + rect.height {
            for col in rect.col..rect.col + rect.width {
                self.set_cell(
                    row,
                    col,
                    Cell {
                        kind: CellKind::Blocker,
                        letter: None,
                    },
                );
            }
        }
        self.blocker = Some(rect);

        if rect.covers_origin() {
            // Each forced cell is attempted on its own; one refusing doesn't
            // stop the other.
            let right = rect.width < self.width && self.place_clue_box(0, rect.width).is_ok();
            let below = rect.height < self.height && self.place_clue_box(rect.height, 0).is_ok();
            if !right && !below {
                self.rollback(token);
                self.blocker = previous_blocker;
                return Err(Error::InvalidConfig(
                    "blocker covers the top-left corner and leaves no cell to license it".into(),
                ));
            }
        } else if self.kind(0, 0) == CellKind::Empty {
            if let Err(e) = self.place_clue_box(0, 0) {
                self.rollback(token);
                self.blocker = previous_blocker;
                return Err(Error::InvalidConfig(e.to_string()));
            }
        }

        self.commit(token);
        Ok(())
    }

    /// Would a clue box at this position satisfy the structural rules?
    #[must_use]
    pub fn can_place_clue_box(&self, row: usize, col: usize) -> bool {
        if !self.in_bounds(row, col) || self.kind(row, col) != CellKind::Empty {
            return false;
        }
        if row + 2 >= self.height && col + 2 >= self.width {
            return false;
        }
        !self.orthogonal_neighbors(row, col).iter().any(|&(r, c)| {
            self.kind(r, c) == CellKind::ClueBox
        })
    }

    pub fn place_clue_box(&mut self, row: usize, col: usize) -> Result<(), ClueBoxError> {
        if !self.in_bounds(row, col) {
            return Err(ClueBoxError::OutOfBounds(row, col));
        }
        if self.kind(row, col) != CellKind::Empty {
            return Err(ClueBoxError::Occupied(row, col));
        }
        if row + 2 >= self.height && col + 2 >= self.width {
            return Err(ClueBoxError::CornerZone(row, col));
        }
        if self
            .orthogonal_neighbors(row, col)
            .iter()
            .any(|&(r, c)| self.kind(r, c) == CellKind::ClueBox)
        {
            return Err(ClueBoxError::Adjacency(row, col));
        }
        self.set_cell(
            row,
            col,
            Cell {
                kind: CellKind::ClueBox,
                letter: None,
            },
        );
        Ok(())
    }

    pub fn place_letter(&mut self, row: usize, col: usize, letter: Letter) -> Result<(), PlacementError> {
        if !self.in_bounds(row, col) {
            return Err(PlacementError::OutOfBounds(row, col));
        }
        match self.cell(row, col) {
            Cell {
                kind: CellKind::Empty,
                ..
            } => {
                self.set_cell(
                    row,
                    col,
                    Cell {
                        kind: CellKind::Letter,
                        letter: Some(letter),
                    },
                );
                Ok(())
            }
            Cell {
                kind: CellKind::Letter,
                letter: Some(existing),
            } if existing == letter => Ok(()),
            Cell {
                kind: CellKind::Letter,
                ..
            } => Err(PlacementError::Conflict(row, col)),
            _ => Err(PlacementError::NotPlayable(row, col)),
        }
    }

    // ------------------------------------------------------------------
    // Run scanning
    // ------------------------------------------------------------------

    fn orthogonal_neighbors(&self, row: usize, col: usize) -> Vec<GridCoord> {
        [(0, 1), (1, 0), (0, -1), (-1, 0)]
            .iter()
            .filter_map(|&(dr, dc)| self.offset((row, col), dr, dc))
            .collect()
    }

    /// The maximal playable run containing `(row, col)` in the given
    /// direction, or `None` if the cell itself isn't playable.
    #[must_use]
    pub fn maximal_run(&self, row: usize, col: usize, direction: Direction) -> Option<RunShape> {
        if !self.cell(row, col).is_playable() {
            return None;
        }
        let (dr, dc) = direction.step();

        let mut start = (row, col);
        while let Some(prev) = self.offset(start, -dr, -dc) {
            if self.cell(prev.0, prev.1).is_playable() {
                start = prev;
            } else {
                break;
            }
        }

        let mut cells = Vec::new();
        let mut cursor = start;
        loop {
            cells.push(cursor);
            match self.offset(cursor, dr, dc) {
                Some(next) if self.cell(next.0, next.1).is_playable() => cursor = next,
                _ => break,
            }
        }

        Some(RunShape {
            start,
            direction,
            cells,
        })
    }

    /// Is `(row, col)` the first cell of a playable run in this direction?
    #[must_use]
    pub fn is_run_start(&self, row: usize, col: usize, direction: Direction) -> bool {
        if !self.cell(row, col).is_playable() {
            return false;
        }
        let (dr, dc) = direction.step();
        match self.offset((row, col), -dr, -dc) {
            Some(prev) => !self.cell(prev.0, prev.1).is_playable(),
            None => true,
        }
    }

    /// All maximal runs of length >= 2 in reading order, across before down.
    #[must_use]
    pub fn register_slots(&self) -> Vec<Slot> {
        let mut slots = Vec::new();
        for direction in [Direction::Across, Direction::Down] {
            for row in 0..self.height {
                for col in 0..self.width {
                    if !self.is_run_start(row, col, direction) {
                        continue;
                    }
                    let run = self
                        .maximal_run(row, col, direction)
                        .expect("run start is playable");
                    if run.len() >= 2 {
                        slots.push(Slot {
                            id: slots.len(),
                            start: run.start,
                            direction,
                            length: run.len(),
                        });
                    }
                }
            }
        }
        slots
    }

    /// The `(position, letter)` constraints currently visible along the given
    /// cells.
    #[must_use]
    pub fn fixed_letters(&self, cells: &[GridCoord]) -> Vec<(usize, Letter)> {
        cells
            .iter()
            .enumerate()
            .filter_map(|(i, &(r, c))| self.letter(r, c).map(|letter| (i, letter)))
            .collect()
    }

    /// The word spelled by the cells, if every cell holds a letter.
    #[must_use]
    pub fn read_word(&self, cells: &[GridCoord]) -> Option<String> {
        cells
            .iter()
            .map(|&(r, c)| self.letter(r, c).map(letter_to_char))
            .collect()
    }

    /// Does the run starting here have a clue box at a direction-legal
    /// offset?
    #[must_use]
    pub fn licensed(&self, start: GridCoord, direction: Direction) -> bool {
        direction.clue_offsets().iter().any(|&(dr, dc)| {
            self.offset(start, dr, dc)
                .map_or(false, |(r, c)| self.kind(r, c) == CellKind::ClueBox)
        })
    }

    /// Does the clue box at `(row, col)` license at least one run of length
    /// >= 2?
    #[must_use]
    pub fn clue_box_licenses_slot(&self, row: usize, col: usize) -> bool {
        for direction in [Direction::Across, Direction::Down] {
            for &(dr, dc) in &direction.clue_offsets() {
                // A box at a licensing offset of a start means the start sits
                // at the inverse offset of the box.
                let Some(start) = self.offset((row, col), -dr, -dc) else {
                    continue;
                };
                if !self.is_run_start(start.0, start.1, direction) {
                    continue;
                }
                if self
                    .maximal_run(start.0, start.1, direction)
                    .map_or(false, |run| run.len() >= 2)
                {
                    return true;
                }
            }
        }
        false
    }

    #[must_use]
    pub fn playable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_playable()).count()
    }

    #[must_use]
    pub fn letter_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| c.kind == CellKind::Letter)
            .count()
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Check the structural rules. Dictionary validity is the sealer's job.
    pub fn validate_structure(&self) -> Result<(), Error> {
        // No clue box touches another orthogonally.
        for row in 0..self.height {
            for col in 0..self.width {
                if self.kind(row, col) != CellKind::ClueBox {
                    continue;
                }
                for (nr, nc) in self.orthogonal_neighbors(row, col) {
                    if self.kind(nr, nc) == CellKind::ClueBox {
                        return Err(Error::InvariantViolation {
                            invariant: Invariant::ClueBoxAdjacency,
                            detail: format!("clue boxes at ({row}, {col}) and ({nr}, {nc})"),
                        });
                    }
                }
            }
        }

        // Corner licensing. Every forced cell past a top-left blocker's
        // edges that exists in the grid must hold a clue box.
        match self.blocker {
            Some(rect) if rect.covers_origin() => {
                let right_ok =
                    rect.width >= self.width || self.kind(0, rect.width) == CellKind::ClueBox;
                let below_ok =
                    rect.height >= self.height || self.kind(rect.height, 0) == CellKind::ClueBox;
                if !(right_ok && below_ok) {
                    return Err(Error::InvariantViolation {
                        invariant: Invariant::CornerLicensing,
                        detail: format!(
                            "forced cell (0, {}) or ({}, 0) past the top-left blocker is not a clue box",
                            rect.width, rect.height
                        ),
                    });
                }
            }
            _ => {
                if self.kind(0, 0) != CellKind::ClueBox {
                    return Err(Error::InvariantViolation {
                        invariant: Invariant::CornerLicensing,
                        detail: "top-left cell is not a clue box".into(),
                    });
                }
            }
        }

        // Bottom-right 2x2 region stays free of clue boxes.
        for row in self.height.saturating_sub(2)..self.height {
            for col in self.width.saturating_sub(2)..self.width {
                if self.kind(row, col) == CellKind::ClueBox {
                    return Err(Error::InvariantViolation {
                        invariant: Invariant::BottomRightZone,
                        detail: format!("clue box at ({row}, {col})"),
                    });
                }
            }
        }

        // Every slot is licensed.
        for slot in self.register_slots() {
            if !self.licensed(slot.start, slot.direction) {
                return Err(Error::InvariantViolation {
                    invariant: Invariant::SlotLicensing,
                    detail: format!(
                        "{} run of length {} at ({}, {})",
                        slot.direction, slot.length, slot.start.0, slot.start.1
                    ),
                });
            }
        }

        // Every clue box earns its keep.
        for row in 0..self.height {
            for col in 0..self.width {
                if self.kind(row, col) == CellKind::ClueBox
                    && !self.clue_box_licenses_slot(row, col)
                {
                    return Err(Error::InvariantViolation {
                        invariant: Invariant::ClueBoxUtility,
                        detail: format!("clue box at ({row}, {col}) licenses nothing"),
                    });
                }
            }
        }

        Ok(())
    }

    /// ASCII rendering for logs and tests: letters as themselves, `#` for
    /// clue boxes, `~` for blockers, `.` for empty cells.
    #[must_use]
    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in 0..self.height {
            for col in 0..self.width {
                let cell = self.cell(row, col);
                let ch = match cell.kind {
                    CellKind::Empty => '.',
                    CellKind::Letter => cell.letter.map_or('?', letter_to_char),
                    CellKind::ClueBox => '#',
                    CellKind::Blocker => '~',
                };
                out.push(ch);
            }
            if row + 1 < self.height {
                out.push('\n');
            }
        }
        out
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::types::{letters_of, Direction};
    use indoc::indoc;

    /// Build a grid from an ASCII template: `#` clue box, `~` blocker, `.`
    /// empty, letters as themselves. Blocker rectangles aren't reconstructed,
    /// so corner validation in these fixtures relies on (0, 0).
    #[must_use]
    pub fn grid_from_template(template: &str) -> Grid {
        let lines: Vec<&str> = template
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();
        let height = lines.len();
        let width = lines[0].len();
        let mut grid = Grid::new(height, width);
        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.chars().enumerate() {
                match ch {
                    '.' => {}
                    '#' => {
                        grid.set_cell(
                            row,
                            col,
                            Cell {
                                kind: CellKind::ClueBox,
                                letter: None,
                            },
                        );
                    }
                    '~' => {
                        grid.set_cell(
                            row,
                            col,
                            Cell {
                                kind: CellKind::Blocker,
                                letter: None,
                            },
                        );
                    }
                    letter => {
                        let id = crate::types::letter_from_char(letter.to_ascii_uppercase())
                            .expect("template letter");
                        grid.set_cell(
                            row,
                            col,
                            Cell {
                                kind: CellKind::Letter,
                                letter: Some(id),
                            },
                        );
                    }
                }
            }
        }
        grid
    }

    #[test]
    fn test_clue_box_adjacency_rejected() {
        let mut grid = Grid::new(5, 5);
        grid.place_clue_box(0, 0).unwrap();
        assert!(matches!(
            grid.place_clue_box(0, 1),
            Err(ClueBoxError::Adjacency(0, 1))
        ));
        assert!(matches!(
            grid.place_clue_box(1, 0),
            Err(ClueBoxError::Adjacency(1, 0))
        ));
        // Diagonal contact is allowed.
        grid.place_clue_box(1, 1).unwrap();
    }

    #[test]
    fn test_corner_zone_rejected() {
        let mut grid = Grid::new(6, 7);
        assert!(matches!(
            grid.place_clue_box(4, 5),
            Err(ClueBoxError::CornerZone(4, 5))
        ));
        assert!(matches!(
            grid.place_clue_box(5, 6),
            Err(ClueBoxError::CornerZone(5, 6))
        ));
        grid.place_clue_box(4, 4).unwrap();
        grid.place_clue_box(3, 5).unwrap();
    }

    #[test]
    fn test_place_letter_rules() {
        let mut grid = Grid::new(4, 4);
        grid.place_letter(1, 1, 0).unwrap();
        // Re-placing the same letter is fine; a different one conflicts.
        grid.place_letter(1, 1, 0).unwrap();
        assert!(matches!(
            grid.place_letter(1, 1, 1),
            Err(PlacementError::Conflict(1, 1))
        ));
        grid.place_clue_box(0, 0).unwrap();
        assert!(matches!(
            grid.place_letter(0, 0, 2),
            Err(PlacementError::NotPlayable(0, 0))
        ));
    }

    #[test]
    fn test_snapshot_rollback_and_commit() {
        let mut grid = Grid::new(4, 4);
        grid.place_letter(0, 0, 0).unwrap();

        let outer = grid.snapshot();
        grid.place_letter(0, 1, 1).unwrap();

        let inner = grid.snapshot();
        grid.place_letter(0, 2, 2).unwrap();
        grid.rollback(inner);
        assert_eq!(grid.kind(0, 2), CellKind::Empty);
        assert_eq!(grid.letter(0, 1), Some(1));

        let inner = grid.snapshot();
        grid.place_letter(0, 3, 3).unwrap();
        grid.commit(inner);
        assert_eq!(grid.letter(0, 3), Some(3));

        // Outer rollback undoes committed inner changes too.
        grid.rollback(outer);
        assert_eq!(grid.kind(0, 1), CellKind::Empty);
        assert_eq!(grid.kind(0, 3), CellKind::Empty);
        assert_eq!(grid.letter(0, 0), Some(0));
    }

    #[test]
    fn test_maximal_run_and_slots() {
        let grid = grid_from_template(indoc! {"
            #....
            .....
            ..#..
            .....
            .....
        "});
        let run = grid.maximal_run(0, 3, Direction::Across).unwrap();
        assert_eq!(run.start, (0, 1));
        assert_eq!(run.len(), 4);

        let run = grid.maximal_run(3, 2, Direction::Down).unwrap();
        assert_eq!(run.start, (3, 2));
        assert_eq!(run.len(), 2);

        assert!(grid.maximal_run(2, 2, Direction::Across).is_none());

        let slots = grid.register_slots();
        // Across: rows 1..5 full width, row 0 from col 1, row 2 split 2+2.
        let across: Vec<_> = slots
            .iter()
            .filter(|s| s.direction == Direction::Across)
            .collect();
        assert_eq!(across.len(), 6);
        // Ids are assigned in registration order.
        for (i, slot) in slots.iter().enumerate() {
            assert_eq!(slot.id, i);
        }
    }

    #[test]
    fn test_set_blocker_corner_licensing() {
        // Full-width top blocker: the right-edge cell is out of range, so the
        // box below the blocker is forced.
        let mut grid = Grid::new(20, 10);
        grid.set_blocker(BlockerRect {
            row: 0,
            col: 0,
            height: 5,
            width: 10,
        })
        .unwrap();
        assert_eq!(grid.kind(5, 0), CellKind::ClueBox);
        for col in 0..10 {
            assert_eq!(grid.kind(0, col), CellKind::Blocker);
            assert_eq!(grid.kind(4, col), CellKind::Blocker);
        }

        // A blocker elsewhere leaves the top-left clue box in place.
        let mut grid = Grid::new(10, 10);
        grid.set_blocker(BlockerRect {
            row: 6,
            col: 6,
            height: 3,
            width: 3,
        })
        .unwrap();
        assert_eq!(grid.kind(0, 0), CellKind::ClueBox);

        let mut grid = Grid::new(10, 10);
        assert!(matches!(
            grid.set_blocker(BlockerRect {
                row: 8,
                col: 0,
                height: 3,
                width: 3,
            }),
            Err(Error::BlockerOutOfBounds(_))
        ));
    }

    #[test]
    fn test_blocker_covering_whole_grid_is_invalid() {
        let mut grid = Grid::new(6, 6);
        assert!(matches!(
            grid.set_blocker(BlockerRect {
                row: 0,
                col: 0,
                height: 6,
                width: 6,
            }),
            Err(Error::InvalidConfig(_))
        ));
        // The failed application leaves no trace behind.
        assert!(grid.blocker().is_none());
        for row in 0..6 {
            for col in 0..6 {
                assert_eq!(grid.kind(row, col), CellKind::Empty);
            }
        }
    }

    #[test]
    fn test_blocker_plants_second_corner_when_first_is_blocked() {
        // The right-edge forced cell is occupied, so only the cell below the
        // blocker plants; application still tries both, but the validator
        // insists on every in-bounds forced cell.
        let mut grid = Grid::new(10, 10);
        grid.place_letter(0, 4, 0).unwrap();
        grid.set_blocker(BlockerRect {
            row: 0,
            col: 0,
            height: 4,
            width: 4,
        })
        .unwrap();

        assert_eq!(grid.kind(0, 4), CellKind::Letter);
        assert_eq!(grid.kind(4, 0), CellKind::ClueBox);

        let err = grid.validate_structure().unwrap_err();
        assert!(matches!(
            err,
            Error::InvariantViolation {
                invariant: Invariant::CornerLicensing,
                ..
            }
        ));
    }

    /// A hand-checked legal 5x6 layout.
    pub const LEGAL_TEMPLATE: &str = indoc! {"
        #AB#C#
        DEFGHI
        #JKLMN
        OPQRST
        #UVWXY
    "};

    #[test]
    fn test_validate_structure() {
        let grid = grid_from_template(LEGAL_TEMPLATE);
        grid.validate_structure().expect("fixture should validate");

        let mut broken = grid_from_template(LEGAL_TEMPLATE);
        broken.set_cell(
            1,
            0,
            Cell {
                kind: CellKind::ClueBox,
                letter: None,
            },
        );
        let err = broken.validate_structure().unwrap_err();
        assert!(matches!(
            err,
            Error::InvariantViolation {
                invariant: Invariant::ClueBoxAdjacency,
                ..
            }
        ));
    }

    #[test]
    fn test_validate_catches_unlicensed_slot() {
        // The down run at (0, 4) loses its licensing box when (0, 3) opens.
        let mut grid = grid_from_template(LEGAL_TEMPLATE);
        grid.set_cell(0, 3, Cell::EMPTY);
        let err = grid.validate_structure().unwrap_err();
        assert!(matches!(
            err,
            Error::InvariantViolation {
                invariant: Invariant::SlotLicensing,
                ..
            }
        ));
    }

    #[test]
    fn test_licensed_offsets() {
        let grid = grid_from_template(
            "#AB..
             CD...
             .....
             .....
             .....",
        );
        // Across run at (0, 1): box at its left.
        assert!(grid.licensed((0, 1), Direction::Across));
        // Down run at (1, 0): box above.
        assert!(grid.licensed((1, 0), Direction::Down));
        // Down run at (0, 1): box at its left.
        assert!(grid.licensed((0, 1), Direction::Down));
        assert!(!grid.licensed((3, 3), Direction::Across));
    }

    #[test]
    fn test_read_word_and_fixed_letters() {
        let grid = grid_from_template(
            "#AB
             .C.
             ...",
        );
        let cells = vec![(0, 1), (0, 2)];
        assert_eq!(grid.read_word(&cells), Some("AB".into()));
        assert_eq!(grid.fixed_letters(&cells), letters_of("AB")
            .unwrap()
            .into_iter()
            .enumerate()
            .collect::<Vec<_>>());
        let partial = vec![(1, 1), (1, 2)];
        assert_eq!(grid.read_word(&partial), None);
        assert_eq!(grid.fixed_letters(&partial), vec![(0, 2)]);
    }
}
