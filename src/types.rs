use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An identifier for a slot, based on its index in the registered slot list.
pub type SlotId = usize;

/// An identifier for a word, scoped to the relevant length bucket.
pub type WordId = usize;

/// An identifier that fully specifies a word by including both its length and
/// `WordId`.
pub type GlobalWordId = (usize, WordId);

/// Zero-indexed row and column for a cell in the grid, row 0 at the top.
pub type GridCoord = (usize, usize);

/// A letter id in `0..ALPHABET`, where 0 is 'A'.
pub type Letter = u8;

/// Number of distinct letters; surfaces are normalized to A-Z before they
/// reach the engine.
pub const ALPHABET: usize = 26;

#[must_use]
pub fn letter_from_char(ch: char) -> Option<Letter> {
    if ch.is_ascii_uppercase() {
        Some(ch as u8 - b'A')
    } else {
        None
    }
}

#[must_use]
pub fn letter_to_char(letter: Letter) -> char {
    (b'A' + letter) as char
}

/// Decode a normalized surface into letter ids, rejecting anything outside
/// A-Z.
#[must_use]
pub fn letters_of(surface: &str) -> Option<Vec<Letter>> {
    surface.chars().map(letter_from_char).collect()
}

/// The direction that a slot is facing.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Across,
    Down,
}

impl Direction {
    /// Step taken from one cell of a run to the next.
    #[must_use]
    pub fn step(self) -> (isize, isize) {
        match self {
            Direction::Across => (0, 1),
            Direction::Down => (1, 0),
        }
    }

    #[must_use]
    pub fn perpendicular(self) -> Direction {
        match self {
            Direction::Across => Direction::Down,
            Direction::Down => Direction::Across,
        }
    }

    /// Offsets from a run's first cell at which a clue box may license it.
    /// Across runs accept a box at left, above or below; down runs accept a
    /// box above, at left or at right.
    #[must_use]
    pub fn clue_offsets(self) -> [(isize, isize); 3] {
        match self {
            Direction::Across => [(0, -1), (-1, 0), (1, 0)],
            Direction::Down => [(-1, 0), (0, -1), (0, 1)],
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Across => write!(f, "across"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// The four kinds of cell a grid position can hold.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    /// Undecided; will become a letter or a clue box.
    Empty,
    /// Holds exactly one letter, possibly shared by an across and a down word.
    Letter,
    /// Structural barrier and anchor for one or more word starts.
    ClueBox,
    /// Inert non-playable region.
    Blocker,
}

/// Requested difficulty tier for the fill.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Center of the tier on the difficulty-score axis, used by candidate
    /// ranking.
    #[must_use]
    pub fn center(self) -> f32 {
        match self {
            Difficulty::Easy => 0.15,
            Difficulty::Medium => 0.45,
            Difficulty::Hard => 0.80,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "EASY"),
            Difficulty::Medium => write!(f, "MEDIUM"),
            Difficulty::Hard => write!(f, "HARD"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EASY" => Ok(Difficulty::Easy),
            "MEDIUM" => Ok(Difficulty::Medium),
            "HARD" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letter_round_trip() {
        assert_eq!(letter_from_char('A'), Some(0));
        assert_eq!(letter_from_char('Z'), Some(25));
        assert_eq!(letter_from_char('a'), None);
        assert_eq!(letter_to_char(4), 'E');
        assert_eq!(letters_of("ARES"), Some(vec![0, 17, 4, 18]));
        assert_eq!(letters_of("AR-S"), None);
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!("HARD".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
