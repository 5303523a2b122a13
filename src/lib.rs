//! Engine for generating dense "barred" crossword puzzles.
//!
//! Generation runs in two phases over a shared grid state machine: a layout
//! phase that decides which cells host letters and which host clue boxes, and
//! a constraint-satisfaction fill phase that assigns a dictionary word to
//! every slot the frozen layout induces. A retry orchestrator coordinates
//! both with a seeded RNG so that equal inputs reproduce equal puzzles.

pub mod dictionary;
pub mod error;
pub mod fill;
pub mod generator;
pub mod grid;
pub mod layout;
pub mod placer;
pub mod theme;
pub mod types;

pub const CHECK_INVARIANTS: bool = cfg!(feature = "check_invariants");

/// The expected maximum length for a single slot.
pub const MAX_SLOT_LENGTH: usize = 21;

/// The longest surface form the dictionary will accept.
pub const MAX_WORD_LENGTH: usize = 24;
