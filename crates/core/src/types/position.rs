//! Chapter positions and the single logical timeline of a multi-file book
//!
//! A book is a sequence of chapter files with known durations. A position is
//! the pair `(chapter index, offset within that chapter)`; everything else
//! (elapsed time, progress, completion) is derived from the durations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of the total duration after which a book counts as completed
pub const COMPLETION_THRESHOLD: f64 = 0.98;

/// Playback position inside a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub chapter: usize,
    pub offset_ms: u64,
}

impl Position {
    /// Start of the first chapter
    pub const START: Self = Self {
        chapter: 0,
        offset_ms: 0,
    };

    pub fn new(chapter: usize, offset_ms: u64) -> Self {
        Self { chapter, offset_ms }
    }

    /// True for any position other than the very start
    pub fn is_started(&self) -> bool {
        *self != Self::START
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}ms)", self.chapter, self.offset_ms)
    }
}

/// Result of a forward skip inside the current chapter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipOutcome {
    /// Seek within the chapter to this offset
    Seek(u64),
    /// The skip ran past the chapter end; move to the next chapter at 0
    NextChapter,
}

/// Computes the outcome of skipping forward by `amount_ms`.
///
/// The remainder past the end of the chapter is not carried over.
pub fn skip_forward(offset_ms: u64, amount_ms: u64, chapter_duration_ms: u64) -> SkipOutcome {
    let target = offset_ms.saturating_add(amount_ms);
    if target < chapter_duration_ms {
        SkipOutcome::Seek(target)
    } else {
        SkipOutcome::NextChapter
    }
}

/// Computes the offset after skipping backward by `amount_ms`, clamped to the
/// start of the current chapter.
pub fn skip_backward(offset_ms: u64, amount_ms: u64) -> u64 {
    offset_ms.saturating_sub(amount_ms)
}

/// Read-only view of a book's chapter durations
#[derive(Debug, Clone, Copy)]
pub struct Timeline<'a> {
    durations: &'a [u64],
}

impl<'a> Timeline<'a> {
    pub fn new(durations: &'a [u64]) -> Self {
        Self { durations }
    }

    /// Number of chapters
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Duration of a chapter, `None` when out of range
    pub fn chapter_duration(&self, chapter: usize) -> Option<u64> {
        self.durations.get(chapter).copied()
    }

    /// Sum of every chapter duration
    pub fn total_ms(&self) -> u64 {
        self.durations.iter().sum()
    }

    /// Time elapsed from the start of the book up to `position`
    pub fn elapsed_ms(&self, position: Position) -> u64 {
        let before: u64 = self.durations.iter().take(position.chapter).sum();
        before + position.offset_ms
    }

    /// Time left from `position` to the end of the book
    pub fn remaining_ms(&self, position: Position) -> u64 {
        self.total_ms().saturating_sub(self.elapsed_ms(position))
    }

    /// Whole-number progress percentage, floored. Zero for an empty timeline.
    pub fn progress_percent(&self, position: Position) -> u8 {
        let total = self.total_ms();
        if total == 0 {
            return 0;
        }
        let percent = self.elapsed_ms(position) as f64 / total as f64 * 100.0;
        percent.floor().clamp(0.0, 100.0) as u8
    }

    /// True once at least 98% of the book has been played
    pub fn is_completed(&self, position: Position) -> bool {
        let total = self.total_ms();
        if total == 0 {
            return false;
        }
        self.elapsed_ms(position) as f64 / total as f64 >= COMPLETION_THRESHOLD
    }

    /// True when the chapter exists and the offset does not pass its end
    pub fn contains(&self, position: Position) -> bool {
        self.chapter_duration(position.chapter)
            .is_some_and(|duration| position.offset_ms <= duration)
    }

    /// Brings a position inside the timeline
    pub fn clamp(&self, position: Position) -> Position {
        match self.durations.len() {
            0 => Position::START,
            len => {
                let chapter = position.chapter.min(len - 1);
                let offset_ms = position.offset_ms.min(self.durations[chapter]);
                Position { chapter, offset_ms }
            }
        }
    }

    /// Position at the very end of the last chapter
    pub fn end(&self) -> Position {
        match self.durations.last() {
            Some(&last) => Position::new(self.durations.len() - 1, last),
            None => Position::START,
        }
    }
}
