//! Difficulty and streak progression for flashcard subjects.
//!
//! This module is the derived-state contract both the client and the backend
//! compute: correct-streak accumulation, longest-streak tracking, and
//! difficulty-tier advancement along an ordered threshold ladder. The
//! transition is a pure function over `(stats, answer outcome, ladder)` so it
//! can be tested in isolation from any network code.
//!
//! ## Rules
//!
//! - A correct answer increments `completed`, `correct`, and `correct_streak`,
//!   and raises `longest_streak` when the streak passes it
//! - An incorrect answer increments `completed` and resets `correct_streak`
//! - Crossing the next threshold advances the difficulty exactly one tier
//! - Tiers never regress; a streak reset touches only `correct_streak`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A difficulty tier definition: the streak count required to enter it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifficultyThreshold {
    pub code: String,
    pub label: String,
    /// Correct-answer streak required to enter this tier
    pub threshold: u32,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LadderError {
    #[error("Difficulty ladder cannot be empty")]
    Empty,
    #[error("Difficulty tier code cannot be empty")]
    EmptyCode,
    #[error("Difficulty thresholds must be strictly increasing: {found} after {previous}")]
    NonIncreasing { previous: u32, found: u32 },
}

/// An ordered list of difficulty tiers, validated on construction.
///
/// Thresholds are strictly increasing, so at most the first tier can sit at
/// streak 0.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultyLadder {
    tiers: Vec<DifficultyThreshold>,
}

impl DifficultyLadder {
    pub fn new(tiers: Vec<DifficultyThreshold>) -> Result<Self, LadderError> {
        if tiers.is_empty() {
            return Err(LadderError::Empty);
        }
        let mut previous: Option<u32> = None;
        for tier in &tiers {
            if tier.code.trim().is_empty() {
                return Err(LadderError::EmptyCode);
            }
            if let Some(prev) = previous {
                if tier.threshold <= prev {
                    return Err(LadderError::NonIncreasing {
                        previous: prev,
                        found: tier.threshold,
                    });
                }
            }
            previous = Some(tier.threshold);
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[DifficultyThreshold] {
        &self.tiers
    }

    /// Look up a tier by code
    pub fn tier(&self, code: &str) -> Option<&DifficultyThreshold> {
        self.tiers.iter().find(|t| t.code == code)
    }

    /// The tier entered at exactly this streak threshold
    fn tier_at_threshold(&self, threshold: u32) -> Option<usize> {
        self.tiers.iter().position(|t| t.threshold == threshold)
    }

    /// The first threshold above the given streak, if any tier remains
    fn next_threshold_above(&self, streak: u32) -> Option<u32> {
        self.tiers
            .iter()
            .map(|t| t.threshold)
            .find(|&threshold| threshold > streak)
    }
}

/// Per-subject difficulty and streak state for one (child, subject) pair.
///
/// Owned by the backend; the client computes the same transitions to reason
/// about what a dashboard must reflect after an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectFlashcardStats {
    #[serde(default)]
    pub correct: u32,
    #[serde(default)]
    pub correct_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default)]
    pub completed: u32,
    /// Current tier code; sticky once earned, never demoted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty_code: Option<String>,
    /// Streak at which the next tier is entered; absent at the top tier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_difficulty_at_streak: Option<u32>,
    /// Threshold that opened the current tier
    #[serde(default)]
    pub current_tier_start_at_streak: u32,
}

impl SubjectFlashcardStats {
    /// Initial state for a new (child, subject) pair.
    ///
    /// Starts in the lowest tier whose threshold is already met at streak 0,
    /// with the first unmet threshold queued as the next advancement.
    pub fn new(ladder: &DifficultyLadder) -> Self {
        let starting_tier = ladder.tiers().first().filter(|t| t.threshold == 0);
        Self {
            correct: 0,
            correct_streak: 0,
            longest_streak: 0,
            completed: 0,
            difficulty_code: starting_tier.map(|t| t.code.clone()),
            next_difficulty_at_streak: ladder.next_threshold_above(0),
            current_tier_start_at_streak: 0,
        }
    }

    /// Fold one flashcard answer outcome into the state.
    ///
    /// Pure transition: the input state is untouched and the ladder is only
    /// read. Advancement moves exactly one tier per answer, so a streak can
    /// never skip a tier.
    pub fn apply_answer(&self, correct: bool, ladder: &DifficultyLadder) -> Self {
        let mut next = self.clone();
        next.completed += 1;

        if !correct {
            next.correct_streak = 0;
            return next;
        }

        next.correct += 1;
        next.correct_streak += 1;
        next.longest_streak = next.longest_streak.max(next.correct_streak);

        if let Some(at) = next.next_difficulty_at_streak {
            if next.correct_streak >= at {
                if let Some(index) = ladder.tier_at_threshold(at) {
                    next.difficulty_code = Some(ladder.tiers()[index].code.clone());
                    next.current_tier_start_at_streak = at;
                    next.next_difficulty_at_streak =
                        ladder.tiers().get(index + 1).map(|t| t.threshold);
                }
            }
        }

        next
    }
}
