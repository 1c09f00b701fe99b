//! Level ladder used to space out reviews of a word.
//!
//! Each successful review promotes a word one level and pushes its next
//! review out by the interval of the level it was on.

use chrono::{DateTime, Duration, Utc};

/// Level assigned to a freshly added word.
pub const FIRST_LEVEL: u32 = 1;

/// Upper bound on a single interval (about a century).
pub const MAX_INTERVAL_DAYS: u32 = 36_500;

const LADDER: [u32; 4] = [1, 7, 16, 35];

/// Interval in days for a word sitting at `level`.
///
/// Levels 1 through 4 use fixed steps (1, 7, 16, 35). Beyond that each level
/// doubles the previous interval minus one day. Level 0 is treated as level 1.
#[must_use]
pub fn interval_days(level: u32) -> u32 {
    let level = level.max(FIRST_LEVEL);
    let idx = (level - 1) as usize;
    if let Some(days) = LADDER.get(idx) {
        return *days;
    }

    let mut days = LADDER[LADDER.len() - 1];
    for _ in LADDER.len()..=idx {
        days = days.saturating_mul(2).saturating_sub(1);
        if days >= MAX_INTERVAL_DAYS {
            return MAX_INTERVAL_DAYS;
        }
    }
    days
}

/// Review schedule for one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordSchedule {
    level: u32,
    next_review: DateTime<Utc>,
}

impl WordSchedule {
    /// A new word, due immediately.
    #[must_use]
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            level: FIRST_LEVEL,
            next_review: now,
        }
    }

    #[must_use]
    pub fn from_persisted(level: u32, next_review: DateTime<Utc>) -> Self {
        Self {
            level: level.max(FIRST_LEVEL),
            next_review,
        }
    }

    #[must_use]
    pub fn level(&self) -> u32 {
        self.level
    }

    #[must_use]
    pub fn next_review(&self) -> DateTime<Utc> {
        self.next_review
    }

    #[must_use]
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// Advances the word after a correct answer.
    pub fn promote(&mut self) {
        let delta = Duration::days(i64::from(interval_days(self.level)));
        self.next_review = self
            .next_review
            .checked_add_signed(delta)
            .unwrap_or(self.next_review);
        self.level = self.level.saturating_add(1);
    }

    /// Drops the word back to the first level, due at `now`.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        *self = Self::new(now);
    }
}
