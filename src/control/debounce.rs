//! Consecutive-sample debounce.
//!
//! Turns a noisy stream of "proximity satisfied" booleans into a single
//! confirmation once `required` qualifying samples arrive back to back.
//! Any non-qualifying sample starts the count over.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsecutiveFilter {
    required: u8,
    streak: u8,
}

impl ConsecutiveFilter {
    /// `required` is clamped to at least one sample.
    pub fn new(required: u8) -> Self {
        Self {
            required: required.max(1),
            streak: 0,
        }
    }

    /// Feed one sample.  Returns `true` once the streak reaches `required`.
    pub fn push(&mut self, qualifies: bool) -> bool {
        if qualifies {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.streak = 0;
        }
        self.streak >= self.required
    }

    pub fn reset(&mut self) {
        self.streak = 0;
    }

    pub fn streak(&self) -> u8 {
        self.streak
    }

    pub fn required(&self) -> u8 {
        self.required
    }
}
