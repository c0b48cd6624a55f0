//! Slot-grid scheduler.
//!
//! A frame of `num_slots` equal slots, one task per slot, so each task runs
//! once per frame at a steady cadence.  The caller owns the loop: it asks
//! [`FrameScheduler::poll`] what to do, runs the task or sleeps, and asks
//! again.
//!
//! ```text
//!   frame = 4 × 50 ms
//!   ┌────────────┬────────────┬────────────┬──────────────────┐
//!   │ PowerPoll  │ PirSample  │ RangeTrack │ ActuatorHeartbeat│
//!   └────────────┴────────────┴────────────┴──────────────────┘
//!   0           50          100          150                200 ms
//! ```
//!
//! If the loop falls more than two slots behind (a long stall, a slow
//! task), the grid is re-phased to the current time instead of replaying
//! the missed slots one after another.

use log::{debug, info};

use crate::config::TrackingMode;

/// Slots shorter than this are stretched.
pub const MIN_SLOT_MS: u64 = 20;
/// A main frame never has fewer slots than this.
pub const MIN_SLOTS: usize = 4;
/// Longest single sleep handed back, so shutdown is noticed promptly.
pub const MAX_SLEEP_MS: u64 = 20;
/// Lag (in slots) that triggers a resync.
const RESYNC_LAG_SLOTS: u64 = 2;

// ═══════════════════════════════════════════════════════════════
//  Slot types
// ═══════════════════════════════════════════════════════════════

/// Work bound to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotTask {
    /// Throttled remote power-flag fetch.
    PowerPoll,
    /// Read the PIR and feed the presence machine.
    PirSample,
    /// One range measurement while tracking.
    RangeTrack,
    /// Cooldown expiry, latch apply, heartbeat log.
    ActuatorHeartbeat,
    /// Padding slot.
    Idle,
}

/// What the loop should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// Nothing due; sleep this many milliseconds (≤ [`MAX_SLEEP_MS`]).
    Sleep(u64),
    /// Run this task now.
    Run(SlotTask),
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

pub struct FrameScheduler {
    slots: Vec<SlotTask>,
    slot_ms: u64,
    start_ms: u64,
    next_slot_ms: u64,
    slot_index: usize,
    resyncs: u64,
}

impl FrameScheduler {
    /// Raw constructor: one slot per task, `slot_ms` clamped to
    /// [`MIN_SLOT_MS`].
    pub fn new(slot_ms: u64, tasks: &[SlotTask], start_ms: u64) -> Self {
        let slots = if tasks.is_empty() {
            vec![SlotTask::Idle]
        } else {
            tasks.to_vec()
        };
        Self {
            slots,
            slot_ms: slot_ms.max(MIN_SLOT_MS),
            start_ms,
            next_slot_ms: start_ms,
            slot_index: 0,
            resyncs: 0,
        }
    }

    /// The main-loop frame.  With background tracking the range slot is
    /// left idle; extra slots beyond the four tasks are idle padding.
    pub fn main_frame(slot_ms: u64, num_slots: usize, tracking: TrackingMode, start_ms: u64) -> Self {
        let range_slot = match tracking {
            TrackingMode::Slotted => SlotTask::RangeTrack,
            TrackingMode::Background => SlotTask::Idle,
        };
        let mut tasks = vec![
            SlotTask::PowerPoll,
            SlotTask::PirSample,
            range_slot,
            SlotTask::ActuatorHeartbeat,
        ];
        tasks.resize(num_slots.max(MIN_SLOTS), SlotTask::Idle);
        let sched = Self::new(slot_ms, &tasks, start_ms);
        info!(
            "scheduler: frame={}ms slot={}ms x {} slots (tracking {:?})",
            sched.frame_ms(),
            sched.slot_ms,
            sched.slots.len(),
            tracking
        );
        sched
    }

    /// Single-slot grid for a dedicated loop running one task at `period_ms`.
    pub fn periodic(period_ms: u64, task: SlotTask, start_ms: u64) -> Self {
        Self::new(period_ms, &[task], start_ms)
    }

    /// Decide what to do at `now_ms`.
    pub fn poll(&mut self, now_ms: u64) -> Poll {
        if now_ms < self.next_slot_ms {
            return Poll::Sleep((self.next_slot_ms - now_ms).min(MAX_SLEEP_MS));
        }

        let lag = now_ms - self.next_slot_ms;
        if lag > self.slot_ms * RESYNC_LAG_SLOTS {
            let elapsed_slots = (now_ms - self.start_ms) / self.slot_ms;
            self.slot_index = (elapsed_slots % self.slots.len() as u64) as usize;
            self.next_slot_ms = now_ms;
            self.resyncs += 1;
            debug!(
                "scheduler: {}ms behind, resync to slot {}",
                lag, self.slot_index
            );
        }

        let task = self.slots[self.slot_index];
        self.slot_index = (self.slot_index + 1) % self.slots.len();
        self.next_slot_ms += self.slot_ms;
        Poll::Run(task)
    }

    pub fn slot_ms(&self) -> u64 {
        self.slot_ms
    }

    pub fn frame_ms(&self) -> u64 {
        self.slot_ms * self.slots.len() as u64
    }

    pub fn slots(&self) -> &[SlotTask] {
        &self.slots
    }

    /// How many times the grid was re-phased.
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
