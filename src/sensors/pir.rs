//! PIR motion sensor driver.
//!
//! Thin wrapper over a digital input that also owns the start-up steps the
//! sensor needs: pull resistor calibration and the warm-up wait.
//!
//! Calibration is best-effort: with `--pud auto` the line is sampled for one
//! second on pull-down and flipped to pull-up if it never read high.  A PIR
//! that is legitimately idle-low the whole second is indistinguishable from
//! one that needs pull-up, so the result is logged, not trusted.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use log::{info, warn};

use crate::app::ports::{Clock, MotionSensor, Pull, PullSelect};
use crate::config::PullMode;
use crate::error::{Result, SensorError};

/// Sampling window for pull calibration.
pub const CALIBRATION_WINDOW_MS: u64 = 1000;
/// Gap between calibration samples, also the warm-up poll interval.
pub const SAMPLE_GAP_MS: u32 = 50;

pub struct PirSensor<P> {
    pin: P,
    pull: Pull,
}

impl<P> PirSensor<P>
where
    P: InputPin + PullSelect,
{
    /// Apply the initial pull for `mode` (pull-down for `Auto`).
    pub fn new(mut pin: P, mode: PullMode) -> Result<Self> {
        let pull = match mode {
            PullMode::Up => Pull::Up,
            PullMode::Down | PullMode::Auto => Pull::Down,
        };
        pin.select_pull(pull)?;
        Ok(Self { pin, pull })
    }

    pub fn pull(&self) -> Pull {
        self.pull
    }

    /// Run the auto pull heuristic.  No-op unless `mode` is `Auto`.
    pub fn calibrate(
        &mut self,
        mode: PullMode,
        clock: &dyn Clock,
        delay: &mut impl DelayNs,
    ) -> Result<Pull> {
        if mode != PullMode::Auto || self.pull != Pull::Down {
            return Ok(self.pull);
        }

        let started = clock.now_ms();
        let mut seen_high = false;
        while clock.now_ms().saturating_sub(started) < CALIBRATION_WINDOW_MS {
            seen_high |= self.is_motion();
            delay.delay_ms(SAMPLE_GAP_MS);
        }

        if !seen_high {
            self.pin.select_pull(Pull::Up)?;
            self.pull = Pull::Up;
            info!("PIR pull calibration: never high on pull-down, switched to pull-up (best effort)");
        } else {
            info!("PIR pull calibration: keeping pull-down");
        }
        Ok(self.pull)
    }

    /// Block for `secs` while the PIR settles, logging the countdown once a
    /// second.  Returns `false` if `abort` fired first.
    pub fn warm_up(
        &mut self,
        secs: u32,
        clock: &dyn Clock,
        delay: &mut impl DelayNs,
        abort: impl Fn() -> bool,
    ) -> bool {
        if secs == 0 {
            return true;
        }
        info!("PIR warm-up: waiting {secs}s");
        let end = clock.now_ms() + u64::from(secs) * 1000;
        let mut next_log = 0;
        loop {
            let now = clock.now_ms();
            if now >= end {
                break;
            }
            if abort() {
                warn!("PIR warm-up aborted");
                return false;
            }
            if now >= next_log {
                let level = if self.is_motion() { "HIGH" } else { "LOW" };
                info!("  ...{}s left (PIR={})", (end - now).div_ceil(1000), level);
                next_log = now + 1000;
            }
            delay.delay_ms(SAMPLE_GAP_MS);
        }
        info!("PIR sensor ready");
        true
    }
}

impl<P: InputPin> PirSensor<P> {
    /// Current line level.
    pub fn read(&mut self) -> Result<bool> {
        self.pin
            .is_high()
            .map_err(|_| SensorError::GpioReadFailed.into())
    }
}

impl<P: InputPin> MotionSensor for PirSensor<P> {
    /// A read error counts as "no motion".
    fn is_motion(&mut self) -> bool {
        self.read().unwrap_or_else(|e| {
            warn!("PIR read: {e}");
            false
        })
    }
}
