//! HC-SR04 ultrasonic rangefinder driver.
//!
//! Pulses the trigger line, then busy-waits on the echo line with two
//! deadline-bounded loops (rise, then fall) so a disconnected or miswired
//! sensor degrades to a [`RangeFault`] instead of hanging the caller.
//!
//! Generic over `embedded-hal` 1.0 pin and delay traits; the Raspberry Pi
//! backend plugs in rppal pins, tests plug in scripted mocks.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};
use heapless::Vec;

use crate::app::ports::{Clock, RangeSensor};
use crate::error::RangeFault;

/// Speed of sound at room temperature.
pub const SPEED_OF_SOUND_CM_PER_S: f32 = 34_300.0;

/// Upper bound on samples per median call.
pub const MAX_MEDIAN_SAMPLES: usize = 9;

/// Pause between median samples so echoes from the previous ping die out.
const MEDIAN_GAP_MS: u32 = 10;

/// Convert an echo pulse width to centimetres, rounded to one decimal.
pub fn distance_from_pulse_us(pulse_us: u64) -> f32 {
    let secs = pulse_us as f32 / 1_000_000.0;
    let cm = secs * SPEED_OF_SOUND_CM_PER_S / 2.0;
    (cm * 10.0).round() / 10.0
}

/// Median of a non-empty slice (mean of the middle pair for even length).
fn median(values: &mut [f32]) -> f32 {
    values.sort_unstable_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

pub struct RangeFinder<T, E, D, C> {
    trigger: T,
    echo: E,
    delay: D,
    clock: C,
    echo_timeout_us: u64,
    min_cm: f32,
    max_cm: f32,
}

impl<T, E, D, C> RangeFinder<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: Clock,
{
    pub fn new(trigger: T, echo: E, delay: D, clock: C, echo_timeout_us: u64) -> Self {
        Self {
            trigger,
            echo,
            delay,
            clock,
            echo_timeout_us,
            min_cm: 2.0,
            max_cm: 400.0,
        }
    }

    /// Valid measuring window used by [`measure_median`](RangeSensor::measure_median).
    pub fn with_window(mut self, min_cm: f32, max_cm: f32) -> Self {
        self.min_cm = min_cm;
        self.max_cm = max_cm;
        self
    }

    fn pulse_trigger(&mut self) -> Result<(), RangeFault> {
        self.trigger.set_low().map_err(|_| RangeFault::PinError)?;
        self.delay.delay_us(2);
        self.trigger.set_high().map_err(|_| RangeFault::PinError)?;
        self.delay.delay_us(10);
        self.trigger.set_low().map_err(|_| RangeFault::PinError)
    }

    /// Spin until the echo line reaches `level` or `deadline_us` passes.
    /// Returns the time the level was seen.
    fn wait_for(&mut self, level: bool, deadline_us: u64) -> Result<Option<u64>, RangeFault> {
        loop {
            let now = self.clock.now_us();
            let high = self.echo.is_high().map_err(|_| RangeFault::PinError)?;
            if high == level {
                return Ok(Some(now));
            }
            if now >= deadline_us {
                return Ok(None);
            }
        }
    }
}

impl<T, E, D, C> RangeSensor for RangeFinder<T, E, D, C>
where
    T: OutputPin,
    E: InputPin,
    D: DelayNs,
    C: Clock,
{
    fn measure_once(&mut self) -> Result<f32, RangeFault> {
        self.pulse_trigger()?;

        let armed_at = self.clock.now_us();
        let rise = self
            .wait_for(true, armed_at + self.echo_timeout_us)?
            .ok_or(RangeFault::EchoLowTimeout)?;
        let fall = self
            .wait_for(false, rise + self.echo_timeout_us)?
            .ok_or(RangeFault::EchoHighTimeout)?;

        Ok(distance_from_pulse_us(fall.saturating_sub(rise)))
    }

    fn measure_median(&mut self, samples: usize) -> Result<f32, RangeFault> {
        let samples = samples.clamp(1, MAX_MEDIAN_SAMPLES);
        let mut good: Vec<f32, MAX_MEDIAN_SAMPLES> = Vec::new();
        let mut last_fault = None;

        for i in 0..samples {
            if i > 0 {
                self.delay.delay_ms(MEDIAN_GAP_MS);
            }
            match self.measure_once() {
                Ok(cm) if cm >= self.min_cm && cm <= self.max_cm => {
                    // Capacity equals the clamp above, so this cannot fail.
                    let _ = good.push(cm);
                }
                Ok(_) => {}
                Err(fault) => last_fault = Some(fault),
            }
        }

        if good.is_empty() {
            return Err(last_fault.unwrap_or(RangeFault::OutOfRange));
        }
        Ok(median(&mut good))
    }
}
