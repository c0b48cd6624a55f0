//! Indicator bank: every LED plus the optional buzzer, driven as one.
//!
//! The buzzer is gated through PWM at a low duty so it stays quiet while
//! following exactly the same on/off as the LEDs.
//!
//! Write failures are logged and otherwise ignored; the latch treats the
//! call as done so one bad pin cannot wedge the loop.

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::ActuatorPort;
use crate::error::ActuatorError;

pub struct IndicatorBank<L, B> {
    leds: Vec<L>,
    buzzer: Option<B>,
    buzzer_duty_percent: u8,
    lit: bool,
}

impl<L, B> IndicatorBank<L, B>
where
    L: OutputPin,
    B: SetDutyCycle,
{
    pub fn new(leds: Vec<L>, buzzer: Option<B>, buzzer_duty_percent: u8) -> Self {
        Self {
            leds,
            buzzer,
            buzzer_duty_percent: buzzer_duty_percent.min(100),
            lit: false,
        }
    }

    /// Last level written.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    fn write(&mut self, on: bool) -> Result<(), ActuatorError> {
        let mut result = Ok(());
        for led in &mut self.leds {
            let r = if on { led.set_high() } else { led.set_low() };
            if r.is_err() {
                result = Err(ActuatorError::GpioWriteFailed);
            }
        }
        if let Some(buzzer) = &mut self.buzzer {
            let r = if on && self.buzzer_duty_percent > 0 {
                buzzer.set_duty_cycle_percent(self.buzzer_duty_percent)
            } else {
                buzzer.set_duty_cycle_fully_off()
            };
            if r.is_err() {
                result = Err(ActuatorError::PwmWriteFailed);
            }
        }
        self.lit = on;
        result
    }
}

impl<L, B> ActuatorPort for IndicatorBank<L, B>
where
    L: OutputPin,
    B: SetDutyCycle,
{
    fn drive(&mut self, on: bool) {
        if let Err(e) = self.write(on) {
            warn!("indicator write failed: {e}");
        }
    }

    fn all_off(&mut self) {
        if let Err(e) = self.write(false) {
            warn!("indicator shutdown write failed: {e}");
        }
    }
}
