//! Raspberry Pi GPIO backend (rppal).
//!
//! Wraps rppal pins in small newtypes implementing the embedded-hal 1.0
//! traits the drivers are written against.  This is the only module that
//! touches real pins; everything above it is host-testable.
//!
//! | Newtype     | Trait(s)                 | Used by          |
//! |-------------|--------------------------|------------------|
//! | `PirPin`    | InputPin + PullSelect    | `PirSensor`      |
//! | `EchoPin`   | InputPin                 | `RangeFinder`    |
//! | `LinePin`   | OutputPin                | trigger, LEDs    |
//! | `BuzzerPin` | SetDutyCycle (soft PWM)  | `IndicatorBank`  |

use core::fmt;

use embedded_hal::digital::{self, ErrorKind as PinErrorKind, InputPin, OutputPin};
use embedded_hal::pwm::{self, ErrorKind as PwmErrorKind, SetDutyCycle};
use log::{error, info};
use rppal::gpio::{self, Gpio};

use crate::app::ports::{Pull, PullSelect};
use crate::config::PinAssignment;
use crate::error::{Error, Result, SensorError};

/// GPIO access failure on the Pi.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpioFault;

impl fmt::Display for GpioFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GPIO access failed")
    }
}

impl digital::Error for GpioFault {
    fn kind(&self) -> PinErrorKind {
        PinErrorKind::Other
    }
}

impl pwm::Error for GpioFault {
    fn kind(&self) -> PwmErrorKind {
        PwmErrorKind::Other
    }
}

fn claim(gpio: &Gpio, bcm: u8) -> Result<gpio::Pin> {
    gpio.get(bcm).map_err(|e| {
        error!("GPIO{bcm}: {e}");
        Error::Init("GPIO pin unavailable")
    })
}

// ── PIR input ────────────────────────────────────────────────

/// PIR input whose pull can be switched by re-claiming the pin.
pub struct PirPin {
    gpio: Gpio,
    bcm: u8,
    pin: Option<gpio::InputPin>,
}

impl PirPin {
    fn new(gpio: Gpio, bcm: u8) -> Self {
        Self {
            gpio,
            bcm,
            pin: None,
        }
    }
}

impl digital::ErrorType for PirPin {
    type Error = GpioFault;
}

impl InputPin for PirPin {
    fn is_high(&mut self) -> core::result::Result<bool, GpioFault> {
        self.pin.as_ref().map(gpio::InputPin::is_high).ok_or(GpioFault)
    }

    fn is_low(&mut self) -> core::result::Result<bool, GpioFault> {
        self.is_high().map(|h| !h)
    }
}

impl PullSelect for PirPin {
    fn select_pull(&mut self, pull: Pull) -> Result<()> {
        // Release first so rppal hands the pin out again.
        self.pin = None;
        let pin = self
            .gpio
            .get(self.bcm)
            .map_err(|_| SensorError::PullSelectFailed)?;
        self.pin = Some(match pull {
            Pull::Up => pin.into_input_pullup(),
            Pull::Down => pin.into_input_pulldown(),
        });
        info!("PIR GPIO{} pull-{:?}", self.bcm, pull);
        Ok(())
    }
}

// ── Echo input ───────────────────────────────────────────────

pub struct EchoPin(gpio::InputPin);

impl digital::ErrorType for EchoPin {
    type Error = GpioFault;
}

impl InputPin for EchoPin {
    fn is_high(&mut self) -> core::result::Result<bool, GpioFault> {
        Ok(self.0.is_high())
    }

    fn is_low(&mut self) -> core::result::Result<bool, GpioFault> {
        Ok(self.0.is_low())
    }
}

// ── Plain outputs ────────────────────────────────────────────

pub struct LinePin(gpio::OutputPin);

impl digital::ErrorType for LinePin {
    type Error = GpioFault;
}

impl OutputPin for LinePin {
    fn set_low(&mut self) -> core::result::Result<(), GpioFault> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), GpioFault> {
        self.0.set_high();
        Ok(())
    }
}

// ── Buzzer ───────────────────────────────────────────────────

/// Buzzer on rppal software PWM.  Duty is expressed in percent.
pub struct BuzzerPin {
    pin: gpio::OutputPin,
    freq_hz: f64,
}

impl pwm::ErrorType for BuzzerPin {
    type Error = GpioFault;
}

impl SetDutyCycle for BuzzerPin {
    fn max_duty_cycle(&self) -> u16 {
        100
    }

    fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), GpioFault> {
        if duty == 0 {
            self.pin.clear_pwm().map_err(|_| GpioFault)?;
            self.pin.set_low();
            return Ok(());
        }
        let fraction = f64::from(duty.min(100)) / 100.0;
        self.pin
            .set_pwm_frequency(self.freq_hz, fraction)
            .map_err(|_| GpioFault)
    }
}

// ── Board ────────────────────────────────────────────────────

/// Every pin the agent uses, claimed once at start-up.
pub struct Board {
    pub pir: PirPin,
    pub trigger: LinePin,
    pub echo: EchoPin,
    pub leds: Vec<LinePin>,
    pub buzzer: Option<BuzzerPin>,
}

impl Board {
    /// Claim every assigned pin.  Outputs start low.
    pub fn open(pins: &PinAssignment, buzzer_pwm_hz: f64) -> Result<Self> {
        let gpio = Gpio::new().map_err(|e| {
            error!("GPIO init: {e}");
            Error::Init("GPIO controller")
        })?;

        let trigger = LinePin(claim(&gpio, pins.trigger)?.into_output_low());
        let echo = EchoPin(claim(&gpio, pins.echo)?.into_input());
        let leds = pins
            .leds
            .iter()
            .map(|&bcm| claim(&gpio, bcm).map(|p| LinePin(p.into_output_low())))
            .collect::<Result<Vec<_>>>()?;
        let buzzer = match pins.buzzer {
            Some(bcm) => Some(BuzzerPin {
                pin: claim(&gpio, bcm)?.into_output_low(),
                freq_hz: buzzer_pwm_hz,
            }),
            None => None,
        };

        info!(
            "GPIO: PIR={} TRIG={} ECHO={} LED={:?} BUZZER={:?}",
            pins.pir, pins.trigger, pins.echo, pins.leds, pins.buzzer
        );
        Ok(Self {
            pir: PirPin::new(gpio, pins.pir),
            trigger,
            echo,
            leds,
            buzzer,
        })
    }
}
