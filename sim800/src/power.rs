use embassy_time::Duration;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin, PinState},
};

use crate::config::{millis, PinConfig, Timing};
use crate::error::Error;

/// The GPIO lines controlling the module.
pub struct ControlPins<PWR, RST, STS> {
    /// Power key, pulsed to switch the module on
    pub pwrkey: PWR,
    /// Hardware reset line
    pub reset: RST,
    /// Reads active while the module is powered
    pub status: STS,
}

/// Power state of the module, as far as the driver knows.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerState {
    #[default]
    Unknown,
    /// Waiting for STATUS to confirm power
    Probing,
    Powered,
    PowerFailed,
    PoweringDown,
    Unpowered,
}

/// Drives PWRKEY and RESET, and reads STATUS, following the module's
/// hardware timing.
pub struct PowerSequencer<PWR, RST, STS> {
    pins: ControlPins<PWR, RST, STS>,
    levels: PinConfig,
    timing: Timing,
    state: PowerState,
}

impl<PWR, RST, STS> PowerSequencer<PWR, RST, STS>
where
    PWR: OutputPin,
    RST: OutputPin,
    STS: InputPin,
{
    /// Take over the control lines. RESET is released immediately.
    pub fn new(
        pins: ControlPins<PWR, RST, STS>,
        levels: PinConfig,
        timing: Timing,
    ) -> Result<Self, Error> {
        let mut sequencer = Self {
            pins,
            levels,
            timing,
            state: PowerState::Unknown,
        };
        sequencer.set_reset(false)?;
        Ok(sequencer)
    }

    pub fn release(self) -> ControlPins<PWR, RST, STS> {
        self.pins
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: PowerState) {
        self.state = state;
    }

    fn set_pwrkey(&mut self, asserted: bool) -> Result<(), Error> {
        let level = active_level(self.levels.pwrkey_active, asserted);
        self.pins.pwrkey.set_state(level).map_err(|_| {
            error!("Failed to drive PWRKEY");
            Error::Pin
        })
    }

    fn set_reset(&mut self, asserted: bool) -> Result<(), Error> {
        let level = active_level(self.levels.reset_active, asserted);
        self.pins.reset.set_state(level).map_err(|_| {
            error!("Failed to drive RESET");
            Error::Pin
        })
    }

    fn status_active(&mut self) -> Result<bool, Error> {
        let high = self.pins.status.is_high().map_err(|_| {
            error!("Failed to read STATUS");
            Error::Pin
        })?;
        Ok(PinState::from(high) == self.levels.status_active)
    }

    /// Poll STATUS until it reads active twice in a row, `status_debounce`
    /// apart. Gives up after `status_attempts` polls.
    pub fn probe<D: DelayNs>(&mut self, delay: &mut D) -> Result<bool, Error> {
        self.state = PowerState::Probing;

        for _ in 0..self.timing.status_attempts {
            wait(delay, self.timing.status_interval);
            if !self.status_active()? {
                continue;
            }

            wait(delay, self.timing.status_debounce);
            if self.status_active()? {
                self.state = PowerState::Powered;
                return Ok(true);
            }
            trace!("STATUS glitch, still probing");
        }

        self.state = PowerState::PowerFailed;
        Ok(false)
    }

    /// Power-on pulse: PWRKEY is asserted for `pwrkey_pulse`, released for
    /// `pwrkey_release` and then left asserted.
    fn pulse_pwrkey<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        self.set_pwrkey(true)?;
        wait(delay, self.timing.pwrkey_pulse);
        self.set_pwrkey(false)?;
        wait(delay, self.timing.pwrkey_release);
        self.set_pwrkey(true)
    }

    /// Make sure the module is powered, pulsing PWRKEY if STATUS does not
    /// confirm it already is.
    pub fn power_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        if !self.probe(delay)? {
            info!("Module seems not powered on");
            self.pulse_pwrkey(delay)?;
            wait(delay, self.timing.power_on_wait);

            if !self.probe(delay)? {
                error!("Failed to power up module");
                return Err(Error::PowerUp);
            }
        }

        wait(delay, self.timing.power_settle);
        debug!("Module powered");
        Ok(())
    }

    /// Pulse RESET, then power the module back on and wait for it to boot.
    pub fn hardware_reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Error> {
        info!("Resetting module");
        self.state = PowerState::Unknown;

        self.set_reset(true)?;
        wait(delay, self.timing.reset_pulse);
        self.set_reset(false)?;

        wait(delay, self.timing.pwrkey_release);
        self.set_pwrkey(true)?;
        wait(delay, self.timing.reboot_wait);
        Ok(())
    }
}

fn active_level(active: PinState, asserted: bool) -> PinState {
    if asserted {
        active
    } else {
        !active
    }
}

fn wait<D: DelayNs>(delay: &mut D, duration: Duration) {
    delay.delay_ms(millis(duration));
}
