use embassy_time::Duration;
use embedded_hal::digital::PinState;

/// Named timeout profiles used by the command executor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub(crate) default: Duration,
    pub(crate) mode_change: Duration,
    pub(crate) power_off: Duration,
    pub(crate) operator: Duration,
    pub(crate) hang_up: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeouts {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            default: Duration::from_millis(500),
            mode_change: Duration::from_millis(3000),
            power_off: Duration::from_millis(1000),
            operator: Duration::from_millis(75000),
            hang_up: Duration::from_millis(90000),
        }
    }

    #[must_use]
    pub const fn default_timeout(mut self, timeout: Duration) -> Self {
        self.default = timeout;
        self
    }

    #[must_use]
    pub const fn mode_change(mut self, timeout: Duration) -> Self {
        self.mode_change = timeout;
        self
    }

    #[must_use]
    pub const fn power_off(mut self, timeout: Duration) -> Self {
        self.power_off = timeout;
        self
    }

    /// Network operator lookup (`AT+COPS?`) can take much longer than
    /// regular commands.
    #[must_use]
    pub const fn operator(mut self, timeout: Duration) -> Self {
        self.operator = timeout;
        self
    }

    #[must_use]
    pub const fn hang_up(mut self, timeout: Duration) -> Self {
        self.hang_up = timeout;
        self
    }
}

/// Hardware timing contract of the module.
///
/// The defaults match the SIM800 hardware design guide: a 100 ms PWRKEY
/// pulse, STATUS sampled every 500 ms with a 30 ms debounce, and settle
/// periods after power-on and reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Timing {
    pub(crate) poll_tick: Duration,
    pub(crate) status_interval: Duration,
    pub(crate) status_debounce: Duration,
    pub(crate) status_attempts: u32,
    pub(crate) pwrkey_pulse: Duration,
    pub(crate) pwrkey_release: Duration,
    pub(crate) power_on_wait: Duration,
    pub(crate) power_settle: Duration,
    pub(crate) reset_pulse: Duration,
    pub(crate) reboot_wait: Duration,
    pub(crate) sync_interval: Duration,
    pub(crate) sync_attempts: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self::new()
    }
}

impl Timing {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_tick: Duration::from_millis(10),
            status_interval: Duration::from_millis(500),
            status_debounce: Duration::from_millis(30),
            status_attempts: 21,
            pwrkey_pulse: Duration::from_millis(100),
            pwrkey_release: Duration::from_millis(1100),
            power_on_wait: Duration::from_secs(4),
            power_settle: Duration::from_secs(2),
            reset_pulse: Duration::from_millis(300),
            reboot_wait: Duration::from_secs(5),
            sync_interval: Duration::from_secs(1),
            sync_attempts: 11,
        }
    }

    /// Granularity at which the executor checks the transport for new lines.
    #[must_use]
    pub const fn poll_tick(mut self, tick: Duration) -> Self {
        self.poll_tick = tick;
        self
    }

    #[must_use]
    pub const fn status_probe(mut self, interval: Duration, debounce: Duration, attempts: u32) -> Self {
        self.status_interval = interval;
        self.status_debounce = debounce;
        self.status_attempts = attempts;
        self
    }

    #[must_use]
    pub const fn pwrkey_pulse(mut self, pulse: Duration, release: Duration) -> Self {
        self.pwrkey_pulse = pulse;
        self.pwrkey_release = release;
        self
    }

    #[must_use]
    pub const fn power_on_wait(mut self, wait: Duration) -> Self {
        self.power_on_wait = wait;
        self
    }

    #[must_use]
    pub const fn power_settle(mut self, settle: Duration) -> Self {
        self.power_settle = settle;
        self
    }

    #[must_use]
    pub const fn reset(mut self, pulse: Duration, reboot_wait: Duration) -> Self {
        self.reset_pulse = pulse;
        self.reboot_wait = reboot_wait;
        self
    }

    #[must_use]
    pub const fn sync_retry(mut self, interval: Duration, attempts: u32) -> Self {
        self.sync_interval = interval;
        self.sync_attempts = attempts;
        self
    }
}

/// Active levels of the control lines.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PinConfig {
    pub(crate) pwrkey_active: PinState,
    pub(crate) reset_active: PinState,
    pub(crate) status_active: PinState,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PinConfig {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pwrkey_active: PinState::High,
            reset_active: PinState::High,
            status_active: PinState::High,
        }
    }

    #[must_use]
    pub const fn pwrkey_active(mut self, level: PinState) -> Self {
        self.pwrkey_active = level;
        self
    }

    #[must_use]
    pub const fn reset_active(mut self, level: PinState) -> Self {
        self.reset_active = level;
        self
    }

    #[must_use]
    pub const fn status_active(mut self, level: PinState) -> Self {
        self.status_active = level;
        self
    }
}

/// Configuration of the driver: timeouts, hardware timing and pin levels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Config {
    pub(crate) timeouts: Timeouts,
    pub(crate) timing: Timing,
    pub(crate) pins: PinConfig,
}

impl Config {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeouts: Timeouts::new(),
            timing: Timing::new(),
            pins: PinConfig::new(),
        }
    }

    #[must_use]
    pub const fn timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    #[must_use]
    pub const fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub const fn pins(mut self, pins: PinConfig) -> Self {
        self.pins = pins;
        self
    }
}

/// Whole milliseconds of `duration`, saturated to what a delay can wait.
pub(crate) fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(millis(config.timeouts.default), 500);
        assert!(config.timeouts.operator > config.timeouts.default);
        assert!(config.timeouts.power_off > config.timeouts.default);
        assert_eq!(config.timing.status_attempts, 21);
        assert_eq!(config.timing.sync_attempts, 11);
        assert_eq!(config.pins.pwrkey_active, PinState::High);
    }

    #[test]
    fn builder() {
        let config = Config::new()
            .timeouts(Timeouts::new().operator(Duration::from_secs(10)))
            .pins(PinConfig::new().reset_active(PinState::Low));

        assert_eq!(millis(config.timeouts.operator), 10_000);
        assert_eq!(config.pins.reset_active, PinState::Low);
        assert_eq!(config.timing, Timing::default());
    }
}
