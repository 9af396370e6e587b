use core::fmt::Write as _;

use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use heapless::String;

use crate::config::{millis, Config, Timeouts};
use crate::error::Error;
use crate::handler::{CommandState, Handler};
use crate::helpers::LossyStr;
use crate::responses::{FlowControl, WorkingMode};
use crate::transport::Transport;

/// Longest response line handed to a line handler; longer lines are
/// truncated.
pub const LINE_BUF_LEN: usize = 128;

/// Capacity for formatted commands, eg. `AT+CGDCONT=...`.
pub const COMMAND_BUF_LEN: usize = 128;

/// Generic DCE handle: owns the transport and the delay provider, executes
/// commands and tracks the state of the current exchange.
pub struct Device<T, D> {
    transport: T,
    delay: D,
    timeouts: Timeouts,
    poll_tick: Duration,
    mode: WorkingMode,
    state: CommandState,
}

impl<T, D> Device<T, D>
where
    T: Transport,
    D: DelayNs,
{
    pub fn new(transport: T, delay: D, config: &Config) -> Self {
        Self {
            transport,
            delay,
            timeouts: config.timeouts,
            poll_tick: config.timing.poll_tick,
            mode: WorkingMode::Command,
            state: CommandState::Idle,
        }
    }

    /// Tear down the handle, handing back the transport and delay.
    pub fn release(self) -> (T, D) {
        (self.transport, self.delay)
    }

    /// State of the last command exchange
    pub fn state(&self) -> CommandState {
        self.state
    }

    pub fn mode(&self) -> WorkingMode {
        self.mode
    }

    pub(crate) fn set_mode(&mut self, mode: WorkingMode) {
        self.mode = mode;
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    pub(crate) fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Send `command` and feed every received line to `handler`, until the
    /// handler reports a terminal state or `timeout` has elapsed.
    ///
    /// Anything received before the command is sent is discarded, so late
    /// lines from a previous exchange cannot complete this one.
    pub fn execute(
        &mut self,
        command: &[u8],
        mut handler: Handler<'_>,
        timeout: Duration,
    ) -> Result<(), Error> {
        self.transport.clear();
        self.state = CommandState::Processing;

        debug!("Sending command: {:?}", LossyStr(command));
        if self.transport.send(command).is_err() {
            error!("Failed to send command {:?}", LossyStr(command));
            self.state = CommandState::Fail;
            return Err(Error::Write);
        }

        let tick = millis(self.poll_tick).max(1);
        let mut remaining = millis(timeout);
        let mut buf = [0; LINE_BUF_LEN];

        loop {
            match self.transport.read_line(&mut buf) {
                Ok(Some(len)) => {
                    let line = &buf[..len];
                    trace!("Received line: {:?}", LossyStr(line));

                    if let Some(state) = handler.handle_line(line) {
                        self.state = state;
                        return if state == CommandState::Success {
                            Ok(())
                        } else {
                            warn!("Command {:?} returned error", LossyStr(command));
                            Err(Error::Error)
                        };
                    }
                    continue;
                }
                Ok(None) => {}
                Err(_) => {
                    error!("Serial read error while waiting for {:?}", LossyStr(command));
                    self.state = CommandState::Fail;
                    return Err(Error::Read);
                }
            }

            if remaining == 0 {
                error!("Timeout waiting for response to {:?}", LossyStr(command));
                self.state = CommandState::Fail;
                return Err(Error::Timeout);
            }

            let step = tick.min(remaining);
            self.delay.delay_ms(step);
            remaining -= step;
        }
    }

    fn execute_generic(&mut self, command: &[u8], timeout: Duration) -> Result<(), Error> {
        self.execute(command, Handler::Generic, timeout)
    }

    /// Check that the module answers at all, `AT`
    pub fn sync(&mut self) -> Result<(), Error> {
        self.execute_generic(b"AT\r", self.timeouts.default)?;
        debug!("Sync ok");
        Ok(())
    }

    /// Enable or disable command echo, `ATE1`/`ATE0`
    pub fn set_echo(&mut self, on: bool) -> Result<(), Error> {
        let command: &[u8] = if on { b"ATE1\r" } else { b"ATE0\r" };
        self.execute_generic(command, self.timeouts.default)?;
        debug!("Set echo mode {} ok", on);
        Ok(())
    }

    /// Save the current settings to the user profile, `AT&W`
    pub fn store_profile(&mut self) -> Result<(), Error> {
        self.execute_generic(b"AT&W\r", self.timeouts.default)?;
        debug!("Save settings ok");
        Ok(())
    }

    pub fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), Error> {
        let mut command = String::<COMMAND_BUF_LEN>::new();
        let value = flow_control as u8;
        write!(command, "AT+IFC={},{}\r", value, value).map_err(|_| Error::Overflow)?;

        self.execute_generic(command.as_bytes(), self.timeouts.default)?;
        debug!("Set flow control {:?} ok", flow_control);
        Ok(())
    }

    /// Define PDP context `cid`, `AT+CGDCONT=<cid>,"<pdp_type>","<apn>"`
    pub fn define_pdp_context(&mut self, cid: u8, pdp_type: &str, apn: &str) -> Result<(), Error> {
        let mut command = String::<COMMAND_BUF_LEN>::new();
        write!(command, "AT+CGDCONT={},\"{}\",\"{}\"\r", cid, pdp_type, apn).map_err(|_| {
            error!("PDP context command does not fit {} bytes", COMMAND_BUF_LEN);
            Error::Overflow
        })?;

        self.execute_generic(command.as_bytes(), self.timeouts.default)?;
        debug!("Define pdp context ok");
        Ok(())
    }

    /// Hang up an ongoing call or data connection, `ATH`
    pub fn hang_up(&mut self) -> Result<(), Error> {
        self.execute_generic(b"ATH\r", self.timeouts.hang_up)?;
        debug!("Hang up ok");
        Ok(())
    }
}
