use embassy_time::Duration;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use heapless::String;

use crate::config::{millis, Config, Timing};
use crate::device::Device;
use crate::error::Error;
use crate::handler::Handler;
use crate::helpers::LossyStr;
use crate::power::{ControlPins, PowerSequencer, PowerState};
use crate::responses::{
    BatteryStatus, FlowControl, Identity, SignalQuality, WorkingMode, IMEI_LEN, IMSI_LEN,
    MODULE_NAME_LEN, OPERATOR_LEN,
};
use crate::traits::Dce;
use crate::transport::Transport;

/// Driver for a SIMCom SIM800 module.
///
/// Wraps a generic [`Device`] with the SIM800 specific commands, and owns
/// the control lines needed to power the module up and recover it.
pub struct Sim800<T, D, PWR, RST, STS> {
    device: Device<T, D>,
    power: PowerSequencer<PWR, RST, STS>,
    timing: Timing,
    identity: Identity,
}

impl<T, D, PWR, RST, STS> Sim800<T, D, PWR, RST, STS>
where
    T: Transport,
    D: DelayNs,
    PWR: OutputPin,
    RST: OutputPin,
    STS: InputPin,
{
    pub fn new(
        transport: T,
        delay: D,
        pins: ControlPins<PWR, RST, STS>,
        config: Config,
    ) -> Result<Self, Error> {
        Ok(Self {
            device: Device::new(transport, delay, &config),
            power: PowerSequencer::new(pins, config.pins, config.timing)?,
            timing: config.timing,
            identity: Identity::default(),
        })
    }

    /// Bring the module into a known, communicating state and read its
    /// identity.
    ///
    /// If the module does not answer, it is reset through the RESET line and
    /// given a second chance. On any failure the driver is dropped together
    /// with the resources it owns.
    pub fn open(mut self) -> Result<Self, Error> {
        if !self.sync_retry() {
            info!("Module is not reachable");
            self.power.hardware_reset(self.device.delay_mut())?;

            if !self.power.probe(self.device.delay_mut())? {
                error!("Failed to open module, STATUS not active");
                return Err(Error::NotReachable);
            }

            if !self.sync_retry() {
                error!("Failed to open module, sync procedure not working");
                return Err(Error::Sync);
            }
        }

        self.device
            .set_echo(false)
            .inspect_err(|_| error!("Close echo mode failed"))?;

        self.identity.module_name = self
            .module_name()
            .inspect_err(|_| error!("Get module name failed"))?;
        self.identity.imei = self.imei().inspect_err(|_| error!("Get IMEI failed"))?;
        self.identity.imsi = self.imsi().inspect_err(|_| error!("Get IMSI failed"))?;
        self.identity.operator = self
            .operator_name()
            .inspect_err(|_| error!("Get operator name failed"))?;

        info!("Opened module {:?}", self.identity.module_name.as_str());
        Ok(self)
    }

    /// Sync, waiting `sync_interval` before each of at most `sync_attempts`
    /// tries.
    fn sync_retry(&mut self) -> bool {
        for attempt in 1..=self.timing.sync_attempts {
            self.device
                .delay_mut()
                .delay_ms(millis(self.timing.sync_interval));
            if self.device.sync().is_ok() {
                return true;
            }
            trace!("Sync attempt {} failed", attempt);
        }
        false
    }

    fn query_identity<const N: usize>(
        &mut self,
        command: &[u8],
        handler: impl FnOnce(&mut String<N>) -> Handler<'_>,
        timeout: Duration,
    ) -> Result<String<N>, Error> {
        let mut value = String::new();
        self.device.execute(command, handler(&mut value), timeout)?;

        if value.is_empty() {
            warn!("No value in response to {:?}", LossyStr(command));
            return Err(Error::InvalidResponse);
        }
        Ok(value)
    }

    /// Model identification, `AT+CGMM`
    pub fn module_name(&mut self) -> Result<String<MODULE_NAME_LEN>, Error> {
        let timeout = self.device.timeouts().default;
        let name = self.query_identity(b"AT+CGMM\r", |v| Handler::ModuleName(v), timeout)?;
        debug!("Get module name ok");
        Ok(name)
    }

    /// Serial number, `AT+CGSN`
    pub fn imei(&mut self) -> Result<String<IMEI_LEN>, Error> {
        let timeout = self.device.timeouts().default;
        let imei = self.query_identity(b"AT+CGSN\r", |v| Handler::Imei(v), timeout)?;
        debug!("Get imei number ok");
        Ok(imei)
    }

    /// Subscriber identity of the SIM, `AT+CIMI`
    pub fn imsi(&mut self) -> Result<String<IMSI_LEN>, Error> {
        let timeout = self.device.timeouts().default;
        let imsi = self.query_identity(b"AT+CIMI\r", |v| Handler::Imsi(v), timeout)?;
        debug!("Get imsi number ok");
        Ok(imsi)
    }

    /// Registered network operator, `AT+COPS?`
    ///
    /// Fails with [`Error::InvalidResponse`] while the module is not
    /// registered, as the response then carries no operator name.
    pub fn operator_name(&mut self) -> Result<String<OPERATOR_LEN>, Error> {
        let timeout = self.device.timeouts().operator;
        let name = self.query_identity(b"AT+COPS?\r", |v| Handler::Operator(v), timeout)?;
        debug!("Get operator name ok");
        Ok(name)
    }

    pub fn power_state(&self) -> PowerState {
        self.power.state()
    }

    pub fn device(&self) -> &Device<T, D> {
        &self.device
    }

    /// Tear down the driver, handing back the transport, delay and pins.
    pub fn release(self) -> (T, D, ControlPins<PWR, RST, STS>) {
        let (transport, delay) = self.device.release();
        (transport, delay, self.power.release())
    }
}

impl<T, D, PWR, RST, STS> Dce for Sim800<T, D, PWR, RST, STS>
where
    T: Transport,
    D: DelayNs,
    PWR: OutputPin,
    RST: OutputPin,
    STS: InputPin,
{
    fn sync(&mut self) -> Result<(), Error> {
        self.device.sync()
    }

    fn set_echo(&mut self, on: bool) -> Result<(), Error> {
        self.device.set_echo(on)
    }

    fn store_profile(&mut self) -> Result<(), Error> {
        self.device.store_profile()
    }

    fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), Error> {
        self.device.set_flow_control(flow_control)
    }

    fn define_pdp_context(&mut self, cid: u8, pdp_type: &str, apn: &str) -> Result<(), Error> {
        self.device.define_pdp_context(cid, pdp_type, apn)
    }

    fn hang_up(&mut self) -> Result<(), Error> {
        self.device.hang_up()
    }

    fn signal_quality(&mut self) -> Result<SignalQuality, Error> {
        let mut csq = None;
        let timeout = self.device.timeouts().default;
        self.device
            .execute(b"AT+CSQ\r", Handler::SignalQuality(&mut csq), timeout)
            .inspect_err(|_| error!("Inquire signal quality failed"))?;

        let csq = csq.ok_or_else(|| {
            warn!("No +CSQ line before OK");
            Error::InvalidResponse
        })?;
        debug!("Inquire signal quality ok");
        Ok(csq)
    }

    fn battery_status(&mut self) -> Result<BatteryStatus, Error> {
        let mut cbc = None;
        let timeout = self.device.timeouts().default;
        self.device
            .execute(b"AT+CBC\r", Handler::BatteryStatus(&mut cbc), timeout)
            .inspect_err(|_| error!("Inquire battery status failed"))?;

        let cbc = cbc.ok_or_else(|| {
            warn!("No +CBC line before OK");
            Error::InvalidResponse
        })?;
        debug!("Inquire battery status ok");
        Ok(cbc)
    }

    fn set_working_mode(&mut self, mode: WorkingMode) -> Result<(), Error> {
        let timeout = self.device.timeouts().mode_change;
        match mode {
            WorkingMode::Command => {
                self.device
                    .execute(b"+++", Handler::ExitDataMode, timeout)
                    .inspect_err(|_| error!("Enter command mode failed"))?;
                debug!("Enter command mode ok");
            }
            WorkingMode::Ppp => {
                self.device
                    .execute(b"ATD*99#\r", Handler::Dial, timeout)
                    .inspect_err(|_| error!("Enter ppp mode failed"))?;
                debug!("Enter ppp mode ok");
            }
            WorkingMode::Transition => {
                warn!("Unsupported working mode: {:?}", mode);
                return Err(Error::UnsupportedMode);
            }
        }
        self.device.set_mode(mode);
        Ok(())
    }

    fn power_up(&mut self) -> Result<(), Error> {
        self.power.power_up(self.device.delay_mut())
    }

    fn power_down(&mut self) -> Result<(), Error> {
        self.power.set_state(PowerState::PoweringDown);
        let timeout = self.device.timeouts().power_off;

        match self.device.execute(b"AT+CPOWD=1\r", Handler::PowerDown, timeout) {
            Ok(()) => {
                debug!("Power down ok");
                self.power.set_state(PowerState::Unpowered);
                Ok(())
            }
            Err(e) => {
                error!("Power down failed");
                self.power.set_state(PowerState::Unknown);
                Err(e)
            }
        }
    }

    fn mode(&self) -> WorkingMode {
        self.device.mode()
    }

    fn identity(&self) -> &Identity {
        &self.identity
    }
}
