use crate::error::Error;
use crate::responses::{BatteryStatus, FlowControl, Identity, SignalQuality, WorkingMode};

/// Operations every supported modem (DCE) provides.
pub trait Dce {
    /// Check that the module answers `AT`
    fn sync(&mut self) -> Result<(), Error>;

    fn set_echo(&mut self, on: bool) -> Result<(), Error>;

    fn store_profile(&mut self) -> Result<(), Error>;

    fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), Error>;

    fn define_pdp_context(&mut self, cid: u8, pdp_type: &str, apn: &str) -> Result<(), Error>;

    fn hang_up(&mut self) -> Result<(), Error>;

    fn signal_quality(&mut self) -> Result<SignalQuality, Error>;

    fn battery_status(&mut self) -> Result<BatteryStatus, Error>;

    /// Switch between command mode and data mode. The recorded mode only
    /// changes if the module confirms the switch.
    fn set_working_mode(&mut self, mode: WorkingMode) -> Result<(), Error>;

    fn power_up(&mut self) -> Result<(), Error>;

    fn power_down(&mut self) -> Result<(), Error>;

    fn mode(&self) -> WorkingMode;

    fn identity(&self) -> &Identity;
}
