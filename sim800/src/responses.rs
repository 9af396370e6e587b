//! Typed results of the SIM800 queries.

use heapless::String;

pub const MODULE_NAME_LEN: usize = 32;
pub const IMEI_LEN: usize = 15;
pub const IMSI_LEN: usize = 15;
pub const OPERATOR_LEN: usize = 32;

/// Signal quality report +CSQ
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    /// Received signal strength indication, 0..=31 or 99 if not detectable
    pub rssi: u32,
    /// Channel bit error rate, 0..=7 or 99 if not detectable
    pub ber: u32,
}

/// Battery charge +CBC
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BatteryStatus {
    /// Charge status: 0 not charging, 1 charging, 2 charging finished
    pub bcs: u32,
    /// Battery connection level in percent
    pub bcl: u32,
    /// Battery voltage in mV
    pub voltage: u32,
}

/// Identity strings read from the module during bring-up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Identity {
    pub module_name: String<MODULE_NAME_LEN>,
    pub imei: String<IMEI_LEN>,
    pub imsi: String<IMSI_LEN>,
    pub operator: String<OPERATOR_LEN>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WorkingMode {
    /// AT command mode
    #[default]
    Command,
    /// PPP data mode
    Ppp,
    /// Switching between modes, never a valid target
    Transition,
}

/// Local flow control, `AT+IFC=<dce_by_dte>,<dte_by_dce>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FlowControl {
    None = 0,
    Software = 1,
    Hardware = 2,
}
