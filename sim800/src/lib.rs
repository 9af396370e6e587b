//! Blocking driver for the SIMCom SIM800 GSM module.
//!
//! The driver talks to the module through a line oriented [`Transport`], and
//! controls its power through the PWRKEY, RESET and STATUS lines using the
//! `embedded-hal` digital traits.
//!
//! Every command is executed by [`Device::execute`], which sends the command
//! text and feeds each received line to a [`Handler`] until the handler
//! reports success or failure, or the timeout elapses. Query results are
//! written straight into typed structs owned by the caller.
//!
//! ### Bring-up example
//! ```ignore
//! use sim800::{prelude::*, Config, ControlPins, SerialTransport, Sim800, WorkingMode};
//!
//! let transport = SerialTransport::<_, 256>::new(uart);
//! let pins = ControlPins {
//!     pwrkey,
//!     reset,
//!     status,
//! };
//!
//! let mut modem = Sim800::new(transport, delay, pins, Config::default())?;
//! modem.power_up()?;
//! let mut modem = modem.open()?;
//!
//! let csq = modem.signal_quality()?;
//! modem.set_working_mode(WorkingMode::Ppp)?;
//! ```
//!
//! # Optional Cargo Features
//!
//! - **`log`** *(disabled by default)* - Log through the `log` facade,
//!   including every command sent and line received on the `TRACE` and
//!   `DEBUG` levels.
//! - **`defmt`** *(disabled by default)* - Log through `defmt`, and derive
//!   `defmt::Format` for the public types.
//! - **`std`** *(disabled by default)* - Enable the `std` features of the
//!   dependencies.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::module_name_repetitions)]

// This mod MUST go first, so that the others see its macros.
pub(crate) mod fmt;

mod config;
mod device;
mod error;
mod handler;
pub(crate) mod helpers;
mod parser;
mod power;
mod responses;
mod sim800;
mod traits;
mod transport;

#[cfg(test)]
mod mock;

pub use self::config::{Config, PinConfig, Timeouts, Timing};
pub use self::device::{Device, COMMAND_BUF_LEN, LINE_BUF_LEN};
pub use self::error::Error;
pub use self::handler::{CommandState, Handler};
pub use self::power::{ControlPins, PowerSequencer, PowerState};
pub use self::responses::{
    BatteryStatus, FlowControl, Identity, SignalQuality, WorkingMode, IMEI_LEN, IMSI_LEN,
    MODULE_NAME_LEN, OPERATOR_LEN,
};
pub use self::sim800::Sim800;
pub use self::traits::Dce;
pub use self::transport::{SerialTransport, Transport};

pub use embassy_time::Duration;

pub mod prelude {
    //! The prelude is a collection of all the traits in this crate
    //!
    //! The traits have been renamed to avoid collisions with other items when
    //! performing a glob import.
    pub use crate::Dce as _sim800_Dce;
    pub use crate::Transport as _sim800_Transport;
}
