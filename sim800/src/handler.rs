use heapless::String;

use crate::helpers::{contains, copy_truncated};
use crate::parser;
use crate::responses::{
    BatteryStatus, SignalQuality, IMEI_LEN, IMSI_LEN, MODULE_NAME_LEN, OPERATOR_LEN,
};

pub(crate) const RESULT_CODE_SUCCESS: &[u8] = b"OK";
pub(crate) const RESULT_CODE_ERROR: &[u8] = b"ERROR";
pub(crate) const RESULT_CODE_CONNECT: &[u8] = b"CONNECT";
pub(crate) const RESULT_CODE_NO_CARRIER: &[u8] = b"NO CARRIER";
pub(crate) const RESULT_CODE_POWER_DOWN: &[u8] = b"POWER DOWN";

/// Start of every command, and so of every echoed command line.
const COMMAND_PREFIX: &[u8] = b"AT";

/// State of the current command exchange
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandState {
    /// No command issued yet
    #[default]
    Idle,
    /// Command sent, waiting for a terminal line
    Processing,
    Success,
    Fail,
}

impl CommandState {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }
}

/// Line handler for exactly one command invocation.
///
/// Each variant matches the response format of one command family. Variants
/// that extract data borrow the caller's result for the duration of the
/// exchange, so a handler can never outlive the command it was created for.
///
/// Data lines are recorded but never end the exchange; only the final result
/// code does, so every line of a response is consumed by its own command.
#[derive(Debug)]
pub enum Handler<'a> {
    /// `OK` / `ERROR`
    Generic,
    /// `+CSQ: <rssi>,<ber>`
    SignalQuality(&'a mut Option<SignalQuality>),
    /// `+CBC: <bcs>,<bcl>,<voltage>`
    BatteryStatus(&'a mut Option<BatteryStatus>),
    /// Response to `+++`. `NO CARRIER` means the link is already down, which
    /// is as good as leaving data mode.
    ExitDataMode,
    /// Response to `ATD*99#`
    Dial,
    ModuleName(&'a mut String<MODULE_NAME_LEN>),
    Imei(&'a mut String<IMEI_LEN>),
    Imsi(&'a mut String<IMSI_LEN>),
    /// `+COPS: <mode>[,<format>[,<oper>]]`
    Operator(&'a mut String<OPERATOR_LEN>),
    /// Only `POWER DOWN` completes the exchange; there is no failure line.
    PowerDown,
}

impl Handler<'_> {
    /// Feed one received line to the handler.
    ///
    /// Returns the terminal state if the line completes the exchange, or
    /// `None` if the exchange is still pending.
    pub fn handle_line(&mut self, line: &[u8]) -> Option<CommandState> {
        match self {
            Handler::Generic => result_code(line),
            Handler::SignalQuality(dst) => {
                if line.starts_with(b"+CSQ") {
                    if let Some(csq) = parser::signal_quality(line) {
                        **dst = Some(csq);
                    }
                    None
                } else {
                    result_code(line)
                }
            }
            Handler::BatteryStatus(dst) => {
                if line.starts_with(b"+CBC") {
                    if let Some(cbc) = parser::battery_status(line) {
                        **dst = Some(cbc);
                    }
                    None
                } else {
                    result_code(line)
                }
            }
            Handler::ExitDataMode => {
                if contains(line, RESULT_CODE_NO_CARRIER) {
                    Some(CommandState::Success)
                } else {
                    result_code(line)
                }
            }
            Handler::Dial => {
                if contains(line, RESULT_CODE_CONNECT) {
                    Some(CommandState::Success)
                } else if contains(line, RESULT_CODE_ERROR)
                    || contains(line, RESULT_CODE_NO_CARRIER)
                {
                    Some(CommandState::Fail)
                } else {
                    None
                }
            }
            Handler::ModuleName(dst) => identity_line(dst, line),
            Handler::Imei(dst) => identity_line(dst, line),
            Handler::Imsi(dst) => identity_line(dst, line),
            Handler::Operator(dst) => {
                if line.starts_with(b"+COPS") {
                    if let Some(name) = parser::operator_name(line) {
                        copy_truncated(dst, name);
                    }
                    None
                } else {
                    result_code(line)
                }
            }
            Handler::PowerDown => {
                contains(line, RESULT_CODE_POWER_DOWN).then_some(CommandState::Success)
            }
        }
    }
}

/// Generic result codes, matched anywhere in the line so that eg.
/// `+CME ERROR: 10` counts as `ERROR`.
fn result_code(line: &[u8]) -> Option<CommandState> {
    if contains(line, RESULT_CODE_SUCCESS) {
        Some(CommandState::Success)
    } else if contains(line, RESULT_CODE_ERROR) {
        Some(CommandState::Fail)
    } else {
        None
    }
}

/// Any line that is neither a result code nor the echo of the command is
/// the value itself.
fn identity_line<const N: usize>(dst: &mut String<N>, line: &[u8]) -> Option<CommandState> {
    let state = result_code(line);
    if state.is_none() && !line.starts_with(COMMAND_PREFIX) {
        if let Some(value) = parser::identity_value(line) {
            copy_truncated(dst, value);
        }
    }
    state
}
