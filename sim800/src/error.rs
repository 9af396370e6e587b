/// Errors returned by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Serial write error
    Write,
    /// Serial read error
    Read,
    /// Timed out while waiting for a terminal response
    Timeout,
    /// The module answered with an error result code
    Error,
    /// The exchange completed, but without the data it was expected to carry
    InvalidResponse,
    /// Command did not fit the command buffer
    Overflow,
    /// Requested working mode cannot be entered through this driver
    UnsupportedMode,
    /// A GPIO line could not be driven or sampled
    Pin,
    /// STATUS never confirmed power, even after a power-on pulse
    PowerUp,
    /// STATUS never confirmed power after a hardware reset
    NotReachable,
    /// The module did not answer the sync procedure
    Sync,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Write => write!(f, "Serial write error"),
            Self::Read => write!(f, "Serial read error"),
            Self::Timeout => write!(f, "Timed out waiting for response"),
            Self::Error => write!(f, "Module returned ERROR"),
            Self::InvalidResponse => write!(f, "Invalid response from module"),
            Self::Overflow => write!(f, "Command buffer overflow"),
            Self::UnsupportedMode => write!(f, "Unsupported working mode"),
            Self::Pin => write!(f, "GPIO error"),
            Self::PowerUp => write!(f, "Failed to power up module"),
            Self::NotReachable => write!(f, "Module not reachable"),
            Self::Sync => write!(f, "Sync procedure failed"),
        }
    }
}

impl core::error::Error for Error {}
