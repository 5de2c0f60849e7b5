//! Errors reported by the device holding the startup command

use core::fmt;

/// Failure of a [`Storage`](super::Storage) device.
///
/// These are the conditions a byte-addressed EEPROM, FRAM or emulated-EEPROM
/// driver runs into. Drivers with richer errors map them onto these so the
/// dispatcher can report them as [`crate::Error::Storage`].
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The access runs past the end of the device.
    OutOfBounds,
    /// The device did not return data.
    ReadError,
    /// The device did not accept data.
    WriteError,
    /// A previous write cycle is still in progress, or the bus did not
    /// acknowledge the device.
    Busy,
    /// The addressed region is write-protected.
    WriteProtected,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfBounds => f.write_str("address out of bounds"),
            Error::ReadError => f.write_str("read failed"),
            Error::WriteError => f.write_str("write failed"),
            Error::Busy => f.write_str("device busy"),
            Error::WriteProtected => f.write_str("write protected"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::OutOfBounds => defmt::write!(f, "OutOfBounds"),
            Error::ReadError => defmt::write!(f, "ReadError"),
            Error::WriteError => defmt::write!(f, "WriteError"),
            Error::Busy => defmt::write!(f, "Busy"),
            Error::WriteProtected => defmt::write!(f, "WriteProtected"),
        }
    }
}
