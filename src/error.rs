//! Common error type for dispatcher operations

use core::fmt;

use crate::storage::error::Error as StorageError;

/// Every way a dispatcher operation can fail.
///
/// All variants are recoverable: the dispatcher never panics or aborts on bad
/// input, it reports the condition and leaves the decision (log it, light an
/// LED, answer over the serial line) to the caller.
///
/// # Examples
///
/// ```rust
/// use serialcmd::{CommandHandler, Error};
///
/// let mut handler: CommandHandler<4> = CommandHandler::new();
/// handler.ingest_all(b"FOO\n").unwrap();
/// assert_eq!(handler.execute(), Err(Error::CommandNotFound));
/// ```
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
    /// The keyword hash matched no registered command.
    CommandNotFound,
    /// The command was given a different number of parameters than it accepts.
    WrongParameterCount,
    /// The buffered line could not be read as text (it is not valid UTF-8).
    ParseError,
    /// A line terminator arrived with no command before it.
    EmptyCommandString,
    /// `execute` was called while no complete line was buffered, or no
    /// startup command is stored.
    NoCommandWaiting,
    /// The command table is full.
    OutOfCapacity,
    /// A byte arrived while a complete line was still waiting to be executed.
    BufferFull,
    /// The line exceeded the buffer capacity. The rest of the line up to the
    /// next newline is discarded.
    CommandTooLong,
    /// The startup command does not fit in its storage region.
    StorageFull,
    /// A command with the same keyword hash is already registered.
    DuplicateCommand,
    /// The storage device backing the startup command reported an error.
    Storage(StorageError),
    /// Reserved. Never produced by correct operation.
    Unknown,
}

impl Error {
    /// Numeric status code for reporting over the wire.
    ///
    /// `0` is reserved for success, so every error maps to a non-zero value.
    /// Codes are stable across releases.
    pub const fn code(self) -> u8 {
        match self {
            Error::CommandNotFound => 1,
            Error::WrongParameterCount => 2,
            Error::ParseError => 3,
            Error::EmptyCommandString => 4,
            Error::NoCommandWaiting => 5,
            Error::OutOfCapacity => 7,
            Error::BufferFull => 8,
            Error::CommandTooLong => 9,
            Error::StorageFull => 10,
            Error::Unknown => 11,
            Error::DuplicateCommand => 12,
            Error::Storage(_) => 13,
        }
    }
}

impl From<StorageError> for Error {
    fn from(error: StorageError) -> Self {
        Error::Storage(error)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::CommandNotFound => f.write_str("command not found"),
            Error::WrongParameterCount => f.write_str("wrong number of parameters"),
            Error::ParseError => f.write_str("error parsing command"),
            Error::EmptyCommandString => f.write_str("empty command string"),
            Error::NoCommandWaiting => f.write_str("no command waiting"),
            Error::OutOfCapacity => f.write_str("command table full"),
            Error::BufferFull => f.write_str("buffer full"),
            Error::CommandTooLong => f.write_str("command too long"),
            Error::StorageFull => f.write_str("startup command storage full"),
            Error::DuplicateCommand => f.write_str("command already registered"),
            Error::Storage(e) => write!(f, "storage error: {}", e),
            Error::Unknown => f.write_str("unknown error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::CommandNotFound => defmt::write!(f, "CommandNotFound"),
            Error::WrongParameterCount => defmt::write!(f, "WrongParameterCount"),
            Error::ParseError => defmt::write!(f, "ParseError"),
            Error::EmptyCommandString => defmt::write!(f, "EmptyCommandString"),
            Error::NoCommandWaiting => defmt::write!(f, "NoCommandWaiting"),
            Error::OutOfCapacity => defmt::write!(f, "OutOfCapacity"),
            Error::BufferFull => defmt::write!(f, "BufferFull"),
            Error::CommandTooLong => defmt::write!(f, "CommandTooLong"),
            Error::StorageFull => defmt::write!(f, "StorageFull"),
            Error::DuplicateCommand => defmt::write!(f, "DuplicateCommand"),
            Error::Storage(e) => defmt::write!(f, "Storage({})", e),
            Error::Unknown => defmt::write!(f, "Unknown"),
        }
    }
}
