//! Serial line buffering and command execution.
//!
//! [`CommandHandler`] is the piece firmware talks to. Bytes from the serial
//! port are fed in one at a time with [`ingest`](CommandHandler::ingest); once
//! a newline completes a line, [`command_waiting`](CommandHandler::command_waiting)
//! turns true and the application calls [`execute`](CommandHandler::execute)
//! when convenient, typically once per main-loop iteration:
//!
//! ```rust
//! use serialcmd::{Arity, CommandHandler, Params, hash};
//!
//! fn set_freq(params: &Params<'_>) {
//!     let _hz: Option<u32> = params.parse(1);
//! }
//!
//! let mut handler: CommandHandler<8> = CommandHandler::new();
//! handler.register(hash("freq"), Arity::Exactly(1), set_freq).unwrap();
//!
//! # let serial = b"FREQ 1000\r\n";
//! for &byte in serial {
//!     // A real loop would report errors back over the serial line
//!     let _ = handler.ingest(byte);
//!
//!     if handler.command_waiting() {
//!         assert_eq!(handler.execute(), Ok(()));
//!     }
//! }
//! ```
//!
//! # Line buffer states
//!
//! ```text
//!   ┌──────┐      newline      ┌───────┐
//!   │ Idle │──────────────────▶│ Ready │──execute──▶ Idle
//!   └──────┘                   └───────┘
//!      │ too long                  ▲
//!      ▼                           │
//! ┌────────────┐     newline       │
//! │ Overflowed │───────────────────┘
//! └────────────┘
//! ```
//!
//! Only one line is buffered at a time. While a line is `Ready`, further
//! bytes are refused with [`Error::BufferFull`] until `execute` drains it.

use heapless::Vec;

use crate::error::Error;
use crate::params::Params;
use crate::table::{Arity, CommandFn, CommandTable};

/// Default line buffer size in bytes.
///
/// Lines may hold at most `COMMAND_SIZE_MAX - 1` bytes.
pub const COMMAND_SIZE_MAX: usize = 150;

/// ASCII line feed character (0x0A). Terminates a line.
pub const ASCII_LF: u8 = 0x0A;
/// ASCII carriage return character (0x0D). Ignored.
pub const ASCII_CR: u8 = 0x0D;

/// State of a [`LineBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineState {
    /// Accepting bytes.
    Idle,
    /// The line outgrew the buffer; bytes are dropped until the next newline.
    Overflowed,
    /// A complete line is waiting to be executed.
    Ready {
        /// Whether bytes of this line were dropped.
        overflowed: bool,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for LineState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            LineState::Idle => defmt::write!(f, "Idle"),
            LineState::Overflowed => defmt::write!(f, "Overflowed"),
            LineState::Ready { overflowed } => {
                defmt::write!(f, "Ready {{ overflowed: {} }}", overflowed)
            }
        }
    }
}

/// Fixed-capacity buffer assembling one line from a byte stream.
///
/// At most `CAP - 1` bytes are buffered per line.
#[derive(Debug)]
pub struct LineBuffer<const CAP: usize> {
    buf: Vec<u8, CAP>,
    state: LineState,
}

impl<const CAP: usize> Default for LineBuffer<CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize> LineBuffer<CAP> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        Self {
            buf: Vec::new(),
            state: LineState::Idle,
        }
    }

    /// Longest line that fits.
    pub const fn max_line_len(&self) -> usize {
        CAP.saturating_sub(1)
    }

    /// Add one byte.
    ///
    /// `\r` is dropped, `\n` completes the line, everything else is buffered.
    ///
    /// # Errors
    ///
    /// * [`Error::BufferFull`] - a complete line is still waiting; the byte is
    ///   refused and the line left intact
    /// * [`Error::CommandTooLong`] - the line no longer fits; the byte and the
    ///   rest of the line are dropped
    pub fn push(&mut self, byte: u8) -> Result<(), Error> {
        if let LineState::Ready { .. } = self.state {
            return Err(Error::BufferFull);
        }

        match byte {
            ASCII_CR => Ok(()),
            ASCII_LF => {
                self.state = LineState::Ready {
                    overflowed: self.state == LineState::Overflowed,
                };
                Ok(())
            }
            _ => {
                if self.state == LineState::Overflowed || self.buf.len() >= self.max_line_len() {
                    self.state = LineState::Overflowed;
                    return Err(Error::CommandTooLong);
                }

                self.buf.push(byte).map_err(|_| Error::CommandTooLong)
            }
        }
    }

    /// Current state.
    pub fn state(&self) -> LineState {
        self.state
    }

    /// Whether a complete line is waiting.
    pub fn is_ready(&self) -> bool {
        matches!(self.state, LineState::Ready { .. })
    }

    /// Whether bytes of the current line were dropped.
    pub fn is_overflowed(&self) -> bool {
        matches!(
            self.state,
            LineState::Overflowed | LineState::Ready { overflowed: true }
        )
    }

    /// Bytes buffered so far, without any terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Number of bytes buffered.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Drop the buffered line and return to [`LineState::Idle`].
    pub fn clear(&mut self) {
        self.buf.clear();
        self.state = LineState::Idle;
    }
}

/// Receives serial input and dispatches complete lines to registered
/// commands.
///
/// `N` is the number of commands that can be registered, `CAP` the line
/// buffer size. Everything lives inline, so a handler can be placed in a
/// `static` cell or on the stack of the task owning the serial port.
///
/// # Examples
///
/// ```rust
/// use serialcmd::{Arity, CommandHandler, Error, Params, hash};
///
/// fn ping(_: &Params<'_>) {}
///
/// let mut handler: CommandHandler<4, 16> = CommandHandler::new();
/// handler.register(hash("ping"), Arity::Exactly(0), ping).unwrap();
///
/// handler.ingest_all(b"PING\r\n").unwrap();
/// assert!(handler.command_waiting());
/// assert_eq!(handler.ingest(b'x'), Err(Error::BufferFull));
/// assert_eq!(handler.execute(), Ok(()));
///
/// assert_eq!(handler.execute(), Err(Error::NoCommandWaiting));
/// ```
#[derive(Debug)]
pub struct CommandHandler<const N: usize, const CAP: usize = COMMAND_SIZE_MAX> {
    pub(crate) table: CommandTable<N>,
    pub(crate) line: LineBuffer<CAP>,
}

impl<const N: usize, const CAP: usize> Default for CommandHandler<N, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, const CAP: usize> CommandHandler<N, CAP> {
    /// Create a handler with no commands and an empty line buffer.
    pub const fn new() -> Self {
        Self {
            table: CommandTable::new(),
            line: LineBuffer::new(),
        }
    }

    /// Register a command under a precomputed keyword hash.
    ///
    /// See [`CommandTable::register`].
    pub fn register(&mut self, hash: u32, arity: Arity, handler: CommandFn) -> Result<(), Error> {
        self.table.register(hash, arity, handler)
    }

    /// Register a command, hashing `keyword` at run time.
    ///
    /// See [`CommandTable::register_keyword`].
    pub fn register_keyword(
        &mut self,
        keyword: &str,
        arity: Arity,
        handler: CommandFn,
    ) -> Result<(), Error> {
        self.table.register_keyword(keyword, arity, handler)
    }

    /// The registered commands.
    pub fn table(&self) -> &CommandTable<N> {
        &self.table
    }

    /// Feed one byte from the serial line.
    ///
    /// Never blocks. Overflow is reported here for the offending byte and
    /// again by [`execute`](Self::execute) for the whole line.
    ///
    /// # Errors
    ///
    /// * [`Error::BufferFull`] - a complete line must be executed first
    /// * [`Error::CommandTooLong`] - the current line is too long
    pub fn ingest(&mut self, byte: u8) -> Result<(), Error> {
        let was_overflowed = self.line.is_overflowed();
        let result = self.line.push(byte);

        match result {
            Ok(()) if self.line.is_ready() => {
                debug!("line complete ({} bytes)", self.line.len());
            }
            Err(Error::CommandTooLong) if !was_overflowed => {
                warn!("command too long, dropping input until newline");
            }
            Err(Error::BufferFull) => {
                trace!("refusing byte {}: line waiting", byte);
            }
            _ => {}
        }

        result
    }

    /// Feed a slice of bytes, stopping at the first error.
    ///
    /// Bytes after the failing one are not consumed.
    pub fn ingest_all(&mut self, data: &[u8]) -> Result<(), Error> {
        data.iter().try_for_each(|&byte| self.ingest(byte))
    }

    /// Whether a complete line is waiting to be executed.
    pub fn command_waiting(&self) -> bool {
        self.line.is_ready()
    }

    /// Whether the handler refuses input until the waiting line is executed.
    pub fn buffer_full(&self) -> bool {
        self.command_waiting()
    }

    /// Bytes of the line currently being received or waiting.
    pub fn pending(&self) -> &[u8] {
        self.line.as_bytes()
    }

    /// Drop the current line without executing it.
    pub fn discard(&mut self) {
        self.line.clear();
    }

    /// Execute the waiting line.
    ///
    /// The line buffer is reset whatever the outcome, so a bad line can never
    /// wedge the handler.
    ///
    /// The line must be valid UTF-8 as a whole: a single garbled byte, even
    /// inside a parameter, rejects the entire line with
    /// [`Error::ParseError`] and no handler runs.
    ///
    /// # Errors
    ///
    /// * [`Error::NoCommandWaiting`] - no complete line is buffered
    /// * [`Error::CommandTooLong`] - the line overflowed the buffer
    /// * [`Error::EmptyCommandString`] - the line holds no keyword
    /// * [`Error::ParseError`] - the line is not valid UTF-8
    /// * any error of [`CommandTable::dispatch`]
    pub fn execute(&mut self) -> Result<(), Error> {
        let result = self.run_line();
        if let Err(error) = result {
            debug!("execute failed: {:?}", error);
        }

        self.line.clear();
        result
    }

    fn run_line(&self) -> Result<(), Error> {
        match self.line.state() {
            LineState::Ready { overflowed: false } => {}
            LineState::Ready { overflowed: true } => return Err(Error::CommandTooLong),
            LineState::Idle | LineState::Overflowed => return Err(Error::NoCommandWaiting),
        }

        if self.line.is_empty() {
            return Err(Error::EmptyCommandString);
        }

        let params = Params::from_bytes(self.line.as_bytes())?;
        self.table.dispatch(&params)
    }
}
