//! Commands replayed at startup.
//!
//! A device can keep one command record in non-volatile storage and run it
//! every time it boots, e.g. to restore the output frequency it was last set
//! to. Several commands are joined with `;` when stored and executed in order
//! on replay.
//!
//! # Layout
//!
//! Relative to the store's base offset:
//!
//! ```text
//! offset 0      1                                   N
//!        ┌──────┬──────────────────────────────┬────┬────┐
//!        │ flag │ cmd \n cmd \n ...            │ \n │ \0 │
//!        └──────┴──────────────────────────────┴────┴────┘
//! ```
//!
//! The flag byte is `1` when a record is present and `0` when it was
//! cleared. Any other value (`0xFF` on a never-written EEPROM) reads as "no
//! record". The record region is `N` bytes, leaving room for `N - 2` bytes of
//! command text plus the final newline and NUL.
//!
//! # Example
//!
//! ```rust
//! use serialcmd::storage::RamStorage;
//! use serialcmd::{Arity, CommandHandler, Params, StartupStore, hash};
//!
//! fn freq(_: &Params<'_>) {}
//! fn amp(_: &Params<'_>) {}
//!
//! let mut handler: CommandHandler<4> = CommandHandler::new();
//! handler.register(hash("freq"), Arity::Exactly(1), freq).unwrap();
//! handler.register(hash("amp"), Arity::Exactly(1), amp).unwrap();
//!
//! let mut store: StartupStore<RamStorage<128>, 64> = StartupStore::new(RamStorage::new());
//! store.store_command("freq 1000;amp 0.5", false).unwrap();
//!
//! // On the next boot
//! assert_eq!(handler.execute_startup(&mut store), Ok(()));
//! ```

use heapless::Vec;

use crate::error::Error;
use crate::handler::{ASCII_LF, CommandHandler, LineState};
use crate::storage::Storage;
use crate::storage::error::Error as StorageError;

/// Default size of the command record region in bytes.
pub const STARTUP_COMMAND_MAX: usize = 256;

/// Default separator between commands in a stored record.
pub const STARTUP_DELIMITER: u8 = b';';

const FLAG_PRESENT: u8 = 1;
const FLAG_CLEARED: u8 = 0;
const TERMINATOR: u8 = 0;

/// Startup command record kept in a [`Storage`] device.
///
/// `N` is the size of the record region following the flag byte.
#[derive(Debug)]
pub struct StartupStore<S, const N: usize = STARTUP_COMMAND_MAX> {
    storage: S,
    base: u32,
    delimiter: u8,
}

impl<S, const N: usize> StartupStore<S, N> {
    /// Keep the record at the start of `storage`.
    pub const fn new(storage: S) -> Self {
        Self::with_offset(storage, 0)
    }

    /// Keep the record at `base` within `storage`.
    pub const fn with_offset(storage: S, base: u32) -> Self {
        Self {
            storage,
            base,
            delimiter: STARTUP_DELIMITER,
        }
    }

    /// Use `delimiter` instead of `;` to separate commands passed to
    /// [`store_command`](Self::store_command).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Longest command text that fits in an empty record.
    pub const fn max_command_len(&self) -> usize {
        N.saturating_sub(2)
    }

    /// The underlying device.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give the underlying device back.
    pub fn into_inner(self) -> S {
        self.storage
    }

    fn flag_offset(&self) -> u32 {
        self.base
    }

    fn record_offset(&self, index: usize) -> Result<u32, Error> {
        u32::try_from(index)
            .ok()
            .and_then(|index| self.base.checked_add(1)?.checked_add(index))
            .ok_or(Error::Storage(StorageError::OutOfBounds))
    }
}

// Record bytes for `command`: delimiters become newlines, then the final
// newline and terminator.
fn encode(command: &str, delimiter: u8) -> impl Iterator<Item = u8> + '_ {
    command
        .bytes()
        .map(move |byte| if byte == delimiter { ASCII_LF } else { byte })
        .chain([ASCII_LF, TERMINATOR])
}

impl<S, const N: usize> StartupStore<S, N>
where
    S: Storage,
    S::Error: Into<StorageError>,
{
    /// Whether a record is stored.
    pub fn has_command(&mut self) -> Result<bool, Error> {
        match self.read_at(self.flag_offset())? {
            FLAG_PRESENT => Ok(true),
            FLAG_CLEARED => Ok(false),
            other => {
                debug!("startup flag undefined ({})", other);
                Ok(false)
            }
        }
    }

    /// The stored record, commands separated by `\n`.
    ///
    /// Empty when no record is stored.
    pub fn read_command(&mut self) -> Result<Vec<u8, N>, Error> {
        let mut record = Vec::new();
        if !self.has_command()? {
            return Ok(record);
        }

        for index in 0..N.saturating_sub(1) {
            let byte = self.read_at(self.record_offset(index)?)?;
            if byte == TERMINATOR {
                break;
            }
            record.push(byte).map_err(|_| Error::StorageFull)?;
        }

        trace!("read startup record ({} bytes)", record.len());
        Ok(record)
    }

    /// Store `command` to run at startup.
    ///
    /// Commands in `command` are separated by the store's delimiter (`;` by
    /// default). With `append`, they run after the commands already stored.
    ///
    /// Only bytes that differ from the stored ones are written. While the
    /// record is being rewritten the flag reads "no record", so an
    /// interrupted write never leaves a half-written record that replays.
    ///
    /// # Errors
    ///
    /// * [`Error::StorageFull`] - the text does not fit in the record; nothing
    ///   is written
    /// * [`Error::ParseError`] - `command` contains a NUL byte
    /// * [`Error::Storage`] - the device failed
    pub fn store_command(&mut self, command: &str, append: bool) -> Result<(), Error> {
        if command.bytes().any(|b| b == TERMINATOR) {
            return Err(Error::ParseError);
        }

        let present = self.has_command()?;
        let start = if append && present {
            self.stored_len()?
        } else {
            0
        };

        let available = self.max_command_len().saturating_sub(start);
        if command.len() > available {
            warn!(
                "startup command too long ({} bytes, {} available)",
                command.len(),
                available
            );
            return Err(Error::StorageFull);
        }

        if present && self.record_matches(start, command)? {
            trace!("startup command unchanged");
            return Ok(());
        }

        if present {
            self.update_at(self.flag_offset(), FLAG_CLEARED)?;
        }

        let mut index = start;
        for byte in encode(command, self.delimiter) {
            self.update_at(self.record_offset(index)?, byte)?;
            index += 1;
        }

        self.update_at(self.flag_offset(), FLAG_PRESENT)?;

        debug!("stored startup command ({} bytes)", index - 1);
        Ok(())
    }

    /// Forget the stored record.
    ///
    /// Only the flag is rewritten; the record bytes stay in place.
    pub fn clear(&mut self) -> Result<(), Error> {
        self.update_at(self.flag_offset(), FLAG_CLEARED)
    }

    // Length of the stored text, up to its NUL terminator.
    fn stored_len(&mut self) -> Result<usize, Error> {
        let limit = self.max_command_len();
        for index in 0..limit {
            if self.read_at(self.record_offset(index)?)? == TERMINATOR {
                return Ok(index);
            }
        }
        Ok(limit)
    }

    // Whether the record already holds `command` from `start` on.
    fn record_matches(&mut self, start: usize, command: &str) -> Result<bool, Error> {
        for (index, byte) in encode(command, self.delimiter).enumerate() {
            if self.read_at(self.record_offset(start + index)?)? != byte {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn read_at(&mut self, offset: u32) -> Result<u8, Error> {
        self.storage
            .read_byte(offset)
            .map_err(|e| Error::Storage(e.into()))
    }

    fn update_at(&mut self, offset: u32, byte: u8) -> Result<(), Error> {
        self.storage
            .update(offset, byte)
            .map(|_| ())
            .map_err(|e| Error::Storage(e.into()))
    }
}

impl<const N: usize, const CAP: usize> CommandHandler<N, CAP> {
    /// Run the commands stored in `store`.
    ///
    /// The record is fed through [`ingest`](Self::ingest) byte by byte, and
    /// every completed line is executed in order. Replay stops at the first
    /// line that fails, whose error is returned; the lines after it are not
    /// run. The line buffer is left empty either way.
    ///
    /// Replay only starts on an empty line buffer. Input received so far,
    /// complete or not, is left untouched.
    ///
    /// # Errors
    ///
    /// * [`Error::BufferFull`] - bytes of a received line are still
    ///   buffered; execute or [`discard`](Self::discard) them first
    /// * [`Error::NoCommandWaiting`] - nothing is stored
    /// * [`Error::Storage`] - the device failed
    /// * any error of [`execute`](Self::execute) for the failing line
    pub fn execute_startup<S, const M: usize>(
        &mut self,
        store: &mut StartupStore<S, M>,
    ) -> Result<(), Error>
    where
        S: Storage,
        S::Error: Into<StorageError>,
    {
        if self.line_in_progress() {
            debug!("startup replay refused: {} bytes pending", self.line.len());
            return Err(Error::BufferFull);
        }

        if !store.has_command()? {
            return Err(Error::NoCommandWaiting);
        }

        let record = store.read_command()?;
        debug!("replaying startup record ({} bytes)", record.len());

        for &byte in &record {
            self.replay(byte)?;
        }

        // A damaged record may end mid-line
        if self.line_in_progress() {
            warn!("startup record unterminated");
            self.replay(ASCII_LF)?;
        }

        Ok(())
    }

    fn line_in_progress(&self) -> bool {
        !self.line.is_empty() || self.line.state() != LineState::Idle
    }

    fn replay(&mut self, byte: u8) -> Result<(), Error> {
        match self.ingest(byte) {
            // Reported again when the line executes
            Ok(()) | Err(Error::CommandTooLong) => {}
            Err(error) => return Err(error),
        }

        if self.command_waiting() {
            self.execute()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ERASED_BYTE, RamStorage, ReadStorage};

    const DEVICE_SIZE: usize = 64;

    // Wraps addresses around the device and fails writes once its budget is
    // spent, like an EEPROM losing power mid-update.
    struct FlakyDevice {
        memory: [u8; DEVICE_SIZE],
        writes_left: usize,
    }

    impl FlakyDevice {
        fn new() -> Self {
            Self {
                memory: [ERASED_BYTE; DEVICE_SIZE],
                writes_left: usize::MAX,
            }
        }
    }

    impl ReadStorage for FlakyDevice {
        type Error = StorageError;

        fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
            for (i, byte) in bytes.iter_mut().enumerate() {
                *byte = self.memory[(offset as usize + i) % DEVICE_SIZE];
            }
            Ok(())
        }

        fn capacity(&self) -> usize {
            DEVICE_SIZE
        }
    }

    impl Storage for FlakyDevice {
        fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
            if self.writes_left == 0 {
                return Err(StorageError::WriteError);
            }
            self.writes_left -= 1;
            for (i, &byte) in bytes.iter().enumerate() {
                self.memory[(offset as usize + i) % DEVICE_SIZE] = byte;
            }
            Ok(())
        }
    }

    type Store = StartupStore<RamStorage<32>, 16>;

    fn store() -> Store {
        StartupStore::new(RamStorage::new())
    }

    #[test]
    fn test_fresh_device_has_no_command() {
        let mut store = store();
        assert_eq!(store.has_command(), Ok(false));
        assert!(store.read_command().unwrap().is_empty());
    }

    #[test]
    fn test_store_and_read_back() {
        let mut store = store();
        store.store_command("a 1;b", false).unwrap();

        assert_eq!(store.has_command(), Ok(true));
        assert_eq!(&store.read_command().unwrap()[..], b"a 1\nb\n");

        let raw = store.storage().as_slice();
        assert_eq!(raw[0], FLAG_PRESENT);
        assert_eq!(&raw[1..9], b"a 1\nb\n\0\xFF");
    }

    #[test]
    fn test_append() {
        let mut store = store();
        store.store_command("a", false).unwrap();
        store.store_command("b;c", true).unwrap();
        assert_eq!(&store.read_command().unwrap()[..], b"a\nb\nc\n");

        // Append to a cleared record starts over
        store.clear().unwrap();
        store.store_command("d", true).unwrap();
        assert_eq!(&store.read_command().unwrap()[..], b"d\n");
    }

    #[test]
    fn test_capacity_limit() {
        let mut store = store();
        assert_eq!(store.max_command_len(), 14);

        assert_eq!(
            store.store_command(&"x".repeat(15), false),
            Err(Error::StorageFull)
        );
        assert_eq!(store.has_command(), Ok(false));

        store.store_command(&"x".repeat(14), false).unwrap();
        assert_eq!(store.read_command().unwrap().len(), 15);

        assert_eq!(store.store_command("y", true), Err(Error::StorageFull));
    }

    #[test]
    fn test_clear_keeps_record_bytes() {
        let mut store = store();
        store.store_command("keep", false).unwrap();
        store.clear().unwrap();

        assert_eq!(store.has_command(), Ok(false));
        assert_eq!(&store.storage().as_slice()[1..5], b"keep");
    }

    #[test]
    fn test_custom_delimiter_and_offset() {
        let mut store: Store = StartupStore::with_offset(RamStorage::new(), 4).with_delimiter(b'|');
        store.store_command("a;b|c", false).unwrap();

        let raw = store.storage().as_slice();
        assert_eq!(raw[0], ERASED_BYTE);
        assert_eq!(raw[4], FLAG_PRESENT);
        assert_eq!(&store.read_command().unwrap()[..], b"a;b\nc\n");
    }

    #[test]
    fn test_rejects_nul() {
        let mut store = store();
        assert_eq!(store.store_command("a\0b", false), Err(Error::ParseError));
    }

    #[test]
    fn test_storage_errors_surface() {
        // Record region runs past the end of the device
        let mut store: StartupStore<RamStorage<4>, 16> = StartupStore::new(RamStorage::new());
        assert_eq!(
            store.store_command("abcdef", false),
            Err(Error::Storage(StorageError::OutOfBounds))
        );
    }

    #[test]
    fn test_interrupted_rewrite_leaves_no_record() {
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::new(FlakyDevice::new());
        store.store_command("freq 1000", false).unwrap();

        // Power fails after the flag is cleared and two body bytes changed
        let mut device = store.into_inner();
        device.writes_left = 3;
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::new(device);

        assert_eq!(
            store.store_command("amp 5", false),
            Err(Error::Storage(StorageError::WriteError))
        );
        assert_eq!(store.has_command(), Ok(false));
        assert!(store.read_command().unwrap().is_empty());
    }

    #[test]
    fn test_interrupted_append_leaves_no_record() {
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::new(FlakyDevice::new());
        store.store_command("on", false).unwrap();

        let mut device = store.into_inner();
        device.writes_left = 2;
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::new(device);

        assert!(store.store_command("freq 1", true).is_err());
        assert_eq!(store.has_command(), Ok(false));
    }

    #[test]
    fn test_unchanged_record_is_not_rewritten() {
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::new(FlakyDevice::new());
        store.store_command("a;b", false).unwrap();

        let mut device = store.into_inner();
        device.writes_left = 0;
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::new(device);

        assert_eq!(store.store_command("a;b", false), Ok(()));
        assert_eq!(store.has_command(), Ok(true));
    }

    #[test]
    fn test_offset_overflow_is_out_of_bounds() {
        let mut store: StartupStore<FlakyDevice, 32> =
            StartupStore::with_offset(FlakyDevice::new(), u32::MAX);

        assert_eq!(store.has_command(), Ok(false));
        assert_eq!(
            store.store_command("a", false),
            Err(Error::Storage(StorageError::OutOfBounds))
        );
        assert_eq!(store.has_command(), Ok(false));

        let mut device = store.into_inner();
        device.memory[u32::MAX as usize % DEVICE_SIZE] = FLAG_PRESENT;
        let mut store: StartupStore<FlakyDevice, 32> = StartupStore::with_offset(device, u32::MAX);
        assert_eq!(
            store.read_command(),
            Err(Error::Storage(StorageError::OutOfBounds))
        );
    }
}
