//! RAM-backed storage device

use super::error::Error;
use super::{ReadStorage, Storage};

/// Value of a never-written byte.
pub const ERASED_BYTE: u8 = 0xFF;

/// Volatile storage emulating an `N`-byte EEPROM.
///
/// Starts out erased (every byte [`ERASED_BYTE`]), like a fresh EEPROM. Useful
/// on hosts, in simulations and in tests, or on targets that keep the startup
/// command in battery-backed RAM.
#[derive(Debug, Clone)]
pub struct RamStorage<const N: usize> {
    memory: [u8; N],
    writes: usize,
}

impl<const N: usize> Default for RamStorage<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RamStorage<N> {
    /// Create an erased device.
    pub const fn new() -> Self {
        Self {
            memory: [ERASED_BYTE; N],
            writes: 0,
        }
    }

    /// The raw contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.memory
    }

    /// Number of write operations performed so far.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    fn range(offset: u32, len: usize) -> Result<core::ops::Range<usize>, Error> {
        let start = offset as usize;
        let end = start.checked_add(len).ok_or(Error::OutOfBounds)?;
        if end > N {
            return Err(Error::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl<const N: usize> ReadStorage for RamStorage<N> {
    type Error = Error;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        bytes.copy_from_slice(&self.memory[range]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        N
    }
}

impl<const N: usize> Storage for RamStorage<N> {
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        let range = Self::range(offset, bytes.len())?;
        self.memory[range].copy_from_slice(bytes);
        self.writes += 1;
        Ok(())
    }
}
