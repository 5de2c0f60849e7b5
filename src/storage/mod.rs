//! # Storage abstraction for persisted commands
//!
//! The startup command lives in a small non-volatile memory, usually the
//! microcontroller's EEPROM. This module provides the byte-addressed traits
//! the [`startup`](crate::startup) layer is written against, so any EEPROM,
//! FRAM or emulated-EEPROM flash driver can back it with a few lines of glue.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────┐
//! │  StartupStore   │   flag byte + NUL-terminated command record
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────────────────────────┐
//! │   ReadStorage / Storage (traits)    │
//! └─────────────────────────────────────┘
//!          │                     │
//!          ▼                     ▼
//! ┌─────────────────┐   ┌─────────────────┐
//! │  EEPROM driver  │   │   RamStorage    │
//! │   (firmware)    │   │  (host, tests)  │
//! └─────────────────┘   └─────────────────┘
//! ```
//!
//! # Core Traits
//!
//! - [`ReadStorage`]: Read data from storage
//! - [`Storage`]: Read and write operations, with wear-friendly [`Storage::update`]
//!
//! # Usage Examples
//!
//! ```rust
//! use serialcmd::storage::{RamStorage, ReadStorage, Storage};
//!
//! let mut eeprom: RamStorage<64> = RamStorage::new();
//! eeprom.write(0, b"hi").unwrap();
//!
//! let mut buf = [0u8; 2];
//! eeprom.read(0, &mut buf).unwrap();
//! assert_eq!(&buf, b"hi");
//! ```

#![deny(unsafe_code)]

/// Common error types for storage operations
pub mod error;

mod ram;

pub use error::Error;
pub use ram::{ERASED_BYTE, RamStorage};

/// Re-exports of common traits for convenient importing
pub mod prelude {
    pub use super::{ReadStorage, Storage};
}

/// Trait for reading data from storage devices.
///
/// # Examples
///
/// ```rust,no_run
/// use serialcmd::storage::ReadStorage;
///
/// fn read_flag<S: ReadStorage>(storage: &mut S) -> Result<u8, S::Error> {
///     let mut flag = [0u8; 1];
///     storage.read(0, &mut flag)?;
///     Ok(flag[0])
/// }
/// ```
pub trait ReadStorage {
    /// Associated error type for read operations
    type Error: core::fmt::Debug;

    /// Read data from the storage device.
    ///
    /// Reads data from the specified offset into the provided buffer.
    /// The entire buffer will be filled unless an error occurs.
    ///
    /// # Arguments
    ///
    /// * `offset` - Byte offset from the start of the storage device
    /// * `bytes` - Buffer to read data into
    ///
    /// # Errors
    ///
    /// - `OutOfBounds` if offset + buffer length exceeds device capacity
    /// - `ReadError` if hardware read operation fails
    /// - `Busy` if the device is still completing a write
    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error>;

    /// Get the total capacity of the storage device in bytes.
    fn capacity(&self) -> usize;

    /// Read a single byte.
    fn read_byte(&mut self, offset: u32) -> Result<u8, Self::Error> {
        let mut byte = [0u8; 1];
        self.read(offset, &mut byte)?;
        Ok(byte[0])
    }
}

/// Trait for storage devices that support both read and write operations.
///
/// Implementations must allow overwriting previously written bytes without
/// an explicit erase, as EEPROM and FRAM do.
pub trait Storage: ReadStorage {
    /// Write data to the storage device.
    ///
    /// # Arguments
    ///
    /// * `offset` - Byte offset from the start of the storage device
    /// * `bytes` - Data to write to the device
    ///
    /// # Errors
    ///
    /// - `OutOfBounds` if offset + data length exceeds device capacity
    /// - `WriteError` if hardware write operation fails
    /// - `Busy` if the device is still completing a write
    /// - `WriteProtected` if the region cannot be written
    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Write a single byte only if it differs from what is stored.
    ///
    /// EEPROM cells wear out with every write cycle; rewriting a persisted
    /// record that barely changed should not cost a cycle per byte.
    ///
    /// Returns whether a write took place.
    fn update(&mut self, offset: u32, byte: u8) -> Result<bool, Self::Error> {
        if self.read_byte(offset)? == byte {
            return Ok(false);
        }
        self.write(offset, &[byte])?;
        Ok(true)
    }
}
