//! # serialcmd - serial command dispatcher for microcontrollers
//!
//! A small, allocation-free library that turns a stream of bytes from a
//! serial port into calls to registered command handlers. It is designed for
//! embedded systems and supports `no_std` environments.
//!
//! ## Features
//!
//! - **Line assembly**: bytes are fed one at a time; `\n` completes a line,
//!   `\r` is ignored so CRLF terminals work unchanged
//! - **Hashed lookup**: commands are registered under a case-insensitive
//!   CRC-32 of their keyword, computable at compile time
//! - **Arity checking**: each command declares how many parameters it takes
//! - **Zero-copy parameters**: handlers get borrowed tokens of the line, no
//!   copies and no allocation
//! - **Startup commands**: one record of `;`-separated commands can be kept
//!   in EEPROM and replayed on boot
//! - **Fixed footprint**: table and buffer sizes are const generics
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   LineBuffer    │───▶│     Params      │───▶│  CommandTable   │
//! │  (byte input)   │    │  (tokenizer)    │    │ (hash + arity)  │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//!          ▲                                             │
//!          │                                             ▼
//! ┌─────────────────┐                           ┌─────────────────┐
//! │  StartupStore   │                           │     handler     │
//! │    (EEPROM)     │                           │   (&Params)     │
//! └─────────────────┘                           └─────────────────┘
//! ```
//!
//! ## Usage
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! serialcmd = "0.1.0"
//! ```
//!
//! ### Basic Example
//!
//! ```rust
//! use serialcmd::{Arity, CommandHandler, Error, Params, hash};
//!
//! const HELO: u32 = hash("helo");
//!
//! fn helo(params: &Params<'_>) {
//!     let a: Option<u32> = params.parse(1);
//!     let b: Option<u32> = params.parse(2);
//!     let c: Option<f32> = params.parse(3);
//!     assert_eq!((a, b, c), (Some(1), Some(2), Some(3.3)));
//! }
//!
//! let mut handler: CommandHandler<10> = CommandHandler::new();
//! handler.register(HELO, Arity::Exactly(3), helo).unwrap();
//!
//! handler.ingest_all(b"HELO 1 2 3.3\r\n").unwrap();
//! assert_eq!(handler.execute(), Ok(()));
//!
//! handler.ingest_all(b"helo 1\n").unwrap();
//! assert_eq!(handler.execute(), Err(Error::WrongParameterCount));
//! ```
//!
//! ## Platform Support
//!
//! This library is designed to work on:
//! - Embedded microcontrollers (AVR-class to ARM Cortex-M, RISC-V, etc.)
//! - Linux-based devices bridging a serial console
//! - Any platform supporting Rust's `core` library
//!
//! ## Optional Features
//!
//! - `std`: Enable standard library support (default: disabled)
//! - `defmt`: Enable defmt logging support for embedded debugging
//! - `log`: Route internal log points through the `log` facade

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(missing_docs)]
#![warn(missing_debug_implementations)]

// Must stay first so the logging macros are visible to the modules below
mod fmt;

/// Common error type for dispatcher operations.
pub mod error;

/// Case-insensitive CRC-32 keyword hashing.
pub mod hash;

/// Zero-copy tokenizer handed to command handlers.
pub mod params;

/// Fixed-capacity table of registered commands.
pub mod table;

/// Line buffering and command execution.
pub mod handler;

/// Storage abstraction layer for the persisted startup command.
///
/// Provides the byte-addressed interfaces an EEPROM or similar
/// non-volatile memory driver implements.
pub mod storage;

/// Commands stored in non-volatile memory and replayed at startup.
pub mod startup;

pub use error::Error;
pub use handler::{COMMAND_SIZE_MAX, CommandHandler, LineBuffer, LineState};
pub use hash::{hash, keyword_hash};
pub use params::{ALL_PARAMS, Params, Tokens, WHOLE_LINE};
pub use startup::{STARTUP_COMMAND_MAX, StartupStore};
pub use table::{Arity, CommandFn, CommandTable, Entry};
