//! Fixed-capacity command table.
//!
//! The table maps keyword hashes to handlers. It is sized at compile time by a
//! const generic, never allocates and never grows: registering past capacity
//! fails and leaves the table untouched.
//!
//! Each entry costs one hash, one arity and one function pointer, so the
//! keyword strings themselves do not have to be kept around.

use heapless::Vec;

use crate::error::Error;
use crate::hash::keyword_hash;
use crate::params::Params;

/// Function signature for command handlers.
///
/// Handlers receive the parsed line. Token 0 is the keyword, tokens `1..` are
/// the parameters. Anything beyond the parameter count (numeric conversion,
/// range checks) is the handler's own business, and so is reporting its
/// failures: the dispatcher only reports whether the command was found and
/// had the right arity.
///
/// # Examples
///
/// ```rust
/// use serialcmd::CommandFn;
///
/// let set_led: CommandFn = |params| {
///     let _on = params.get(1) == Some("on");
/// };
/// ```
pub type CommandFn = fn(&Params<'_>);

/// Number of parameters a command accepts, not counting the keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// Any number of parameters, including none.
    Any,
    /// Exactly this many parameters.
    Exactly(usize),
}

impl Arity {
    /// Decode the signed encoding where `-1` means "any".
    ///
    /// Returns `None` for negative values other than `-1`.
    pub const fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            -1 => Some(Arity::Any),
            n if n >= 0 => Some(Arity::Exactly(n as usize)),
            _ => None,
        }
    }

    /// Whether a call with `count` parameters is acceptable.
    pub const fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Any => true,
            Arity::Exactly(n) => n == count,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Arity {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Arity::Any => defmt::write!(f, "Any"),
            Arity::Exactly(n) => defmt::write!(f, "Exactly({})", n),
        }
    }
}

/// One registered command.
#[derive(Debug, Clone, Copy)]
pub struct Entry {
    /// Hash of the keyword, see [`crate::hash`].
    pub hash: u32,
    /// Accepted parameter count.
    pub arity: Arity,
    /// Function invoked on a match.
    pub handler: CommandFn,
}

/// A table of up to `N` commands.
///
/// # Examples
///
/// ```rust
/// use serialcmd::{Arity, CommandTable, Error, Params, hash};
///
/// fn identify(_: &Params<'_>) {}
///
/// let mut table: CommandTable<8> = CommandTable::new();
/// table.register(hash("*idn"), Arity::Exactly(0), identify).unwrap();
///
/// assert_eq!(table.dispatch(&Params::new("*IDN")), Ok(()));
/// assert_eq!(table.dispatch(&Params::new("*IDN 1")), Err(Error::WrongParameterCount));
/// assert_eq!(table.dispatch(&Params::new("*RST")), Err(Error::CommandNotFound));
/// ```
#[derive(Debug)]
pub struct CommandTable<const N: usize> {
    entries: Vec<Entry, N>,
}

impl<const N: usize> Default for CommandTable<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> CommandTable<N> {
    /// Create an empty table.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a handler under a precomputed keyword hash.
    ///
    /// # Errors
    ///
    /// * [`Error::OutOfCapacity`] - the table already holds `N` commands
    /// * [`Error::DuplicateCommand`] - `hash` is already registered
    ///
    /// The table is left unchanged on error.
    pub fn register(
        &mut self,
        hash: u32,
        arity: Arity,
        handler: CommandFn,
    ) -> Result<(), Error> {
        if self.contains(hash) {
            warn!("command {} already registered", hash);
            return Err(Error::DuplicateCommand);
        }

        let entry = Entry {
            hash,
            arity,
            handler,
        };

        self.entries.push(entry).map_err(|_| {
            warn!("command table full ({} entries)", N);
            Error::OutOfCapacity
        })?;

        debug!("registered command {} ({} of {})", hash, self.entries.len(), N);
        Ok(())
    }

    /// Register a handler, hashing `keyword` at run time.
    ///
    /// Prefer [`register`](Self::register) with a `const` hash from
    /// [`crate::hash::hash`] so the keyword string is not kept in the binary.
    pub fn register_keyword(
        &mut self,
        keyword: &str,
        arity: Arity,
        handler: CommandFn,
    ) -> Result<(), Error> {
        self.register(keyword_hash(keyword.as_bytes()), arity, handler)
    }

    /// Find the entry registered under `hash`.
    pub fn lookup(&self, hash: u32) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.hash == hash)
    }

    /// Whether a command is registered under `hash`.
    pub fn contains(&self, hash: u32) -> bool {
        self.lookup(hash).is_some()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no command is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of commands.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Registered entries in registration order.
    pub fn iter(&self) -> core::slice::Iter<'_, Entry> {
        self.entries.iter()
    }

    /// Look up the command named by `params` and run it.
    ///
    /// # Errors
    ///
    /// * [`Error::EmptyCommandString`] - `params` holds no keyword
    /// * [`Error::CommandNotFound`] - no command matches the keyword
    /// * [`Error::WrongParameterCount`] - the command does not accept
    ///   `params.arg_count()` parameters
    pub fn dispatch(&self, params: &Params<'_>) -> Result<(), Error> {
        let keyword = params.keyword().ok_or(Error::EmptyCommandString)?;
        let hash = keyword_hash(keyword.as_bytes());

        let entry = self.lookup(hash).ok_or_else(|| {
            debug!("command not found: {}", keyword);
            Error::CommandNotFound
        })?;

        if !entry.arity.accepts(params.arg_count()) {
            debug!(
                "{}: expected {:?} parameters, got {}",
                keyword,
                entry.arity,
                params.arg_count()
            );
            return Err(Error::WrongParameterCount);
        }

        trace!("calling {} with {} parameters", keyword, params.arg_count());
        (entry.handler)(params);
        Ok(())
    }
}
