//! Zero-copy parameter view over a single command line.
//!
//! A [`Params`] borrows the line it was built from and hands out sub-slices of
//! it. Nothing is copied, nothing is allocated and the line itself is never
//! modified, so a handler can ask for individual tokens and for the whole line
//! in any order.
//!
//! Tokens are maximal runs of bytes other than space and tab. Runs of several
//! delimiters collapse into a single boundary, and leading or trailing
//! delimiters never produce empty tokens.
//!
//! ```text
//! "SET  led\t1 "
//!  ^^^  ^^^  ^
//!   0    1   2        len() == 3, args() == "led\t1 "
//! ```
//!
//! Besides [`Params::get`], the view supports the signed index convention used
//! on the wire by older firmware through [`Params::lookup`]:
//!
//! | index | result                                    |
//! |-------|-------------------------------------------|
//! | `-1`  | the whole line ([`WHOLE_LINE`])           |
//! | `-2`  | everything from token 1 on ([`ALL_PARAMS`]) |
//! | `n`   | token `n`, token 0 being the keyword      |

use core::str::{self, FromStr};

use crate::error::Error;

/// ASCII space character (0x20).
pub const ASCII_SPACE: u8 = 0x20;
/// ASCII horizontal tab character (0x09).
pub const ASCII_TAB: u8 = 0x09;

/// [`Params::lookup`] index returning the whole line.
pub const WHOLE_LINE: isize = -1;
/// [`Params::lookup`] index returning all parameters after the keyword.
pub const ALL_PARAMS: isize = -2;

/// Whether `byte` separates tokens.
#[inline]
pub const fn is_delimiter(byte: u8) -> bool {
    byte == ASCII_SPACE || byte == ASCII_TAB
}

/// Read-only view of the tokens of one command line.
///
/// The token count is computed once on construction; every lookup is a
/// bounded scan of the line.
///
/// # Examples
///
/// ```rust
/// use serialcmd::Params;
///
/// let params = Params::new("HELO 1 2 3.3");
///
/// assert_eq!(params.len(), 4);
/// assert_eq!(params.get(0), Some("HELO"));
/// assert_eq!(params.get(3), Some("3.3"));
/// assert_eq!(params.get(4), None);
/// assert_eq!(params.args(), Some("1 2 3.3"));
/// assert_eq!(params.line(), "HELO 1 2 3.3");
/// assert_eq!(params.parse::<f32>(3), Some(3.3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params<'a> {
    line: &'a str,
    len: usize,
}

impl<'a> Params<'a> {
    /// Build a view over `line`.
    pub fn new(line: &'a str) -> Self {
        Self {
            line,
            len: Tokens::new(line).count(),
        }
    }

    /// Build a view over raw line bytes.
    ///
    /// # Errors
    ///
    /// * [`Error::ParseError`] - `line` is not valid UTF-8
    pub fn from_bytes(line: &'a [u8]) -> Result<Self, Error> {
        let line = str::from_utf8(line).map_err(|_| Error::ParseError)?;
        Ok(Self::new(line))
    }

    /// Number of tokens, keyword included.
    ///
    /// An empty or whitespace-only line has no tokens.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the line holds no tokens at all.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of parameters after the keyword.
    pub fn arg_count(&self) -> usize {
        self.len.saturating_sub(1)
    }

    /// The command keyword (token 0).
    pub fn keyword(&self) -> Option<&'a str> {
        self.get(0)
    }

    /// The whole line exactly as received.
    pub fn line(&self) -> &'a str {
        self.line
    }

    /// Everything from the first parameter to the end of the line, original
    /// spacing preserved. `None` when the command has no parameters.
    pub fn args(&self) -> Option<&'a str> {
        let start = self.token_start(1)?;
        Some(&self.line[start..])
    }

    /// Token `index`, where `0` is the keyword.
    pub fn get(&self, index: usize) -> Option<&'a str> {
        let start = self.token_start(index)?;
        let tail = &self.line[start..];
        let end = tail
            .bytes()
            .position(is_delimiter)
            .unwrap_or(tail.len());
        Some(&tail[..end])
    }

    /// Look a token up using the signed index convention.
    ///
    /// `-1` ([`WHOLE_LINE`]) yields the whole line, `-2` ([`ALL_PARAMS`]) the
    /// parameters, non-negative values the token at that position. Any other
    /// negative index yields `None`.
    pub fn lookup(&self, index: isize) -> Option<&'a str> {
        match index {
            WHOLE_LINE => Some(self.line),
            ALL_PARAMS => self.args(),
            i if i >= 0 => self.get(i as usize),
            _ => None,
        }
    }

    /// Parse token `index` with [`FromStr`].
    ///
    /// Returns `None` when the token is missing or does not parse.
    pub fn parse<T: FromStr>(&self, index: usize) -> Option<T> {
        self.get(index)?.parse().ok()
    }

    /// Iterate over all tokens in order.
    pub fn iter(&self) -> Tokens<'a> {
        Tokens::new(self.line)
    }

    // Byte offset of the first byte of token `index`. Delimiters are ASCII,
    // so every offset returned is a char boundary.
    fn token_start(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }

        let mut remaining = index;
        let mut in_token = false;

        for (pos, &byte) in self.line.as_bytes().iter().enumerate() {
            if is_delimiter(byte) {
                in_token = false;
                continue;
            }

            if !in_token {
                if remaining == 0 {
                    return Some(pos);
                }
                remaining -= 1;
                in_token = true;
            }
        }

        None
    }
}

impl<'a> IntoIterator for &Params<'a> {
    type Item = &'a str;
    type IntoIter = Tokens<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the tokens of a line. See [`Params::iter`].
#[derive(Debug, Clone)]
pub struct Tokens<'a> {
    rest: &'a str,
}

impl<'a> Tokens<'a> {
    /// Tokenize `line`.
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        let bytes = self.rest.as_bytes();
        let start = bytes.iter().position(|&b| !is_delimiter(b))?;
        let end = bytes[start..]
            .iter()
            .position(|&b| is_delimiter(b))
            .map_or(bytes.len(), |n| start + n);

        let token = &self.rest[start..end];
        self.rest = &self.rest[end..];
        Some(token)
    }
}
