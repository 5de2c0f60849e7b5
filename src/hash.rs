//! Case-insensitive keyword hashing.
//!
//! Commands are looked up by a 32-bit hash of their keyword so the keyword
//! strings themselves never need to live in RAM. The hash is the standard
//! CRC-32 (reflected polynomial `0xEDB88320`, seeded with all ones, result
//! complemented) computed over the ASCII-lower-cased keyword, so `PING`,
//! `ping` and `PiNg` all hash identically.
//!
//! Two entry points produce bit-identical results:
//!
//! - [`hash`] / [`hash_bytes`] are `const fn`, for computing keyword hashes at
//!   compile time when registering commands.
//! - [`keyword_hash`] runs at dispatch time on whatever arrived over the
//!   serial line, using the table-driven [`crc32fast`] implementation.
//!
//! ```rust
//! use serialcmd::hash::{hash, keyword_hash};
//!
//! const SET_LED: u32 = hash("set_led");
//!
//! assert_eq!(SET_LED, keyword_hash(b"SET_LED"));
//! ```

/// Reflected CRC-32 polynomial.
pub const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

/// Hash a keyword at compile time (or run time).
pub const fn hash(keyword: &str) -> u32 {
    hash_bytes(keyword.as_bytes())
}

/// Hash raw keyword bytes. See [`hash`].
pub const fn hash_bytes(keyword: &[u8]) -> u32 {
    let mut crc = u32::MAX;
    let mut i = 0;
    while i < keyword.len() {
        crc ^= keyword[i].to_ascii_lowercase() as u32;
        let mut bit = 0;
        while bit < 8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (CRC32_POLYNOMIAL & mask);
            bit += 1;
        }
        i += 1;
    }
    !crc
}

// Lower-casing happens in small stack chunks so crc32fast can still work on
// slices without allocating a copy of the keyword.
const CHUNK: usize = 32;

/// Hash a keyword received at run time.
pub fn keyword_hash(keyword: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    let mut lowered = [0u8; CHUNK];

    for chunk in keyword.chunks(CHUNK) {
        for (dst, src) in lowered.iter_mut().zip(chunk) {
            *dst = src.to_ascii_lowercase();
        }
        hasher.update(&lowered[..chunk.len()]);
    }

    hasher.finalize()
}
