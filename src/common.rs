//! Structures common to every stage of the ladder: modes, digest identifiers and the
//! configuration of a chain.
use crate::encoding::Encoding;
use crate::errors::Error;
use crate::hash::HashRegistry;
use std::fmt;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Default number of blocks in a window.
pub const DEFAULT_WINDOW_SIZE: u8 = 5;
/// Default size of an origin block, in bits.
pub const DEFAULT_ORIGIN_SIZE: usize = 256;
/// Wire code reserved for externally supplied digests.
pub const EXTERNAL_ALGORITHM_CODE: u8 = 0xff;

/// Ladder algorithm used to turn a window into signature blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Mode {
    /// Linear ladder: block `i` is hashed `i` times.
    S,
    /// Triangular ladder: the first element of every row of pairwise hashes.
    X,
}

impl Mode {
    /// Wire code of the mode.
    pub fn code(self) -> u8 {
        match self {
            Mode::S => 0x01,
            Mode::X => 0x02,
        }
    }

    /// Resolve a wire code, if it names a known mode.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Mode::S),
            0x02 => Some(Mode::X),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::S => f.write_str("S"),
            Mode::X => f.write_str("X"),
        }
    }
}

/// Digest algorithm identifier.
///
/// Every variant but `External` is computed in-crate. `External` names a provider that
/// must be registered in the [`HashRegistry`] before first use, and travels on the wire as
/// [`EXTERNAL_ALGORITHM_CODE`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Algorithm {
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// SHA3-256
    Sha3_256,
    /// SHA3-512
    Sha3_512,
    /// BLAKE3 with its default 256-bit output
    Blake3,
    /// BLAKE2b truncated to 256 bits
    Blake2b256,
    /// Externally supplied digest, identified by name
    External(String),
}

impl Algorithm {
    /// Identifier of the algorithm, as used for registration and display.
    pub fn id(&self) -> &str {
        match self {
            Algorithm::Sha256 => "SHA-256",
            Algorithm::Sha384 => "SHA-384",
            Algorithm::Sha512 => "SHA-512",
            Algorithm::Sha3_256 => "SHA3-256",
            Algorithm::Sha3_512 => "SHA3-512",
            Algorithm::Blake3 => "BLAKE3",
            Algorithm::Blake2b256 => "BLAKE2B-256",
            Algorithm::External(id) => id,
        }
    }

    /// Resolve an identifier. Anything that is not built in is treated as external.
    pub fn from_id(id: &str) -> Self {
        match id {
            "SHA-256" => Algorithm::Sha256,
            "SHA-384" => Algorithm::Sha384,
            "SHA-512" => Algorithm::Sha512,
            "SHA3-256" => Algorithm::Sha3_256,
            "SHA3-512" => Algorithm::Sha3_512,
            "BLAKE3" => Algorithm::Blake3,
            "BLAKE2B-256" => Algorithm::Blake2b256,
            other => Algorithm::External(other.to_string()),
        }
    }

    /// Wire code of the algorithm.
    ///
    /// Codes `0x01` (SHA-1) and `0x08` (WHIRLPOOL) are reserved for interoperability and
    /// never produced: those digests are only available as external providers.
    pub fn code(&self) -> u8 {
        match self {
            Algorithm::Sha256 => 0x02,
            Algorithm::Sha384 => 0x03,
            Algorithm::Sha512 => 0x04,
            Algorithm::Sha3_256 => 0x05,
            Algorithm::Sha3_512 => 0x06,
            Algorithm::Blake3 => 0x07,
            Algorithm::Blake2b256 => 0x09,
            Algorithm::External(_) => EXTERNAL_ALGORITHM_CODE,
        }
    }

    /// Resolve a wire code. The external code maps back to `configured`, which must itself
    /// be external, since the wire does not carry the provider's name.
    pub fn from_code(code: u8, configured: &Algorithm) -> Result<Self, Error> {
        match code {
            0x02 => Ok(Algorithm::Sha256),
            0x03 => Ok(Algorithm::Sha384),
            0x04 => Ok(Algorithm::Sha512),
            0x05 => Ok(Algorithm::Sha3_256),
            0x06 => Ok(Algorithm::Sha3_512),
            0x07 => Ok(Algorithm::Blake3),
            0x09 => Ok(Algorithm::Blake2b256),
            EXTERNAL_ALGORITHM_CODE => match configured {
                Algorithm::External(_) => Ok(configured.clone()),
                _ => Err(Error::UnknownAlgorithm(
                    "external code without a configured external algorithm".to_string(),
                )),
            },
            other => Err(Error::UnknownAlgorithm(format!("code {:#04x}", other))),
        }
    }

    /// Digest length in bytes of a built-in algorithm; `None` for external ones.
    pub fn builtin_len(&self) -> Option<usize> {
        match self {
            Algorithm::Sha256 | Algorithm::Sha3_256 | Algorithm::Blake3 => Some(32),
            Algorithm::Blake2b256 => Some(32),
            Algorithm::Sha384 => Some(48),
            Algorithm::Sha512 | Algorithm::Sha3_512 => Some(64),
            Algorithm::External(_) => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Parameters of a chain, fixed for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Config {
    /// Number of blocks `N` in every window.
    pub window_size: u8,
    /// Ladder algorithm.
    pub mode: Mode,
    /// Digest algorithm.
    pub algorithm: Algorithm,
    /// Size of an origin block, in bits.
    pub origin_size: usize,
    /// Text (or raw) form of exported packages.
    pub format: Encoding,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            mode: Mode::S,
            algorithm: Algorithm::Sha256,
            origin_size: DEFAULT_ORIGIN_SIZE,
            format: Encoding::Hex,
        }
    }
}

impl Config {
    /// Set the window size `N`.
    pub fn with_window_size(mut self, window_size: u8) -> Self {
        self.window_size = window_size;
        self
    }

    /// Set the ladder mode.
    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the digest algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Set the origin block size, in bits.
    pub fn with_origin_size(mut self, origin_size: usize) -> Self {
        self.origin_size = origin_size;
        self
    }

    /// Set the export format.
    pub fn with_format(mut self, format: Encoding) -> Self {
        self.format = format;
        self
    }

    /// Origin block size in bytes.
    pub fn origin_len(&self) -> usize {
        self.origin_size / 8
    }

    /// Check that the configuration describes a usable chain against `registry`.
    ///
    /// # Errors
    /// The function fails if
    /// * `window_size` is zero
    /// * `origin_size` is not a positive multiple of 8
    /// * the algorithm is unknown to `registry`
    /// * the mode is `X` and the origin block is not exactly one digest long
    pub fn validate(&self, registry: &HashRegistry) -> Result<(), Error> {
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window size must be at least 1".into()));
        }
        if self.origin_size == 0 || self.origin_size % 8 != 0 {
            return Err(Error::InvalidConfig(format!(
                "origin size {} is not a positive multiple of 8 bits",
                self.origin_size
            )));
        }

        let digest_len = registry.output_len(&self.algorithm)?;
        if self.mode == Mode::X && digest_len != self.origin_len() {
            return Err(Error::InvalidConfig(format!(
                "mode X needs {}-bit origin blocks to match {}, got {}",
                digest_len * 8,
                self.algorithm,
                self.origin_size
            )));
        }

        Ok(())
    }
}
