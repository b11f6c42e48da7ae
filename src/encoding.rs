//! Export forms of packages: lowercase hex, standard base64, or raw bytes.
//!
//! The form is chosen by configuration and is not recorded in the package itself.
use crate::errors::Error;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// How package bytes are exported and imported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Encoding {
    /// Lowercase hexadecimal text
    Hex,
    /// Standard (padded) base64 text
    Base64,
    /// Raw bytes
    Bytes,
}

/// An exported package, as handed to or received from the outside world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exported {
    /// Hex or base64 text
    Text(String),
    /// Raw package bytes
    Bytes(Vec<u8>),
}

impl Exported {
    /// Return the text form, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Exported::Text(s) => Some(s),
            Exported::Bytes(_) => None,
        }
    }

    /// Return the raw form, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Exported::Text(_) => None,
            Exported::Bytes(b) => Some(b),
        }
    }
}

impl From<String> for Exported {
    fn from(s: String) -> Self {
        Exported::Text(s)
    }
}

impl From<&str> for Exported {
    fn from(s: &str) -> Self {
        Exported::Text(s.to_string())
    }
}

impl From<Vec<u8>> for Exported {
    fn from(b: Vec<u8>) -> Self {
        Exported::Bytes(b)
    }
}

impl Encoding {
    /// Export `bytes` in this form.
    pub fn export(self, bytes: &[u8]) -> Exported {
        match self {
            Encoding::Hex => Exported::Text(hex::encode(bytes)),
            Encoding::Base64 => Exported::Text(STANDARD.encode(bytes)),
            Encoding::Bytes => Exported::Bytes(bytes.to_vec()),
        }
    }

    /// Recover package bytes from an exported value.
    ///
    /// Raw values are returned as they are whatever the configured form. Text is parsed
    /// in the configured form; when that form is `Bytes` the text form is guessed.
    pub fn import(self, value: &Exported) -> Result<Vec<u8>, Error> {
        match value {
            Exported::Bytes(b) => Ok(b.clone()),
            Exported::Text(s) => self.decode_str(s),
        }
    }

    /// Parse text in this form.
    pub fn decode_str(self, s: &str) -> Result<Vec<u8>, Error> {
        match self {
            Encoding::Hex => Ok(hex::decode(s)?),
            Encoding::Base64 => Ok(STANDARD.decode(s)?),
            Encoding::Bytes => guess_to_bytes(s),
        }
    }
}

/// `true` if `s` is a non-empty, even-length run of hex digits (either case).
pub fn looks_like_hex(s: &str) -> bool {
    !s.is_empty() && s.len() % 2 == 0 && s.bytes().all(|c| c.is_ascii_hexdigit())
}

/// Decode text of unknown form: hex when it looks like hex, base64 otherwise.
///
/// Only meant for input whose form is not known from configuration. Short base64 strings
/// made solely of hex digits are read as hex.
pub fn guess_to_bytes(s: &str) -> Result<Vec<u8>, Error> {
    if looks_like_hex(s) {
        Ok(hex::decode(s)?)
    } else {
        Ok(STANDARD.decode(s)?)
    }
}
