//! Errors specific to ULDA packages, windows and digest providers
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
/// Enum of errors associated with ULDA windows and signatures
pub enum Error {
    /// A package could not be decoded: truncated header, bad marker or sentinel, unknown
    /// mode code, or a payload that does not split into whole blocks.
    #[error("malformed package: {0}")]
    MalformedPackage(String),
    /// A window does not hold exactly `N` blocks of one shared, non-zero length.
    #[error("invalid window: {0}")]
    InvalidWindow(String),
    /// The ladder was asked to run over a window without blocks.
    #[error("cannot build a ladder over an empty window")]
    EmptyWindow,
    /// The algorithm is neither built in nor registered.
    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),
    /// A registered provider returned a digest whose size differs from the declared one.
    #[error("hasher <{algorithm}> size mismatch: expected {expected} bits, got {actual}")]
    SizeMismatch {
        /// Identifier of the offending algorithm.
        algorithm: String,
        /// Declared output size, in bits.
        expected: usize,
        /// Observed output size, in bits.
        actual: usize,
    },
    /// An identifier was registered twice, or shadows a built-in algorithm.
    #[error("hash algorithm already registered: {0}")]
    DuplicateAlgorithm(String),
    /// The one-time readiness step of an external provider failed.
    #[error("hasher <{algorithm}> failed to initialise: {reason}")]
    ProviderInit {
        /// Identifier of the provider.
        algorithm: String,
        /// Failure reported by the provider.
        reason: String,
    },
    /// The configuration cannot describe a valid chain.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The window index cannot be incremented any further.
    #[error("window index cannot be incremented past u64::MAX")]
    IndexOverflow,
    /// A text export could not be decoded back into bytes.
    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<hex::FromHexError> for Error {
    fn from(err: hex::FromHexError) -> Error {
        Error::Encoding(format!("hex: {}", err))
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Error {
        Error::Encoding(format!("base64: {}", err))
    }
}
