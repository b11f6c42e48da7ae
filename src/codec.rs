//! Wire format of origin and signature packages.
//!
//! Every package starts with the same header:
//!
//! ```text
//! marker(1) || header_len(1) || N(1) || mode(1) || algorithm(1) || index(var) || sentinel(1)
//! ```
//!
//! where `index` is big-endian and minimal (zero is a single `0x00` byte), and
//! `header_len` counts every header byte including the sentinel. The payload follows:
//! the `N` raw blocks for an origin package, or the ladder output for a signature
//! package. Block lengths are not stored; they are re-derived from the payload length,
//! `N`, the mode and the configured origin size.
use crate::common::{Algorithm, Config, Mode};
use crate::errors::Error;
use crate::window::OriginWindow;

#[cfg(feature = "serde_enabled")]
use {
    serde::{Deserialize, Serialize},
    serde_with::{serde_as, Bytes},
};

/// First byte of every package we emit; mandatory for origin packages.
pub const MARKER: u8 = 0x00;
/// Last header byte.
pub const SENTINEL: u8 = 0x00;
/// Header bytes besides the index and the sentinel.
const FIXED_HEADER_LEN: usize = 5;
/// Smallest valid header: a one-byte index.
pub const MIN_HEADER_LEN: usize = FIXED_HEADER_LEN + 1 + 1;

/// Encoded package bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package(Vec<u8>);

impl Package {
    /// Wrap raw bytes. No validation happens until the package is decoded.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Package(bytes)
    }

    /// Return the package as a byte slice.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Return the package bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Package {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Header fields shared by both kinds of package.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub struct Header {
    /// Window size `N`.
    pub window_size: u8,
    /// Ladder mode.
    pub mode: Mode,
    /// Digest algorithm.
    pub algorithm: Algorithm,
    /// Position of the window in the chain.
    pub index: u64,
}

impl Header {
    /// Header derived from a configuration, at `index`.
    pub fn from_config(config: &Config, index: u64) -> Self {
        Header {
            window_size: config.window_size,
            mode: config.mode,
            algorithm: config.algorithm.clone(),
            index,
        }
    }

    /// Encode the header, sentinel included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let index = index_to_bytes(self.index);
        let header_len = FIXED_HEADER_LEN + index.len() + 1;

        let mut out = Vec::with_capacity(header_len);
        out.push(MARKER);
        out.push(header_len as u8);
        out.push(self.window_size);
        out.push(self.mode.code());
        out.push(self.algorithm.code());
        out.extend_from_slice(&index);
        out.push(SENTINEL);
        out
    }

    /// Decode the header at the start of `bytes`, returning it with its length.
    ///
    /// Marker and sentinel values are not checked here; see [`decode_origin`].
    pub fn from_bytes(bytes: &[u8], config: &Config) -> Result<(Self, usize), Error> {
        if bytes.len() < MIN_HEADER_LEN {
            return Err(Error::MalformedPackage(format!(
                "{} bytes cannot hold a header",
                bytes.len()
            )));
        }
        let header_len = bytes[1] as usize;
        if header_len < MIN_HEADER_LEN || header_len > bytes.len() {
            return Err(Error::MalformedPackage(format!(
                "header length {} out of range for a {}-byte package",
                header_len,
                bytes.len()
            )));
        }

        let window_size = bytes[2];
        if window_size == 0 {
            return Err(Error::MalformedPackage("window size of zero".into()));
        }
        let mode = Mode::from_code(bytes[3]).ok_or_else(|| {
            Error::MalformedPackage(format!("unknown mode code {:#04x}", bytes[3]))
        })?;
        let algorithm = Algorithm::from_code(bytes[4], &config.algorithm)?;
        let index = index_from_bytes(&bytes[FIXED_HEADER_LEN..header_len - 1])?;

        Ok((
            Header {
                window_size,
                mode,
                algorithm,
                index,
            },
            header_len,
        ))
    }
}

/// Minimal big-endian encoding of `index`; zero encodes as a single zero byte.
pub fn index_to_bytes(index: u64) -> Vec<u8> {
    let bytes = index.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count().min(7);
    bytes[skip..].to_vec()
}

/// Big-endian accumulate over `bytes`.
///
/// # Errors
/// Fails if the value does not fit in a `u64`.
pub fn index_from_bytes(bytes: &[u8]) -> Result<u64, Error> {
    bytes.iter().try_fold(0u64, |acc, b| {
        if acc > u64::MAX >> 8 {
            return Err(Error::MalformedPackage("index exceeds 64 bits".into()));
        }
        Ok((acc << 8) | u64::from(*b))
    })
}

/// Encode `window` as an origin package: header followed by the concatenated blocks.
pub fn encode_origin(window: &OriginWindow) -> Package {
    let mut out = window.header().to_bytes();
    out.reserve(window.window_size() as usize * window.block_len());
    for block in window.blocks() {
        out.extend_from_slice(block);
    }
    Package(out)
}

/// Decode an origin package.
///
/// # Errors
/// Fails with `MalformedPackage` if the marker or sentinel is not `0x00`, the header is
/// truncated, or the payload does not split into `N` non-empty blocks of equal length.
pub fn decode_origin(bytes: &[u8], config: &Config) -> Result<OriginWindow, Error> {
    let (header, header_len) = Header::from_bytes(bytes, config)?;
    if bytes[0] != MARKER || bytes[header_len - 1] != SENTINEL {
        return Err(Error::MalformedPackage("sentinel".into()));
    }

    let body = &bytes[header_len..];
    let n = header.window_size as usize;
    if body.is_empty() || body.len() % n != 0 {
        return Err(Error::MalformedPackage(format!(
            "payload of {} bytes does not split into {} blocks",
            body.len(),
            n
        )));
    }

    let blocks = body.chunks(body.len() / n).map(|c| c.to_vec()).collect();
    OriginWindow::from_blocks(header, blocks)
}

/// Encode ladder output as a signature package.
pub fn encode_signature(sig_blocks: &[Vec<u8>], header: &Header) -> Package {
    let mut out = header.to_bytes();
    out.reserve(sig_blocks.iter().map(Vec::len).sum());
    for block in sig_blocks {
        out.extend_from_slice(block);
    }
    Package(out)
}

/// A decoded signature package.
///
/// Holds exactly `N` blocks: the first of `origin_len` bytes, the others of `block_len`
/// bytes. Deserialization re-checks this layout.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
#[cfg_attr(
    feature = "serde_enabled",
    serde(try_from = "SignatureParts", into = "SignatureParts")
)]
pub struct SignaturePackage {
    header: Header,
    origin_len: usize,
    block_len: usize,
    blocks: Vec<Vec<u8>>,
}

#[cfg(feature = "serde_enabled")]
#[serde_as]
#[derive(Serialize, Deserialize)]
struct SignatureParts {
    header: Header,
    #[serde_as(as = "Vec<Bytes>")]
    blocks: Vec<Vec<u8>>,
}

#[cfg(feature = "serde_enabled")]
impl TryFrom<SignatureParts> for SignaturePackage {
    type Error = Error;

    fn try_from(parts: SignatureParts) -> Result<Self, Error> {
        SignaturePackage::from_blocks(parts.header, parts.blocks)
    }
}

#[cfg(feature = "serde_enabled")]
impl From<SignaturePackage> for SignatureParts {
    fn from(sig: SignaturePackage) -> Self {
        SignatureParts {
            header: sig.header,
            blocks: sig.blocks,
        }
    }
}

impl SignaturePackage {
    /// Build a signature package from ladder blocks.
    ///
    /// # Errors
    /// Fails with `MalformedPackage` unless there are exactly `header.window_size` blocks,
    /// a non-empty first block, and tail blocks sharing one non-zero length. In mode X
    /// every block has the same length.
    pub fn from_blocks(header: Header, blocks: Vec<Vec<u8>>) -> Result<Self, Error> {
        let n = header.window_size as usize;
        if n == 0 || blocks.len() != n {
            return Err(Error::MalformedPackage(format!(
                "expected {} signature blocks, found {}",
                n,
                blocks.len()
            )));
        }
        let origin_len = blocks[0].len();
        let block_len = match (header.mode, blocks.get(1)) {
            (_, Some(b)) => b.len(),
            (Mode::S, None) => 0,
            (Mode::X, None) => origin_len,
        };
        let tail_ok = blocks[1..].iter().all(|b| b.len() == block_len);
        let shape_ok = match header.mode {
            Mode::S => n == 1 || block_len > 0,
            Mode::X => block_len == origin_len,
        };
        if origin_len == 0 || !tail_ok || !shape_ok {
            return Err(Error::MalformedPackage(
                "signature blocks do not share a valid layout".into(),
            ));
        }
        Ok(SignaturePackage {
            header,
            origin_len,
            block_len,
            blocks,
        })
    }

    /// The package header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Window size `N`.
    pub fn window_size(&self) -> u8 {
        self.header.window_size
    }

    /// Ladder mode.
    pub fn mode(&self) -> Mode {
        self.header.mode
    }

    /// Digest algorithm.
    pub fn algorithm(&self) -> &Algorithm {
        &self.header.algorithm
    }

    /// Index of the signed window.
    pub fn index(&self) -> u64 {
        self.header.index
    }

    /// Length of the first signature block.
    pub fn origin_len(&self) -> usize {
        self.origin_len
    }

    /// Length shared by the remaining signature blocks.
    pub fn block_len(&self) -> usize {
        self.block_len
    }

    /// The `N` signature blocks.
    pub fn blocks(&self) -> &[Vec<u8>] {
        &self.blocks
    }

    /// Total payload length.
    pub fn payload_len(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }
}

/// Decode a signature package, splitting the payload according to its mode.
///
/// Mode S: the first block is `config.origin_len()` bytes and the `N - 1` others share
/// the remaining length. Mode X: `N` blocks of equal length. The marker byte is advisory
/// for signatures and is not checked.
///
/// # Errors
/// Fails with `MalformedPackage` if the header is truncated or the payload does not split
/// into whole blocks.
pub fn decode_signature(bytes: &[u8], config: &Config) -> Result<SignaturePackage, Error> {
    let (header, header_len) = Header::from_bytes(bytes, config)?;
    let payload = &bytes[header_len..];
    let n = header.window_size as usize;

    let (origin_len, block_len) = match header.mode {
        Mode::S => split_linear(payload.len(), config.origin_len(), n)?,
        Mode::X => {
            if payload.is_empty() || payload.len() % n != 0 {
                return Err(Error::MalformedPackage(format!(
                    "payload of {} bytes does not split into {} equal blocks",
                    payload.len(),
                    n
                )));
            }
            let len = payload.len() / n;
            (len, len)
        }
    };

    let mut blocks = Vec::with_capacity(n);
    blocks.push(payload[..origin_len].to_vec());
    if block_len > 0 {
        blocks.extend(payload[origin_len..].chunks(block_len).map(|c| c.to_vec()));
    }

    Ok(SignaturePackage {
        header,
        origin_len,
        block_len,
        blocks,
    })
}

// (origin_len, block_len) of a mode S payload.
fn split_linear(payload_len: usize, origin_len: usize, n: usize) -> Result<(usize, usize), Error> {
    if origin_len == 0 || payload_len < origin_len {
        return Err(Error::MalformedPackage(format!(
            "payload of {} bytes is shorter than the {}-byte origin block",
            payload_len, origin_len
        )));
    }
    let rest = payload_len - origin_len;
    if n == 1 {
        if rest != 0 {
            return Err(Error::MalformedPackage(format!(
                "{} trailing bytes after a single-block signature",
                rest
            )));
        }
        return Ok((origin_len, 0));
    }
    if rest == 0 || rest % (n - 1) != 0 {
        return Err(Error::MalformedPackage(format!(
            "{} bytes do not split into {} ladder blocks",
            rest,
            n - 1
        )));
    }
    Ok((origin_len, rest / (n - 1)))
}
