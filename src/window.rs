//! Origin windows: the secret, sliding state of a chain.
//!
//! A window holds `N` random blocks of one fixed length. Stepping drops the oldest block,
//! appends a fresh one and increments the index; it never mutates the current window.
use crate::codec::{self, Header, Package};
use crate::common::{Algorithm, Config, Mode};
use crate::errors::Error;
use rand_core::{CryptoRng, RngCore};
use std::fmt;
use tracing::debug;
use zeroize::Zeroize;

/// `N` equal-length random blocks at a given index. Blocks are wiped on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct OriginWindow {
    header: Header,
    blocks: Vec<Vec<u8>>,
}

impl Drop for OriginWindow {
    fn drop(&mut self) {
        self.blocks.zeroize();
    }
}

impl fmt::Debug for OriginWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginWindow")
            .field("header", &self.header)
            .field("block_len", &self.block_len())
            .finish_non_exhaustive()
    }
}

fn random_block<R: RngCore + CryptoRng>(rng: &mut R, len: usize) -> Vec<u8> {
    let mut block = vec![0u8; len];
    rng.fill_bytes(&mut block);
    block
}

impl OriginWindow {
    /// Draw a fresh window at index 0.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R, config: &Config) -> Result<Self, Error> {
        Self::generate_at(rng, config, 0)
    }

    /// Draw a fresh window starting at `index`.
    ///
    /// # Errors
    /// Fails with `InvalidConfig` if the configuration has no blocks or zero-length blocks.
    pub fn generate_at<R: RngCore + CryptoRng>(
        rng: &mut R,
        config: &Config,
        index: u64,
    ) -> Result<Self, Error> {
        let block_len = config.origin_len();
        if config.window_size == 0 || block_len == 0 {
            return Err(Error::InvalidConfig(format!(
                "cannot draw {} blocks of {} bytes",
                config.window_size, block_len
            )));
        }

        let blocks = (0..config.window_size)
            .map(|_| random_block(rng, block_len))
            .collect();
        debug!(n = config.window_size, index, "generated origin window");
        Ok(Self {
            header: Header::from_config(config, index),
            blocks,
        })
    }

    /// Build a window from existing blocks.
    ///
    /// # Errors
    /// Fails with `InvalidWindow` unless there are exactly `header.window_size` blocks,
    /// all non-empty and of the same length.
    pub fn from_blocks(header: Header, blocks: Vec<Vec<u8>>) -> Result<Self, Error> {
        let window = Self { header, blocks };
        window.check()?;
        Ok(window)
    }

    /// The next window: blocks shifted left by one, a fresh random block appended, index
    /// incremented.
    ///
    /// # Errors
    /// The function fails if
    /// * the window is not well formed (`InvalidWindow`)
    /// * the index is already `u64::MAX` (`IndexOverflow`)
    pub fn step<R: RngCore + CryptoRng>(&self, rng: &mut R) -> Result<Self, Error> {
        self.check()?;
        let index = self.header.index.checked_add(1).ok_or(Error::IndexOverflow)?;

        let mut blocks = Vec::with_capacity(self.blocks.len());
        blocks.extend(self.blocks[1..].iter().cloned());
        blocks.push(random_block(rng, self.block_len()));

        debug!(n = self.header.window_size, index, "stepped origin window");
        Ok(Self {
            header: Header {
                index,
                ..self.header.clone()
            },
            blocks,
        })
    }

    /// Decode an origin package, step it and re-encode it.
    ///
    /// # Errors
    /// Fails with `InvalidWindow` if `package` does not decode into a well-formed window,
    /// whatever the decoding failure, and with `IndexOverflow` at the end of the range.
    pub fn step_package<R: RngCore + CryptoRng>(
        package: &[u8],
        config: &Config,
        rng: &mut R,
    ) -> Result<Package, Error> {
        let window = codec::decode_origin(package, config).map_err(|e| match e {
            Error::MalformedPackage(reason) | Error::InvalidWindow(reason) => {
                Error::InvalidWindow(reason)
            }
            other => Error::InvalidWindow(other.to_string()),
        })?;
        Ok(codec::encode_origin(&window.step(rng)?))
    }

    /// The window header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Position of the window in the chain.
    pub fn index(&self) -> u64 {
        self.header.index
    }

    /// Number of blocks `N`.
    pub fn window_size(&self) -> u8 {
        self.header.window_size
    }

    /// Ladder mode the window is signed with.
    pub fn mode(&self) -> Mode {
        self.header.mode
    }

    /// Digest algorithm the window is signed with.
    pub fn algorithm(&self) -> &Algorithm {
        &self.header.algorithm
    }

    /// The raw blocks, oldest first.
    pub fn blocks(&self) -> &[Vec<u8>] {
        &self.blocks
    }

    /// Length shared by every block.
    pub fn block_len(&self) -> usize {
        self.blocks.first().map_or(0, Vec::len)
    }

    fn check(&self) -> Result<(), Error> {
        let n = self.header.window_size as usize;
        if self.blocks.len() != n {
            return Err(Error::InvalidWindow(format!(
                "expected {} blocks, found {}",
                n,
                self.blocks.len()
            )));
        }
        let len = self.block_len();
        if len == 0 || self.blocks.iter().any(|b| b.len() != len) {
            return Err(Error::InvalidWindow(
                "blocks must be non-empty and of equal length".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;
    use rand_core::OsRng;

    #[test]
    fn generate_shape() {
        let config = Config::default();
        let w = OriginWindow::generate(&mut OsRng, &config).unwrap();
        assert_eq!(w.index(), 0);
        assert_eq!(w.blocks().len(), 5);
        assert!(w.blocks().iter().all(|b| b.len() == 32));
        // Fresh randomness: blocks should not repeat.
        assert_ne!(w.blocks()[0], w.blocks()[1]);
    }

    #[test]
    fn generate_rejects_empty_shapes() {
        let config = Config::default().with_window_size(0);
        assert!(OriginWindow::generate(&mut OsRng, &config).is_err());
        let config = Config::default().with_origin_size(0);
        assert!(OriginWindow::generate(&mut OsRng, &config).is_err());
    }

    #[test]
    fn from_blocks_checks_shape() {
        let header = Header::from_config(&Config::default().with_window_size(2), 0);
        assert!(OriginWindow::from_blocks(header.clone(), vec![vec![1; 4]]).is_err());
        assert!(OriginWindow::from_blocks(header.clone(), vec![vec![1; 4], vec![2; 3]]).is_err());
        assert!(OriginWindow::from_blocks(header.clone(), vec![vec![], vec![]]).is_err());
        assert!(OriginWindow::from_blocks(header, vec![vec![1; 4], vec![2; 4]]).is_ok());
    }

    #[test]
    fn step_overflow() {
        let header = Header::from_config(&Config::default().with_window_size(1), u64::MAX);
        let w = OriginWindow::from_blocks(header, vec![vec![0; 8]]).unwrap();
        assert_eq!(w.step(&mut OsRng), Err(Error::IndexOverflow));
    }

    #[test]
    fn step_package_reports_invalid_window() {
        let config = Config::default();
        let w = OriginWindow::generate(&mut OsRng, &config).unwrap();
        let mut pkg = codec::encode_origin(&w).into_bytes();
        pkg[0] = 0x01;
        assert!(matches!(
            OriginWindow::step_package(&pkg, &config, &mut OsRng),
            Err(Error::InvalidWindow(_))
        ));

        pkg[0] = 0x00;
        pkg[4] = 0x42;
        assert!(matches!(
            OriginWindow::step_package(&pkg, &config, &mut OsRng),
            Err(Error::InvalidWindow(_))
        ));

        pkg[4] = Algorithm::Sha256.code();
        let next = OriginWindow::step_package(&pkg, &config, &mut OsRng).unwrap();
        let next = codec::decode_origin(next.as_bytes(), &config).unwrap();
        assert_eq!(next.index(), 1);
        assert_eq!(next.blocks()[..4], w.blocks()[1..]);
    }

    #[test]
    fn debug_hides_blocks() {
        let header = Header::from_config(&Config::default().with_window_size(1), 0);
        let w = OriginWindow::from_blocks(header, vec![vec![0xab; 4]]).unwrap();
        assert!(!format!("{:?}", w).contains("171"));
    }

    proptest! {
        #[test]
        fn stepping_shifts_blocks(n in 1u8..=16, steps in 1usize..8) {
            let config = Config::default().with_window_size(n);
            let mut w = OriginWindow::generate(&mut OsRng, &config).unwrap();
            for _ in 0..steps {
                let next = w.step(&mut OsRng).unwrap();
                prop_assert_eq!(next.index(), w.index() + 1);
                prop_assert_eq!(next.blocks().len(), n as usize);
                prop_assert_eq!(&next.blocks()[..n as usize - 1], &w.blocks()[1..]);
                prop_assert_eq!(next.block_len(), w.block_len());
                w = next;
            }
        }
    }
}
