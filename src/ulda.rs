//! Config-driven entry point working on exported packages.
//!
//! `Ulda` binds a [`Config`] to a [`HashRegistry`] and exposes the whole life cycle of a
//! chain over [`Exported`] values: hex or base64 text, or raw bytes, depending on
//! `config.format`.
use crate::codec::{self, SignaturePackage};
use crate::common::Config;
use crate::encoding::Exported;
use crate::errors::Error;
use crate::hash::HashRegistry;
use crate::signer;
use crate::verify::{self, Verdict};
use crate::window::OriginWindow;
use rand_core::OsRng;
use std::sync::Arc;

/// A configured ULDA chain.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use ulda_sign::hash::HashRegistry;
/// use ulda_sign::{Config, Ulda};
///
/// let ulda = Ulda::new(Config::default(), Arc::new(HashRegistry::new())).unwrap();
///
/// let o0 = ulda.new_origin().unwrap();
/// let o1 = ulda.step_up(&o0).unwrap();
///
/// let s0 = ulda.sign(&o0).unwrap();
/// let s1 = ulda.sign(&o1).unwrap();
/// assert!(ulda.verify(&s0, &s1).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct Ulda {
    config: Config,
    registry: Arc<HashRegistry>,
}

impl Ulda {
    /// Bind `config` to `registry`.
    ///
    /// # Errors
    /// Fails if `config` does not validate against `registry`.
    pub fn new(config: Config, registry: Arc<HashRegistry>) -> Result<Self, Error> {
        config.validate(&registry)?;
        Ok(Self { config, registry })
    }

    /// The chain configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The registry digests are resolved in.
    pub fn registry(&self) -> &Arc<HashRegistry> {
        &self.registry
    }

    /// A fresh origin package at index 0.
    pub fn new_origin(&self) -> Result<Exported, Error> {
        self.new_origin_at(0)
    }

    /// A fresh origin package at `index`.
    pub fn new_origin_at(&self, index: u64) -> Result<Exported, Error> {
        let window = OriginWindow::generate_at(&mut OsRng, &self.config, index)?;
        Ok(self.export(codec::encode_origin(&window).as_bytes()))
    }

    /// The origin package following `origin`.
    ///
    /// # Errors
    /// Fails with `InvalidWindow` if `origin` does not decode into a window, and with
    /// `IndexOverflow` at the end of the index range.
    pub fn step_up(&self, origin: &Exported) -> Result<Exported, Error> {
        let bytes = self.config.format.import(origin)?;
        let next = OriginWindow::step_package(&bytes, &self.config, &mut OsRng)?;
        Ok(self.export(next.as_bytes()))
    }

    /// Sign an origin package.
    ///
    /// # Errors
    /// Fails with `InvalidWindow` if the origin blocks are not `config.origin_size` bits
    /// long, since the signature could not be split back by this chain.
    pub fn sign(&self, origin: &Exported) -> Result<Exported, Error> {
        let window = self.import_origin(origin)?;
        if window.block_len() != self.config.origin_len() {
            return Err(Error::InvalidWindow(format!(
                "origin blocks of {} bytes, chain expects {}",
                window.block_len(),
                self.config.origin_len()
            )));
        }
        let package = signer::sign(&window, &self.registry)?;
        Ok(self.export(package.as_bytes()))
    }

    /// Verify two signature packages, in either order.
    ///
    /// # Errors
    /// Fails if either package does not decode, or a digest provider fails. Unrelated
    /// signatures are `Ok(false)`.
    pub fn verify(&self, a: &Exported, b: &Exported) -> Result<bool, Error> {
        self.check(a, b).map(|v| v.is_accepted())
    }

    /// Like [`Ulda::verify`], reporting why a pair is rejected.
    pub fn check(&self, a: &Exported, b: &Exported) -> Result<Verdict, Error> {
        let a = self.import_signature(a)?;
        let b = self.import_signature(b)?;
        verify::check(&a, &b, &self.registry)
    }

    /// Decode an exported origin package.
    pub fn import_origin(&self, origin: &Exported) -> Result<OriginWindow, Error> {
        let bytes = self.config.format.import(origin)?;
        codec::decode_origin(&bytes, &self.config)
    }

    /// Decode an exported signature package.
    pub fn import_signature(&self, signature: &Exported) -> Result<SignaturePackage, Error> {
        let bytes = self.config.format.import(signature)?;
        codec::decode_signature(&bytes, &self.config)
    }

    fn export(&self, bytes: &[u8]) -> Exported {
        self.config.format.export(bytes)
    }
}
