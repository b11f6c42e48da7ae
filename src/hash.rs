//! Resolution of algorithm identifiers to digest functions.
//!
//! Built-in algorithms are computed directly. Any other identifier must be registered
//! with a [`HashProvider`] and its declared output size before the registry is shared;
//! the registry is immutable afterwards.
use crate::common::Algorithm;
use crate::encoding::{Encoding, Exported};
use crate::errors::Error;
use crate::traits::HashProvider;
use blake2::digest::consts::U32;
use blake2::Blake2b;
use once_cell::sync::OnceCell;
use sha2::{Digest, Sha256, Sha384, Sha512};
use sha3::{Sha3_256, Sha3_512};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type Blake2b256 = Blake2b<U32>;

struct External {
    provider: Arc<dyn HashProvider>,
    output_bits: usize,
    ready: OnceCell<()>,
}

/// Registry of digest providers.
#[derive(Default)]
pub struct HashRegistry {
    external: HashMap<String, External>,
}

impl fmt::Debug for HashRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.external.keys().collect();
        ids.sort();
        f.debug_struct("HashRegistry").field("external", &ids).finish()
    }
}

impl HashRegistry {
    /// Registry holding only the built-in algorithms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an external provider under `id`, declaring its output size in bits.
    ///
    /// # Errors
    /// The function fails if
    /// * `id` names a built-in algorithm or is already registered
    /// * `output_bits` is not a positive multiple of 8
    pub fn register<P>(
        &mut self,
        id: impl Into<String>,
        output_bits: usize,
        provider: P,
    ) -> Result<(), Error>
    where
        P: HashProvider + 'static,
    {
        let id = id.into();
        if Algorithm::from_id(&id).builtin_len().is_some() || self.external.contains_key(&id) {
            return Err(Error::DuplicateAlgorithm(id));
        }
        if output_bits == 0 || output_bits % 8 != 0 {
            return Err(Error::InvalidConfig(format!(
                "hasher <{}> output of {} bits is not a whole number of bytes",
                id, output_bits
            )));
        }

        debug!(algorithm = %id, output_bits, "registered external hasher");
        self.external.insert(
            id,
            External {
                provider: Arc::new(provider),
                output_bits,
                ready: OnceCell::new(),
            },
        );
        Ok(())
    }

    /// `true` if `alg` can be digested with this registry.
    pub fn is_known(&self, alg: &Algorithm) -> bool {
        match alg {
            Algorithm::External(id) => self.external.contains_key(id),
            _ => true,
        }
    }

    /// Digest length of `alg`, in bytes.
    pub fn output_len(&self, alg: &Algorithm) -> Result<usize, Error> {
        if let Some(len) = alg.builtin_len() {
            return Ok(len);
        }
        self.lookup(alg.id()).map(|ext| ext.output_bits / 8)
    }

    /// Digest `data` with `alg`.
    ///
    /// # Errors
    /// The function fails if
    /// * `alg` is neither built in nor registered
    /// * the provider's readiness step fails
    /// * the provider's output cannot be decoded or differs from its declared size
    pub fn digest(&self, alg: &Algorithm, data: &[u8]) -> Result<Vec<u8>, Error> {
        let id = match alg {
            Algorithm::Sha256 => return Ok(Sha256::digest(data).to_vec()),
            Algorithm::Sha384 => return Ok(Sha384::digest(data).to_vec()),
            Algorithm::Sha512 => return Ok(Sha512::digest(data).to_vec()),
            Algorithm::Sha3_256 => return Ok(Sha3_256::digest(data).to_vec()),
            Algorithm::Sha3_512 => return Ok(Sha3_512::digest(data).to_vec()),
            Algorithm::Blake3 => return Ok(blake3::hash(data).as_bytes().to_vec()),
            Algorithm::Blake2b256 => return Ok(Blake2b256::digest(data).to_vec()),
            Algorithm::External(id) => id,
        };

        let ext = self.lookup(id)?;
        self.ensure_ready(id, ext)?;

        let raw = ext.provider.digest(data)?;
        let bytes = match raw {
            Exported::Bytes(b) => b,
            text => ext.provider.output().import(&text)?,
        };
        if bytes.len() * 8 != ext.output_bits {
            return Err(Error::SizeMismatch {
                algorithm: id.clone(),
                expected: ext.output_bits,
                actual: bytes.len() * 8,
            });
        }
        Ok(bytes)
    }

    /// Bind `alg` to this registry.
    pub fn hasher<'a>(&'a self, alg: &'a Algorithm) -> Hasher<'a> {
        Hasher {
            registry: self,
            algorithm: alg,
        }
    }

    fn lookup(&self, id: &str) -> Result<&External, Error> {
        self.external
            .get(id)
            .ok_or_else(|| Error::UnknownAlgorithm(id.to_string()))
    }

    // Concurrent first users block on the single in-flight `prepare`. A failure is not
    // memoized, so the next call retries.
    fn ensure_ready(&self, id: &str, ext: &External) -> Result<(), Error> {
        ext.ready
            .get_or_try_init(|| {
                debug!(algorithm = %id, "preparing external hasher");
                ext.provider.prepare().map_err(|e| Error::ProviderInit {
                    algorithm: id.to_string(),
                    reason: e.to_string(),
                })
            })
            .map(|_| ())
    }
}

/// An algorithm bound to the registry that computes it.
#[derive(Debug, Clone, Copy)]
pub struct Hasher<'a> {
    registry: &'a HashRegistry,
    algorithm: &'a Algorithm,
}

impl<'a> Hasher<'a> {
    /// The bound algorithm.
    pub fn algorithm(&self) -> &'a Algorithm {
        self.algorithm
    }

    /// `H(data)`
    pub fn hash(&self, data: &[u8]) -> Result<Vec<u8>, Error> {
        self.registry.digest(self.algorithm, data)
    }

    /// `H(lhs || rhs)`
    pub fn hash_pair(&self, lhs: &[u8], rhs: &[u8]) -> Result<Vec<u8>, Error> {
        let mut buf = Vec::with_capacity(lhs.len() + rhs.len());
        buf.extend_from_slice(lhs);
        buf.extend_from_slice(rhs);
        self.hash(&buf)
    }

    /// `H^times(data)`; zero applications return `data` unchanged.
    pub fn hash_iter(&self, data: &[u8], times: usize) -> Result<Vec<u8>, Error> {
        let mut out = data.to_vec();
        for _ in 0..times {
            out = self.hash(&out)?;
        }
        Ok(out)
    }
}

/// A provider backed by a closure.
pub struct FnProvider<F> {
    output: Encoding,
    func: F,
}

impl<F> FnProvider<F>
where
    F: Fn(&[u8]) -> Exported + Send + Sync,
{
    /// Wrap `func`, whose output comes in the `output` form.
    pub fn new(output: Encoding, func: F) -> Self {
        Self { output, func }
    }
}

impl<F> HashProvider for FnProvider<F>
where
    F: Fn(&[u8]) -> Exported + Send + Sync,
{
    fn output(&self) -> Encoding {
        self.output
    }

    fn digest(&self, data: &[u8]) -> Result<Exported, Error> {
        Ok((self.func)(data))
    }
}
