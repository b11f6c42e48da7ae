//! Trait that defines an externally supplied digest
use crate::encoding::{Encoding, Exported};
use crate::errors::Error;

/// Trait that defines a digest provider registered in a
/// [`HashRegistry`](crate::hash::HashRegistry).
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use ulda_sign::encoding::{Encoding, Exported};
/// use ulda_sign::hash::HashRegistry;
/// use ulda_sign::traits::HashProvider;
/// use ulda_sign::{Algorithm, Error};
///
/// struct Fold;
///
/// impl HashProvider for Fold {
///     fn output(&self) -> Encoding {
///         Encoding::Hex
///     }
///
///     fn digest(&self, data: &[u8]) -> Result<Exported, Error> {
///         let mut acc = [0u8; 4];
///         for (i, b) in data.iter().enumerate() {
///             acc[i % 4] ^= *b;
///         }
///         Ok(Exported::Text(hex::encode(acc)))
///     }
/// }
///
/// let mut registry = HashRegistry::new();
/// registry.register("FOLD-32", 32, Fold).unwrap();
/// let registry = Arc::new(registry);
///
/// let digest = registry
///     .digest(&Algorithm::External("FOLD-32".into()), b"tilin")
///     .unwrap();
/// assert_eq!(digest.len(), 4);
/// ```
pub trait HashProvider: Send + Sync {
    /// Form in which `digest` returns its output.
    fn output(&self) -> Encoding {
        Encoding::Bytes
    }

    /// One-time readiness step, run before the first digest. The registry runs it at most
    /// once per successful initialisation, even under concurrent first use.
    fn prepare(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Digest `data`.
    fn digest(&self, data: &[u8]) -> Result<Exported, Error>;
}
