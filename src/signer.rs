//! Signing: ladder a window and package the result as a standalone signature.
use crate::codec::{self, Package};
use crate::errors::Error;
use crate::hash::HashRegistry;
use crate::ladder;
use crate::window::OriginWindow;
use tracing::debug;

/// Sign `window` with its own mode and algorithm. The package carries the window's
/// `N`, mode, algorithm and index; origin blocks beyond `b[0]` never leave the window.
///
/// # Example
/// ```
/// use rand_core::OsRng;
/// use ulda_sign::hash::HashRegistry;
/// use ulda_sign::window::OriginWindow;
/// use ulda_sign::{signer, verify, codec, Config};
///
/// let config = Config::default();
/// let registry = HashRegistry::new();
///
/// let w0 = OriginWindow::generate(&mut OsRng, &config).unwrap();
/// let w1 = w0.step(&mut OsRng).unwrap();
///
/// let s0 = signer::sign(&w0, &registry).unwrap();
/// let s1 = signer::sign(&w1, &registry).unwrap();
///
/// let a = codec::decode_signature(s0.as_bytes(), &config).unwrap();
/// let b = codec::decode_signature(s1.as_bytes(), &config).unwrap();
/// assert!(verify::verify(&a, &b, &registry).unwrap());
/// ```
pub fn sign(window: &OriginWindow, registry: &HashRegistry) -> Result<Package, Error> {
    let hasher = registry.hasher(window.algorithm());
    let output = ladder::ladder(window.mode(), window.blocks(), &hasher)?;
    debug!(
        index = window.index(),
        n = window.window_size(),
        mode = %window.mode(),
        algorithm = %window.algorithm(),
        "signed window"
    );
    Ok(codec::encode_signature(&output.blocks, window.header()))
}
