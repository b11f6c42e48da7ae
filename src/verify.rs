//! Cross-verification of two signature packages.
//!
//! Given signatures of windows `k` and `k + g`, the verifier decides whether the newer
//! one is a legitimate successor of the older one, using only the published blocks.
//!
//! * Mode S accepts any gap `0 < g < N`: hashing `newer[i]` `g` more times must give
//!   `older[i + g]` for every `i` in `0..N-g`.
//! * Mode X accepts adjacent signatures only (`g == 1`): `H(older[d-1] || newer[d-1])`
//!   must give `older[d]` for every `d` in `1..N`.
//!
//! Unrelated or out-of-range pairs are rejections, not errors. Errors are reserved for
//! digest providers that cannot run.
use crate::codec::SignaturePackage;
use crate::common::Mode;
use crate::errors::Error;
use crate::hash::{HashRegistry, Hasher};
use tracing::debug;

#[cfg(feature = "serde_enabled")]
use serde::{Deserialize, Serialize};

/// Why a pair of signatures was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Rejection {
    /// The packages disagree on `N` or on the algorithm.
    ParameterMismatch,
    /// The packages use different ladders.
    ModeMismatch,
    /// The index gap cannot be bridged by this mode.
    UnsupportedGap(u64),
    /// Block lengths of the two packages are not comparable.
    LayoutMismatch,
    /// The relation fails at this block of the older signature.
    ChainBroken {
        /// Position in the older signature.
        position: usize,
    },
}

/// Outcome of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde_enabled", derive(Serialize, Deserialize))]
pub enum Verdict {
    /// The newer signature continues the older one.
    Accepted,
    /// The pair does not verify.
    Rejected(Rejection),
}

impl Verdict {
    /// `true` for `Accepted`.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Verify two signatures, in either order.
pub fn verify(
    a: &SignaturePackage,
    b: &SignaturePackage,
    registry: &HashRegistry,
) -> Result<bool, Error> {
    check(a, b, registry).map(|v| v.is_accepted())
}

/// Verify two signatures, in either order, reporting why a pair is rejected.
///
/// # Errors
/// Only digest failures (unknown or misbehaving providers) are errors.
pub fn check(
    a: &SignaturePackage,
    b: &SignaturePackage,
    registry: &HashRegistry,
) -> Result<Verdict, Error> {
    let verdict = if a.window_size() != b.window_size() || a.algorithm() != b.algorithm() {
        Verdict::Rejected(Rejection::ParameterMismatch)
    } else if a.mode() != b.mode() {
        Verdict::Rejected(Rejection::ModeMismatch)
    } else {
        let hasher = registry.hasher(a.algorithm());
        match a.mode() {
            Mode::S => check_s(a, b, &hasher)?,
            Mode::X => check_x(a, b, &hasher)?,
        }
    };

    if let Verdict::Rejected(reason) = verdict {
        debug!(
            lhs = a.index(),
            rhs = b.index(),
            ?reason,
            "signature pair rejected"
        );
    }
    Ok(verdict)
}

// Lower index first.
fn order<'a>(
    a: &'a SignaturePackage,
    b: &'a SignaturePackage,
) -> (&'a SignaturePackage, &'a SignaturePackage) {
    if a.index() <= b.index() {
        (a, b)
    } else {
        (b, a)
    }
}

// Both packages must hold the same `N` blocks before any position is compared.
fn shape_mismatch(older: &SignaturePackage, newer: &SignaturePackage) -> Option<Rejection> {
    let n = older.window_size() as usize;
    if newer.window_size() != older.window_size() {
        Some(Rejection::ParameterMismatch)
    } else if older.blocks().len() != n || newer.blocks().len() != n {
        Some(Rejection::LayoutMismatch)
    } else {
        None
    }
}

/// Linear ladder verification for any gap `0 < g < N`.
pub fn check_s(
    a: &SignaturePackage,
    b: &SignaturePackage,
    hasher: &Hasher<'_>,
) -> Result<Verdict, Error> {
    let (older, newer) = order(a, b);
    if let Some(reason) = shape_mismatch(older, newer) {
        return Ok(Verdict::Rejected(reason));
    }
    let gap = newer.index() - older.index();
    let n = older.window_size() as usize;
    if gap == 0 || gap >= n as u64 {
        return Ok(Verdict::Rejected(Rejection::UnsupportedGap(gap)));
    }
    if older.origin_len() != newer.origin_len() || older.block_len() != newer.block_len() {
        return Ok(Verdict::Rejected(Rejection::LayoutMismatch));
    }

    let gap = gap as usize;
    let (old_blocks, new_blocks) = (older.blocks(), newer.blocks());
    for i in 0..n - gap {
        if hasher.hash_iter(&new_blocks[i], gap)? != old_blocks[i + gap] {
            return Ok(Verdict::Rejected(Rejection::ChainBroken { position: i + gap }));
        }
    }
    Ok(Verdict::Accepted)
}

/// Triangular ladder verification; only adjacent indices can be linked.
pub fn check_x(
    a: &SignaturePackage,
    b: &SignaturePackage,
    hasher: &Hasher<'_>,
) -> Result<Verdict, Error> {
    let (older, newer) = order(a, b);
    if let Some(reason) = shape_mismatch(older, newer) {
        return Ok(Verdict::Rejected(reason));
    }
    let gap = newer.index() - older.index();
    if gap != 1 {
        return Ok(Verdict::Rejected(Rejection::UnsupportedGap(gap)));
    }
    let n = older.window_size() as usize;
    let len = older.payload_len();
    if len != newer.payload_len() || len % n != 0 {
        return Ok(Verdict::Rejected(Rejection::LayoutMismatch));
    }

    let (old_blocks, new_blocks) = (older.blocks(), newer.blocks());
    for d in 1..n {
        if hasher.hash_pair(&old_blocks[d - 1], &new_blocks[d - 1])? != old_blocks[d] {
            return Ok(Verdict::Rejected(Rejection::ChainBroken { position: d }));
        }
    }
    Ok(Verdict::Accepted)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::{decode_origin, decode_signature, encode_origin};
    use crate::common::{Algorithm, Config};
    use crate::signer::sign;
    use crate::window::OriginWindow;
    use rand_core::OsRng;

    // Signatures of `count` consecutive windows.
    fn chain(config: &Config, count: usize) -> Vec<SignaturePackage> {
        let registry = HashRegistry::new();
        let mut w = OriginWindow::generate(&mut OsRng, config).unwrap();
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            let pkg = sign(&w, &registry).unwrap();
            out.push(decode_signature(pkg.as_bytes(), config).unwrap());
            w = w.step(&mut OsRng).unwrap();
        }
        out
    }

    #[test]
    fn linear_gaps() {
        let config = Config::default();
        let registry = HashRegistry::new();
        let sigs = chain(&config, 7);
        for g in 0..7 {
            let verdict = check(&sigs[0], &sigs[g], &registry).unwrap();
            if g > 0 && g < 5 {
                assert_eq!(verdict, Verdict::Accepted, "gap {}", g);
            } else {
                assert_eq!(
                    verdict,
                    Verdict::Rejected(Rejection::UnsupportedGap(g as u64))
                );
            }
        }
    }

    #[test]
    fn order_does_not_matter() {
        let config = Config::default();
        let registry = HashRegistry::new();
        let sigs = chain(&config, 3);
        assert!(verify(&sigs[2], &sigs[0], &registry).unwrap());
        assert!(verify(&sigs[1], &sigs[0], &registry).unwrap());
    }

    #[test]
    fn triangular_adjacency_only() {
        let config = Config::default().with_mode(Mode::X);
        let registry = HashRegistry::new();
        let sigs = chain(&config, 3);
        assert!(verify(&sigs[0], &sigs[1], &registry).unwrap());
        assert!(verify(&sigs[2], &sigs[1], &registry).unwrap());
        assert_eq!(
            check(&sigs[0], &sigs[2], &registry).unwrap(),
            Verdict::Rejected(Rejection::UnsupportedGap(2))
        );
        assert_eq!(
            check(&sigs[1], &sigs[1], &registry).unwrap(),
            Verdict::Rejected(Rejection::UnsupportedGap(0))
        );
    }

    #[test]
    fn unrelated_chains_break() {
        let config = Config::default();
        let registry = HashRegistry::new();
        let a = chain(&config, 2);
        let b = chain(&config, 2);
        assert_eq!(
            check(&a[0], &b[1], &registry).unwrap(),
            Verdict::Rejected(Rejection::ChainBroken { position: 1 })
        );
    }

    #[test]
    fn parameter_and_mode_mismatches() {
        let registry = HashRegistry::new();
        let base = chain(&Config::default(), 2);
        let wider = chain(&Config::default().with_window_size(6), 2);
        let other_alg = chain(&Config::default().with_algorithm(Algorithm::Sha3_256), 2);
        let triangular = chain(&Config::default().with_mode(Mode::X), 2);

        assert_eq!(
            check(&base[0], &wider[1], &registry).unwrap(),
            Verdict::Rejected(Rejection::ParameterMismatch)
        );
        assert_eq!(
            check(&base[0], &other_alg[1], &registry).unwrap(),
            Verdict::Rejected(Rejection::ParameterMismatch)
        );
        assert_eq!(
            check(&base[0], &triangular[1], &registry).unwrap(),
            Verdict::Rejected(Rejection::ModeMismatch)
        );
    }

    #[test]
    fn layout_mismatch_in_mode_s() {
        let registry = HashRegistry::new();
        let config = Config::default();
        let w0 = OriginWindow::generate(&mut OsRng, &config).unwrap();
        let w1 = w0.step(&mut OsRng).unwrap();
        let s0 = decode_signature(sign(&w0, &registry).unwrap().as_bytes(), &config).unwrap();

        // Four extra payload bytes spread over the four tail blocks.
        let mut padded = sign(&w1, &registry).unwrap().into_bytes();
        padded.extend_from_slice(&[0u8; 4]);
        let s1 = decode_signature(&padded, &config).unwrap();
        assert_eq!(s1.block_len(), 33);
        assert_eq!(
            check(&s0, &s1, &registry).unwrap(),
            Verdict::Rejected(Rejection::LayoutMismatch)
        );
    }

    #[test]
    fn direct_ladder_checks_reject_foreign_sizes() {
        let registry = HashRegistry::new();
        let hasher = registry.hasher(&Algorithm::Sha256);
        let five = chain(&Config::default(), 2);
        let two = chain(&Config::default().with_window_size(2), 2);
        assert_eq!(
            check_s(&five[0], &two[1], &hasher).unwrap(),
            Verdict::Rejected(Rejection::ParameterMismatch)
        );
        assert_eq!(
            check_s(&two[1], &five[0], &hasher).unwrap(),
            Verdict::Rejected(Rejection::ParameterMismatch)
        );

        let x = Config::default().with_mode(Mode::X);
        let x5 = chain(&x, 2);
        let x2 = chain(&x.with_window_size(2), 2);
        assert_eq!(
            check_x(&x5[0], &x2[1], &hasher).unwrap(),
            Verdict::Rejected(Rejection::ParameterMismatch)
        );
    }

    #[cfg(feature = "serde_enabled")]
    #[test]
    fn truncated_deserialized_package_never_reaches_the_ladder() {
        let registry = HashRegistry::new();
        let sigs = chain(&Config::default(), 2);
        let mut json = serde_json::to_value(&sigs[1]).unwrap();
        json["blocks"].as_array_mut().unwrap().truncate(3);
        assert!(serde_json::from_value::<SignaturePackage>(json).is_err());

        let back: SignaturePackage =
            serde_json::from_value(serde_json::to_value(&sigs[1]).unwrap()).unwrap();
        assert!(verify(&sigs[0], &back, &registry).unwrap());
    }

    #[test]
    fn single_block_windows_never_verify() {
        let config = Config::default().with_window_size(1);
        let registry = HashRegistry::new();
        let sigs = chain(&config, 2);
        assert!(!verify(&sigs[0], &sigs[1], &registry).unwrap());
    }

    #[test]
    fn verification_survives_origin_round_trip() {
        let config = Config::default();
        let registry = HashRegistry::new();
        let w0 = OriginWindow::generate(&mut OsRng, &config).unwrap();
        let w0 = decode_origin(encode_origin(&w0).as_bytes(), &config).unwrap();
        let w1 = w0.step(&mut OsRng).unwrap();
        let a = decode_signature(sign(&w0, &registry).unwrap().as_bytes(), &config).unwrap();
        let b = decode_signature(sign(&w1, &registry).unwrap().as_bytes(), &config).unwrap();
        assert!(verify(&a, &b, &registry).unwrap());
    }
}
