//! End-to-end chains driven through the `Ulda` facade.
use std::sync::Arc;
use ulda_sign::encoding::{Encoding, Exported};
use ulda_sign::hash::{FnProvider, HashRegistry};
use ulda_sign::verify::{Rejection, Verdict};
use ulda_sign::{Algorithm, Config, Error, Mode, Ulda};

use sha2::{Digest, Sha256};

fn ulda(config: Config) -> Ulda {
    Ulda::new(config, Arc::new(HashRegistry::new())).unwrap()
}

// Signatures of `count` consecutive origins, the first at index 0.
fn signatures(ulda: &Ulda, count: usize) -> Vec<Exported> {
    let mut origin = ulda.new_origin().unwrap();
    let mut sigs = Vec::with_capacity(count);
    for _ in 0..count {
        sigs.push(ulda.sign(&origin).unwrap());
        origin = ulda.step_up(&origin).unwrap();
    }
    sigs
}

fn flip(value: &Exported, format: Encoding, offset: usize) -> Exported {
    let mut bytes = format.import(value).unwrap();
    bytes[offset] ^= 0x80;
    format.export(&bytes)
}

#[test]
fn five_block_linear_chain() {
    let u = ulda(Config::default());
    let s = signatures(&u, 3);
    assert!(u.verify(&s[0], &s[1]).unwrap());
    assert!(u.verify(&s[1], &s[2]).unwrap());
    assert!(u.verify(&s[0], &s[2]).unwrap());
}

#[test]
fn two_block_linear_chain() {
    let u = ulda(Config::default().with_window_size(2));
    let s = signatures(&u, 3);
    assert!(u.verify(&s[0], &s[1]).unwrap());
    assert!(u.verify(&s[1], &s[2]).unwrap());
    assert!(!u.verify(&s[0], &s[2]).unwrap());
}

#[test]
fn linear_gap_window() {
    let u = ulda(Config::default());
    let s = signatures(&u, 7);
    for g in 0..7 {
        assert_eq!(u.verify(&s[0], &s[g]).unwrap(), g > 0 && g < 5, "gap {}", g);
    }
}

#[test]
fn triangular_chain() {
    let u = ulda(Config::default().with_mode(Mode::X).with_algorithm(Algorithm::Sha3_256));
    let s = signatures(&u, 4);
    for pair in s.windows(2) {
        assert!(u.verify(&pair[0], &pair[1]).unwrap());
    }
    assert!(!u.verify(&s[0], &s[2]).unwrap());
    assert!(!u.verify(&s[1], &s[3]).unwrap());
}

#[test]
fn foreign_chains_reject_without_error() {
    let base = ulda(Config::default());
    let s = signatures(&base, 2);

    let foreign = [
        Config::default().with_window_size(4),
        Config::default().with_mode(Mode::X),
        Config::default().with_algorithm(Algorithm::Blake3),
        Config::default().with_algorithm(Algorithm::Blake2b256),
    ];
    for config in foreign.iter() {
        let other = signatures(&ulda(config.clone()), 2);
        assert!(!base.verify(&s[0], &other[1]).unwrap(), "{:?}", config);
        assert!(!base.verify(&other[0], &s[1]).unwrap(), "{:?}", config);
    }

    // Same parameters, different chain.
    let other = signatures(&base, 2);
    assert!(matches!(
        base.check(&s[0], &other[1]).unwrap(),
        Verdict::Rejected(Rejection::ChainBroken { .. })
    ));
}

#[test]
fn linear_tampering_in_bound_blocks() {
    let u = ulda(Config::default().with_format(Encoding::Bytes));
    let s = signatures(&u, 2);
    let header_len = 7;

    // Gap 1: newer blocks 0..4 and older blocks 1..5 take part.
    for block in 0..4 {
        let offset = header_len + block * 32 + 17;
        let bad = flip(&s[1], Encoding::Bytes, offset);
        assert!(!u.verify(&s[0], &bad).unwrap(), "newer block {}", block);
    }
    for block in 1..5 {
        let offset = header_len + block * 32;
        let bad = flip(&s[0], Encoding::Bytes, offset);
        assert!(!u.verify(&bad, &s[1]).unwrap(), "older block {}", block);
    }
}

#[test]
fn triangular_tampering_in_bound_blocks() {
    let u = ulda(Config::default().with_mode(Mode::X).with_format(Encoding::Base64));
    let s = signatures(&u, 2);
    let header_len = 7;

    for block in 0..5 {
        let bad = flip(&s[0], Encoding::Base64, header_len + block * 32 + 3);
        assert!(!u.verify(&bad, &s[1]).unwrap(), "older block {}", block);
    }
    for block in 0..4 {
        let bad = flip(&s[1], Encoding::Base64, header_len + block * 32 + 3);
        assert!(!u.verify(&s[0], &bad).unwrap(), "newer block {}", block);
    }
}

#[test]
fn every_export_form() {
    for format in [Encoding::Hex, Encoding::Base64, Encoding::Bytes].iter() {
        let u = ulda(Config::default().with_format(*format));
        let s = signatures(&u, 2);
        match format {
            Encoding::Bytes => assert!(s[0].as_bytes().is_some()),
            _ => assert!(s[0].as_text().is_some()),
        }
        assert!(u.verify(&s[0], &s[1]).unwrap(), "{:?}", format);
    }
}

#[test]
fn malformed_packages_are_errors() {
    let u = ulda(Config::default());
    let s = signatures(&u, 1);
    let truncated = Exported::Text("000705".into());
    assert!(matches!(
        u.verify(&s[0], &truncated),
        Err(Error::MalformedPackage(_))
    ));
    assert!(matches!(
        u.sign(&truncated),
        Err(Error::MalformedPackage(_))
    ));
}

#[test]
fn external_double_sha256() {
    let mut registry = HashRegistry::new();
    registry
        .register(
            "DOUBLE-SHA256",
            256,
            FnProvider::new(Encoding::Hex, |data: &[u8]| {
                Exported::Text(hex::encode(Sha256::digest(Sha256::digest(data))))
            }),
        )
        .unwrap();

    let alg = Algorithm::External("DOUBLE-SHA256".into());
    let config = Config::default().with_algorithm(alg.clone());
    let u = Ulda::new(config, Arc::new(registry)).unwrap();
    let s = signatures(&u, 3);
    assert!(u.verify(&s[0], &s[2]).unwrap());

    // External digests travel as the reserved code.
    let sig = u.import_signature(&s[0]).unwrap();
    assert_eq!(sig.algorithm(), &alg);
    let raw = Encoding::Hex.import(&s[0]).unwrap();
    assert_eq!(raw[4], 0xff);

    // A chain configured with a built-in digest cannot read it.
    let plain = ulda(Config::default());
    assert!(matches!(
        plain.import_signature(&s[0]),
        Err(Error::UnknownAlgorithm(_))
    ));
}

#[test]
fn chain_across_a_byte_boundary() {
    let u = ulda(Config::default().with_window_size(3));
    let mut origin = u.new_origin_at(254).unwrap();
    let mut prev = u.sign(&origin).unwrap();
    for index in 255..258u64 {
        origin = u.step_up(&origin).unwrap();
        let sig = u.sign(&origin).unwrap();
        assert_eq!(u.import_signature(&sig).unwrap().index(), index);
        assert!(u.verify(&prev, &sig).unwrap());
        prev = sig;
    }
}

#[cfg(feature = "serde_enabled")]
#[test]
fn config_and_verdict_serialize() {
    let config = Config::default()
        .with_mode(Mode::X)
        .with_algorithm(Algorithm::External("DOUBLE-SHA256".into()));
    let json = serde_json::to_string(&config).unwrap();
    let back: Config = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let verdict = Verdict::Rejected(Rejection::UnsupportedGap(3));
    let json = serde_json::to_string(&verdict).unwrap();
    assert_eq!(serde_json::from_str::<Verdict>(&json).unwrap(), verdict);
}
