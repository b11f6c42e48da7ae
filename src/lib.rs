//! ULDA hash-ladder signatures.
//!
//! A chain is a sliding window of `N` random blocks. Stepping drops the oldest block,
//! appends a fresh one and bumps the index. A signature is a deterministic ladder of
//! hashes over the window, and two signatures whose indices are close enough can be
//! checked against each other from their published bytes alone:
//!
//! * mode S (linear ladder) links any two signatures with index gap `0 < g < N`;
//! * mode X (triangular ladder) links adjacent signatures only.
//!
//! The [`Ulda`] facade covers the usual life cycle over exported packages. The modules
//! below expose each stage on its own.
#![warn(missing_docs, rust_2018_idioms)]

mod common;
mod errors;

pub mod codec;
pub mod encoding;
pub mod hash;
pub mod ladder;
pub mod signer;
pub mod traits;
pub mod ulda;
pub mod verify;
pub mod window;

pub use common::*;
pub use errors::Error;
pub use ulda::Ulda;
