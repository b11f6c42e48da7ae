//! The two ladders turning a window `b[0..N]` into `N` signature blocks.
//!
//! * Mode S: `sig[i] = H^i(b[i])`. Later blocks are more cooked, so an older signature's
//!   tail can be reached by hashing a newer signature's head forward.
//! * Mode X: a triangle whose row 0 is the window and whose row `d` holds
//!   `H(row[d-1][i] || row[d-1][i+1])`; the signature is the first element of every row,
//!   so `sig[0] = b[0]` and `sig[N-1]` is the apex.
//!
//! With the `parallel` feature, blocks of mode S and entries of a single X row are
//! computed on the rayon pool. X rows are always produced in order.
use crate::common::Mode;
use crate::errors::Error;
use crate::hash::Hasher;
use tracing::trace;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Ladder output: the `N` signature blocks, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderOutput {
    /// Signature blocks.
    pub blocks: Vec<Vec<u8>>,
}

impl LadderOutput {
    /// The most cooked block, `sig[N-1]`.
    pub fn final_block(&self) -> &[u8] {
        self.blocks.last().map(Vec::as_slice).unwrap_or_default()
    }
}

/// Run the ladder of `mode` over `blocks`.
pub fn ladder(mode: Mode, blocks: &[Vec<u8>], hasher: &Hasher<'_>) -> Result<LadderOutput, Error> {
    match mode {
        Mode::S => ladder_s(blocks, hasher),
        Mode::X => ladder_x(blocks, hasher),
    }
}

/// Linear ladder: `sig[i] = H^i(b[i])`.
///
/// # Errors
/// Fails with `EmptyWindow` if `blocks` is empty, and propagates digest errors.
pub fn ladder_s(blocks: &[Vec<u8>], hasher: &Hasher<'_>) -> Result<LadderOutput, Error> {
    if blocks.is_empty() {
        return Err(Error::EmptyWindow);
    }
    trace!(n = blocks.len(), algorithm = %hasher.algorithm(), "linear ladder");

    #[cfg(feature = "parallel")]
    let iter = blocks.par_iter();
    #[cfg(not(feature = "parallel"))]
    let iter = blocks.iter();

    let out = iter
        .enumerate()
        .map(|(i, b)| hasher.hash_iter(b, i))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(LadderOutput { blocks: out })
}

/// Triangular ladder: first element of each row of pairwise hashes.
///
/// # Errors
/// Fails with `EmptyWindow` if `blocks` is empty, and propagates digest errors.
pub fn ladder_x(blocks: &[Vec<u8>], hasher: &Hasher<'_>) -> Result<LadderOutput, Error> {
    let first = blocks.first().ok_or(Error::EmptyWindow)?;
    trace!(n = blocks.len(), algorithm = %hasher.algorithm(), "triangular ladder");

    let mut out = Vec::with_capacity(blocks.len());
    out.push(first.clone());

    let mut row = next_row(blocks, hasher)?;
    while let Some(head) = row.first() {
        out.push(head.clone());
        row = next_row(&row, hasher)?;
    }

    Ok(LadderOutput { blocks: out })
}

/// Every row of the X triangle, row 0 being the window itself.
pub fn triangle(blocks: &[Vec<u8>], hasher: &Hasher<'_>) -> Result<Vec<Vec<Vec<u8>>>, Error> {
    if blocks.is_empty() {
        return Err(Error::EmptyWindow);
    }
    let mut rows = vec![blocks.to_vec()];
    for _ in 1..blocks.len() {
        let next = next_row(&rows[rows.len() - 1], hasher)?;
        rows.push(next);
    }
    Ok(rows)
}

// row[d][i] = H(row[d-1][i] || row[d-1][i+1]); empty once `prev` has a single entry.
fn next_row(prev: &[Vec<u8>], hasher: &Hasher<'_>) -> Result<Vec<Vec<u8>>, Error> {
    #[cfg(feature = "parallel")]
    let pairs = prev.par_windows(2);
    #[cfg(not(feature = "parallel"))]
    let pairs = prev.windows(2);

    pairs
        .map(|pair| hasher.hash_pair(&pair[0], &pair[1]))
        .collect()
}
