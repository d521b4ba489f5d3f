//! Dimension decomposition for vectors wider than GLSL supports
//!
//! A `vec<n>` with `n > 4` is stored as a struct of native chunks
//! `a0, a1, ...`. The chunk sizes come from peeling trailing `vec4`s, except
//! that a leftover of 5 becomes `[2, 3]` so no 1-wide member is produced
//! from it:
//!
//! ```text
//! n = 6  → [2, 4]
//! n = 7  → [3, 4]
//! n = 9  → [2, 3, 4]
//! n = 13 → [2, 3, 4, 4]
//! ```
//!
//! Struct generation, element access and constant fills all go through
//! [`decompose`], so they always agree on the layout.
//!
//! Author: Moroya Sakamoto

use crate::error::{Error, Result};
use crate::types::MAX_NATIVE_WIDTH;

/// Chunk sizes covering a vector of length `n`
pub fn decompose(n: usize) -> Vec<usize> {
    let mut chunks = Vec::new();
    let mut rest = n;
    while rest > MAX_NATIVE_WIDTH && rest != 5 {
        rest -= MAX_NATIVE_WIDTH;
        chunks.push(MAX_NATIVE_WIDTH);
    }
    if rest == 5 {
        chunks.push(3);
        chunks.push(2);
    } else {
        chunks.push(rest);
    }
    chunks.reverse();
    chunks
}

/// Position of element `k` in the layout of a length-`n` vector.
///
/// Returns `(chunk, offset)` such that the element lives at
/// `.a<chunk>[<offset>]`.
pub fn locate(k: usize, n: usize) -> Result<(usize, usize)> {
    let mut rest = k;
    for (i, size) in decompose(n).into_iter().enumerate() {
        if rest < size {
            return Ok((i, rest));
        }
        rest -= size;
    }
    Err(Error::InvariantViolation(format!(
        "index {} outside of decomposed vec{}",
        k, n
    )))
}
