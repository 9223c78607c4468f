//! Six component encoding of symmetric tensors
//!
//! Symmetric tensors only have six independent components, stored on disk in
//! the order `xx, xy, xz, yy, yz, zz`. In memory they are always expanded to
//! the full 3x3 with the off-diagonal mirrored.
//!
//! ```text
//!  [0 1 2]      | xx xy xz |
//!  [1 3 4]  =>  | xy yy yz |
//!  [2 4 5]      | xz yz zz |
//! ```

// crate modules
use crate::error::{Error, Result};
use crate::field::Field;

// external crates
use nalgebra::Matrix3;

/// Number of independent components in a symmetric 3x3 tensor
pub const SYMMETRIC_SIZE: usize = 6;

/// Row/column of every independent component, in storage order
pub const SYMMETRIC_INDICES: [(usize, usize); SYMMETRIC_SIZE] =
    [(0, 0), (0, 1), (0, 2), (1, 1), (1, 2), (2, 2)];

/// Which of the six stored components fills each position of the full 3x3
const EXPANSION: [usize; 9] = [0, 1, 2, 1, 3, 4, 2, 4, 5];

/// Expand six independent components into the full symmetric tensor
///
/// ```rust
/// # use datafoam_tensor::expand_components;
/// let m = expand_components(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
/// assert_eq!(m[(1, 0)], 2.0);
/// assert_eq!(m[(2, 1)], 5.0);
/// ```
pub fn expand_components(components: &[f64]) -> Matrix3<f64> {
    Matrix3::from_fn(|r, c| components[EXPANSION[r * 3 + c]])
}

/// Upper triangle of a tensor in storage order
///
/// The lower triangle is never read, so this is only lossless for tensors that
/// are actually symmetric.
pub fn flatten_components(m: &Matrix3<f64>) -> [f64; SYMMETRIC_SIZE] {
    SYMMETRIC_INDICES.map(|(r, c)| m[(r, c)])
}

/// Expand a raw `[N, 6]` symmetric tensor field into `[N, 3, 3]`
pub fn expand_symmetric(raw: &Field) -> Result<Field> {
    if raw.shape()[1..] != [SYMMETRIC_SIZE] {
        return Err(Error::UnexpectedShape {
            expected: "6 component symmetric tensor",
            found: raw.shape().to_vec(),
        });
    }

    let data = raw
        .data()
        .chunks_exact(SYMMETRIC_SIZE)
        .flat_map(|cell| EXPANSION.map(|i| cell[i]))
        .collect();

    Field::new(vec![raw.n_cells(), 3, 3], data)
}

/// Reduce a `[N, 3, 3]` field to its `[N, 6]` upper triangle
pub fn flatten_symmetric(field: &Field) -> Result<Field> {
    let data = field
        .matrices()?
        .iter()
        .flat_map(flatten_components)
        .collect();

    Field::new(vec![field.n_cells(), SYMMETRIC_SIZE], data)
}
