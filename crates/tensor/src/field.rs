//! Dense per-cell field arrays

// crate modules
use crate::error::{Error, Result};

// external crates
use nalgebra::{Matrix3, Vector3};

/// Number of tensors in a stacked basis, i.e. T1..T10
pub const BASIS_SIZE: usize = 10;

/// A per-cell numeric array over the `N` cells of a case
///
/// Values are stored row-major and contiguous, so the data for cell `i` is
/// always `data[i*stride..(i+1)*stride]`. The first dimension of the shape is
/// the number of cells.
///
/// | Rank | Shape           | Typical fields                     |
/// | ---- | --------------- | ---------------------------------- |
/// | 1    | `[N]`           | k, nut, wallDistance               |
/// | 2    | `[N, W]`        | U, C, stacked invariants (W=47)    |
/// | 3    | `[N, 3, 3]`     | gradU, S, R, tau                   |
/// | 4    | `[N, 10, 3, 3]` | stacked basis tensors T1..T10      |
///
/// Symmetric tensors are always held as the full 3x3 in memory. See
/// [expand_symmetric()](crate::expand_symmetric) for the 6 component form.
///
/// ```rust
/// # use datafoam_tensor::Field;
/// let k = Field::uniform(1.5, 4);
/// assert_eq!(k.shape(), &[4]);
/// assert_eq!(k.scalars().unwrap(), &[1.5, 1.5, 1.5, 1.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Field {
    /// Build a field from an explicit shape and row-major payload
    ///
    /// Fails if the rank is outside 1..=4 or the payload does not fill the
    /// shape exactly.
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self> {
        if shape.is_empty() || shape.len() > 4 {
            return Err(Error::InvalidRank(shape.len()));
        }

        if shape.iter().product::<usize>() != data.len() {
            return Err(Error::InvalidShape {
                shape,
                found: data.len(),
            });
        }

        Ok(Self { shape, data })
    }

    /// Scalar field, one value per cell
    pub fn from_scalars(values: Vec<f64>) -> Self {
        Self {
            shape: vec![values.len()],
            data: values,
        }
    }

    /// Broadcast a single uniform value to every cell
    ///
    /// Constant fields must never be persisted as a single value, consumers
    /// rely on every field having a leading dimension of `N`.
    pub fn uniform(value: f64, n_cells: usize) -> Self {
        Self::from_scalars(vec![value; n_cells])
    }

    /// Broadcast one row of `width` values (vector/tensor) to every cell
    pub fn uniform_row(row: &[f64], tail: &[usize], n_cells: usize) -> Result<Self> {
        let mut shape = vec![n_cells];
        shape.extend_from_slice(tail);
        let data = row
            .iter()
            .copied()
            .cycle()
            .take(row.len() * n_cells)
            .collect();
        Self::new(shape, data)
    }

    /// Vector field of 3 components per cell
    pub fn from_vectors(vectors: &[Vector3<f64>]) -> Self {
        Self {
            shape: vec![vectors.len(), 3],
            data: vectors.iter().flat_map(|v| [v.x, v.y, v.z]).collect(),
        }
    }

    /// Full 3x3 tensor field, written row-major per cell
    pub fn from_matrices(matrices: &[Matrix3<f64>]) -> Self {
        let mut data = Vec::with_capacity(matrices.len() * 9);
        for m in matrices {
            push_row_major(&mut data, m);
        }
        Self {
            shape: vec![matrices.len(), 3, 3],
            data,
        }
    }

    /// Stacked basis of ten 3x3 tensors per cell
    pub fn from_basis(basis: &[[Matrix3<f64>; BASIS_SIZE]]) -> Self {
        let mut data = Vec::with_capacity(basis.len() * BASIS_SIZE * 9);
        for stack in basis {
            for m in stack {
                push_row_major(&mut data, m);
            }
        }
        Self {
            shape: vec![basis.len(), BASIS_SIZE, 3, 3],
            data,
        }
    }

    /// Stack several scalar fields as the columns of a `[N, W]` field
    pub fn from_columns(columns: &[Field]) -> Result<Self> {
        let n_cells = columns.first().map(|c| c.n_cells()).unwrap_or(0);
        let mut data = vec![0.0; n_cells * columns.len()];

        for (j, column) in columns.iter().enumerate() {
            column.ensure_cells(n_cells)?;
            for (i, value) in column.scalars()?.iter().enumerate() {
                data[i * columns.len() + j] = *value;
            }
        }

        Self::new(vec![n_cells, columns.len()], data)
    }

    /// Full shape, starting with the number of cells
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Number of dimensions including the cell dimension
    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Number of cells, `N`
    pub fn n_cells(&self) -> usize {
        self.shape[0]
    }

    /// Number of values stored for every cell
    pub fn stride(&self) -> usize {
        self.shape[1..].iter().product()
    }

    /// Raw row-major payload
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Consume the field, returning the shape and payload
    pub fn into_parts(self) -> (Vec<usize>, Vec<f64>) {
        (self.shape, self.data)
    }

    /// All values for a single cell
    pub fn cell(&self, index: usize) -> &[f64] {
        let stride = self.stride();
        &self.data[index * stride..(index + 1) * stride]
    }

    /// Check this field lives on a mesh of `n_cells`
    pub fn ensure_cells(&self, n_cells: usize) -> Result<()> {
        if self.n_cells() != n_cells {
            return Err(Error::MeshInconsistency {
                expected: n_cells,
                found: self.n_cells(),
            });
        }
        Ok(())
    }

    /// Number of NaN values anywhere in the field
    pub fn count_nan(&self) -> usize {
        self.data.iter().filter(|v| v.is_nan()).count()
    }

    /// Values of a scalar field
    pub fn scalars(&self) -> Result<&[f64]> {
        self.ensure_tail(&[], "scalar")?;
        Ok(&self.data)
    }

    /// Values of a 3 component vector field
    pub fn vectors(&self) -> Result<Vec<Vector3<f64>>> {
        self.ensure_tail(&[3], "3 component vector")?;
        Ok(self
            .data
            .chunks_exact(3)
            .map(Vector3::from_column_slice)
            .collect())
    }

    /// Values of a 3x3 tensor field
    pub fn matrices(&self) -> Result<Vec<Matrix3<f64>>> {
        self.ensure_tail(&[3, 3], "3x3 tensor")?;
        Ok(self
            .data
            .chunks_exact(9)
            .map(Matrix3::from_row_slice)
            .collect())
    }

    /// Values of a stacked tensor basis field
    pub fn basis(&self) -> Result<Vec<[Matrix3<f64>; BASIS_SIZE]>> {
        self.ensure_tail(&[BASIS_SIZE, 3, 3], "stacked tensor basis")?;
        Ok(self
            .data
            .chunks_exact(BASIS_SIZE * 9)
            .map(|cell| std::array::from_fn(|n| Matrix3::from_row_slice(&cell[n * 9..n * 9 + 9])))
            .collect())
    }

    /// New field made of the cells at `indices`, in the order given
    pub fn select_cells(&self, indices: &[usize]) -> Self {
        let mut shape = self.shape.clone();
        shape[0] = indices.len();
        let data = indices
            .iter()
            .flat_map(|&i| self.cell(i).iter().copied())
            .collect();
        Self { shape, data }
    }

    /// Mutable access to the values for a single cell
    pub fn cell_mut(&mut self, index: usize) -> &mut [f64] {
        let stride = self.stride();
        &mut self.data[index * stride..(index + 1) * stride]
    }

    fn ensure_tail(&self, tail: &[usize], expected: &'static str) -> Result<()> {
        if &self.shape[1..] != tail {
            return Err(Error::UnexpectedShape {
                expected,
                found: self.shape.clone(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Field {:?} ({} values)", self.shape, self.data.len())
    }
}

/// Append the 9 values of `m` in row-major order
pub(crate) fn push_row_major(data: &mut Vec<f64>, m: &Matrix3<f64>) {
    for r in 0..3 {
        for c in 0..3 {
            data.push(m[(r, c)]);
        }
    }
}
