//! Semantic field types and the name-based classifier

// standard library
use std::collections::BTreeSet;

// crate modules
use crate::error::{Error, Result};
use crate::field::{Field, BASIS_SIZE};

/// Semantic type of a field, decided from rank, shape and name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Rank 1, `[N]`
    Scalar,
    /// Rank 2, `[N, W]` with the width recorded
    Vector(usize),
    /// Rank 3 general tensor, `[N, 3, 3]`
    Matrix,
    /// Rank 3 tensor whose name is on the symmetric allow-list
    SymmetricMatrix,
    /// Rank 4 stack of ten tensors, `[N, 10, 3, 3]`
    TensorBasis,
}

impl FieldKind {
    /// Number of scalar columns this kind flattens into
    pub fn n_columns(&self) -> usize {
        match self {
            FieldKind::Scalar => 1,
            FieldKind::Vector(width) => *width,
            FieldKind::Matrix => 9,
            FieldKind::SymmetricMatrix => 6,
            FieldKind::TensorBasis => BASIS_SIZE * 6,
        }
    }

    /// Short lowercase name
    pub fn name(&self) -> &str {
        match self {
            FieldKind::Scalar => "scalar",
            FieldKind::Vector(_) => "vector",
            FieldKind::Matrix => "matrix",
            FieldKind::SymmetricMatrix => "symmetric matrix",
            FieldKind::TensorBasis => "tensor basis",
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Allow-list of field names known to hold symmetric tensors
///
/// Symmetric and general tensors share the same `[N, 3, 3]` layout once
/// expanded, so the only way to tell them apart is by name. Call sites supply
/// their own set rather than relying on a global list.
///
/// ```rust
/// # use datafoam_tensor::SymmetricNames;
/// let names = SymmetricNames::default().with("SMean");
/// assert!(names.contains("tau"));
/// assert!(names.contains("SMean"));
/// assert!(!names.contains("gradU"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricNames(BTreeSet<String>);

impl SymmetricNames {
    /// Empty allow-list, every rank 3 field is a general tensor
    pub fn empty() -> Self {
        Self(BTreeSet::new())
    }

    /// Add a name to the list
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.0.insert(name.into());
        self
    }

    /// Check a field name against the list
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    /// Iterate over the names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|s| s.as_str())
    }
}

impl Default for SymmetricNames {
    fn default() -> Self {
        ["S", "Shat", "b", "tau", "a"].into_iter().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for SymmetricNames {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for SymmetricNames {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into))
    }
}

/// Decide the semantic type of a named field
///
/// - rank 1 => [FieldKind::Scalar]
/// - rank 2 => [FieldKind::Vector]
/// - rank 3 => [FieldKind::SymmetricMatrix] if `name` is in `symmetric`,
///   otherwise [FieldKind::Matrix], even if the values happen to be symmetric
/// - rank 4 with a second dimension of 10 => [FieldKind::TensorBasis]
///
/// ```rust
/// # use datafoam_tensor::{classify, Field, FieldKind, SymmetricNames};
/// let names = SymmetricNames::default();
/// let tensor = Field::new(vec![2, 3, 3], vec![0.0; 18]).unwrap();
/// assert_eq!(classify("S", &tensor, &names).unwrap(), FieldKind::SymmetricMatrix);
/// assert_eq!(classify("gradU", &tensor, &names).unwrap(), FieldKind::Matrix);
/// ```
pub fn classify(name: &str, field: &Field, symmetric: &SymmetricNames) -> Result<FieldKind> {
    let kind = match field.shape() {
        [_] => FieldKind::Scalar,
        [_, width] => FieldKind::Vector(*width),
        [_, 3, 3] if symmetric.contains(name) => FieldKind::SymmetricMatrix,
        [_, 3, 3] => FieldKind::Matrix,
        [_, BASIS_SIZE, 3, 3] => FieldKind::TensorBasis,
        shape => return Err(Error::UnsupportedShape(shape.to_vec())),
    };
    Ok(kind)
}
