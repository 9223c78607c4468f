//! Flattening of typed fields into named scalar columns

// datafoam modules
use datafoam_tensor::{Field, FieldKind, BASIS_SIZE, SYMMETRIC_INDICES};

/// A named column of values, one per row
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<f64>,
}

/// Column name suffixes and the per-cell offset each one reads from
///
/// | Kind             | Suffixes                                  |
/// | ---------------- | ----------------------------------------- |
/// | scalar           | none                                      |
/// | vector, width W  | `_1` .. `_W`                              |
/// | matrix           | `_11,_12,_13,_21,_22,_23,_31,_32,_33`     |
/// | symmetric matrix | `_11,_12,_13,_22,_23,_33`                 |
/// | tensor basis     | `_{n}_11 .. _{n}_33` for n in 1..=10      |
///
/// ```rust
/// # use datafoam_dataset::column_layout;
/// # use datafoam_tensor::FieldKind;
/// let layout = column_layout(FieldKind::SymmetricMatrix);
/// assert_eq!(layout[3], ("_22".to_string(), 4));
/// assert_eq!(column_layout(FieldKind::TensorBasis).len(), 60);
/// ```
pub fn column_layout(kind: FieldKind) -> Vec<(String, usize)> {
    match kind {
        FieldKind::Scalar => vec![(String::new(), 0)],
        FieldKind::Vector(width) => (0..width).map(|i| (format!("_{}", i + 1), i)).collect(),
        FieldKind::Matrix => (0..9)
            .map(|i| (format!("_{}{}", i / 3 + 1, i % 3 + 1), i))
            .collect(),
        FieldKind::SymmetricMatrix => symmetric_layout("", 0),
        FieldKind::TensorBasis => (0..BASIS_SIZE)
            .flat_map(|n| symmetric_layout(&format!("_{}", n + 1), n * 9))
            .collect(),
    }
}

fn symmetric_layout(prefix: &str, offset: usize) -> Vec<(String, usize)> {
    SYMMETRIC_INDICES
        .iter()
        .map(|(r, c)| (format!("{prefix}_{}{}", r + 1, c + 1), offset + r * 3 + c))
        .collect()
}

/// Split a field into columns named `{name}{suffix}`
pub fn flatten(name: &str, field: &Field, kind: FieldKind) -> Vec<Column> {
    let n_rows = field.n_cells();
    column_layout(kind)
        .into_iter()
        .map(|(suffix, offset)| Column {
            name: format!("{name}{suffix}"),
            values: (0..n_rows).map(|row| field.cell(row)[offset]).collect(),
        })
        .collect()
}
