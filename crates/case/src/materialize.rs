//! Extraction of a whole case into the array store

// crate modules
use crate::case_type::{basis_names, numbered, CaseType, N_INVARIANTS, N_LAMBDA, N_Q};
use crate::error::{Error, Result};

// datafoam modules
use datafoam_store::{ArrayStore, FoamCase, COORDINATES};
use datafoam_tensor::{Field, BASIS_SIZE};

// external crates
use log::{debug, info};

/// Outcome of materialising a case
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    /// Prefix every array was saved under
    pub prefix: String,
    /// Number of cells shared by every field
    pub n_cells: usize,
    /// Names of every array written, in the order written
    pub fields: Vec<String>,
}

/// Read every field of a case type and save it to the store
///
/// Cell centres are read first and decide the cell count every other field is
/// checked against. Each field is saved as `{prefix}_{field}`. RANS types also
/// get the stacked arrays:
///
/// | Array     | Shape           | Built from             |
/// | --------- | --------------- | ---------------------- |
/// | `Tensors` | `[N, 10, 3, 3]` | `T1..T10`              |
/// | `I1`      | `[N, 47]`       | `I1_1..I1_47`          |
/// | `I2`      | `[N, 47]`       | `I2_1..I2_47`          |
/// | `q`       | `[N, 4]`        | `q1..q4`               |
/// | `lambda`  | `[N, 5]`        | `lambda1..lambda5`     |
///
/// Any missing or inconsistent field stops the extraction. Arrays already
/// written stay on disk and are overwritten by the next run.
///
/// ```rust, no_run
/// # use datafoam_case::{materialize, CaseType};
/// # use datafoam_store::{ArrayStore, FoamCase};
/// let case = FoamCase::open("./cases/komegasst/case_1p0").unwrap();
/// let store = ArrayStore::new("./data/komegasst")
///     .with_symmetric_names(CaseType::KOmegaSst.symmetric_names());
///
/// let summary = materialize(&case, CaseType::KOmegaSst, &store, "komegasst_case_1p0").unwrap();
/// println!("{} fields for {} cells", summary.fields.len(), summary.n_cells);
/// ```
pub fn materialize(
    case: &FoamCase,
    case_type: CaseType,
    store: &ArrayStore,
    prefix: &str,
) -> Result<Materialized> {
    info!(
        "Materialising {} case {} (time {}) as {prefix}",
        case_type,
        case.root().display(),
        case.time()
    );

    let centres = case.read_cell_centres()?;
    let n_cells = centres.n_cells();
    let mut summary = Materialized {
        prefix: prefix.to_string(),
        n_cells,
        fields: Vec::new(),
    };
    save(store, &mut summary, COORDINATES, &centres)?;

    for name in case_type.field_list() {
        if name == COORDINATES {
            continue;
        }
        let field = read_matching(case, &name, n_cells, prefix)?;
        save(store, &mut summary, &name, &field)?;
    }

    if case_type.is_rans() {
        let stacked = stack_features(store, prefix)?;
        summary.fields.extend(stacked);
    }

    info!("Saved {} arrays for {prefix}", summary.fields.len());
    Ok(summary)
}

/// Stack the saved basis tensors, invariants, `q` and `lambda` of a case
///
/// Works from the per-column arrays already in the store, so the case
/// directory is only parsed once. Every column must share the cell count of
/// `T1`. Returns the names of the stacked arrays.
pub fn stack_features(store: &ArrayStore, prefix: &str) -> Result<Vec<String>> {
    debug!("Stacking closure features for {prefix}");
    let mut written = Vec::new();

    let names = basis_names();
    let n_cells = store.load(prefix, &names[0])?.n_cells();
    let basis = names
        .iter()
        .map(|name| Ok(load_matching(store, prefix, name, n_cells)?.matrices()?))
        .collect::<Result<Vec<_>>>()?;
    let basis = (0..n_cells)
        .map(|i| std::array::from_fn::<_, BASIS_SIZE, _>(|n| basis[n][i]))
        .collect::<Vec<_>>();
    save_stacked(store, prefix, "Tensors", &Field::from_basis(&basis))?;
    written.push("Tensors".to_string());

    let groups = [
        ("I1", numbered("I1_", N_INVARIANTS)),
        ("I2", numbered("I2_", N_INVARIANTS)),
        ("q", numbered("q", N_Q)),
        ("lambda", numbered("lambda", N_LAMBDA)),
    ];
    for (stacked, names) in groups {
        let columns = names
            .iter()
            .map(|name| load_matching(store, prefix, name, n_cells))
            .collect::<Result<Vec<Field>>>()?;
        save_stacked(store, prefix, stacked, &Field::from_columns(&columns)?)?;
        written.push(stacked.to_string());
    }

    Ok(written)
}

/// Load a saved column and check its cell count
fn load_matching(store: &ArrayStore, prefix: &str, name: &str, n_cells: usize) -> Result<Field> {
    let field = store.load(prefix, name)?;
    if field.n_cells() != n_cells {
        return Err(Error::MeshInconsistency {
            case: prefix.to_string(),
            field: name.to_string(),
            expected: n_cells,
            found: field.n_cells(),
        });
    }
    Ok(field)
}

fn save_stacked(store: &ArrayStore, prefix: &str, name: &str, field: &Field) -> Result<()> {
    info!("Saving {name}, with shape {:?}", field.shape());
    Ok(store.save(prefix, name, field)?)
}

/// Read a field and check it has one value per cell centre
fn read_matching(case: &FoamCase, name: &str, n_cells: usize, prefix: &str) -> Result<Field> {
    let field = case.read_field(name)?;
    if field.n_cells() != n_cells {
        return Err(Error::MeshInconsistency {
            case: prefix.to_string(),
            field: name.to_string(),
            expected: n_cells,
            found: field.n_cells(),
        });
    }
    Ok(field)
}

fn save(store: &ArrayStore, summary: &mut Materialized, name: &str, field: &Field) -> Result<()> {
    info!("Saving {name}, with shape {:?}", field.shape());
    store.save(&summary.prefix, name, field)?;
    summary.fields.push(name.to_string());
    Ok(())
}
