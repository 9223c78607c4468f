//! Binary array store, one file per (case prefix, field) pair

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};

// datafoam modules
use datafoam_tensor::{expand_symmetric, Field, SymmetricNames, SYMMETRIC_SIZE};

// external crates
use log::{debug, trace};
use serde::{Deserialize, Serialize};

/// Extension used for every stored array
pub const ARRAY_EXTENSION: &str = "bin";

/// Name of the cell centre coordinate field
pub const COORDINATES: &str = "C";

/// On-disk layout of a stored array
///
/// The shape is written first so that readers can recover the rank without
/// any knowledge of the field. The payload is the row-major `f64` data.
///
/// ```text
/// <rank> <dim 0> ... <dim rank-1>
/// <length> <value 0> <value 1> ... <value length-1>
/// ```
#[derive(Debug, Serialize, Deserialize)]
struct ArrayFile {
    shape: Vec<u64>,
    data: Vec<f64>,
}

/// Directory of field arrays named `{prefix}_{field}.bin`
///
/// This is the interchange format between every stage of the pipeline. A
/// prefix usually combines the source and case, e.g. `komegasst_case_1p0`,
/// and several prefixes may share a directory.
///
/// Arrays are saved verbatim. On load, a raw `[N, 6]` array whose name is on
/// the symmetric allow-list is expanded to the full `[N, 3, 3]`.
///
/// ```rust, no_run
/// # use datafoam_store::ArrayStore;
/// # use datafoam_tensor::Field;
/// let store = ArrayStore::new("./data/komegasst");
/// store.save("komegasst_case_1p0", "k", &Field::uniform(1.0, 10)).unwrap();
/// let k = store.load("komegasst_case_1p0", "k").unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ArrayStore {
    root: PathBuf,
    symmetric: SymmetricNames,
}

impl ArrayStore {
    /// Store rooted at `root`, using the default symmetric names
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            symmetric: SymmetricNames::default(),
        }
    }

    /// Replace the allow-list used to expand raw symmetric tensors
    pub fn with_symmetric_names(mut self, names: SymmetricNames) -> Self {
        self.symmetric = names;
        self
    }

    /// Directory holding the arrays
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allow-list of symmetric tensor names
    pub fn symmetric_names(&self) -> &SymmetricNames {
        &self.symmetric
    }

    /// Full path for a field of a given case prefix
    pub fn path(&self, prefix: &str, field: &str) -> PathBuf {
        self.root.join(format!("{prefix}_{field}.{ARRAY_EXTENSION}"))
    }

    /// Check whether an array exists without reading it
    pub fn contains(&self, prefix: &str, field: &str) -> bool {
        self.path(prefix, field).is_file()
    }

    /// Load a field, auto-detecting its rank from the stored shape
    pub fn load(&self, prefix: &str, field: &str) -> Result<Field> {
        let path = self.path(prefix, field);
        trace!("Loading {}", path.display());

        let file = File::open(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FieldNotFound {
                case: prefix.to_string(),
                field: field.to_string(),
            },
            _ => Error::IOError(e),
        })?;

        let stored: ArrayFile = bincode::deserialize_from(BufReader::new(file))?;
        let shape = stored.shape.iter().map(|&d| d as usize).collect::<Vec<usize>>();
        let array = Field::new(shape, stored.data)?;

        if array.shape()[1..] == [SYMMETRIC_SIZE] && self.symmetric.contains(field) {
            debug!("Expanding raw symmetric tensor {field}");
            return Ok(expand_symmetric(&array)?);
        }

        Ok(array)
    }

    /// Load the `[N, 3]` cell centre coordinates of a case
    pub fn load_coordinates(&self, prefix: &str) -> Result<Field> {
        let coordinates = self.load(prefix, COORDINATES)?;
        coordinates.vectors()?;
        Ok(coordinates)
    }

    /// Write a field verbatim, overwriting anything already there
    pub fn save(&self, prefix: &str, field: &str, array: &Field) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let path = self.path(prefix, field);
        debug!("Saving {field} with shape {:?} to {}", array.shape(), path.display());

        let stored = ArrayFile {
            shape: array.shape().iter().map(|&d| d as u64).collect(),
            data: array.data().to_vec(),
        };

        let writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(writer, &stored)?;
        Ok(())
    }

    /// Broadcast a uniform value to `n_cells` before saving
    ///
    /// Upstream tools report constant fields as a single value, but every
    /// consumer expects a leading dimension of `N`, so the value is never
    /// persisted as-is.
    pub fn save_uniform(&self, prefix: &str, field: &str, value: f64, n_cells: usize) -> Result<()> {
        self.save(prefix, field, &Field::uniform(value, n_cells))
    }
}
