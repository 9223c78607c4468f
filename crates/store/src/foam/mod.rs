//! Reader for finished OpenFOAM case directories
//!
//! Only the subset of the ascii field format needed to pull the internal
//! field values out of a finished case is understood. Boundary patches and
//! binary field files are ignored or rejected.
//!
//! ```rust, no_run
//! # use datafoam_store::FoamCase;
//! let case = FoamCase::open("./cases/komegasst/case_1p0").unwrap();
//! let u = case.read_field("U").unwrap();
//! assert_eq!(u.shape(), &[case.n_cells(), 3]);
//! ```

mod parsers;

pub use parsers::FoamClass;

// standard library
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

// crate modules
use crate::error::{Error, Result};
use parsers::InternalField;

// datafoam modules
use datafoam_tensor::{expand_symmetric, Field};

// external crates
use log::{debug, info, trace, warn};

/// Mesh files are only searched this far for the `nCells:` note
const HEADER_LINES: usize = 40;

/// A finished case directory, fixed to one time step
#[derive(Debug, Clone)]
pub struct FoamCase {
    root: PathBuf,
    time: String,
    n_cells: usize,
}

impl FoamCase {
    /// Open a case at its latest time directory
    ///
    /// The number of cells is taken from the mesh, and every field read
    /// afterwards is checked against it.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let n_cells = read_cell_count(&root)?;
        let time = latest_time(&root)?;
        info!("Opened {} at time {time} ({n_cells} cells)", root.display());
        Ok(Self {
            root,
            time,
            n_cells,
        })
    }

    /// Read fields from a specific time directory instead of the latest
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = time.into();
        self
    }

    /// Case directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Time directory fields are read from
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Number of cells in the mesh
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// Path to a field file in the current time directory
    pub fn field_path(&self, name: &str) -> PathBuf {
        self.root.join(&self.time).join(name)
    }

    /// Check whether the current time directory holds a field
    pub fn has_field(&self, name: &str) -> bool {
        self.field_path(name).is_file()
    }

    /// Read the internal values of a field from the current time directory
    pub fn read_field(&self, name: &str) -> Result<Field> {
        self.read_field_at(&self.time, name)
    }

    /// Read the `[N, 3]` cell centres
    ///
    /// Uses the `C` vector field if present, otherwise stacks the `Cx`, `Cy`
    /// and `Cz` components. Both the current and the `0` time directories are
    /// searched, as centres are usually written once at the start.
    pub fn read_cell_centres(&self) -> Result<Field> {
        for time in [self.time.as_str(), "0"] {
            let dir = self.root.join(time);
            if dir.join("C").is_file() {
                let centres = self.read_field_at(time, "C")?;
                centres.vectors()?;
                return Ok(centres);
            }

            if ["Cx", "Cy", "Cz"].iter().all(|c| dir.join(c).is_file()) {
                let components = ["Cx", "Cy", "Cz"]
                    .iter()
                    .map(|c| self.read_field_at(time, c))
                    .collect::<Result<Vec<Field>>>()?;
                return Ok(Field::from_columns(&components)?);
            }
        }

        Err(self.not_found("C"))
    }

    fn read_field_at(&self, time: &str, name: &str) -> Result<Field> {
        let path = self.root.join(time).join(name);
        info!("Reading {name}");
        trace!("  {}", path.display());

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(self.not_found(name));
            }
            Err(e) => return Err(e.into()),
        };

        if parsers::is_binary(&text) {
            return Err(Error::UnsupportedFormat(name.to_string()));
        }

        let class = parsers::find_keyword(&text, "class")
            .and_then(FoamClass::from_keyword)
            .ok_or_else(|| Error::ParseError {
                field: name.to_string(),
                reason: "missing or unsupported field class".to_string(),
            })?;
        debug!("  {name} is a {class:?} field");

        let (_, internal) = parsers::internal_field(&text).map_err(|e| Error::ParseError {
            field: name.to_string(),
            reason: nom_reason(e),
        })?;

        let raw = match internal {
            InternalField::Uniform(row) => self.broadcast(name, class, &row)?,
            InternalField::NonUniform { length, values } => {
                self.nonuniform(name, class, length, values)?
            }
        };

        match class {
            FoamClass::SymmTensor => Ok(expand_symmetric(&raw)?),
            _ => Ok(raw),
        }
    }

    /// Uniform values are never kept as a single value
    fn broadcast(&self, name: &str, class: FoamClass, row: &[f64]) -> Result<Field> {
        self.check_width(name, class, row.len())?;
        warn!(
            "{name} is uniform {row:?}, broadcasting to {} cells",
            self.n_cells
        );
        Ok(Field::uniform_row(row, class.tail(), self.n_cells)?)
    }

    fn nonuniform(
        &self,
        name: &str,
        class: FoamClass,
        length: usize,
        values: Vec<f64>,
    ) -> Result<Field> {
        if length != self.n_cells {
            return Err(Error::MeshInconsistency {
                field: name.to_string(),
                expected: self.n_cells,
                found: length,
            });
        }

        if values.len() != length * class.width() {
            return Err(Error::ParseError {
                field: name.to_string(),
                reason: format!(
                    "expected {} values for {length} cells, found {}",
                    length * class.width(),
                    values.len()
                ),
            });
        }

        let mut shape = vec![length];
        shape.extend_from_slice(class.tail());
        Ok(Field::new(shape, values)?)
    }

    fn check_width(&self, name: &str, class: FoamClass, width: usize) -> Result<()> {
        if width != class.width() {
            return Err(Error::ParseError {
                field: name.to_string(),
                reason: format!("expected {} values per cell, found {width}", class.width()),
            });
        }
        Ok(())
    }

    fn not_found(&self, field: &str) -> Error {
        Error::FieldNotFound {
            case: self.root.display().to_string(),
            field: field.to_string(),
        }
    }
}

/// Number of cells from the `nCells:` note in the mesh
///
/// The `owner` file always carries the note, `neighbour` is tried as well
/// for older meshes.
pub fn read_cell_count(root: &Path) -> Result<usize> {
    let mesh = root.join("constant").join("polyMesh");
    for name in ["owner", "neighbour"] {
        let Ok(file) = File::open(mesh.join(name)) else {
            continue;
        };

        // the note is in the header, never read the face list itself
        let n_cells = BufReader::new(file)
            .lines()
            .take(HEADER_LINES)
            .map_while(|line| line.ok())
            .find_map(|line| parsers::n_cells_note(&line).ok().map(|(_, n)| n));

        if let Some(n_cells) = n_cells {
            debug!("Found a mesh with {n_cells} cells");
            return Ok(n_cells);
        }
    }

    Err(Error::MeshNotFound(root.display().to_string()))
}

/// Name of the largest numeric time directory
pub fn latest_time(root: &Path) -> Result<String> {
    let mut latest: Option<(f64, String)> = None;

    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        let Ok(time) = name.parse::<f64>() else {
            continue;
        };

        if !time.is_finite() {
            continue;
        }

        if latest.as_ref().map_or(true, |(t, _)| time > *t) {
            latest = Some((time, name));
        }
    }

    latest
        .map(|(_, name)| name)
        .ok_or_else(|| Error::NoTimeDirectory(root.display().to_string()))
}

/// Short description of a nom failure without echoing the whole file
fn nom_reason(err: nom::Err<nom::error::Error<&str>>) -> String {
    match err {
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let near = e.input.chars().take(40).collect::<String>();
            format!("{:?} near \"{}\"", e.code, near.trim())
        }
        nom::Err::Incomplete(_) => "incomplete input".to_string(),
    }
}
