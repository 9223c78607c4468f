//! Joining fields across stores and cases

// standard library
use std::hash::{DefaultHasher, Hash, Hasher};
use std::path::{Path, PathBuf};

// crate modules
use crate::columns::{flatten, Column};
use crate::error::{Error, Result};
use crate::table::TabularDataset;

// datafoam modules
use datafoam_store::ArrayStore;
use datafoam_tensor::{classify, Field, SymmetricNames};

// external crates
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// Decimal places kept when fingerprinting coordinates
pub const FINGERPRINT_DECIMALS: i32 = 6;

/// A named store and the fields to take from it
///
/// Arrays for a case are expected at `{root}/{id}/{id}_{case}_{field}.bin`,
/// so the id doubles as the directory name and the start of the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub id: String,
    pub fields: Vec<String>,
}

impl Source {
    pub fn new(id: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            id: id.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Row count and checksum of a set of cell centres
///
/// Coordinates are rounded before hashing, so two copies of the same mesh
/// match even after a round trip through a lower precision format. The
/// checksum depends on the row order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub rows: usize,
    pub checksum: u64,
}

impl Fingerprint {
    pub fn new(coordinates: &Field) -> Self {
        let scale = 10f64.powi(FINGERPRINT_DECIMALS);
        let mut hasher = DefaultHasher::new();
        for value in coordinates.data() {
            ((value * scale).round() as i64).hash(&mut hasher);
        }
        Self {
            rows: coordinates.n_cells(),
            checksum: hasher.finish(),
        }
    }
}

/// Builds a [TabularDataset] from fields spread over several stores
///
/// ```rust, no_run
/// # use datafoam_dataset::{Assembler, Source};
/// let sources = vec![
///     Source::new("komegasst", &["k", "S", "I1"]),
///     Source::new("dns_mapped", &["b", "gamma"]),
/// ];
/// let cases = vec!["case_1p0".to_string(), "case_1p2".to_string()];
///
/// Assembler::new("./data")
///     .with_coordinates("C")
///     .write_csv(&sources, &cases, "./dataset.csv")
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct Assembler {
    root: PathBuf,
    symmetric: SymmetricNames,
    coordinates: Option<String>,
}

impl Assembler {
    /// Sources are looked up under `root`, using the default symmetric names
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            symmetric: SymmetricNames::default(),
            coordinates: None,
        }
    }

    /// Replace the symmetric allow-list used to load and classify fields
    pub fn with_symmetric_names(mut self, names: SymmetricNames) -> Self {
        self.symmetric = names;
        self
    }

    /// Check every source of a case holds the same coordinate field
    pub fn with_coordinates(mut self, name: impl Into<String>) -> Self {
        self.coordinates = Some(name.into());
        self
    }

    /// Store holding the arrays of a source
    pub fn store(&self, source: &str) -> ArrayStore {
        ArrayStore::new(self.root.join(source)).with_symmetric_names(self.symmetric.clone())
    }

    /// Build the full table, stacking cases in the order given
    ///
    /// Any missing field or inconsistent case fails the whole assembly.
    pub fn assemble(&self, sources: &[Source], cases: &[String]) -> Result<TabularDataset> {
        let mut table = TabularDataset::default();
        for case in cases {
            let columns = self.case_columns(sources, case)?;
            table.push_case(case, columns)?;
        }
        info!(
            "Assembled {} rows and {} columns from {} cases",
            table.n_rows(),
            table.n_columns(),
            cases.len()
        );
        Ok(table)
    }

    /// Assemble the table and write it, leaving no file on failure
    pub fn write_csv(
        &self,
        sources: &[Source],
        cases: &[String],
        path: impl AsRef<Path>,
    ) -> Result<TabularDataset> {
        let table = self.assemble(sources, cases)?;
        table.write_csv(path)?;
        Ok(table)
    }

    /// Every column contributed by one case, in source then field order
    pub fn case_columns(&self, sources: &[Source], case: &str) -> Result<Vec<Column>> {
        info!("Assembling {case}");
        self.check_coordinates(sources, case)?;

        let mut columns = Vec::new();
        let mut n_rows = None;

        for source in sources {
            let store = self.store(&source.id);
            let prefix = format!("{}_{case}", source.id);

            for name in &source.fields {
                let field = store.load(&prefix, name)?;
                let column = format!("{}_{name}", source.id);

                let expected = *n_rows.get_or_insert(field.n_cells());
                if field.n_cells() != expected {
                    return Err(Error::MeshInconsistency {
                        case: case.to_string(),
                        field: column,
                        expected,
                        found: field.n_cells(),
                    });
                }

                let kind = classify(name, &field, &self.symmetric)?;
                debug!("{column}: {kind}, {} columns", kind.n_columns());
                columns.extend(flatten(&column, &field, kind));
            }
        }

        Ok(columns)
    }

    /// Compare the coordinate fingerprint of every source for a case
    fn check_coordinates(&self, sources: &[Source], case: &str) -> Result<()> {
        let Some(name) = &self.coordinates else {
            return Ok(());
        };

        let mut first: Option<Fingerprint> = None;
        for source in sources {
            let prefix = format!("{}_{case}", source.id);
            let fingerprint = Fingerprint::new(&self.store(&source.id).load(&prefix, name)?);

            if *first.get_or_insert(fingerprint) != fingerprint {
                return Err(Error::CoordinateMismatch {
                    case: case.to_string(),
                    source_id: source.id.clone(),
                });
            }
        }

        debug!("Coordinates agree across {} sources for {case}", sources.len());
        Ok(())
    }
}
