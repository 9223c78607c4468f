//! Pipeline description read from JSON

// standard library
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

// crate modules
use crate::error::Result;

// datafoam modules
use datafoam::case::CaseType;
use datafoam::dataset::Source;
use datafoam::mapping::{Geometry, Method};
use datafoam::store::ArrayStore;
use datafoam::tensor::SymmetricNames;

// external crates
use serde::Deserialize;

/// Every stage of a run, executed in field order
///
/// ```json
/// {
///   "data": "./data",
///   "cases": [
///     { "path": "./cases/case_1p0", "type": "komegasst", "source": "komegasst", "case": "case_1p0" },
///     { "path": "./cases/case_1p0_DNS", "type": "dns", "source": "dns", "case": "case_1p0" }
///   ],
///   "derived": [
///     { "source": "dns", "case": "case_1p0", "job": "k_b_a" },
///     { "source": "dns", "case": "case_1p0", "job": "strain_rotation" }
///   ],
///   "mappings": [
///     {
///       "fine": { "source": "dns", "case": "case_1p0" },
///       "coarse": { "source": "komegasst", "case": "case_1p0" },
///       "output": { "source": "dns_mapped", "case": "case_1p0" },
///       "fields": ["k", "a", "b", "S"],
///       "method": "linear"
///     }
///   ],
///   "assembly": {
///     "sources": [
///       { "id": "komegasst", "fields": ["k", "S", "I1"] },
///       { "id": "dns_mapped", "fields": ["b"] }
///     ],
///     "cases": ["case_1p0"],
///     "output": "./dataset.csv"
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Parent directory of every source store
    #[serde(default = "default_data")]
    pub data: PathBuf,
    #[serde(default)]
    pub cases: Vec<CaseConfig>,
    #[serde(default)]
    pub derived: Vec<DerivedConfig>,
    #[serde(default)]
    pub mappings: Vec<MappingConfig>,
    pub assembly: Option<AssemblyConfig>,
}

impl Config {
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Store of a source, `{data}/{source}`
    pub fn store(&self, source: &str) -> ArrayStore {
        ArrayStore::new(self.data.join(source)).with_symmetric_names(self.symmetric_names())
    }

    /// Symmetric tensor names of every case type in use, plus any extras
    pub fn symmetric_names(&self) -> SymmetricNames {
        let mut names = SymmetricNames::default();
        for case in &self.cases {
            names.extend(case.case_type.symmetric_names().iter());
        }
        if let Some(assembly) = &self.assembly {
            names.extend(assembly.symmetric.iter().cloned());
        }
        names
    }
}

fn default_data() -> PathBuf {
    PathBuf::from(".")
}

/// A case within a source store, saved under the prefix `{source}_{case}`
#[derive(Debug, Clone, Deserialize)]
pub struct CaseRef {
    pub source: String,
    pub case: String,
}

impl CaseRef {
    pub fn prefix(&self) -> String {
        format!("{}_{}", self.source, self.case)
    }
}

/// A finished case directory to extract
#[derive(Debug, Deserialize)]
pub struct CaseConfig {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub case_type: CaseType,
    #[serde(flatten)]
    pub target: CaseRef,
    /// Time directory to read, the latest if not given
    pub time: Option<String>,
}

/// A derived field calculation on one case
#[derive(Debug, Deserialize)]
pub struct DerivedConfig {
    #[serde(flatten)]
    pub target: CaseRef,
    #[serde(flatten)]
    pub job: DerivedJob,
}

/// Calculations available to the `derived` stage
#[derive(Debug, Deserialize)]
#[serde(tag = "job", rename_all = "snake_case")]
pub enum DerivedJob {
    KBA {
        #[serde(default = "default_tau")]
        tau: String,
        k_floor: Option<f64>,
    },
    StrainRotation {
        #[serde(default = "default_grad_u")]
        grad_u: String,
    },
    EddyViscosity {
        #[serde(default)]
        unconstrained: bool,
        #[serde(default)]
        les: bool,
    },
    PrescribedEddyViscosity {
        coarse: CaseRef,
        k_floor: Option<f64>,
        #[serde(default)]
        les: bool,
    },
    BasisTensors {
        k_floor: Option<f64>,
    },
    Invariants,
    BasisRegression {
        #[serde(default = "default_basis")]
        basis: String,
        #[serde(default = "default_bperp")]
        bperp: String,
        #[serde(default = "default_alpha")]
        alpha: f64,
    },
    CalibrationRatio {
        coarse: CaseRef,
        #[serde(default = "default_fine_nut")]
        nut: String,
        #[serde(default = "default_coarse_nut")]
        coarse_nut: String,
    },
}

fn default_tau() -> String {
    "tau".into()
}

fn default_grad_u() -> String {
    "gradU".into()
}

fn default_basis() -> String {
    "Tensors".into()
}

fn default_bperp() -> String {
    "bperp_nnls".into()
}

fn default_alpha() -> f64 {
    1.0
}

fn default_fine_nut() -> String {
    "nut_nnls".into()
}

fn default_coarse_nut() -> String {
    "nut".into()
}

/// Fields to map from a fine case onto a coarse case
#[derive(Debug, Deserialize)]
pub struct MappingConfig {
    pub fine: CaseRef,
    pub coarse: CaseRef,
    pub output: CaseRef,
    pub fields: Vec<String>,
    #[serde(default)]
    pub method: Method,
    #[serde(default)]
    pub geometry: Geometry,
}

/// The final CSV table
#[derive(Debug, Deserialize)]
pub struct AssemblyConfig {
    pub sources: Vec<Source>,
    pub cases: Vec<String>,
    pub output: PathBuf,
    /// Coordinate field checked across sources, if any
    pub coordinates: Option<String>,
    /// Extra symmetric tensor names on top of those of the case types used
    #[serde(default)]
    pub symmetric: Vec<String>,
}
