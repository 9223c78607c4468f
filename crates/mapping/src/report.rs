//! Provenance of a mapping run

// standard library
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

// crate modules
use crate::error::Result;
use crate::interpolate::{Geometry, Method};

// datafoam modules
use datafoam_store::ArrayStore;

// external crates
use serde::{Deserialize, Serialize};

/// Suffix of the provenance file written next to the mapped fields
pub const PROVENANCE_SUFFIX: &str = "provenance.json";

/// Record of what was mapped, how, and how often it fell back to nearest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingReport {
    pub source: String,
    pub target: String,
    pub output: String,
    pub method: Method,
    pub geometry: Geometry,
    pub n_source: usize,
    pub n_target: usize,
    pub fields: Vec<FieldReport>,
}

/// Fallback count for a single field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub name: String,
    pub fallback: usize,
}

impl MappingReport {
    /// Location of the record for an output prefix
    pub fn path(store: &ArrayStore, prefix: &str) -> PathBuf {
        store.root().join(format!("{prefix}_{PROVENANCE_SUFFIX}"))
    }

    /// Fallback points summed over every field
    pub fn total_fallback(&self) -> usize {
        self.fields.iter().map(|f| f.fallback).sum()
    }

    /// Write as pretty printed JSON
    pub fn write(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Read a previously written record
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}
