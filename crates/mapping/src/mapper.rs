//! Mapping fields between meshes

// crate modules
use crate::error::{Error, Result};
use crate::interpolate::{Geometry, Method, Stencil};
use crate::index::{Point, PointIndex};
use crate::report::{FieldReport, MappingReport};

// datafoam modules
use datafoam_store::{ArrayStore, COORDINATES};
use datafoam_tensor::Field;

// external crates
use kdam::{Bar, BarBuilder, BarExt};
use log::{debug, info, warn};

/// Options shared by every field mapped between the same pair of meshes
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MapOptions {
    pub method: Method,
    pub geometry: Geometry,
    /// Show a progress bar while building the stencils
    pub progress: bool,
}

/// Precomputed interpolation from one set of points onto another
///
/// The neighbour search and simplex weights depend only on the coordinates,
/// so they are found once and applied to any number of fields of any rank.
/// Each component of a vector or tensor is interpolated independently.
///
/// ```rust
/// # use datafoam_mapping::{Mapper, MapOptions};
/// # use datafoam_tensor::Field;
/// # use nalgebra::Vector3;
/// let source = Field::from_vectors(&[
///     Vector3::new(0.0, 0.0, 0.0),
///     Vector3::new(1.0, 0.0, 0.0),
///     Vector3::new(0.0, 1.0, 0.0),
///     Vector3::new(0.0, 0.0, 1.0),
/// ]);
/// let target = Field::from_vectors(&[Vector3::new(0.25, 0.25, 0.25)]);
/// let mapper = Mapper::new(&source, &target, &MapOptions::default()).unwrap();
///
/// let field = Field::from_scalars(vec![0.0, 4.0, 8.0, 12.0]);
/// let (mapped, fallback) = mapper.map("f", &field).unwrap();
/// assert_eq!(mapped.scalars().unwrap(), &[6.0]);
/// assert_eq!(fallback, 0);
/// ```
#[derive(Debug, Clone)]
pub struct Mapper {
    stencils: Vec<Stencil>,
    n_source: usize,
    options: MapOptions,
}

impl Mapper {
    /// Build the stencils for every target point
    ///
    /// Both coordinate fields must be `[N, 3]` cell centres.
    pub fn new(source: &Field, target: &Field, options: &MapOptions) -> Result<Self> {
        options.geometry.validate()?;
        let source = points(source, &options.geometry)?;
        let target = points(target, &options.geometry)?;

        if source.is_empty() {
            return Err(Error::EmptySource);
        }

        let n_source = source.len();
        debug!(
            "Building {} stencils from {n_source} points ({}, {:?})",
            target.len(),
            options.method,
            options.geometry
        );

        let index = PointIndex::new(source);
        let mut bar = init_progress_bar(target.len(), options.progress)?;
        let mut stencils = Vec::with_capacity(target.len());
        for (cell, query) in target.iter().enumerate() {
            let stencil = Stencil::new(&index, query, options.method, &options.geometry)
                .ok_or(Error::NonFiniteCoordinate { cell })?;
            stencils.push(stencil);
            bar.update(1)?;
        }

        if options.progress {
            eprintln!();
        }

        Ok(Self {
            stencils,
            n_source,
            options: *options,
        })
    }

    /// Number of points mapped from
    pub fn n_source(&self) -> usize {
        self.n_source
    }

    /// Number of points mapped onto
    pub fn n_target(&self) -> usize {
        self.stencils.len()
    }

    /// Options the mapping was built with
    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    /// Number of target points outside the convex hull of the source
    pub fn n_outside(&self) -> usize {
        self.stencils.iter().filter(|s| s.is_outside()).count()
    }

    /// Interpolate a field, returning it with the number of fallback points
    ///
    /// A target point falls back to the nearest source value if it lies
    /// outside the convex hull of the source or the interpolated value has any NaN
    /// component. The result therefore only has NaN where the nearest source
    /// value does.
    pub fn map(&self, name: &str, field: &Field) -> Result<(Field, usize)> {
        if field.n_cells() != self.n_source {
            return Err(Error::MeshInconsistency {
                field: name.to_string(),
                expected: self.n_source,
                found: field.n_cells(),
            });
        }

        let stride = field.stride();
        let mut data = Vec::with_capacity(self.n_target() * stride);
        let mut fallback = 0;

        for stencil in &self.stencils {
            match stencil {
                Stencil::Nearest(i) => data.extend_from_slice(field.cell(*i)),
                Stencil::Outside(i) => {
                    fallback += 1;
                    data.extend_from_slice(field.cell(*i));
                }
                Stencil::Linear { nearest, weights } => {
                    let row = (0..stride)
                        .map(|c| weights.iter().map(|(i, w)| w * field.cell(*i)[c]).sum())
                        .collect::<Vec<f64>>();
                    if row.iter().any(|v| v.is_nan()) {
                        fallback += 1;
                        data.extend_from_slice(field.cell(*nearest));
                    } else {
                        data.extend(row);
                    }
                }
            }
        }

        let mut shape = field.shape().to_vec();
        shape[0] = self.n_target();
        Ok((Field::new(shape, data)?, fallback))
    }
}

/// Interpolate one field from source to target coordinates in 3D
pub fn map_field(
    source_coordinates: &Field,
    source_field: &Field,
    target_coordinates: &Field,
    method: Method,
) -> Result<(Field, usize)> {
    let options = MapOptions {
        method,
        ..Default::default()
    };
    Mapper::new(source_coordinates, target_coordinates, &options)?.map("field", source_field)
}

/// Interpolate one field in the plane left after dropping `axis`
pub fn map_field_2d(
    source_coordinates: &Field,
    source_field: &Field,
    target_coordinates: &Field,
    method: Method,
    axis: usize,
) -> Result<(Field, usize)> {
    let options = MapOptions {
        method,
        geometry: Geometry::Plane { axis },
        ..Default::default()
    };
    Mapper::new(source_coordinates, target_coordinates, &options)?.map("field", source_field)
}

/// A case prefix within a store
#[derive(Debug, Clone, Copy)]
pub struct Location<'a> {
    pub store: &'a ArrayStore,
    pub prefix: &'a str,
}

impl<'a> Location<'a> {
    pub fn new(store: &'a ArrayStore, prefix: &'a str) -> Self {
        Self { store, prefix }
    }

    fn name(&self) -> String {
        format!("{}/{}", self.store.root().display(), self.prefix)
    }
}

/// Map a list of stored fields onto the cell centres of another case
///
/// Coordinates are read from the `C` field of the source and target
/// prefixes. Every mapped field is saved under the output prefix along with
/// the target coordinates, and a provenance record is written next to them
/// as `{output_prefix}_provenance.json`. An empty list does nothing.
pub fn map_fields(
    source: Location,
    target: Location,
    output: Location,
    fields: &[String],
    options: &MapOptions,
) -> Result<MappingReport> {
    let mut report = MappingReport {
        source: source.name(),
        target: target.name(),
        output: output.name(),
        method: options.method,
        geometry: options.geometry,
        n_source: 0,
        n_target: 0,
        fields: Vec::with_capacity(fields.len()),
    };

    if fields.is_empty() {
        info!("No fields to map from {}", source.prefix);
        return Ok(report);
    }

    info!("Mapping {} onto {}", source.prefix, target.prefix);
    let source_coordinates = source.store.load_coordinates(source.prefix)?;
    let target_coordinates = target.store.load_coordinates(target.prefix)?;
    let mapper = Mapper::new(&source_coordinates, &target_coordinates, options)?;
    report.n_source = mapper.n_source();
    report.n_target = mapper.n_target();

    for name in fields {
        let field = source.store.load(source.prefix, name)?;
        let (mapped, fallback) = mapper.map(name, &field)?;
        if fallback > 0 {
            warn!("{name}: {fallback} points outside the source hull, filled with nearest values");
        }

        info!("Saving {}_{name}", output.prefix);
        output.store.save(output.prefix, name, &mapped)?;
        report.fields.push(FieldReport {
            name: name.clone(),
            fallback,
        });
    }

    // mapped fields live on the target mesh from now on
    if !fields.iter().any(|f| f == COORDINATES) {
        output.store.save(output.prefix, COORDINATES, &target_coordinates)?;
    }

    report.write(MappingReport::path(output.store, output.prefix))?;
    Ok(report)
}

/// Coordinates as points, after projection
fn points(coordinates: &Field, geometry: &Geometry) -> Result<Vec<Point>> {
    coordinates
        .vectors()?
        .iter()
        .enumerate()
        .map(|(cell, v)| {
            if v.iter().all(|c| c.is_finite()) {
                Ok(geometry.project([v[0], v[1], v[2]]))
            } else {
                Err(Error::NonFiniteCoordinate { cell })
            }
        })
        .collect()
}

/// Initialise the progress bar, if wanted
fn init_progress_bar(total: usize, progress: bool) -> Result<Bar> {
    BarBuilder::default()
        .total(total)
        .unit(" points")
        .disable(!progress)
        .bar_format("{count}/{total} points [{rate:.0} points/s]  ")
        .build()
        .map_err(Error::ProgressBar)
}
