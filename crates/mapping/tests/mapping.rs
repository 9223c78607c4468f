//! Integration tests for mapping fields between meshes

use std::fs;
use std::path::PathBuf;

use datafoam_mapping::{
    map_field, map_field_2d, map_fields, Error, Location, MapOptions, Mapper, MappingReport,
    Method,
};
use datafoam_store::ArrayStore;
use datafoam_tensor::Field;
use nalgebra::{Matrix3, Vector3};
use rstest::{fixture, rstest};

/// Small deterministic generator so that fixtures are reproducible
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Unique scratch directory, removed when dropped
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "datafoam_mapping_{name}_{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn store(&self) -> ArrayStore {
        ArrayStore::new(&self.0)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

const SPACING: f64 = 0.25;

fn linear(p: &Vector3<f64>) -> f64 {
    1.0 + 2.0 * p.x - p.y + 0.5 * p.z
}

/// Regular 5x5x5 lattice over the unit cube
#[fixture]
fn fine() -> Vec<Vector3<f64>> {
    let mut points = Vec::new();
    for i in 0..5 {
        for j in 0..5 {
            for k in 0..5 {
                points.push(Vector3::new(i as f64, j as f64, k as f64) * SPACING);
            }
        }
    }
    points
}

/// Points well inside the lattice cells
#[fixture]
fn coarse() -> Vec<Vector3<f64>> {
    let mut rng = Lcg(5);
    (0..40)
        .map(|_| {
            Vector3::from_fn(|_, _| {
                let cell = (rng.next() * 4.0).floor();
                (cell + 0.3 + 0.4 * rng.next()) * SPACING
            })
        })
        .collect()
}

#[rstest]
fn linear_fields_are_reproduced(fine: Vec<Vector3<f64>>, coarse: Vec<Vector3<f64>>) {
    let source = Field::from_vectors(&fine);
    let target = Field::from_vectors(&coarse);
    let field = Field::from_scalars(fine.iter().map(linear).collect());

    let (mapped, fallback) = map_field(&source, &field, &target, Method::Linear).unwrap();
    assert_eq!(fallback, 0);
    for (value, p) in mapped.scalars().unwrap().iter().zip(&coarse) {
        assert!((value - linear(p)).abs() < 1e-9);
    }
}

#[rstest]
fn every_component_is_mapped(fine: Vec<Vector3<f64>>, coarse: Vec<Vector3<f64>>) {
    let mapper = Mapper::new(
        &Field::from_vectors(&fine),
        &Field::from_vectors(&coarse),
        &MapOptions::default(),
    )
    .unwrap();

    let tensors = fine
        .iter()
        .map(|p| Matrix3::from_fn(|i, j| p[i] * (j as f64 + 1.0)))
        .collect::<Vec<_>>();
    let (mapped, _) = mapper.map("gradU", &Field::from_matrices(&tensors)).unwrap();

    assert_eq!(mapped.shape(), &[coarse.len(), 3, 3]);
    for (m, p) in mapped.matrices().unwrap().iter().zip(&coarse) {
        let expected = Matrix3::from_fn(|i, j| p[i] * (j as f64 + 1.0));
        assert!((m - expected).abs().max() < 1e-9);
    }
}

#[rstest]
fn outside_points_fall_back_to_nearest(fine: Vec<Vector3<f64>>) {
    let source = Field::from_vectors(&fine);
    let target = Field::from_vectors(&[Vector3::new(0.5, 0.5, 0.5), Vector3::new(2.0, 2.0, 2.0)]);
    let field = Field::from_scalars(fine.iter().map(linear).collect());

    let (mapped, fallback) = map_field(&source, &field, &target, Method::Linear).unwrap();
    assert_eq!(fallback, 1);
    assert_eq!(mapped.count_nan(), 0);
    assert_eq!(mapped.scalars().unwrap()[1], linear(&Vector3::new(1.0, 1.0, 1.0)));
}

#[rstest]
fn nan_results_fall_back_to_nearest(fine: Vec<Vector3<f64>>) {
    let source = Field::from_vectors(&fine);
    let target = Field::from_vectors(&[Vector3::new(0.3, 0.3, 0.3) * SPACING]);
    let mut values = fine.iter().map(linear).collect::<Vec<f64>>();
    // vertex of the tightest simplex around the target
    values[25] = f64::NAN;
    let field = Field::from_scalars(values);

    let (mapped, fallback) = map_field(&source, &field, &target, Method::Linear).unwrap();
    assert_eq!(mapped.scalars().unwrap(), &[1.0]);
    assert_eq!(fallback, 1);
}

#[rstest]
fn nearest_never_falls_back(fine: Vec<Vector3<f64>>, coarse: Vec<Vector3<f64>>) {
    let source = Field::from_vectors(&fine);
    let mut targets = coarse.clone();
    targets.push(Vector3::new(-3.0, 0.1, 0.1));
    let field = Field::from_scalars((0..fine.len()).map(|i| i as f64).collect());

    let (mapped, fallback) =
        map_field(&source, &field, &Field::from_vectors(&targets), Method::Nearest).unwrap();
    assert_eq!(fallback, 0);
    assert_eq!(mapped.count_nan(), 0);

    for (value, p) in mapped.scalars().unwrap().iter().zip(&targets) {
        let closest = fine
            .iter()
            .map(|f| (f - p).norm())
            .fold(f64::INFINITY, f64::min);
        assert!(((fine[*value as usize] - p).norm() - closest).abs() < 1e-12);
    }
}

#[test]
fn plane_mapping_ignores_dropped_axis() {
    let mut fine = Vec::new();
    for j in 0..5 {
        for k in 0..5 {
            fine.push(Vector3::new(0.1, j as f64 * SPACING, k as f64 * SPACING));
        }
    }
    let plane = |p: &Vector3<f64>| 3.0 * p.y - 2.0 * p.z;
    let field = Field::from_scalars(fine.iter().map(plane).collect());

    let mut rng = Lcg(9);
    let coarse = (0..20)
        .map(|_| Vector3::new(5.0 + rng.next(), rng.next(), rng.next()))
        .collect::<Vec<_>>();

    let (mapped, fallback) = map_field_2d(
        &Field::from_vectors(&fine),
        &field,
        &Field::from_vectors(&coarse),
        Method::Linear,
        0,
    )
    .unwrap();

    assert_eq!(fallback, 0);
    for (value, p) in mapped.scalars().unwrap().iter().zip(&coarse) {
        assert!((value - plane(p)).abs() < 1e-9);
    }

    // the same points are far outside the source in 3D
    let (_, fallback) = map_field(
        &Field::from_vectors(&fine),
        &field,
        &Field::from_vectors(&coarse),
        Method::Linear,
    )
    .unwrap();
    assert_eq!(fallback, coarse.len());
}

/// Lattice stretched along y, as in a wall resolved boundary layer
#[rstest]
#[case(1.0)]
#[case(0.1)]
#[case(0.01)]
fn stretched_cells_are_interpolated(#[case] dy: f64) {
    let mut fine = Vec::new();
    for i in 0..4 {
        for j in 0..40 {
            for k in 0..4 {
                fine.push(Vector3::new(i as f64, j as f64 * dy, k as f64));
            }
        }
    }
    let field = Field::from_scalars(fine.iter().map(linear).collect());

    let mut rng = Lcg(17);
    let coarse = (0..60)
        .map(|_| Vector3::new(3.0 * rng.next(), 39.0 * dy * rng.next(), 3.0 * rng.next()))
        .collect::<Vec<_>>();

    let (mapped, fallback) = map_field(
        &Field::from_vectors(&fine),
        &field,
        &Field::from_vectors(&coarse),
        Method::Linear,
    )
    .unwrap();

    assert_eq!(fallback, 0);
    for (value, p) in mapped.scalars().unwrap().iter().zip(&coarse) {
        assert!((value - linear(p)).abs() < 1e-9, "{value} at {p:?}");
    }
}

#[test]
fn scattered_cloud_is_interpolated() {
    let mut rng = Lcg(23);
    let mut fine = (0..8)
        .map(|n| Vector3::new((n & 1) as f64, ((n >> 1) & 1) as f64, ((n >> 2) & 1) as f64))
        .collect::<Vec<_>>();
    fine.extend((0..300).map(|_| Vector3::new(rng.next(), rng.next(), rng.next())));
    let field = Field::from_scalars(fine.iter().map(linear).collect());

    let mut coarse = (0..50)
        .map(|_| Vector3::from_fn(|_, _| 0.05 + 0.9 * rng.next()))
        .collect::<Vec<_>>();
    coarse.push(Vector3::new(1.5, 0.5, 0.5));

    let mapper = Mapper::new(
        &Field::from_vectors(&fine),
        &Field::from_vectors(&coarse),
        &MapOptions::default(),
    )
    .unwrap();
    assert_eq!(mapper.n_outside(), 1);

    let (mapped, fallback) = mapper.map("k", &field).unwrap();
    assert_eq!(fallback, 1);
    let mapped = mapped.scalars().unwrap();
    for (value, p) in mapped.iter().zip(&coarse[..50]) {
        assert!((value - linear(p)).abs() < 1e-9);
    }

    // outside the unit cube, filled from the closest source point
    let closest = (0..fine.len())
        .min_by(|&a, &b| {
            let (da, db) = ((fine[a] - coarse[50]).norm(), (fine[b] - coarse[50]).norm());
            da.total_cmp(&db).then(a.cmp(&b))
        })
        .unwrap();
    assert_eq!(mapped[50], linear(&fine[closest]));
}

#[rstest]
fn wrong_mesh_is_rejected(fine: Vec<Vector3<f64>>, coarse: Vec<Vector3<f64>>) {
    let mapper = Mapper::new(
        &Field::from_vectors(&fine),
        &Field::from_vectors(&coarse),
        &MapOptions::default(),
    )
    .unwrap();

    let result = mapper.map("k", &Field::uniform(1.0, 3));
    assert!(matches!(
        result,
        Err(Error::MeshInconsistency {
            expected: 125,
            found: 3,
            ..
        })
    ));
}

#[rstest]
fn stored_fields_are_mapped(fine: Vec<Vector3<f64>>, coarse: Vec<Vector3<f64>>) {
    let scratch = Scratch::new("stored");
    let store = scratch.store();
    store.save("dns", "C", &Field::from_vectors(&fine)).unwrap();
    store.save("rans", "C", &Field::from_vectors(&coarse)).unwrap();
    store
        .save("dns", "k", &Field::from_scalars(fine.iter().map(linear).collect()))
        .unwrap();
    store.save("dns", "U", &Field::from_vectors(&fine)).unwrap();

    let fields = vec!["k".to_string(), "U".to_string()];
    let report = map_fields(
        Location::new(&store, "dns"),
        Location::new(&store, "rans"),
        Location::new(&store, "dns_mapped"),
        &fields,
        &MapOptions::default(),
    )
    .unwrap();

    assert_eq!(report.n_source, fine.len());
    assert_eq!(report.n_target, coarse.len());
    assert_eq!(report.total_fallback(), 0);
    assert_eq!(store.load("dns_mapped", "k").unwrap().n_cells(), coarse.len());
    assert_eq!(store.load("dns_mapped", "U").unwrap().shape(), &[coarse.len(), 3]);
    assert_eq!(
        store.load_coordinates("dns_mapped").unwrap(),
        store.load_coordinates("rans").unwrap()
    );

    let written = MappingReport::read(MappingReport::path(&store, "dns_mapped")).unwrap();
    assert_eq!(written, report);
    assert_eq!(written.fields[1].name, "U");
}

#[test]
fn empty_field_list_is_a_no_op() {
    let scratch = Scratch::new("empty");
    let store = scratch.store();

    let report = map_fields(
        Location::new(&store, "dns"),
        Location::new(&store, "rans"),
        Location::new(&store, "dns_mapped"),
        &[],
        &MapOptions::default(),
    )
    .unwrap();

    assert!(report.fields.is_empty());
    assert!(!MappingReport::path(&store, "dns_mapped").exists());
}

#[rstest]
fn missing_coordinates_are_fatal(fine: Vec<Vector3<f64>>) {
    let scratch = Scratch::new("missing");
    let store = scratch.store();
    store.save("dns", "C", &Field::from_vectors(&fine)).unwrap();
    store.save("dns", "k", &Field::uniform(1.0, fine.len())).unwrap();

    let result = map_fields(
        Location::new(&store, "dns"),
        Location::new(&store, "rans"),
        Location::new(&store, "dns_mapped"),
        &["k".to_string()],
        &MapOptions::default(),
    );
    assert!(matches!(result, Err(Error::StoreError(_))));
    assert!(!store.contains("dns_mapped", "k"));
}
