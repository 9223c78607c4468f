//! Integration tests for the array store and case directory reader

use std::fs;
use std::path::{Path, PathBuf};

use datafoam_store::{ArrayStore, Error, FoamCase};
use datafoam_tensor::{Field, SymmetricNames};
use rstest::{fixture, rstest};

/// Unique scratch directory, removed when dropped
struct Scratch(PathBuf);

impl Scratch {
    fn new(name: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "datafoam_store_{name}_{}_{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn header(class: &str, object: &str) -> String {
    format!(
        "FoamFile\n{{\n    version     2.0;\n    format      ascii;\n    class       {class};\n    object      {object};\n}}\n\ndimensions      [0 0 0 0 0 0 0];\n\n"
    )
}

fn write_field(dir: &Path, name: &str, class: &str, internal: &str) {
    let text = format!(
        "{}internalField   {internal}\n\nboundaryField\n{{\n}}\n",
        header(class, name)
    );
    fs::write(dir.join(name), text).unwrap();
}

/// Minimal three cell case with a handful of fields at time 100
#[fixture]
fn case() -> Scratch {
    let scratch = Scratch::new("case");
    let root = &scratch.0;

    let mesh = root.join("constant/polyMesh");
    fs::create_dir_all(&mesh).unwrap();
    fs::write(
        mesh.join("owner"),
        "FoamFile\n{\n    class       labelList;\n    note        \"nPoints:16 nCells:3 nFaces:14 nInternalFaces:2\";\n}\n14\n(\n0\n0\n1\n)\n",
    )
    .unwrap();

    for time in ["0", "50", "100", "system"] {
        fs::create_dir_all(root.join(time)).unwrap();
    }

    let latest = root.join("100");
    write_field(&latest, "k", "volScalarField", "nonuniform List<scalar> 3\n(\n0.5\n1\n1.5\n)\n;");
    write_field(&latest, "nut", "volScalarField", "uniform 2e-05;");
    write_field(
        &latest,
        "U",
        "volVectorField",
        "nonuniform List<vector> 3\n(\n(1 0 0)\n(2 0.5 0)\n(3 -1 1e-3)\n)\n;",
    );
    write_field(
        &latest,
        "tau",
        "volSymmTensorField",
        "nonuniform List<symmTensor> 3\n(\n(1 2 3 4 5 6)\n(1 0 0 1 0 1)\n(0 0 0 0 0 0)\n)\n;",
    );
    write_field(
        &latest,
        "gradU",
        "volTensorField",
        "uniform (1 2 3 4 5 6 7 8 9);",
    );
    write_field(&latest, "short", "volScalarField", "nonuniform List<scalar> 2(1 2);");

    for (name, values) in [("Cx", "(0 1 2)"), ("Cy", "(0 0 0)"), ("Cz", "(5 5 5)")] {
        write_field(
            &root.join("0"),
            name,
            "volScalarField",
            &format!("nonuniform List<scalar> 3{values};"),
        );
    }

    scratch
}

#[rstest]
fn opens_latest_time(case: Scratch) {
    let foam = FoamCase::open(&case.0).unwrap();
    assert_eq!(foam.time(), "100");
    assert_eq!(foam.n_cells(), 3);
}

#[rstest]
fn reads_every_field_class(case: Scratch) {
    let foam = FoamCase::open(&case.0).unwrap();

    let k = foam.read_field("k").unwrap();
    assert_eq!(k.scalars().unwrap(), &[0.5, 1.0, 1.5]);

    let u = foam.read_field("U").unwrap();
    assert_eq!(u.shape(), &[3, 3]);
    assert_eq!(u.cell(2), &[3.0, -1.0, 1e-3]);

    let tau = foam.read_field("tau").unwrap();
    assert_eq!(tau.shape(), &[3, 3, 3]);
    assert_eq!(tau.cell(0), &[1.0, 2.0, 3.0, 2.0, 4.0, 5.0, 3.0, 5.0, 6.0]);
}

#[rstest]
fn uniform_fields_are_broadcast(case: Scratch) {
    let foam = FoamCase::open(&case.0).unwrap();

    let nut = foam.read_field("nut").unwrap();
    assert_eq!(nut.shape(), &[3]);
    assert_eq!(nut.scalars().unwrap(), &[2e-05; 3]);

    let grad_u = foam.read_field("gradU").unwrap();
    assert_eq!(grad_u.shape(), &[3, 3, 3]);
    assert_eq!(grad_u.cell(1)[5], 6.0);
}

#[rstest]
fn cell_centres_from_components(case: Scratch) {
    let foam = FoamCase::open(&case.0).unwrap();
    let c = foam.read_cell_centres().unwrap();
    assert_eq!(c.shape(), &[3, 3]);
    assert_eq!(c.cell(1), &[1.0, 0.0, 5.0]);
}

#[rstest]
fn wrong_length_is_inconsistent(case: Scratch) {
    let foam = FoamCase::open(&case.0).unwrap();
    assert!(matches!(
        foam.read_field("short"),
        Err(Error::MeshInconsistency {
            expected: 3,
            found: 2,
            ..
        })
    ));
}

#[rstest]
fn missing_case_field(case: Scratch) {
    let foam = FoamCase::open(&case.0).unwrap();
    assert!(matches!(
        foam.read_field("epsilon"),
        Err(Error::FieldNotFound { field, .. }) if field == "epsilon"
    ));
}

#[test]
fn missing_mesh() {
    let scratch = Scratch::new("no_mesh");
    assert!(matches!(
        FoamCase::open(&scratch.0),
        Err(Error::MeshNotFound(_))
    ));
}

#[test]
fn store_round_trip() {
    let scratch = Scratch::new("round_trip");
    let store = ArrayStore::new(&scratch.0);

    let fields = [
        ("k", Field::from_scalars(vec![0.1, 0.2, f64::NAN])),
        ("U", Field::new(vec![2, 3], vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap()),
        ("Tensors", Field::new(vec![1, 10, 3, 3], (0..90).map(f64::from).collect()).unwrap()),
    ];

    for (name, field) in &fields {
        store.save("RANS_case_1p0", name, field).unwrap();
        assert!(store.contains("RANS_case_1p0", name));
    }

    for (name, field) in &fields {
        let loaded = store.load("RANS_case_1p0", name).unwrap();
        assert_eq!(loaded.shape(), field.shape());
        for (a, b) in loaded.data().iter().zip(field.data()) {
            assert!(a == b || (a.is_nan() && b.is_nan()));
        }
    }
}

#[test]
fn raw_symmetric_arrays_expand_on_load() {
    let scratch = Scratch::new("symmetric");
    let raw = Field::new(vec![1, 6], vec![11.0, 12.0, 13.0, 22.0, 23.0, 33.0]).unwrap();

    let store = ArrayStore::new(&scratch.0);
    store.save("LES_case", "tauMean", &raw).unwrap();
    store.save("LES_case", "b", &raw).unwrap();

    // not on the default list, stays raw
    assert_eq!(store.load("LES_case", "tauMean").unwrap().shape(), &[1, 6]);
    assert_eq!(store.load("LES_case", "b").unwrap().shape(), &[1, 3, 3]);

    let names = SymmetricNames::default().with("tauMean");
    let store = store.with_symmetric_names(names);
    let tau = store.load("LES_case", "tauMean").unwrap();
    assert_eq!(tau.shape(), &[1, 3, 3]);
    assert_eq!(tau.cell(0)[7], 23.0);
}

#[test]
fn uniform_values_saved_as_full_arrays() {
    let scratch = Scratch::new("uniform");
    let store = ArrayStore::new(&scratch.0);
    store.save_uniform("DNS_case", "nu", 1.5e-5, 4).unwrap();
    let nu = store.load("DNS_case", "nu").unwrap();
    assert_eq!(nu.shape(), &[4]);
}

#[test]
fn missing_array_is_field_not_found() {
    let scratch = Scratch::new("missing");
    let store = ArrayStore::new(&scratch.0);
    match store.load("DNS_case", "k") {
        Err(Error::FieldNotFound { case, field }) => {
            assert_eq!(case, "DNS_case");
            assert_eq!(field, "k");
        }
        other => panic!("expected FieldNotFound, found {other:?}"),
    }
}

#[rstest]
#[case("DNS_case_1.5")]
#[case("komegasst_case.0.5")]
#[case("LES.case")]
fn dotted_prefixes_keep_fields_apart(#[case] prefix: &str) {
    let scratch = Scratch::new(&format!("dotted_{prefix}"));
    let store = ArrayStore::new(&scratch.0);

    let k = Field::from_scalars(vec![1.0, 2.0, 3.0, 4.0]);
    let u = Field::new(vec![4, 3], (0..12).map(f64::from).collect()).unwrap();
    store.save(prefix, "k", &k).unwrap();
    store.save(prefix, "U", &u).unwrap();

    assert_ne!(store.path(prefix, "k"), store.path(prefix, "U"));
    assert_eq!(
        store.path(prefix, "k").file_name().unwrap(),
        format!("{prefix}_k.bin").as_str()
    );
    assert_eq!(store.load(prefix, "k").unwrap(), k);
    assert_eq!(store.load(prefix, "U").unwrap(), u);
}
