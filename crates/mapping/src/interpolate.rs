//! Interpolation schemes and the per-point weights they produce

// crate modules
use crate::error::{Error, Result};
use crate::index::{Point, PointIndex};

// external crates
use itertools::Itertools;
use nalgebra::{DMatrix, DVector, Matrix2, Matrix3, Vector2, Vector3};
use serde::{Deserialize, Serialize};

/// Number of nearby source points searched for the tightest containing simplex
pub const LINEAR_CANDIDATES: usize = 10;

/// Upper bound on the source points gathered while widening the search
pub const MAX_CANDIDATES: usize = 512;

/// Residual of the convex combination below which a point is inside the hull
pub const HULL_TOLERANCE: f64 = 1e-9;

/// Barycentric weights down to this value still count as inside
pub const CONTAINMENT_TOLERANCE: f64 = 1e-10;

/// Simplices with a relative volume below this are skipped
pub const DEGENERATE_TOLERANCE: f64 = 1e-12;

/// Interpolation scheme
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// Value of the closest source point
    Nearest,
    /// Barycentric interpolation within a containing simplex
    #[default]
    Linear,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Method::Nearest => write!(f, "nearest"),
            Method::Linear => write!(f, "linear"),
        }
    }
}

/// Which coordinates take part in the interpolation
///
/// Cases that are homogeneous in one direction, such as a streamwise
/// periodic duct, are mapped in the plane of the other two axes. The dropped
/// axis is zeroed on both meshes so the nearest neighbour search ignores it
/// too.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Geometry {
    /// Full three dimensional interpolation
    #[default]
    Volume,
    /// Two dimensional interpolation with `axis` dropped
    Plane { axis: usize },
}

impl Geometry {
    /// Check the dropped axis exists
    pub fn validate(&self) -> Result<()> {
        match self {
            Geometry::Plane { axis } if *axis > 2 => Err(Error::InvalidAxis(*axis)),
            _ => Ok(()),
        }
    }

    /// Point as seen by the search, with any dropped axis zeroed
    pub fn project(&self, mut point: Point) -> Point {
        if let Geometry::Plane { axis } = self {
            point[*axis] = 0.0;
        }
        point
    }

    /// Number of vertices in a simplex of this dimension
    pub fn simplex_size(&self) -> usize {
        match self {
            Geometry::Volume => 4,
            Geometry::Plane { .. } => 3,
        }
    }

    fn kept_axes(&self) -> [usize; 2] {
        match self {
            Geometry::Plane { axis: 0 } => [1, 2],
            Geometry::Plane { axis: 1 } => [0, 2],
            _ => [0, 1],
        }
    }

    /// Coordinates that take part in the interpolation
    fn axes(&self) -> Vec<usize> {
        match self {
            Geometry::Volume => vec![0, 1, 2],
            Geometry::Plane { .. } => self.kept_axes().to_vec(),
        }
    }
}

/// How the value at one target point is built from the source values
#[derive(Debug, Clone, PartialEq)]
pub enum Stencil {
    /// Copy the closest source value
    Nearest(usize),
    /// Weighted sum over the vertices of a containing simplex
    Linear {
        nearest: usize,
        weights: Vec<(usize, f64)>,
    },
    /// Outside the convex hull of the source, the closest value is used instead
    Outside(usize),
}

impl Stencil {
    /// Build the stencil for a single target point
    ///
    /// Linear stencils use the tightest simplex among the nearest
    /// [LINEAR_CANDIDATES] source points. Where those do not surround the
    /// point, as on stretched cells, the search widens across each plane
    /// separating the point from the candidates gathered so far, until a
    /// convex combination is found or no source point lies beyond the plane.
    ///
    /// Returns `None` only when the index has no usable points.
    pub fn new(
        index: &PointIndex,
        query: &Point,
        method: Method,
        geometry: &Geometry,
    ) -> Option<Self> {
        let candidates = match method {
            Method::Nearest => index.nearest_k(query, 1),
            Method::Linear => index.nearest_k(query, LINEAR_CANDIDATES),
        };
        let (nearest, distance) = *candidates.first()?;

        let stencil = match method {
            Method::Nearest => Stencil::Nearest(nearest),
            Method::Linear if distance == 0.0 => Stencil::Linear {
                nearest,
                weights: vec![(nearest, 1.0)],
            },
            Method::Linear => match containing_simplex(index, query, &candidates, geometry)
                .or_else(|| enclosing_combination(index, query, &candidates, geometry))
            {
                Some(weights) => Stencil::Linear { nearest, weights },
                None => Stencil::Outside(nearest),
            },
        };
        Some(stencil)
    }

    /// True if the point has to fall back to its nearest value
    pub fn is_outside(&self) -> bool {
        matches!(self, Stencil::Outside(_))
    }

    /// Index of the closest source point
    pub fn nearest(&self) -> usize {
        match self {
            Stencil::Nearest(i) | Stencil::Outside(i) => *i,
            Stencil::Linear { nearest, .. } => *nearest,
        }
    }
}

/// Weights of the tightest candidate simplex that contains the query
///
/// Coincident candidates are only used once. Candidate simplices are ranked
/// by the summed distance of their vertices to the query, with the first
/// found kept on a tie.
fn containing_simplex(
    index: &PointIndex,
    query: &Point,
    candidates: &[(usize, f64)],
    geometry: &Geometry,
) -> Option<Vec<(usize, f64)>> {
    candidates
        .iter()
        .unique_by(|(i, _)| index.point(*i).map(f64::to_bits))
        .combinations(geometry.simplex_size())
        .filter_map(|simplex| {
            let vertices = simplex
                .iter()
                .map(|(i, _)| index.point(*i))
                .collect::<Vec<&Point>>();
            let weights = match geometry {
                Geometry::Volume => barycentric_3d(&vertices, query)?,
                Geometry::Plane { .. } => barycentric_2d(&vertices, query, geometry.kept_axes())?,
            };
            let score = simplex.iter().map(|(_, d)| d.sqrt()).sum::<f64>();
            let weights = simplex.iter().map(|(i, _)| *i).zip(weights).collect();
            Some((score, weights))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, weights)| weights)
}

/// Convex combination of source points equal to the query, if one exists
///
/// Starting from the nearest candidates, each failed attempt yields a plane
/// through the query with every candidate strictly on one side. The closest
/// source point on the other side joins the candidates. If there is none the
/// query is outside the hull of the whole source.
fn enclosing_combination(
    index: &PointIndex,
    query: &Point,
    candidates: &[(usize, f64)],
    geometry: &Geometry,
) -> Option<Vec<(usize, f64)>> {
    let axes = geometry.axes();
    let mut members = candidates.iter().map(|(i, _)| *i).collect::<Vec<usize>>();

    while members.len() <= MAX_CANDIDATES {
        let vertices = members.iter().map(|i| index.point(*i)).collect::<Vec<&Point>>();
        match hull_weights(&vertices, query, &axes) {
            Hull::Inside(weights) => {
                return Some(
                    members
                        .iter()
                        .zip(weights)
                        .filter(|(_, w)| *w > 0.0)
                        .map(|(i, w)| (*i, w))
                        .collect(),
                )
            }
            Hull::Outside(normal) => {
                let (next, _) = index.nearest_beyond(query, &normal)?;
                if members.contains(&next) {
                    return None;
                }
                members.push(next);
            }
        }
    }
    None
}

/// Result of testing a query against the hull of a set of points
#[derive(Debug, Clone, PartialEq)]
enum Hull {
    /// Non-negative weights, one per point, summing to one
    Inside(Vec<f64>),
    /// Normal of a plane through the query with every point on its positive side
    Outside(Point),
}

/// Closest convex combination of the points to the query
///
/// Solved as non-negative least squares over the columns `[(p - q)/h; 1]`
/// against `[0; 1]`, where `h` is the largest offset. A zero residual gives
/// the weights. Otherwise the residual `r` satisfies `(p - q).r_x <= -r_1 < 0`
/// for every point, so `-r_x` separates them from the query.
fn hull_weights(vertices: &[&Point], query: &Point, axes: &[usize]) -> Hull {
    let rows = axes.len() + 1;
    let scale = vertices
        .iter()
        .map(|p| axes.iter().map(|&a| (p[a] - query[a]).abs()).fold(0.0, f64::max))
        .fold(0.0, f64::max);
    if scale == 0.0 {
        let mut weights = vec![0.0; vertices.len()];
        weights[0] = 1.0;
        return Hull::Inside(weights);
    }

    let a = DMatrix::from_fn(rows, vertices.len(), |r, c| match axes.get(r) {
        Some(&axis) => (vertices[c][axis] - query[axis]) / scale,
        None => 1.0,
    });
    let mut b = DVector::zeros(rows);
    b[rows - 1] = 1.0;

    let x = nnls(&a, &b);
    let residual = &b - &a * &x;
    if residual.norm() <= HULL_TOLERANCE {
        let total = x.sum();
        return Hull::Inside(x.iter().map(|w| w / total).collect());
    }

    let mut normal = [0.0; 3];
    for (r, &axis) in axes.iter().enumerate() {
        normal[axis] = -residual[r];
    }
    Hull::Outside(normal)
}

/// Lawson-Hanson non-negative least squares, `min |Ax - b|` with `x >= 0`
fn nnls(a: &DMatrix<f64>, b: &DVector<f64>) -> DVector<f64> {
    let n = a.ncols();
    let mut x = DVector::zeros(n);
    let mut passive = vec![false; n];

    for _ in 0..3 * n {
        let gradient = a.transpose() * (b - a * &x);
        let entering = (0..n)
            .filter(|&j| !passive[j] && gradient[j] > f64::EPSILON)
            .max_by(|&i, &j| gradient[i].total_cmp(&gradient[j]).then(j.cmp(&i)));
        let Some(j) = entering else {
            break;
        };
        passive[j] = true;

        loop {
            let z = passive_solution(a, b, &passive);
            if (0..n).all(|i| !passive[i] || z[i] > 0.0) {
                x = z;
                break;
            }

            // step back to the first variable that would turn negative
            let (blocking, step) = (0..n)
                .filter(|&i| passive[i] && z[i] <= 0.0)
                .map(|i| match x[i] - z[i] > 0.0 {
                    true => (i, x[i] / (x[i] - z[i])),
                    false => (i, 0.0),
                })
                .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                .unwrap_or((j, 0.0));
            let delta = (z - &x) * step;
            x += delta;

            passive[blocking] = false;
            x[blocking] = 0.0;
            for i in 0..n {
                if passive[i] && x[i] <= f64::EPSILON {
                    passive[i] = false;
                    x[i] = 0.0;
                }
            }
        }
    }
    x
}

/// Unconstrained least squares over the passive columns, zero elsewhere
fn passive_solution(a: &DMatrix<f64>, b: &DVector<f64>, passive: &[bool]) -> DVector<f64> {
    let columns = (0..a.ncols()).filter(|&j| passive[j]).collect::<Vec<usize>>();
    let mut z = DVector::zeros(a.ncols());
    if columns.is_empty() {
        return z;
    }

    let sub = a.select_columns(columns.iter());
    if let Ok(solution) = sub.svd(true, true).solve(b, f64::EPSILON) {
        for (k, &j) in columns.iter().enumerate() {
            z[j] = solution[k];
        }
    }
    z
}

/// Barycentric coordinates in a tetrahedron, if it contains the query
pub fn barycentric_3d(vertices: &[&Point], query: &Point) -> Option<Vec<f64>> {
    let origin = Vector3::from(*vertices[0]);
    let edges = Matrix3::from_columns(&[
        Vector3::from(*vertices[1]) - origin,
        Vector3::from(*vertices[2]) - origin,
        Vector3::from(*vertices[3]) - origin,
    ]);

    let scale = edges.column_iter().map(|c| c.norm()).fold(0.0, f64::max);
    if scale == 0.0 || edges.determinant().abs() <= DEGENERATE_TOLERANCE * scale.powi(3) {
        return None;
    }

    let local = edges.try_inverse()? * (Vector3::from(*query) - origin);
    let weights = vec![1.0 - local.sum(), local[0], local[1], local[2]];
    contains(weights)
}

/// Barycentric coordinates in a triangle spanned by the `axes` coordinates
pub fn barycentric_2d(vertices: &[&Point], query: &Point, axes: [usize; 2]) -> Option<Vec<f64>> {
    let reduce = |p: &Point| Vector2::new(p[axes[0]], p[axes[1]]);
    let origin = reduce(vertices[0]);
    let edges = Matrix2::from_columns(&[reduce(vertices[1]) - origin, reduce(vertices[2]) - origin]);

    let scale = edges.column_iter().map(|c| c.norm()).fold(0.0, f64::max);
    if scale == 0.0 || edges.determinant().abs() <= DEGENERATE_TOLERANCE * scale.powi(2) {
        return None;
    }

    let local = edges.try_inverse()? * (reduce(query) - origin);
    let weights = vec![1.0 - local.sum(), local[0], local[1]];
    contains(weights)
}

fn contains(weights: Vec<f64>) -> Option<Vec<f64>> {
    weights
        .iter()
        .all(|w| *w >= -CONTAINMENT_TOLERANCE)
        .then_some(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube() -> Vec<Point> {
        (0..8)
            .map(|n| [(n & 1) as f64, ((n >> 1) & 1) as f64, ((n >> 2) & 1) as f64])
            .collect()
    }

    #[test]
    fn tetrahedron_weights() {
        let v = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let vertices = v.iter().collect::<Vec<_>>();
        let weights = barycentric_3d(&vertices, &[0.25, 0.25, 0.25]).unwrap();
        assert_eq!(weights, vec![0.25, 0.25, 0.25, 0.25]);
        assert_eq!(barycentric_3d(&vertices, &[1.0, 1.0, 1.0]), None);
    }

    #[test]
    fn flat_simplices_are_skipped() {
        let v = [
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 1.0, 0.0],
        ];
        let vertices = v.iter().collect::<Vec<_>>();
        assert_eq!(barycentric_3d(&vertices, &[0.5, 0.5, 0.0]), None);
    }

    #[test]
    fn triangle_weights_ignore_dropped_axis() {
        let v = [[9.0, 0.0, 0.0], [-3.0, 2.0, 0.0], [4.0, 0.0, 2.0]];
        let vertices = v.iter().collect::<Vec<_>>();
        let weights = barycentric_2d(&vertices, &[0.0, 1.0, 1.0], [1, 2]).unwrap();
        assert_eq!(weights, vec![0.0, 0.5, 0.5]);
    }

    #[test]
    fn stencil_kinds() {
        let index = PointIndex::new(unit_cube());
        let volume = Geometry::Volume;

        let stencil = Stencil::new(&index, &[0.1, 0.1, 0.1], Method::Nearest, &volume);
        assert_eq!(stencil, Some(Stencil::Nearest(0)));

        let stencil = Stencil::new(&index, &[1.0, 1.0, 1.0], Method::Linear, &volume).unwrap();
        assert_eq!(
            stencil,
            Stencil::Linear {
                nearest: 7,
                weights: vec![(7, 1.0)]
            }
        );

        let stencil = Stencil::new(&index, &[0.3, 0.4, 0.2], Method::Linear, &volume).unwrap();
        assert!(matches!(stencil, Stencil::Linear { nearest: 0, .. }));

        let stencil = Stencil::new(&index, &[3.0, 3.0, 3.0], Method::Linear, &volume).unwrap();
        assert!(stencil.is_outside());
        assert_eq!(stencil.nearest(), 7);
    }

    #[test]
    fn hull_membership() {
        let v = [
            [0.0, 0.0, 0.0],
            [2.0, 0.0, 0.0],
            [0.0, 2.0, 0.0],
            [0.0, 0.0, 2.0],
            [2.0, 2.0, 2.0],
        ];
        let vertices = v.iter().collect::<Vec<_>>();
        let query = [0.5, 0.6, 0.7];

        let Hull::Inside(weights) = hull_weights(&vertices, &query, &[0, 1, 2]) else {
            panic!("query should be inside");
        };
        assert!(weights.iter().all(|w| *w >= 0.0));
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        for axis in 0..3 {
            let value = v.iter().zip(&weights).map(|(p, w)| p[axis] * w).sum::<f64>();
            assert!((value - query[axis]).abs() < 1e-9);
        }

        let query = [-1.0, 0.5, 0.5];
        let Hull::Outside(normal) = hull_weights(&vertices, &query, &[0, 1, 2]) else {
            panic!("query should be outside");
        };
        for p in &v {
            let side = (0..3).map(|i| (p[i] - query[i]) * normal[i]).sum::<f64>();
            assert!(side > 0.0);
        }
    }

    #[test]
    fn collinear_neighbours_widen_the_search() {
        // wall normal spacing far finer than the other two directions
        let mut points = Vec::new();
        for i in 0..4 {
            for j in 0..60 {
                for k in 0..4 {
                    points.push([i as f64, j as f64 * 0.01, k as f64]);
                }
            }
        }
        let values = points.iter().map(|p| p[0] + p[2]).collect::<Vec<f64>>();
        let index = PointIndex::new(points);

        let query = [1.1, 0.305, 1.1];
        let stencil = Stencil::new(&index, &query, Method::Linear, &Geometry::Volume).unwrap();
        let Stencil::Linear { weights, .. } = &stencil else {
            panic!("expected a linear stencil, found {stencil:?}");
        };
        let value = weights.iter().map(|(i, w)| w * values[*i]).sum::<f64>();
        assert!((value - 2.2).abs() < 1e-9);

        let stencil = Stencil::new(&index, &[1.1, 0.7, 1.1], Method::Linear, &Geometry::Volume);
        assert!(stencil.unwrap().is_outside());
    }

    #[test]
    fn plane_axis_is_checked() {
        assert!(Geometry::Plane { axis: 2 }.validate().is_ok());
        assert!(matches!(
            Geometry::Plane { axis: 3 }.validate(),
            Err(Error::InvalidAxis(3))
        ));
    }
}
