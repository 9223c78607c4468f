//! R-tree over cell centres

// external crates
use rstar::primitives::GeomWithData;
use rstar::{RTree, SelectionFunction, AABB};

/// A point in three dimensions
pub type Point = [f64; 3];

/// Tree entry, a point tagged with its position in the input
type Entry = GeomWithData<Point, usize>;

/// Nearest neighbour queries over a fixed set of points
///
/// Queries are deterministic. Ties in distance always favour the lower
/// input index, whatever order the tree visits them in.
///
/// ```rust
/// # use datafoam_mapping::PointIndex;
/// let index = PointIndex::new(vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
/// assert_eq!(index.nearest(&[1.5, 0.0, 0.0]), Some((1, 0.25)));
///
/// // equidistant from points 0 and 1
/// let found = index.nearest_k(&[0.5, 0.0, 0.0], 2);
/// assert_eq!(found[0].0, 0);
/// assert_eq!(found[1].0, 1);
/// ```
pub struct PointIndex {
    points: Vec<Point>,
    tree: RTree<Entry>,
}

impl std::fmt::Debug for PointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointIndex")
            .field("len", &self.points.len())
            .finish()
    }
}

impl PointIndex {
    /// Bulk load the tree, taking ownership of the points
    pub fn new(points: Vec<Point>) -> Self {
        let entries = points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect::<Vec<Entry>>();
        Self {
            points,
            tree: RTree::bulk_load(entries),
        }
    }

    /// Number of points held
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the index holds no points
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, in input order
    pub fn point(&self, index: usize) -> &Point {
        &self.points[index]
    }

    /// Index and squared distance of the closest point
    pub fn nearest(&self, query: &Point) -> Option<(usize, f64)> {
        self.nearest_k(query, 1).into_iter().next()
    }

    /// Up to `k` closest points as `(index, squared distance)`, closest first
    pub fn nearest_k(&self, query: &Point, k: usize) -> Vec<(usize, f64)> {
        if k == 0 {
            return Vec::new();
        }

        // keep pulling past k while the distance is tied with the last one
        let mut found: Vec<(usize, f64)> = Vec::with_capacity(k + 1);
        for (entry, distance) in self.tree.nearest_neighbor_iter_with_distance_2(query) {
            if found.len() >= k && found.last().is_some_and(|&(_, d)| distance > d) {
                break;
            }
            found.push((entry.data, distance));
        }

        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found.truncate(k);
        found
    }

    /// Closest point on the far side of the plane through `query`
    ///
    /// Only points with `(p - query) . normal <= 0` are considered. Returns
    /// `None` if there are none, which is checked against the tree envelopes
    /// before any distance ordered search.
    pub fn nearest_beyond(&self, query: &Point, normal: &Point) -> Option<(usize, f64)> {
        let half = HalfSpace {
            origin: *query,
            normal: *normal,
        };
        self.tree.locate_with_selection_function(half).next()?;

        let mut found: Option<(usize, f64)> = None;
        for (entry, distance) in self.tree.nearest_neighbor_iter_with_distance_2(query) {
            if let Some((index, best)) = found {
                if distance > best {
                    break;
                }
                if half.contains(entry.geom()) && entry.data < index {
                    found = Some((entry.data, distance));
                }
            } else if half.contains(entry.geom()) {
                found = Some((entry.data, distance));
            }
        }
        found
    }
}

/// Squared Euclidean distance
pub fn distance_squared(a: &Point, b: &Point) -> f64 {
    a.iter().zip(b).map(|(a, b)| (a - b) * (a - b)).sum()
}

/// Closed half space `(p - origin) . normal <= 0`
#[derive(Debug, Clone, Copy)]
struct HalfSpace {
    origin: Point,
    normal: Point,
}

impl HalfSpace {
    fn side(&self, p: &Point) -> f64 {
        (0..3).map(|i| (p[i] - self.origin[i]) * self.normal[i]).sum()
    }

    fn contains(&self, p: &Point) -> bool {
        self.side(p) <= 0.0
    }
}

impl SelectionFunction<Entry> for HalfSpace {
    fn should_unpack_parent(&self, envelope: &AABB<Point>) -> bool {
        // corner furthest along -normal
        let (lower, upper) = (envelope.lower(), envelope.upper());
        let corner = std::array::from_fn(|i| match self.normal[i] > 0.0 {
            true => lower[i],
            false => upper[i],
        });
        self.contains(&corner)
    }

    fn should_unpack_leaf(&self, leaf: &Entry) -> bool {
        self.contains(leaf.geom())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scattered(n: usize) -> Vec<Point> {
        let mut state = 3u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            (state >> 11) as f64 / (1u64 << 53) as f64
        };
        (0..n).map(|_| [next(), next(), next()]).collect()
    }

    fn brute_force(points: &[Point], query: &Point, k: usize) -> Vec<(usize, f64)> {
        let mut all = points
            .iter()
            .enumerate()
            .map(|(i, p)| (i, distance_squared(p, query)))
            .collect::<Vec<_>>();
        all.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        all.truncate(k);
        all
    }

    #[test]
    fn matches_brute_force() {
        let points = scattered(500);
        let index = PointIndex::new(points.clone());
        for query in scattered(50).iter().map(|p| [p[0] * 1.2, p[1] - 0.1, p[2]]) {
            assert_eq!(index.nearest_k(&query, 8), brute_force(&points, &query, 8));
        }
    }

    #[test]
    fn duplicates_favour_lower_index() {
        let index = PointIndex::new(vec![[1.0, 1.0, 1.0]; 6]);
        let found = index.nearest_k(&[0.0, 0.0, 0.0], 3);
        assert_eq!(found.iter().map(|f| f.0).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn empty_index() {
        let index = PointIndex::new(vec![]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(&[0.0, 0.0, 0.0]), None);
    }

    #[test]
    fn fewer_points_than_requested() {
        let index = PointIndex::new(vec![[0.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);
        assert_eq!(index.nearest_k(&[1.5, 0.0, 0.0], 5), vec![(1, 0.25), (0, 2.25)]);
    }

    #[test]
    fn nearest_beyond_a_plane() {
        let points = vec![[0.1, 0.0, 0.0], [0.2, 0.0, 0.0], [-3.0, 0.0, 0.0], [-1.0, 5.0, 0.0]];
        let index = PointIndex::new(points.clone());
        let query = [0.0, 0.0, 0.0];

        // everything with x <= 0
        let found = index.nearest_beyond(&query, &[1.0, 0.0, 0.0]);
        assert_eq!(found, Some((2, 9.0)));

        // nothing with x <= -10
        assert_eq!(index.nearest_beyond(&[-10.0, 0.0, 0.0], &[1.0, 0.0, 0.0]), None);

        let points = scattered(300);
        let index = PointIndex::new(points.clone());
        let (query, normal) = ([0.5, 0.5, 0.5], [0.3, -1.0, 0.2]);
        let side = |p: &Point| (0..3).map(|i| (p[i] - query[i]) * normal[i]).sum::<f64>();
        let expected = points
            .iter()
            .enumerate()
            .filter(|(_, p)| side(p) <= 0.0)
            .map(|(i, p)| (i, distance_squared(p, &query)))
            .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        assert_eq!(index.nearest_beyond(&query, &normal), expected);
    }
}
