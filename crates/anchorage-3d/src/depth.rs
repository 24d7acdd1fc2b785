use kiddo::immutable::float::kdtree::ImmutableKdTree;
use kiddo::SquaredEuclidean;

/// A neighbour returned by a snapshot query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbour {
    /// Index of the point in [`DepthSnapshot::points`].
    pub index: usize,
    /// Euclidean distance to the query point.
    pub distance: f64,
}

/// A timestamped point cloud captured by the depth camera.
///
/// Points are expressed in the depth camera frame. The snapshot is immutable and carries a
/// k-d tree over its points for neighbourhood queries.
pub struct DepthSnapshot {
    // capture time in seconds
    timestamp: f64,
    points: Vec<[f64; 3]>,
    // None for an empty cloud
    index: Option<ImmutableKdTree<f64, u32, 3, 32>>,
}

impl std::fmt::Debug for DepthSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DepthSnapshot")
            .field("timestamp", &self.timestamp)
            .field("num_points", &self.points.len())
            .finish()
    }
}

impl DepthSnapshot {
    /// Create a snapshot and build its neighbourhood index.
    pub fn new(timestamp: f64, points: Vec<[f64; 3]>) -> Self {
        let index = if points.is_empty() {
            None
        } else {
            Some(ImmutableKdTree::new_from_slice(&points))
        };
        Self {
            timestamp,
            points,
            index,
        }
    }

    /// The capture time in seconds.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Get as reference the points of the snapshot.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get the number of points in the snapshot.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the snapshot is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The point closest to `query`.
    pub fn nearest(&self, query: &[f64; 3]) -> Option<Neighbour> {
        let index = self.index.as_ref()?;
        let nn = index.nearest_one::<SquaredEuclidean>(query);
        Some(Neighbour {
            index: nn.item as usize,
            distance: nn.distance.sqrt(),
        })
    }

    /// All points within `radius` of `query`, closest first.
    pub fn within(&self, query: &[f64; 3], radius: f64) -> Vec<Neighbour> {
        let Some(index) = self.index.as_ref() else {
            return Vec::new();
        };
        index
            .within::<SquaredEuclidean>(query, radius * radius)
            .into_iter()
            .map(|nn| Neighbour {
                index: nn.item as usize,
                distance: nn.distance.sqrt(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // a grid with a tiny per-point depth offset so that no two points share a depth
    fn grid(step: f64, n: usize, depth: f64) -> Vec<[f64; 3]> {
        let mut points = Vec::with_capacity(n * n);
        for i in 0..n {
            for j in 0..n {
                let jitter = (i * n + j) as f64 * 1e-9;
                points.push([i as f64 * step, j as f64 * step, depth + jitter]);
            }
        }
        points
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = DepthSnapshot::new(1.0, Vec::new());
        assert!(snapshot.is_empty());
        assert!(snapshot.nearest(&[0.0, 0.0, 0.0]).is_none());
        assert!(snapshot.within(&[0.0, 0.0, 0.0], 10.0).is_empty());
    }

    #[test]
    fn test_nearest() {
        let snapshot = DepthSnapshot::new(0.5, grid(0.1, 10, 2.0));
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.timestamp(), 0.5);

        let nn = snapshot.nearest(&[0.31, 0.52, 2.0]).unwrap();
        let p = snapshot.points()[nn.index];
        assert_relative_eq!(p[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(p[1], 0.5, epsilon = 1e-12);
        assert_relative_eq!(nn.distance, 0.02f64.hypot(0.01), epsilon = 1e-6);
    }

    #[test]
    fn test_within_sorted_by_distance() {
        let snapshot = DepthSnapshot::new(0.0, grid(1.0, 5, 1.0));
        let centre = snapshot.points()[12];
        let neighbours = snapshot.within(&centre, 1.01);
        // the centre plus its four direct neighbours
        assert_eq!(neighbours.len(), 5);
        assert_eq!(neighbours[0].index, 12);
        assert!(neighbours
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
    }
}
