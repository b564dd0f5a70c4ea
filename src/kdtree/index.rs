use crate::error::{KdIndexError, Result};
use crate::kdtree::builder::{KdTreeBuilder, KdTreeOptions};
use crate::kdtree::node::Node;
use crate::kdtree::results::Neighbor;
use crate::kdtree::search::{self, QueryOptions};
use crate::kdtree::store::PointStore;
use crate::r#type::Coord;

/// An immutable k-d tree over fixed-dimension points.
///
/// Built once via [`KdTreeBuilder`] (or [`KdTree::from_points`]); all queries
/// take `&self` and own their per-query state, so any number of queries may
/// run concurrently across threads.
#[derive(Debug, Clone, PartialEq)]
pub struct KdTree<N: Coord> {
    pub(crate) root: Node<N>,
    pub(crate) store: PointStore<N>,
    pub(crate) options: KdTreeOptions,
}

impl<N: Coord> KdTree<N> {
    /// Build a tree with default options from a flat row-major
    /// `num_items * dim` coordinate buffer.
    pub fn from_points(coords: &[N], dim: usize) -> Result<Self> {
        let mut builder = KdTreeBuilder::new(dim);
        for point in coords.chunks_exact(dim) {
            builder.add(point);
        }
        builder.finish()
    }

    /// The number of points in this tree.
    pub fn num_items(&self) -> usize {
        self.store.num_items()
    }

    /// The dimension this tree was built with.
    pub fn dim(&self) -> usize {
        self.store.dim()
    }

    /// The options this tree was built with.
    pub fn options(&self) -> KdTreeOptions {
        self.options
    }

    /// The point store backing this tree.
    pub fn store(&self) -> &PointStore<N> {
        &self.store
    }

    /// Access the root node of the tree for manual traversal.
    pub fn root(&self) -> &Node<N> {
        &self.root
    }

    /// The `k` nearest neighbors of `query`, as `(index, squared distance)`
    /// pairs in heap order.
    ///
    /// May legitimately return fewer than `k` results when the tree holds
    /// fewer than `k` points.
    pub fn k_nearest(&self, query: &[N], k: usize) -> Result<Vec<Neighbor<N>>> {
        self.k_nearest_with_options(query, k, &QueryOptions::default())
    }

    /// The `k` nearest neighbors of `query`, honoring the exclusion window
    /// and result ordering configured in `options`.
    ///
    /// # Example
    ///
    /// ```
    /// use kd_index::kdtree::{KdTree, QueryOptions};
    ///
    /// let tree = KdTree::from_points(&[0.0, 0.0, 3.0, 3.0, 9.0, 9.0], 2).unwrap();
    /// let options = QueryOptions {
    ///     sort_results: true,
    ///     ..Default::default()
    /// };
    /// let results = tree.k_nearest_with_options(&[1.0, 1.0], 2, &options).unwrap();
    /// assert_eq!(results[0].index, 0);
    /// assert_eq!(results[1].index, 1);
    /// ```
    pub fn k_nearest_with_options(
        &self,
        query: &[N],
        k: usize,
        options: &QueryOptions,
    ) -> Result<Vec<Neighbor<N>>> {
        self.check_query(query)?;
        if k == 0 {
            return Err(KdIndexError::InvalidParameter(
                "k must be positive".to_string(),
            ));
        }
        Ok(search::k_nearest(self, query, k, options))
    }

    /// Every item with true squared distance to `query` at most
    /// `radius * radius`, unordered.
    pub fn within_radius(&self, query: &[N], radius: N) -> Result<Vec<Neighbor<N>>> {
        self.within_radius_with_options(query, radius, &QueryOptions::default())
    }

    /// Every item within `radius` of `query`, honoring the exclusion window
    /// configured in `options`. Results are unordered regardless of
    /// [`QueryOptions::sort_results`].
    pub fn within_radius_with_options(
        &self,
        query: &[N],
        radius: N,
        options: &QueryOptions,
    ) -> Result<Vec<Neighbor<N>>> {
        self.check_query(query)?;
        if radius < N::zero() {
            return Err(KdIndexError::InvalidParameter(format!(
                "radius must be non-negative, got {radius:?}"
            )));
        }
        Ok(search::within_radius(self, query, radius, options))
    }

    /// The `k` nearest neighbors of the stored item `item`, excluding every
    /// item whose index is within `window` of `item` itself.
    ///
    /// With `window == 0` nothing is excluded and the item is its own
    /// nearest neighbor at distance zero; `window == 1` excludes exactly the
    /// item. Useful when the catalog order is meaningful (e.g. sequential
    /// frames) and near-duplicates of the query item should be suppressed.
    pub fn k_nearest_around(
        &self,
        item: usize,
        k: usize,
        window: u32,
    ) -> Result<Vec<Neighbor<N>>> {
        if item >= self.num_items() {
            return Err(KdIndexError::InvalidParameter(format!(
                "item index {item} out of bounds for {} items",
                self.num_items()
            )));
        }

        let query = self.store.point(item).to_vec();
        let options = QueryOptions {
            exclude: Some((item as u32, window)),
            sort_results: true,
        };
        self.k_nearest_with_options(&query, k, &options)
    }

    fn check_query(&self, query: &[N]) -> Result<()> {
        if query.len() != self.dim() {
            return Err(KdIndexError::DimensionMismatch {
                expected: self.dim(),
                got: query.len(),
            });
        }
        Ok(())
    }
}
