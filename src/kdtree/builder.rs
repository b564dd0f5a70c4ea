use crate::error::Result;
use crate::kdtree::node::{Aabb, Extent, Node};
use crate::kdtree::store::PointStore;
use crate::kdtree::KdTree;
use crate::r#type::Coord;

/// Construction-time options for a [`KdTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdTreeOptions {
    /// Minimum occupancy below which an index range becomes a leaf instead
    /// of splitting further. Must be at least 1.
    pub bucket_size: usize,

    /// Copy the coordinates into permutation order after the build, so leaf
    /// scans read memory sequentially instead of hopping through the
    /// permutation. Costs one extra copy of the coordinate buffer.
    pub rearrange: bool,
}

impl Default for KdTreeOptions {
    fn default() -> Self {
        Self {
            bucket_size: 1,
            rearrange: true,
        }
    }
}

/// A builder to create a [`KdTree`].
pub struct KdTreeBuilder<N: Coord> {
    coords: Vec<N>,
    dim: usize,
    options: KdTreeOptions,
}

impl<N: Coord> KdTreeBuilder<N> {
    /// Create a new builder for points of dimension `dim`, with default
    /// options.
    pub fn new(dim: usize) -> Self {
        Self::new_with_options(dim, KdTreeOptions::default())
    }

    /// Create a new builder for points of dimension `dim`.
    pub fn new_with_options(dim: usize, options: KdTreeOptions) -> Self {
        assert!(dim > 0, "dimension must be positive");
        assert!(options.bucket_size >= 1, "bucket size must be at least 1");

        Self {
            coords: Vec::new(),
            dim,
            options,
        }
    }

    /// Add a point to the index. Returns the index of the added point, the
    /// identity reported back by queries.
    pub fn add(&mut self, point: &[N]) -> usize {
        assert_eq!(
            point.len(),
            self.dim,
            "Added a point of dimension {} when expected {}.",
            point.len(),
            self.dim
        );

        let index = self.coords.len() / self.dim;
        self.coords.extend_from_slice(point);
        index
    }

    /// Consume this builder, performing the recursive sliding-midpoint sort
    /// and generating a tree ready for queries.
    pub fn finish(self) -> Result<KdTree<N>> {
        let mut store = PointStore::try_new(self.coords, self.dim)?;

        let upper = store.num_items() - 1;
        let root = build_subtree(&mut store, self.options.bucket_size, 0, upper, None);

        if self.options.rearrange {
            store.rearrange();
        }

        Ok(KdTree {
            root,
            store,
            options: self.options,
        })
    }
}

/// Build the subtree over the inclusive slot range `[lower, upper]`,
/// reordering the store's permutation in place.
///
/// `parent` carries the cut dimension and the provisional per-dimension
/// ranges of the parent split, so that only the freshly partitioned
/// dimension has to be rescanned here.
fn build_subtree<N: Coord>(
    store: &mut PointStore<N>,
    bucket_size: usize,
    lower: usize,
    upper: usize,
    parent: Option<(usize, &[Extent<N>])>,
) -> Node<N> {
    let dim = store.dim();

    if upper - lower <= bucket_size {
        return make_leaf(store, lower, upper);
    }

    // Pick the widest dimension as the cut. Ranges inherited from the parent
    // are loose for this half of the partition, which is fine: they only
    // steer the split choice, the node's final bounds come from its children.
    let mut ranges: Vec<Extent<N>> = Vec::with_capacity(dim);
    let mut cut_dim = 0;
    let mut max_width = N::zero();
    for d in 0..dim {
        let extent = match parent {
            Some((parent_cut, parent_ranges)) if parent_cut != d => parent_ranges[d],
            _ => range_of_dimension(store, d, lower, upper),
        };
        let width = extent.ub - extent.lb;
        if width > max_width {
            max_width = width;
            cut_dim = d;
        }
        ranges.push(extent);
    }

    // Sliding midpoint: partition around the arithmetic mean on the cut
    // dimension, O(1) split-point selection at the cost of skewed halves on
    // clustered data.
    let mut sum = N::zero();
    for slot in lower..=upper {
        sum = sum + store.coord_at_slot(slot, cut_dim);
    }
    let count = N::from(upper - lower + 1).unwrap();
    let mean = sum / count;

    let split = partition_around(store, cut_dim, mean, lower, upper);
    if split == lower || split > upper {
        // Every coordinate on the widest dimension fell on one side of the
        // mean; no split can make progress, so the whole range is a leaf.
        return make_leaf(store, lower, upper);
    }

    let parent = Some((cut_dim, ranges.as_slice()));
    let left = build_subtree(store, bucket_size, lower, split - 1, parent);
    let right = build_subtree(store, bucket_size, split, upper, parent);

    let cut_left = left.bounds().extent(cut_dim).ub;
    let cut_right = right.bounds().extent(cut_dim).lb;
    let cut_val = (cut_left + cut_right) / (N::one() + N::one());
    let bounds = Aabb::union(left.bounds(), right.bounds());

    Node::Internal {
        cut_dim,
        cut_val,
        cut_left,
        cut_right,
        bounds,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn make_leaf<N: Coord>(store: &PointStore<N>, lower: usize, upper: usize) -> Node<N> {
    let extents = (0..store.dim())
        .map(|d| range_of_dimension(store, d, lower, upper))
        .collect();

    Node::Leaf {
        lower,
        upper,
        bounds: Aabb::new(extents),
    }
}

/// True min/max along `axis` over the slots `[lower, upper]`.
fn range_of_dimension<N: Coord>(
    store: &PointStore<N>,
    axis: usize,
    lower: usize,
    upper: usize,
) -> Extent<N> {
    let mut lb = store.coord_at_slot(lower, axis);
    let mut ub = lb;
    for slot in lower + 1..=upper {
        let v = store.coord_at_slot(slot, axis);
        if v < lb {
            lb = v;
        }
        if v > ub {
            ub = v;
        }
    }
    Extent { lb, ub }
}

/// Two-pointer swap scan of the permutation slots in `[lower, upper]`:
/// afterwards every slot holding a coordinate `<= pivot` on `axis` precedes
/// every slot holding one `> pivot`. Returns the first slot of the `>` side
/// (`upper + 1` when there is none).
fn partition_around<N: Coord>(
    store: &mut PointStore<N>,
    axis: usize,
    pivot: N,
    lower: usize,
    upper: usize,
) -> usize {
    let mut lo = lower;
    let mut hi = upper;
    while lo < hi {
        if store.coord_at_slot(lo, axis) <= pivot {
            lo += 1;
        } else {
            store.swap_slots(lo, hi);
            hi -= 1;
        }
    }
    if store.coord_at_slot(lo, axis) <= pivot {
        lo + 1
    } else {
        lo
    }
}
