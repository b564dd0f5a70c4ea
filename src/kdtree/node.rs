use crate::r#type::Coord;

/// Closed interval of coordinate values along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent<N: Coord> {
    /// Lower bound (minimum coordinate value).
    pub lb: N,
    /// Upper bound (maximum coordinate value).
    pub ub: N,
}

impl<N: Coord> Extent<N> {
    /// Squared distance from `x` to the nearest point of this interval;
    /// zero when `x` lies inside it.
    #[inline]
    pub(crate) fn axis_sq_dist(&self, x: N) -> N {
        if x > self.ub {
            let d = x - self.ub;
            d * d
        } else if x < self.lb {
            let d = self.lb - x;
            d * d
        } else {
            N::zero()
        }
    }
}

/// Axis-aligned bounding box: one [`Extent`] per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb<N: Coord> {
    extents: Box<[Extent<N>]>,
}

impl<N: Coord> Aabb<N> {
    pub(crate) fn new(extents: Box<[Extent<N>]>) -> Self {
        Self { extents }
    }

    /// The number of dimensions of this box.
    pub fn dim(&self) -> usize {
        self.extents.len()
    }

    /// The extent of this box along axis `axis`.
    pub fn extent(&self, axis: usize) -> Extent<N> {
        self.extents[axis]
    }

    /// Componentwise union of two boxes of equal dimension.
    pub(crate) fn union(a: &Aabb<N>, b: &Aabb<N>) -> Aabb<N> {
        debug_assert_eq!(a.dim(), b.dim());
        let extents = a
            .extents
            .iter()
            .zip(b.extents.iter())
            .map(|(ea, eb)| Extent {
                lb: ea.lb.min(eb.lb),
                ub: ea.ub.max(eb.ub),
            })
            .collect();
        Aabb { extents }
    }

    /// Whether any point of this box can lie within squared distance
    /// `ball_size` of `query`. Sums the per-axis squared face distances,
    /// short-circuiting as soon as the partial sum exceeds the ball.
    pub(crate) fn within_ball(&self, query: &[N], ball_size: N) -> bool {
        let mut acc = N::zero();
        for (x, extent) in query.iter().zip(self.extents.iter()) {
            acc = acc + extent.axis_sq_dist(*x);
            if acc > ball_size {
                return false;
            }
        }
        true
    }
}

/// One node of a built tree.
///
/// Exposed for manual traversal; the tree owns its root and every internal
/// node owns both children, so walking is strictly top-down.
#[derive(Debug, Clone, PartialEq)]
pub enum Node<N: Coord> {
    /// A terminal range of tree slots, scanned linearly during search.
    Leaf {
        /// First tree slot of the range (inclusive).
        lower: usize,
        /// Last tree slot of the range (inclusive).
        upper: usize,
        /// Tight per-dimension min/max over the contained points.
        bounds: Aabb<N>,
    },
    /// A split over one dimension. Both children are always present: a
    /// degenerate one-sided partition collapses to a `Leaf` at build time.
    Internal {
        /// The dimension the children are split over.
        cut_dim: usize,
        /// Value separating the children on `cut_dim`: midpoint of the gap
        /// between `cut_left` and `cut_right`.
        cut_val: N,
        /// Upper bound of the left child on `cut_dim`.
        cut_left: N,
        /// Lower bound of the right child on `cut_dim`.
        cut_right: N,
        /// Union of both children's bounds.
        bounds: Aabb<N>,
        /// Child holding the coordinates `<=` the split mean.
        left: Box<Node<N>>,
        /// Child holding the coordinates `>` the split mean.
        right: Box<Node<N>>,
    },
}

impl<N: Coord> Node<N> {
    /// The bounding box of every point under this node.
    pub fn bounds(&self) -> &Aabb<N> {
        match self {
            Node::Leaf { bounds, .. } => bounds,
            Node::Internal { bounds, .. } => bounds,
        }
    }

    /// Returns `true` if this is a leaf node without children.
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}
