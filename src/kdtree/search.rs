use crate::kdtree::node::Node;
use crate::kdtree::results::{Collect, Neighbor, NeighborHeap};
use crate::kdtree::store::PointStore;
use crate::kdtree::KdTree;
use crate::r#type::Coord;

/// Per-query options shared by both search modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// `(center, window)`: drop every candidate whose original index lies
    /// within `window` of `center` (`|index - center| < window`). Intended
    /// for catalogs whose index order is meaningful, e.g. sequential frames
    /// where adjacent items are near-duplicates.
    pub exclude: Option<(u32, u32)>,

    /// Sort k-nearest results ascending by distance before returning.
    /// Without this the results come back in heap order. Fixed-radius
    /// results are always unordered.
    pub sort_results: bool,
}

/// State owned by a single traversal: the query vector, the shrinking ball
/// and the candidate collection. Never shared between queries.
struct SearchState<'a, N: Coord, C> {
    query: &'a [N],
    ball_size: N,
    exclude: Option<(u32, u32)>,
    collector: C,
}

pub(crate) fn k_nearest<N: Coord>(
    tree: &KdTree<N>,
    query: &[N],
    k: usize,
    options: &QueryOptions,
) -> Vec<Neighbor<N>> {
    let mut state = SearchState {
        query,
        ball_size: N::infinity(),
        exclude: options.exclude,
        collector: NeighborHeap::new(k),
    };
    search_node(&tree.root, tree.store(), &mut state);

    let mut results = state.collector.into_vec();
    if options.sort_results {
        // We don't allow NaN. This should only panic on NaN
        results.sort_unstable_by(|a, b| a.dist.partial_cmp(&b.dist).unwrap());
    }
    results
}

pub(crate) fn within_radius<N: Coord>(
    tree: &KdTree<N>,
    query: &[N],
    radius: N,
    options: &QueryOptions,
) -> Vec<Neighbor<N>> {
    let mut state = SearchState {
        query,
        ball_size: radius * radius,
        exclude: options.exclude,
        collector: Vec::new(),
    };
    search_node(&tree.root, tree.store(), &mut state);
    state.collector
}

/// Branch-and-bound descent. The near child (same side of the cut as the
/// query) is always visited; the far child only when the squared margin
/// across the cut gap is inside the ball and its bounding box passes the
/// face-distance test.
fn search_node<N: Coord, C: Collect<N>>(
    node: &Node<N>,
    store: &PointStore<N>,
    state: &mut SearchState<'_, N, C>,
) {
    match node {
        Node::Leaf { lower, upper, .. } => scan_leaf(*lower, *upper, store, state),
        Node::Internal {
            cut_dim,
            cut_val,
            cut_left,
            cut_right,
            left,
            right,
            ..
        } => {
            let q = state.query[*cut_dim];
            let (near, far, margin) = if q < *cut_val {
                (left, right, *cut_right - q)
            } else {
                (right, left, q - *cut_left)
            };

            search_node(near, store, state);

            if margin * margin < state.ball_size
                && far.bounds().within_ball(state.query, state.ball_size)
            {
                search_node(far, store, state);
            }
        }
    }
}

fn scan_leaf<N: Coord, C: Collect<N>>(
    lower: usize,
    upper: usize,
    store: &PointStore<N>,
    state: &mut SearchState<'_, N, C>,
) {
    for slot in lower..=upper {
        let Some(dist) = sq_dist_bounded(state.query, store.slot_row(slot), state.ball_size)
        else {
            continue;
        };

        let index = store.id(slot);
        if let Some((center, window)) = state.exclude {
            if center.abs_diff(index) < window {
                continue;
            }
        }

        state.ball_size = state
            .collector
            .accept(Neighbor { index, dist }, state.ball_size);
    }
}

/// Squared Euclidean distance between `a` and `b`, abandoning the
/// accumulation as soon as the partial sum exceeds `limit`.
#[inline]
fn sq_dist_bounded<N: Coord>(a: &[N], b: &[N], limit: N) -> Option<N> {
    let mut acc = N::zero();
    for (x, y) in a.iter().zip(b.iter()) {
        let d = *x - *y;
        acc = acc + d * d;
        if acc > limit {
            return None;
        }
    }
    Some(acc)
}
