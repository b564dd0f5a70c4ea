use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kdtree::node::{Aabb, Node};
use crate::kdtree::{KdTree, KdTreeBuilder, KdTreeOptions, QueryOptions};
use crate::KdIndexError;

fn random_coords(n: usize, dim: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n * dim).map(|_| rng.gen_range(0.0..100.0)).collect()
}

fn sq_dist(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Linear scan over all points, ascending by distance.
fn brute_force(coords: &[f64], dim: usize, query: &[f64]) -> Vec<(u32, f64)> {
    let mut all: Vec<(u32, f64)> = coords
        .chunks_exact(dim)
        .enumerate()
        .map(|(i, p)| (i as u32, sq_dist(p, query)))
        .collect();
    all.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap());
    all
}

fn sorted_indices(results: &[crate::kdtree::Neighbor<f64>]) -> Vec<u32> {
    let mut indices: Vec<u32> = results.iter().map(|r| r.index).collect();
    indices.sort_unstable();
    indices
}

#[test]
fn worked_example() {
    let coords = [0.0, 0.0, 0.0, 10.0, 10.0, 10.0, 0.0, 0.0, 1.0];
    let tree = KdTree::from_points(&coords, 3).unwrap();
    assert_eq!(tree.num_items(), 3);
    assert_eq!(tree.dim(), 3);
    assert_eq!(tree.options().bucket_size, 1);

    let results = tree.k_nearest(&[0.0, 0.0, 0.0], 1).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].index, 0);
    assert_eq!(results[0].dist, 0.0);

    let options = QueryOptions {
        sort_results: true,
        ..Default::default()
    };
    let results = tree
        .k_nearest_with_options(&[0.0, 0.0, 0.0], 2, &options)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].index, 0);
    assert_eq!(results[0].dist, 0.0);
    assert_eq!(results[1].index, 2);
    assert_eq!(results[1].dist, 1.0);

    let results = tree.k_nearest(&[100.0, 100.0, 100.0], 1).unwrap();
    assert_eq!(results[0].index, 1);
    assert_eq!(results[0].dist, sq_dist(&[100.0, 100.0, 100.0], &[10.0, 10.0, 10.0]));
}

/// Collect every leaf's inclusive slot range, left to right.
fn leaf_ranges(node: &Node<f64>, out: &mut Vec<(usize, usize)>) {
    match node {
        Node::Leaf { lower, upper, .. } => out.push((*lower, *upper)),
        Node::Internal { left, right, .. } => {
            leaf_ranges(left, out);
            leaf_ranges(right, out);
        }
    }
}

#[test]
fn leaves_partition_the_slot_range() {
    for bucket_size in [1, 4, 16] {
        let coords = random_coords(257, 3, 7);
        let options = KdTreeOptions {
            bucket_size,
            ..Default::default()
        };
        let mut builder = KdTreeBuilder::new_with_options(3, options);
        for point in coords.chunks_exact(3) {
            builder.add(point);
        }
        let tree = builder.finish().unwrap();

        let mut ranges = Vec::new();
        leaf_ranges(tree.root(), &mut ranges);

        // contiguous, disjoint, and covering [0, N)
        let mut next = 0;
        for (lower, upper) in ranges {
            assert_eq!(lower, next);
            assert!(upper >= lower);
            next = upper + 1;
        }
        assert_eq!(next, tree.num_items());
    }
}

fn check_bounds(node: &Node<f64>, tree: &KdTree<f64>) {
    match node {
        Node::Leaf {
            lower,
            upper,
            bounds,
        } => {
            for d in 0..tree.dim() {
                let mut lb = f64::INFINITY;
                let mut ub = f64::NEG_INFINITY;
                for slot in *lower..=*upper {
                    let v = tree.store().coord_at_slot(slot, d);
                    lb = lb.min(v);
                    ub = ub.max(v);
                }
                assert_eq!(bounds.extent(d).lb, lb, "leaf lower bound on dim {d}");
                assert_eq!(bounds.extent(d).ub, ub, "leaf upper bound on dim {d}");
            }
        }
        Node::Internal {
            cut_dim,
            cut_left,
            cut_right,
            bounds,
            left,
            right,
            ..
        } => {
            assert_eq!(bounds, &Aabb::union(left.bounds(), right.bounds()));
            assert_eq!(*cut_left, left.bounds().extent(*cut_dim).ub);
            assert_eq!(*cut_right, right.bounds().extent(*cut_dim).lb);
            assert!(cut_left <= cut_right, "children separated on the cut dim");
            check_bounds(left, tree);
            check_bounds(right, tree);
        }
    }
}

#[test]
fn bounding_boxes_are_tight_and_consistent() {
    let coords = random_coords(500, 4, 11);
    let tree = KdTree::from_points(&coords, 4).unwrap();
    check_bounds(tree.root(), &tree);
}

#[test]
fn full_k_matches_brute_force() {
    let n = 200;
    let coords = random_coords(n, 3, 13);
    let tree = KdTree::from_points(&coords, 3).unwrap();
    let mut rng = StdRng::seed_from_u64(14);

    for _ in 0..10 {
        let query: Vec<f64> = (0..3).map(|_| rng.gen_range(-20.0..120.0)).collect();
        let results = tree.k_nearest(&query, n).unwrap();
        assert_eq!(results.len(), n);

        let mut expected: Vec<u32> = brute_force(&coords, 3, &query)
            .iter()
            .map(|(i, _)| *i)
            .collect();
        expected.sort_unstable();
        assert_eq!(sorted_indices(&results), expected);
    }
}

#[test]
fn small_k_matches_brute_force() {
    let coords = random_coords(400, 4, 17);
    let tree = KdTree::from_points(&coords, 4).unwrap();
    let mut rng = StdRng::seed_from_u64(18);
    let options = QueryOptions {
        sort_results: true,
        ..Default::default()
    };

    for k in [1, 3, 10, 50] {
        for _ in 0..10 {
            let query: Vec<f64> = (0..4).map(|_| rng.gen_range(0.0..100.0)).collect();
            let results = tree.k_nearest_with_options(&query, k, &options).unwrap();
            assert_eq!(results.len(), k);

            let expected = brute_force(&coords, 4, &query);
            for (result, (index, dist)) in results.iter().zip(expected.iter()) {
                assert_eq!(result.index, *index);
                assert_eq!(result.dist, *dist);
            }
        }
    }
}

#[test]
fn self_match_has_distance_zero() {
    let coords = random_coords(100, 3, 19);
    let tree = KdTree::from_points(&coords, 3).unwrap();

    for index in [0usize, 17, 99] {
        let query = tree.store().point(index).to_vec();
        let results = tree.k_nearest(&query, 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].index, index as u32);
        assert_eq!(results[0].dist, 0.0);
    }
}

#[test]
fn exclusion_window_is_honored() {
    let coords = random_coords(150, 2, 23);
    let tree = KdTree::from_points(&coords, 2).unwrap();

    for window in [1u32, 5, 20] {
        let center = 70usize;
        let results = tree.k_nearest_around(center, 10, window).unwrap();
        assert_eq!(results.len(), 10);
        for result in &results {
            assert!(
                (center as u32).abs_diff(result.index) >= window,
                "index {} inside window {window} of {center}",
                result.index
            );
        }
    }

    // window 0 excludes nothing: the item is its own nearest neighbor
    let results = tree.k_nearest_around(70, 1, 0).unwrap();
    assert_eq!(results[0].index, 70);
    assert_eq!(results[0].dist, 0.0);
}

#[test]
fn radius_query_is_complete() {
    let coords = random_coords(300, 3, 29);
    let tree = KdTree::from_points(&coords, 3).unwrap();
    let mut rng = StdRng::seed_from_u64(30);

    for radius in [0.0f64, 5.0, 20.0, 200.0] {
        let query: Vec<f64> = (0..3).map(|_| rng.gen_range(0.0..100.0)).collect();
        let results = tree.within_radius(&query, radius).unwrap();

        let mut expected: Vec<u32> = brute_force(&coords, 3, &query)
            .into_iter()
            .filter(|(_, dist)| *dist <= radius * radius)
            .map(|(i, _)| i)
            .collect();
        expected.sort_unstable();
        assert_eq!(sorted_indices(&results), expected);

        for result in &results {
            assert!(result.dist <= radius * radius);
            assert_eq!(
                result.dist,
                sq_dist(tree.store().point(result.index as usize), &query)
            );
        }
    }
}

#[test]
fn rearrange_does_not_change_results() {
    let coords = random_coords(250, 3, 31);
    let mut trees = Vec::new();
    for rearrange in [true, false] {
        let options = KdTreeOptions {
            rearrange,
            ..Default::default()
        };
        let mut builder = KdTreeBuilder::new_with_options(3, options);
        for point in coords.chunks_exact(3) {
            builder.add(point);
        }
        trees.push(builder.finish().unwrap());
    }
    assert!(trees[0].store().is_rearranged());
    assert!(!trees[1].store().is_rearranged());

    let mut rng = StdRng::seed_from_u64(32);
    let options = QueryOptions {
        sort_results: true,
        ..Default::default()
    };
    for _ in 0..10 {
        let query: Vec<f64> = (0..3).map(|_| rng.gen_range(0.0..100.0)).collect();

        let a = trees[0].k_nearest_with_options(&query, 7, &options).unwrap();
        let b = trees[1].k_nearest_with_options(&query, 7, &options).unwrap();
        assert_eq!(a, b);

        let a = trees[0].within_radius(&query, 15.0).unwrap();
        let b = trees[1].within_radius(&query, 15.0).unwrap();
        assert_eq!(sorted_indices(&a), sorted_indices(&b));
    }
}

#[test]
fn underfilled_results_are_not_errors() {
    let coords = [0.0, 0.0, 1.0, 1.0, 2.0, 2.0];
    let tree = KdTree::from_points(&coords, 2).unwrap();

    // k larger than the point count
    let results = tree.k_nearest(&[0.0, 0.0], 10).unwrap();
    assert_eq!(results.len(), 3);

    // an exclusion window wide enough to reject everything
    let options = QueryOptions {
        exclude: Some((1, 100)),
        ..Default::default()
    };
    let results = tree.k_nearest_with_options(&[0.0, 0.0], 2, &options).unwrap();
    assert!(results.is_empty());
}

#[test]
fn duplicate_points_build_and_query() {
    // every coordinate identical: the degenerate one-sided split collapses
    // to a leaf instead of recursing forever
    let coords: Vec<f64> = vec![3.5; 20 * 2];
    let tree = KdTree::from_points(&coords, 2).unwrap();

    let results = tree.k_nearest(&[3.5, 3.5], 5).unwrap();
    assert_eq!(results.len(), 5);
    for result in &results {
        assert_eq!(result.dist, 0.0);
    }

    let results = tree.within_radius(&[0.0, 0.0], 10.0).unwrap();
    assert_eq!(results.len(), 20);
}

#[test]
fn single_point_tree() {
    let tree = KdTree::from_points(&[4.0, 2.0], 2).unwrap();
    assert!(tree.root().is_leaf());
    let results = tree.k_nearest(&[0.0, 0.0], 3).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].index, 0);
    assert_eq!(results[0].dist, 20.0);
}

#[test]
fn empty_input_fails_construction() {
    let builder: KdTreeBuilder<f64> = KdTreeBuilder::new(3);
    assert!(matches!(
        builder.finish(),
        Err(KdIndexError::EmptyInput)
    ));
}

#[test]
fn invalid_queries_are_rejected() {
    let tree = KdTree::from_points(&[0.0, 0.0, 1.0, 1.0], 2).unwrap();

    assert!(matches!(
        tree.k_nearest(&[0.0, 0.0, 0.0], 1),
        Err(KdIndexError::DimensionMismatch {
            expected: 2,
            got: 3
        })
    ));
    assert!(matches!(
        tree.k_nearest(&[0.0, 0.0], 0),
        Err(KdIndexError::InvalidParameter(_))
    ));
    assert!(matches!(
        tree.within_radius(&[0.0, 0.0], -1.0),
        Err(KdIndexError::InvalidParameter(_))
    ));
    assert!(matches!(
        tree.k_nearest_around(5, 1, 0),
        Err(KdIndexError::InvalidParameter(_))
    ));

    // a failed query leaves the tree usable
    assert_eq!(tree.k_nearest(&[0.0, 0.0], 1).unwrap().len(), 1);
}

#[test]
fn f32_coordinates() {
    let coords: Vec<f32> = vec![0.0, 0.0, 3.0, 4.0, 10.0, 10.0];
    let tree = KdTree::from_points(&coords, 2).unwrap();

    let results = tree.k_nearest(&[0.0f32, 0.0], 2).unwrap();
    let mut indices: Vec<u32> = results.iter().map(|r| r.index).collect();
    indices.sort_unstable();
    assert_eq!(indices, vec![0, 1]);

    let results = tree.within_radius(&[0.0f32, 0.0], 5.0).unwrap();
    assert_eq!(results.len(), 2);
}

#[test]
fn sorted_results_ascend() {
    let coords = random_coords(120, 3, 41);
    let tree = KdTree::from_points(&coords, 3).unwrap();
    let options = QueryOptions {
        sort_results: true,
        ..Default::default()
    };

    let results = tree
        .k_nearest_with_options(&[50.0, 50.0, 50.0], 20, &options)
        .unwrap();
    for pair in results.windows(2) {
        assert!(pair[0].dist <= pair[1].dist);
    }
}
