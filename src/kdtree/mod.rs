//! An implementation of an immutable k-d tree over fixed-dimension points.
//!
//! Build a [`KdTree`] with [`KdTreeBuilder`], then query it with
//! [`KdTree::k_nearest`] and [`KdTree::within_radius`].

#![warn(missing_docs)]

mod builder;
mod index;
mod node;
mod results;
mod search;
mod store;

pub use builder::{KdTreeBuilder, KdTreeOptions};
pub use index::KdTree;
pub use node::{Aabb, Extent, Node};
pub use results::Neighbor;
pub use search::QueryOptions;
pub use store::PointStore;

#[cfg(test)]
mod test;
