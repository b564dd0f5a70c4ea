use crate::error::{KdIndexError, Result};
use crate::r#type::Coord;

/// Owns the flat row-major coordinate buffer and the permutation mapping
/// tree slots back to original item indices.
///
/// The permutation starts as the identity and is reordered in place while the
/// tree is built; it is a bijection on `[0, num_items)` at all times. When
/// the tree is built with rearranging enabled, a second coordinate buffer in
/// permutation order is kept so leaf scans read memory sequentially.
#[derive(Debug, Clone, PartialEq)]
pub struct PointStore<N: Coord> {
    coords: Vec<N>,
    num_items: usize,
    dim: usize,
    perm: Vec<u32>,
    rearranged: Option<Vec<N>>,
}

impl<N: Coord> PointStore<N> {
    pub(crate) fn try_new(coords: Vec<N>, dim: usize) -> Result<Self> {
        debug_assert!(dim > 0);
        debug_assert_eq!(coords.len() % dim, 0);

        let num_items = coords.len() / dim;
        if num_items == 0 {
            return Err(KdIndexError::EmptyInput);
        }
        assert!(num_items <= u32::MAX as usize);

        Ok(Self {
            coords,
            num_items,
            dim,
            perm: (0..num_items as u32).collect(),
            rearranged: None,
        })
    }

    /// The number of points in this store.
    pub fn num_items(&self) -> usize {
        self.num_items
    }

    /// The dimension of every point in this store.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The coordinates of the item with original index `index`.
    pub fn point(&self, index: usize) -> &[N] {
        &self.coords[index * self.dim..(index + 1) * self.dim]
    }

    /// Original item index stored at tree slot `slot`.
    #[inline]
    pub(crate) fn id(&self, slot: usize) -> u32 {
        self.perm[slot]
    }

    /// Coordinate on axis `axis` of the point at tree slot `slot`, read
    /// through the permutation.
    #[inline]
    pub(crate) fn coord_at_slot(&self, slot: usize, axis: usize) -> N {
        self.coords[self.perm[slot] as usize * self.dim + axis]
    }

    /// Coordinate row backing tree slot `slot` for leaf scans: the
    /// rearranged buffer when present, the original buffer through the
    /// permutation otherwise.
    #[inline]
    pub(crate) fn slot_row(&self, slot: usize) -> &[N] {
        match &self.rearranged {
            Some(buf) => &buf[slot * self.dim..(slot + 1) * self.dim],
            None => self.point(self.perm[slot] as usize),
        }
    }

    #[inline]
    pub(crate) fn swap_slots(&mut self, a: usize, b: usize) {
        self.perm.swap(a, b);
    }

    /// Copy every point into permutation order. Called once, after the
    /// build has finished reordering the permutation.
    pub(crate) fn rearrange(&mut self) {
        let mut buf = Vec::with_capacity(self.coords.len());
        for &id in &self.perm {
            let id = id as usize;
            buf.extend_from_slice(&self.coords[id * self.dim..(id + 1) * self.dim]);
        }
        self.rearranged = Some(buf);
    }

    /// `true` when leaf scans read from the permuted coordinate copy.
    pub fn is_rearranged(&self) -> bool {
        self.rearranged.is_some()
    }
}
