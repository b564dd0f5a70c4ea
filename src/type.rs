use std::fmt::Debug;

use num_traits::Float;

/// A trait for scalar types that can be used as point coordinates.
///
/// This trait is sealed and cannot be implemented for external types. The
/// tree arithmetic (mean-based splits, squared distances, infinite initial
/// ball sizes) assumes IEEE floating point.
pub trait Coord: private::Sealed + Float + Debug + Send + Sync + 'static {}

impl Coord for f32 {}
impl Coord for f64 {}

// https://rust-lang.github.io/api-guidelines/future-proofing.html#sealed-traits-protect-against-downstream-implementations-c-sealed
mod private {
    pub trait Sealed {}

    impl Sealed for f32 {}
    impl Sealed for f64 {}
}
