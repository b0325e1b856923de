//! # spatial_psh
//!
//! A perfect spatial hash: a collision-free, O(1) lookup from a sparse set
//! of `D`-dimensional integer lattice points to values. Construction finds
//! an offset table φ and hash table H such that every defined point maps
//! to a unique slot of H; queries for points outside the defined set
//! return `None` rather than a wrong value or a panic.
//!
//! ## Example
//!
//! ```rust
//! use spatial_psh::{PerfectSpatialHash, Point};
//!
//! let points: Vec<(Point<2, u32>, &str)> = vec![
//!     (Point::new([0, 0]), "origin"),
//!     (Point::new([3, 1]), "a"),
//!     (Point::new([2, 4]), "b"),
//! ];
//!
//! let map: PerfectSpatialHash<2, &str> = PerfectSpatialHash::new(points, 8).unwrap();
//! assert_eq!(map.get(&Point::new([0, 0])), Some(&"origin"));
//! assert_eq!(map.get(&Point::new([7, 7])), None);
//! ```

pub mod error;

pub use error::PshError;
pub use psh_core::{BuildError, HashInt, PerfectSpatialHash, Point, PosInt};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_round_trip() {
        let points: Vec<(Point<2, u32>, u32)> = vec![
            (Point::new([0, 0]), 1),
            (Point::new([1, 1]), 2),
            (Point::new([3, 2]), 3),
        ];
        let map: PerfectSpatialHash<2, u32, u32, u32> =
            PerfectSpatialHash::with_seed(points, 8, 1).unwrap();
        assert_eq!(map.get(&Point::new([0, 0])), Some(&1));
        assert_eq!(map.get(&Point::new([5, 5])), None);
    }

    #[test]
    fn empty_key_set_rejected() {
        let points: Vec<(Point<2, u32>, u32)> = Vec::new();
        let result = PerfectSpatialHash::<2, u32, u32, u32>::new(points, 8);
        assert!(matches!(result, Err(BuildError::EmptyKeySet)));
        let wrapped: Result<_, PshError> = result.map_err(PshError::from);
        assert!(wrapped.is_err());
    }
}
