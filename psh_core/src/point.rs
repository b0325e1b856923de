//! Lattice point & index arithmetic (C1).
//!
//! A [`Point`] is a fixed-size vector of `D` unsigned integer coordinates.
//! All componentwise arithmetic wraps in the coordinate width: this is
//! intentional and load-bearing — the wrapping supplies the mixing that
//! the composed hash in [`crate::map`] depends on. Do not switch any of
//! this to saturating or checked arithmetic.

use std::fmt;

/// Bound on the coordinate width a [`Point`] may use.
///
/// Implemented for the unsigned integer widths spec.md §6 allows for
/// `PosInt` (8/16/32/64-bit).
pub trait PosInt:
    Copy + Clone + Default + PartialEq + Eq + std::hash::Hash + fmt::Debug + Send + Sync + 'static
{
    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: u64) -> Self;
    fn as_u64(self) -> u64;
    fn from_u64(v: u64) -> Self;
}

macro_rules! impl_pos_int {
    ($t:ty) => {
        impl PosInt for $t {
            #[inline(always)]
            fn wrapping_add(self, rhs: Self) -> Self {
                <$t>::wrapping_add(self, rhs)
            }
            #[inline(always)]
            fn wrapping_mul(self, rhs: u64) -> Self {
                <$t>::wrapping_mul(self, rhs as $t)
            }
            #[inline(always)]
            fn as_u64(self) -> u64 {
                self as u64
            }
            #[inline(always)]
            fn from_u64(v: u64) -> Self {
                v as $t
            }
        }
    };
}
impl_pos_int!(u8);
impl_pos_int!(u16);
impl_pos_int!(u32);
impl_pos_int!(u64);

/// A `D`-dimensional integer lattice point.
///
/// Defaults to `u32` coordinates; use a narrower [`PosInt`] (`u8`/`u16`)
/// when the domain is small enough, for a tighter φ/H footprint.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Point<const D: usize, P: PosInt = u32> {
    pub coords: [P; D],
}

impl<const D: usize, P: PosInt> Point<D, P> {
    pub fn new(coords: [P; D]) -> Self {
        Self { coords }
    }

    pub fn zero() -> Self {
        Self {
            coords: [P::default(); D],
        }
    }

    /// Componentwise addition, wrapping in `P`.
    pub fn add(&self, rhs: &Self) -> Self {
        let mut out = *self;
        for i in 0..D {
            out.coords[i] = out.coords[i].wrapping_add(rhs.coords[i]);
        }
        out
    }

    /// Scalar multiplication, wrapping in `P`.
    pub fn scale(&self, scalar: u64) -> Self {
        let mut out = *self;
        for i in 0..D {
            out.coords[i] = out.coords[i].wrapping_mul(scalar);
        }
        out
    }
}

/// `point_to_index(P, w, cap) = (Σ_i wⁱ · c_i) mod cap`.
///
/// Accumulates in `u128` so the sum cannot overflow before the final
/// reduction (spec.md §9 "Numeric subtleties": "the naive form can
/// overflow before the modulo").
pub fn point_to_index<const D: usize, P: PosInt>(p: &Point<D, P>, width: u64, cap: u64) -> u64 {
    debug_assert!(cap > 0);
    let mut acc: u128 = 0;
    let mut w_pow: u128 = 1;
    for i in 0..D {
        acc += w_pow * p.coords[i].as_u64() as u128;
        w_pow *= width as u128;
    }
    (acc % cap as u128) as u64
}

/// Inverse of [`point_to_index`] when `cap == width^D` (always true for the
/// φ and H tables, whose sizes are exactly `r̄^d` and `m̄^d`). Axis `i`
/// recovers the digit carrying weight `w^i`, matching `point_to_index`'s
/// weighting, so the pair round-trips.
pub fn index_to_point<const D: usize, P: PosInt>(index: u64, width: u64, cap: u64) -> Point<D, P> {
    let mut index = if cap == 0 { 0 } else { index % cap };
    let mut coords = [P::default(); D];
    for c in coords.iter_mut() {
        *c = P::from_u64(if width == 0 { 0 } else { index % width });
        if width != 0 {
            index /= width;
        }
    }
    Point::new(coords)
}

/// Specialized 2-D form of [`point_to_index`] (spec.md §4.1). Semantically
/// identical to the general form (unlike the original C++ source, whose d=2
/// and d=3 specializations used a different axis-weight order than the
/// general template — see DESIGN.md).
pub fn point_to_index_2<P: PosInt>(p: &Point<2, P>, width: u64, cap: u64) -> u64 {
    let c0 = p.coords[0].as_u64() as u128;
    let c1 = p.coords[1].as_u64() as u128;
    ((c0 + width as u128 * c1) % cap as u128) as u64
}

pub fn index_to_point_2<P: PosInt>(index: u64, width: u64, cap: u64) -> Point<2, P> {
    let index = if cap == 0 { 0 } else { index % cap };
    let (c0, c1) = if width == 0 {
        (0, 0)
    } else {
        (index % width, index / width)
    };
    Point::new([P::from_u64(c0), P::from_u64(c1)])
}

/// Specialized 3-D form of [`point_to_index`] (spec.md §4.1).
pub fn point_to_index_3<P: PosInt>(p: &Point<3, P>, width: u64, cap: u64) -> u64 {
    let c0 = p.coords[0].as_u64() as u128;
    let c1 = p.coords[1].as_u64() as u128;
    let c2 = p.coords[2].as_u64() as u128;
    let w = width as u128;
    ((c0 + w * c1 + w * w * c2) % cap as u128) as u64
}

pub fn index_to_point_3<P: PosInt>(index: u64, width: u64, cap: u64) -> Point<3, P> {
    let mut index = if cap == 0 { 0 } else { index % cap };
    let (c0, c1, c2) = if width == 0 {
        (0, 0, 0)
    } else {
        let c0 = index % width;
        index /= width;
        let c1 = index % width;
        index /= width;
        let c2 = index % width;
        (c0, c1, c2)
    };
    Point::new([P::from_u64(c0), P::from_u64(c1), P::from_u64(c2)])
}

/// Dispatches to [`point_to_index_2`]/[`point_to_index_3`] when `D` is 2 or
/// 3, falling back to the general [`point_to_index`] otherwise. Every call
/// site in `build`/`map` goes through this rather than the general form
/// directly, so the specializations actually earn their keep.
///
/// Uses `.get()` rather than literal indexing: a literal `p.coords[2]`
/// would fail to compile once monomorphized with `D = 2` (rustc's
/// `unconditional_panic` lint is deny-by-default and fires on a
/// statically out-of-bounds index, regardless of which runtime branch is
/// live).
pub fn dispatch_to_index<const D: usize, P: PosInt>(p: &Point<D, P>, width: u64, cap: u64) -> u64 {
    if D == 2 {
        let p2 = Point::<2, P>::new([
            p.coords.first().copied().unwrap_or_default(),
            p.coords.get(1).copied().unwrap_or_default(),
        ]);
        point_to_index_2(&p2, width, cap)
    } else if D == 3 {
        let p3 = Point::<3, P>::new([
            p.coords.first().copied().unwrap_or_default(),
            p.coords.get(1).copied().unwrap_or_default(),
            p.coords.get(2).copied().unwrap_or_default(),
        ]);
        point_to_index_3(&p3, width, cap)
    } else {
        point_to_index(p, width, cap)
    }
}

/// Inverse of [`dispatch_to_index`]; see its doc for why `D` is branched on
/// at runtime instead of specialized at compile time.
pub fn dispatch_index_to_point<const D: usize, P: PosInt>(
    index: u64,
    width: u64,
    cap: u64,
) -> Point<D, P> {
    if D == 2 {
        let p2 = index_to_point_2::<P>(index, width, cap);
        let mut coords = [P::default(); D];
        if let Some(c) = coords.get_mut(0) {
            *c = p2.coords[0];
        }
        if let Some(c) = coords.get_mut(1) {
            *c = p2.coords[1];
        }
        Point::new(coords)
    } else if D == 3 {
        let p3 = index_to_point_3::<P>(index, width, cap);
        let mut coords = [P::default(); D];
        if let Some(c) = coords.get_mut(0) {
            *c = p3.coords[0];
        }
        if let Some(c) = coords.get_mut(1) {
            *c = p3.coords[1];
        }
        if let Some(c) = coords.get_mut(2) {
            *c = p3.coords[2];
        }
        Point::new(coords)
    } else {
        index_to_point(index, width, cap)
    }
}
