//! Hash table entry model (C2).

use crate::point::{Point, PosInt};

/// Bound on the positional-hash tag width.
///
/// Implemented for the unsigned widths spec.md §6 allows for `HashInt`. A
/// wider `HashInt` lowers the failure rate of [`crate::build`]'s
/// positional-hash fixer at the cost of a larger per-slot footprint.
pub trait HashInt:
    Copy + Clone + Default + PartialEq + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
    /// The largest representable value, used to mask `u64` working
    /// arithmetic down to `Self`'s width.
    const MAX: u64;
    fn as_u64(self) -> u64;
    fn from_u64(v: u64) -> Self;
    fn one() -> Self;
}

macro_rules! impl_hash_int {
    ($t:ty) => {
        impl HashInt for $t {
            const MAX: u64 = <$t>::MAX as u64;
            #[inline(always)]
            fn as_u64(self) -> u64 {
                self as u64
            }
            #[inline(always)]
            fn from_u64(v: u64) -> Self {
                v as $t
            }
            #[inline(always)]
            fn one() -> Self {
                1
            }
        }
    };
}
impl_hash_int!(u8);
impl_hash_int!(u16);
impl_hash_int!(u32);
impl_hash_int!(u64);

/// `position_hash(P, M2, k) = (P · (k, k², …, k^d)) · M2`, reduced into
/// `H`'s width throughout.
///
/// `k = 0` would degenerate every power to 0 and collapse the hash to a
/// constant; [`crate::fixer::fix_k`] never settles on `k = 0` (it treats 0
/// as an alias of 1 while scanning), so this clamps defensively rather
/// than asserting.
pub fn position_hash<const D: usize, P: PosInt, H: HashInt>(p: &Point<D, P>, m2: u64, k: H) -> H {
    let k64 = k.as_u64().max(1) & H::MAX;
    let mut acc: u64 = 0;
    let mut pow: u64 = k64;
    for i in 0..D {
        let c = p.coords[i].as_u64();
        acc = acc.wrapping_add(c.wrapping_mul(pow)) & H::MAX;
        pow = pow.wrapping_mul(k64) & H::MAX;
    }
    H::from_u64(acc.wrapping_mul(m2) & H::MAX)
}

/// A slot of the finalized hash table H: the user's value plus the
/// positional-hash tag `(k, hk)` that disambiguates defined from undefined
/// keys at query time (spec.md §3).
#[derive(Clone, Copy, Debug)]
pub struct Entry<T, H: HashInt> {
    pub value: T,
    pub k: H,
    pub hk: H,
}

impl<T: Default, H: HashInt> Default for Entry<T, H> {
    fn default() -> Self {
        Self {
            value: T::default(),
            k: H::one(),
            hk: H::one(),
        }
    }
}

impl<T, H: HashInt> Entry<T, H> {
    pub fn rehash<const D: usize, P: PosInt>(&mut self, p: &Point<D, P>, m2: u64, new_k: H) {
        self.k = new_k;
        self.hk = position_hash(p, m2, new_k);
    }

    pub fn equals<const D: usize, P: PosInt>(&self, p: &Point<D, P>, m2: u64) -> bool {
        self.hk == position_hash(p, m2, self.k)
    }
}

/// Construction-only entry that additionally carries the defining key's
/// `location`, so the positional-hash fixer (C5) can recompute `hk` for
/// new values of `k` without a side table. Discarded into a plain [`Entry`]
/// once H is finalized (spec.md §4.2).
#[derive(Clone, Copy, Debug)]
pub struct EntryLarge<const D: usize, T, P: PosInt, H: HashInt> {
    pub location: Point<D, P>,
    pub value: T,
    pub k: H,
    pub hk: H,
}

impl<const D: usize, T: Default, P: PosInt, H: HashInt> Default for EntryLarge<D, T, P, H> {
    fn default() -> Self {
        Self {
            location: Point::zero(),
            value: T::default(),
            k: H::one(),
            hk: H::one(),
        }
    }
}

impl<const D: usize, T, P: PosInt, H: HashInt> EntryLarge<D, T, P, H> {
    pub fn new(location: Point<D, P>, value: T, m2: u64) -> Self {
        let hk = position_hash(&location, m2, H::one());
        Self {
            location,
            value,
            k: H::one(),
            hk,
        }
    }

    pub fn into_entry(self) -> Entry<T, H> {
        Entry {
            value: self.value,
            k: self.k,
            hk: self.hk,
        }
    }
}
