//! Query / incremental-update API (C7).

use crate::build::{construct, BuildParams, BuildResult};
use crate::entry::{position_hash, Entry, HashInt};
use crate::error::BuildError;
use crate::point::{dispatch_to_index, Point, PosInt};
use bitvec::vec::BitVec;

/// A constructed perfect spatial hash over a fixed, caller-declared
/// `[0, domain_width)^D` lattice domain.
///
/// Queries (`get`) are O(1) and total over the whole domain: points never
/// inserted return `None` rather than panicking or returning garbage
/// (spec.md §7). `add` is the narrow in-place update path — it can only
/// overwrite a value for a key that already occupies a slot, never seat a
/// brand-new key — anything else requires `rebuild`.
pub struct PerfectSpatialHash<const D: usize, T, P: PosInt = u32, H: HashInt = u32> {
    m0: u64,
    m1: u64,
    m2: u64,
    r_bar: u64,
    r: u64,
    m_bar: u64,
    m: u64,
    domain_width: u64,
    phi: Vec<u64>,
    #[allow(dead_code)]
    phi_occupied: BitVec,
    h_table: Vec<Entry<T, H>>,
    h_occupied: BitVec,
    /// Retained verbatim so `rebuild` can re-run construction over the
    /// current contents plus whatever the caller adds; `Entry` alone
    /// doesn't carry a key's location once H is finalized.
    points: Vec<(Point<D, P>, T)>,
    params: BuildParams,
}

impl<const D: usize, T: Clone + Default + PartialEq + Sync, P: PosInt, H: HashInt>
    PerfectSpatialHash<D, T, P, H>
{
    /// Builds a new map from `points` over `[0, domain_width)^D`, seeding
    /// construction from process entropy.
    pub fn new(points: Vec<(Point<D, P>, T)>, domain_width: u64) -> Result<Self, BuildError> {
        Self::with_params(points, BuildParams::new(domain_width))
    }

    /// Builds a new map with an explicit seed, for bit-for-bit
    /// reproducible construction (spec.md §6).
    pub fn with_seed(
        points: Vec<(Point<D, P>, T)>,
        domain_width: u64,
        seed: u64,
    ) -> Result<Self, BuildError> {
        Self::with_params(points, BuildParams::new(domain_width).with_seed(seed))
    }

    fn with_params(points: Vec<(Point<D, P>, T)>, params: BuildParams) -> Result<Self, BuildError> {
        let result: BuildResult<D, T, P, H> = construct(points.clone(), &params)?;
        Ok(Self::from_build(points, params, result))
    }

    fn from_build(
        points: Vec<(Point<D, P>, T)>,
        params: BuildParams,
        result: BuildResult<D, T, P, H>,
    ) -> Self {
        Self {
            m0: result.m0,
            m1: result.m1,
            m2: result.m2,
            r_bar: result.r_bar,
            r: result.r,
            m_bar: result.m_bar,
            m: result.m,
            domain_width: result.domain_width,
            phi: result.phi,
            phi_occupied: result.phi_occupied,
            h_table: result.h_table,
            h_occupied: result.h_occupied,
            points,
            params,
        }
    }

    fn slot_of(&self, p: &Point<D, P>) -> usize {
        let i = dispatch_to_index(&p.scale(self.m1), self.r_bar, self.r) as usize;
        let offset = self.phi.get(i).copied().unwrap_or(0);
        let h0 = dispatch_to_index(&p.scale(self.m0), self.m_bar, self.m);
        ((h0 + offset) % self.m.max(1)) as usize
    }

    /// O(1) lookup. `None` for any point not in the originally constructed
    /// set, including points that collide with an occupied slot but carry
    /// a mismatched positional-hash tag.
    pub fn get(&self, p: &Point<D, P>) -> Option<&T> {
        let slot = self.slot_of(p);
        if !*self.h_occupied.get(slot)? {
            return None;
        }
        let entry = self.h_table.get(slot)?;
        if entry.hk == position_hash(p, self.m2, entry.k) {
            Some(&entry.value)
        } else {
            None
        }
    }

    /// Attempts to write `value` at `p`'s slot in place. Succeeds only if
    /// `p` is already a defined key (spec.md §4.7); returns `false`
    /// otherwise without mutating anything. Use [`Self::rebuild`] to add a
    /// point that was not already present.
    pub fn add(&mut self, p: &Point<D, P>, value: T) -> bool {
        let slot = self.slot_of(p);
        let occupied = self.h_occupied.get(slot).map(|b| *b).unwrap_or(false);
        if !occupied {
            return false;
        }
        let matches = {
            let entry = &self.h_table[slot];
            entry.hk == position_hash(p, self.m2, entry.k)
        };
        if !matches {
            return false;
        }
        self.h_table[slot].value = value.clone();
        if let Some(existing) = self.points.iter_mut().find(|(loc, _)| *loc == *p) {
            existing.1 = value;
        }
        true
    }

    /// Re-runs full construction over the current contents plus
    /// `additional`, replacing every table in place. This is the only path
    /// that can seat a brand-new key (spec.md §4.7/§4.8).
    pub fn rebuild(&mut self, additional: Vec<(Point<D, P>, T)>) -> Result<(), BuildError> {
        let mut points = self.points.clone();
        points.extend(additional);
        let result: BuildResult<D, T, P, H> = construct(points.clone(), &self.params)?;
        let rebuilt = Self::from_build(points, self.params, result);
        *self = rebuilt;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn domain_width(&self) -> u64 {
        self.domain_width
    }

    /// Manual `size_of` accounting over φ, H and their occupancy bitmaps,
    /// plus the retained point list, matching
    /// `original_source/src/psh.hpp::memory_size`'s own hand-summed
    /// footprint rather than a derive-based accounting crate (spec.md §6:
    /// `T` needs only `Default + PartialEq`, no further trait bound).
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.phi.capacity() * std::mem::size_of::<u64>()
            + self.phi_occupied.capacity() / 8
            + self.h_table.capacity() * std::mem::size_of::<Entry<T, H>>()
            + self.h_occupied.capacity() / 8
            + self.points.capacity() * std::mem::size_of::<(Point<D, P>, T)>()
    }
}
