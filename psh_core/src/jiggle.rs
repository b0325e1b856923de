//! Offset jiggler (C4).
//!
//! For a bucket of colliding points, searches for a single scalar offset
//! `o` such that adding `o` to every member's base hash (`h0`, reduced
//! into H's shape) lands each member on a distinct, still-vacant slot of
//! H. The winning offset becomes φ's entry for this bucket; every member
//! is then written into H at its resolved slot.

use crate::bucket::Bucket;
use crate::entry::HashInt;
use crate::parallel::parallel_pipeline_search;
use crate::point::{Point, PosInt};

/// Candidate offsets are tried in chunks of this size per pipeline round
/// (spec.md §4.4's "parallel pipeline" requirement — a serial dispatch of
/// chunk indices, each chunk searched in parallel).
const JIGGLE_CHUNK: u64 = 256;

/// Resolved placement for one bucket: the offset that worked, and the
/// final H-slot for each of the bucket's members (indices line up
/// positionally with `bucket.items`).
pub struct Placement {
    pub offset: u64,
    pub slots: Vec<u64>,
}

/// Searches `0..m_cap` for an offset that places every item of `bucket`
/// into a distinct slot of H that is not already marked occupied in
/// `occupied`. `h0_index` maps a bucket member to its base H-index (prior
/// to adding the offset); `m_cap` is H's total slot count (the modulus the
/// offset addition wraps into).
///
/// Returns `None` if no offset in `0..m_cap` works — the caller then
/// aborts the whole construction attempt and retries with fresh seeds
/// (spec.md §4.4/§4.6: no partial backtracking, no eviction).
pub fn jiggle_offset<const D: usize, T, P: PosInt, H: HashInt>(
    bucket: &Bucket<D, T, P, H>,
    occupied: &bitvec::vec::BitVec,
    m_cap: u64,
    h0_index: impl Fn(&Point<D, P>) -> u64 + Sync,
) -> Option<Placement> {
    if bucket.items.is_empty() {
        return Some(Placement {
            offset: 0,
            slots: Vec::new(),
        });
    }
    let bases: Vec<u64> = bucket
        .items
        .iter()
        .map(|e| h0_index(&e.location))
        .collect();

    parallel_pipeline_search(m_cap, JIGGLE_CHUNK, |offset| {
        let mut slots = Vec::with_capacity(bases.len());
        let mut seen = std::collections::HashSet::with_capacity(bases.len());
        for &base in &bases {
            let slot = (base + offset) % m_cap.max(1);
            if occupied.get(slot as usize).map(|b| *b).unwrap_or(false) {
                return None;
            }
            if !seen.insert(slot) {
                return None;
            }
            slots.push(slot);
        }
        Some(Placement { offset, slots })
    })
}
