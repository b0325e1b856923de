//! Positional-hash fixer (C5).
//!
//! φ and H are built from the defined points alone, but queries accept any
//! point in the domain. An undefined point can still land on an occupied
//! H-slot and, by coincidence, carry the same positional-hash tag as that
//! slot's defining key — a false positive. This module sweeps the whole
//! domain against the built table and bumps a slot's `k` (which changes
//! `hk` without moving the slot) whenever some other point collides with
//! it, until the slot's tag is unambiguous again.
//!
//! Three sweeps (spec.md §4.5): bumping one slot's `k` can only ever
//! remove that slot from some other point's collision set, never add one,
//! so the set of ambiguous slots shrinks monotonically and this converges
//! in a small, bounded number of passes over practical domains. Each sweep
//! and each per-candidate-`k` scan is a domain-wide for-each with no
//! inter-iteration dependency, so both run through
//! [`crate::parallel::parallel_for_each`] rather than a serial loop.

use crate::entry::{position_hash, EntryLarge, HashInt};
use crate::parallel::parallel_for_each;
use crate::point::{Point, PosInt};
use bitvec::vec::BitVec;
use std::sync::atomic::{AtomicU32, Ordering};

const SWEEP_LIMIT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixerExhausted {
    pub slot: u64,
}

/// Runs up to [`SWEEP_LIMIT`] sweeps over `domain`, bumping `k` on any
/// slot that some other domain point still collides with.
///
/// `resolve_slot` must reproduce exactly the query path (§4.1/§4.3): M1
/// reduction to a φ index, offset lookup, M0 reduction plus offset, mod
/// H's slot count. `max_k` bounds how many candidate `k` values get tried
/// per ambiguous slot before giving up on this construction attempt.
pub fn fix_positional_hashes<const D: usize, T: Sync, P: PosInt, H: HashInt>(
    table: &mut [EntryLarge<D, T, P, H>],
    defined_at_slot: &BitVec,
    m2: u64,
    domain: impl Iterator<Item = Point<D, P>> + Clone,
    resolve_slot: impl Fn(&Point<D, P>) -> u64 + Copy + Sync,
    max_k: u64,
) -> Result<(), FixerExhausted> {
    let domain_points: Vec<Point<D, P>> = domain.collect();

    for _sweep in 0..SWEEP_LIMIT {
        let collisions = count_collisions(table, defined_at_slot, m2, &domain_points, resolve_slot);

        let ambiguous: Vec<usize> = collisions
            .iter()
            .enumerate()
            .filter(|(_, c)| c.load(Ordering::Relaxed) > 1)
            .map(|(i, _)| i)
            .collect();

        if ambiguous.is_empty() {
            return Ok(());
        }

        for slot in ambiguous {
            fix_k(table, slot, m2, &domain_points, resolve_slot, max_k)?;
        }
    }

    // One more verification pass; if still ambiguous after SWEEP_LIMIT
    // rounds of per-slot fixing, report the first offending slot.
    let collisions = count_collisions(table, defined_at_slot, m2, &domain_points, resolve_slot);
    if let Some((slot, _)) = collisions
        .iter()
        .enumerate()
        .find(|(_, c)| c.load(Ordering::Relaxed) > 1)
    {
        return Err(FixerExhausted { slot: slot as u64 });
    }
    Ok(())
}

/// Counts, per H slot, how many domain points currently resolve to it and
/// match its positional-hash tag. Run as a [`parallel_for_each`] over the
/// whole domain; each point only ever touches its own slot's counter, so
/// the shared `AtomicU32`s never contend on the same cell across threads
/// for a correctly built table.
fn count_collisions<const D: usize, T: Sync, P: PosInt, H: HashInt>(
    table: &[EntryLarge<D, T, P, H>],
    defined_at_slot: &BitVec,
    m2: u64,
    domain_points: &[Point<D, P>],
    resolve_slot: impl Fn(&Point<D, P>) -> u64 + Sync,
) -> Vec<AtomicU32> {
    let collisions: Vec<AtomicU32> = (0..table.len()).map(|_| AtomicU32::new(0)).collect();
    parallel_for_each(domain_points, |p| {
        let slot = resolve_slot(p) as usize;
        if slot >= table.len() || !defined_at_slot.get(slot).map(|b| *b).unwrap_or(false) {
            return;
        }
        let e = &table[slot];
        if e.hk == position_hash(p, m2, e.k) {
            collisions[slot].fetch_add(1, Ordering::Relaxed);
        }
    });
    collisions
}

/// Searches `k = 2..=max_k` (every slot starts at `k = 1`) for a value
/// under which `slot`'s defining point is the only domain point whose
/// positional hash matches.
fn fix_k<const D: usize, T: Sync, P: PosInt, H: HashInt>(
    table: &mut [EntryLarge<D, T, P, H>],
    slot: usize,
    m2: u64,
    domain_points: &[Point<D, P>],
    resolve_slot: impl Fn(&Point<D, P>) -> u64 + Sync,
    max_k: u64,
) -> Result<(), FixerExhausted> {
    let location = table[slot].location;
    for candidate in 2..=max_k.max(2) {
        let k = H::from_u64(candidate & H::MAX);
        let hk = position_hash(&location, m2, k);
        let count = AtomicU32::new(0);
        parallel_for_each(domain_points, |p| {
            if resolve_slot(p) as usize != slot {
                return;
            }
            if hk == position_hash(p, m2, k) {
                count.fetch_add(1, Ordering::Relaxed);
            }
        });
        if count.load(Ordering::Relaxed) == 1 {
            table[slot].k = k;
            table[slot].hk = hk;
            return Ok(());
        }
    }
    Err(FixerExhausted { slot: slot as u64 })
}
