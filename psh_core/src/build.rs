//! Construction driver (C6).
//!
//! Ties bucket formation (C3), offset jiggling (C4) and the positional-hash
//! fixer (C5) into the retry loop spec.md §4.6 describes: pick a global
//! seed, size φ/H, place every bucket or fail and try a different seed;
//! escalate the table sizes after enough seed failures at one size.
//!
//! Unlike the teacher's CHD construction (`ptr_hash_patched::build`, which
//! evicts and re-places individual keys on a collision), this algorithm
//! never partially backtracks: a single unplaceable bucket discards the
//! whole attempt and a fresh seed (or fresh table size) is drawn. This
//! matches `original_source/src/psh.hpp::create`, not the teacher's CHD.

use crate::bucket::build_and_sort_buckets;
use crate::entry::{Entry, EntryLarge, HashInt};
use crate::error::BuildError;
use crate::jiggle::jiggle_offset;
use crate::point::{dispatch_index_to_point, dispatch_to_index, Point, PosInt};
use crate::util::log_duration;
use bitvec::vec::BitVec;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// The original's 18-entry prime pool (spec.md §3's "fixed table of 18
/// primes"): M0/M1/M2 are each drawn uniformly from it, and it also serves
/// as an escalation floor for `r̄` when a size is rejected by [`bad_m_r`] or
/// exhausts its seed budget.
const PRIME_POOL: [u64; 18] = [
    53, 97, 193, 389, 769, 1543, 3079, 6151, 12289, 24593, 49157, 98317, 196613, 393241, 786433,
    1572869, 3145739, 6291469,
];

/// Global seed attempts tried at one table size before escalating.
const MAX_SEED_TRIES: u32 = 10;

/// Table-size escalation steps tried before giving up entirely.
const MAX_SIZE_RETRIES: u32 = PRIME_POOL.len() as u32;

/// Candidate `k` values the positional-hash fixer may try per slot.
const MAX_K: u64 = 1 << 16;

#[derive(Clone, Copy)]
pub struct BuildParams {
    /// Explicit seed for deterministic reconstruction; `None` draws from
    /// process entropy (spec.md §6 "Seeding").
    pub seed: Option<u64>,
    /// Per-axis width of the domain queries may legally range over; the
    /// positional-hash fixer (C5) sweeps this whole domain.
    pub domain_width: u64,
    pub max_seed_tries: u32,
    pub max_size_retries: u32,
    pub max_k: u64,
}

impl BuildParams {
    pub fn new(domain_width: u64) -> Self {
        Self {
            seed: None,
            domain_width,
            max_seed_tries: MAX_SEED_TRIES,
            max_size_retries: MAX_SIZE_RETRIES,
            max_k: MAX_K,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// The finished offset table, hash table and multipliers a successful
/// construction attempt produces.
pub struct BuildResult<const D: usize, T, P: PosInt, H: HashInt> {
    pub m0: u64,
    pub m1: u64,
    pub m2: u64,
    pub r_bar: u64,
    pub r: u64,
    pub m_bar: u64,
    pub m: u64,
    pub domain_width: u64,
    pub phi: Vec<u64>,
    pub phi_occupied: BitVec,
    pub h_table: Vec<Entry<T, H>>,
    pub h_occupied: BitVec,
    _marker: std::marker::PhantomData<Point<D, P>>,
}

/// `m̄ mod r̄ ∈ {1, r̄ − 1}` is a known-bad ratio (spec.md §9): it makes the
/// bucket-to-slot reduction degenerate along an axis. Resolved to the
/// `r̄ − 1` form per spec.md's stated intent.
fn bad_m_r(m_bar: u64, r_bar: u64) -> bool {
    if r_bar <= 1 {
        return true;
    }
    let rem = m_bar % r_bar;
    rem == 1 || rem == r_bar - 1
}

/// spec.md §3's exact sizing formula: `m̄ = ⌈n^(1/d)⌉`,
/// `r̄ = ⌈(n/d)^(1/d)⌉ − 1`, matching `original_source/src/psh.hpp`'s
/// constructor. `r̄` is clamped to `≥ d` (spec.md §9's resolution for
/// degenerate small-`n` cases); the §4.6 retry loop's `escalate_r_bar`
/// handles any size this starting point proves too tight for.
fn initial_sizes<const D: usize>(n: usize) -> (u64, u64) {
    let n = n.max(1) as f64;
    let d = D as f64;
    let m_bar = n.powf(1.0 / d).ceil() as u64;
    let r_bar_raw = (n / d).powf(1.0 / d).ceil() as i64 - 1;
    let r_bar = (r_bar_raw.max(D as i64) as u64).max(D as u64);
    (r_bar, m_bar.max(D as u64))
}

fn escalate_r_bar<const D: usize>(r_bar: u64, step_index: u32) -> u64 {
    let prime_floor = PRIME_POOL
        .get(step_index as usize)
        .copied()
        .unwrap_or(*PRIME_POOL.last().unwrap());
    (r_bar + D as u64).max(prime_floor)
}

fn h0_index<const D: usize, P: PosInt>(p: &Point<D, P>, m0: u64, m_bar: u64, m: u64) -> u64 {
    dispatch_to_index(&p.scale(m0), m_bar, m)
}

fn phi_index_of<const D: usize, P: PosInt>(p: &Point<D, P>, m1: u64, r_bar: u64, r: u64) -> u64 {
    dispatch_to_index(&p.scale(m1), r_bar, r)
}

/// Reproduces the query path so the fixer (C5) can detect false positives:
/// the bucket a point falls in, the offset φ recorded for that bucket, and
/// the resulting H slot.
fn resolve_slot<const D: usize, P: PosInt>(
    p: &Point<D, P>,
    m0: u64,
    m1: u64,
    r_bar: u64,
    r: u64,
    m_bar: u64,
    m: u64,
    phi: &[u64],
) -> u64 {
    let i = phi_index_of(p, m1, r_bar, r) as usize;
    let offset = phi.get(i).copied().unwrap_or(0);
    (h0_index(p, m0, m_bar, m) + offset) % m.max(1)
}

/// Enumerates every point of the `[0, domain_width)^D` hypercube, in
/// row-major order. Used only by the fixer's exhaustive sweep.
fn domain_iter<const D: usize, P: PosInt>(domain_width: u64) -> impl Iterator<Item = Point<D, P>> + Clone {
    let total = domain_width.pow(D as u32).max(1);
    let cap = total;
    (0..total).map(move |idx| dispatch_index_to_point::<D, P>(idx, domain_width, cap))
}

/// Runs the full construction loop over `points`, returning a placed φ/H
/// pair or the [`BuildError`] that exhausted all retries.
pub fn construct<const D: usize, T: Clone + Default + Sync, P: PosInt, H: HashInt>(
    points: Vec<(Point<D, P>, T)>,
    params: &BuildParams,
) -> Result<BuildResult<D, T, P, H>, BuildError> {
    if points.is_empty() {
        return Err(BuildError::EmptyKeySet);
    }
    let n = points.len();
    let (mut r_bar, mut m_bar) = initial_sizes::<D>(n);

    let seed = params.seed.unwrap_or_else(rand::random::<u64>);
    let mut base_rng = ChaCha8Rng::seed_from_u64(seed);

    for size_attempt in 0..params.max_size_retries.max(1) {
        if bad_m_r(m_bar, r_bar) {
            log::warn!("bad m\u{0304}/r\u{0304} ratio at r\u{0304}={r_bar}, m\u{0304}={m_bar}, escalating");
            r_bar = escalate_r_bar::<D>(r_bar, size_attempt);
            m_bar = (m_bar + 1).max(r_bar);
            continue;
        }

        let r = r_bar.pow(D as u32);
        let m = m_bar.pow(D as u32);
        log::trace!(
            "attempt {size_attempt}: r\u{0304}={r_bar} r={r} m\u{0304}={m_bar} m={m} n={n}"
        );

        for seed_attempt in 0..params.max_seed_tries.max(1) {
            let m0: u64 = PRIME_POOL[base_rng.gen_range(0..PRIME_POOL.len())];
            let mut m1: u64 = PRIME_POOL[base_rng.gen_range(0..PRIME_POOL.len())];
            while m1 == m0 {
                m1 = PRIME_POOL[base_rng.gen_range(0..PRIME_POOL.len())];
            }
            let m2: u64 = PRIME_POOL[base_rng.gen_range(0..PRIME_POOL.len())];

            let buckets = log_duration("bucket sort", || {
                build_and_sort_buckets::<D, T, P, H>(points.clone(), m2, |p| {
                    phi_index_of(p, m1, r_bar, r)
                })
            });

            let mut phi = vec![0u64; r as usize];
            let mut phi_occupied: BitVec = BitVec::repeat(false, r as usize);
            let mut h_table: Vec<EntryLarge<D, T, P, H>> = Vec::with_capacity(m as usize);
            h_table.resize_with(m as usize, EntryLarge::default);
            let mut h_occupied: BitVec = BitVec::repeat(false, m as usize);

            let mut placed_all = true;
            for bucket in &buckets {
                let placement = log_duration("jiggle", || {
                    jiggle_offset(bucket, &h_occupied, m, |p| h0_index(p, m0, m_bar, m))
                });
                match placement {
                    Some(placement) => {
                        phi[bucket.phi_index as usize] = placement.offset;
                        phi_occupied.set(bucket.phi_index as usize, true);
                        for (item, &slot) in bucket.items.iter().zip(placement.slots.iter()) {
                            h_table[slot as usize] = item.clone();
                            h_occupied.set(slot as usize, true);
                        }
                    }
                    None => {
                        log::warn!(
                            "seed attempt {seed_attempt} failed: bucket of size {} unplaceable",
                            bucket.items.len()
                        );
                        placed_all = false;
                        break;
                    }
                }
            }

            if !placed_all {
                continue;
            }

            let fix_result = log_duration("positional-hash fix", || {
                crate::fixer::fix_positional_hashes(
                    &mut h_table,
                    &h_occupied,
                    m2,
                    domain_iter::<D, P>(params.domain_width),
                    |p| resolve_slot(p, m0, m1, r_bar, r, m_bar, m, &phi),
                    params.max_k,
                )
            });

            match fix_result {
                Ok(()) => {
                    let h_table: Vec<Entry<T, H>> =
                        h_table.into_iter().map(|e| e.into_entry()).collect();
                    return Ok(BuildResult {
                        m0,
                        m1,
                        m2,
                        r_bar,
                        r,
                        m_bar,
                        m,
                        domain_width: params.domain_width,
                        phi,
                        phi_occupied,
                        h_table,
                        h_occupied,
                        _marker: std::marker::PhantomData,
                    });
                }
                Err(e) => {
                    log::warn!("positional-hash fixer exhausted at slot {}", e.slot);
                    continue;
                }
            }
        }

        r_bar = escalate_r_bar::<D>(r_bar, size_attempt);
        m_bar = (m_bar + 1).max(r_bar);
    }

    Err(BuildError::RetriesExhausted {
        tries: params.max_size_retries,
    })
}
