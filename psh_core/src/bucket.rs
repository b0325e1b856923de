//! Bucket construction and ordering (C3).
//!
//! Every defined point is assigned to a bucket by `point_to_index` over φ's
//! shape (`M1 * location` in the original, i.e. the same reduction φ itself
//! uses). Buckets are then sorted largest-first: placing the most
//! contended buckets before the offset jiggler runs keeps later, smaller
//! buckets free to slot into whatever room is left, the same ordering
//! heuristic `original_source/src/psh.hpp::create_buckets` and the
//! teacher's CHD bucket placement both rely on.

use crate::entry::{EntryLarge, HashInt};
use crate::parallel::parallel_sort_by_key_desc;
use crate::point::{Point, PosInt};

/// One φ-slot's worth of colliding points, carried through construction
/// until an offset is found that places every member without collision.
pub struct Bucket<const D: usize, T, P: PosInt, H: HashInt> {
    pub phi_index: u64,
    pub items: Vec<EntryLarge<D, T, P, H>>,
}

/// Groups `points` (with their values) into buckets keyed by
/// `point_to_index(location, phi_width, phi_cap)`, then sorts the bucket
/// list largest-first.
///
/// `to_phi_index` is supplied by the caller so the general and the
/// dimension-specialized `point_to_index` variants can both be used
/// without this module depending on `D` directly.
pub fn build_and_sort_buckets<const D: usize, T, P: PosInt, H: HashInt>(
    points: Vec<(Point<D, P>, T)>,
    m2: u64,
    to_phi_index: impl Fn(&Point<D, P>) -> u64,
) -> Vec<Bucket<D, T, P, H>> {
    use std::collections::HashMap;

    let mut grouped: HashMap<u64, Vec<EntryLarge<D, T, P, H>>> = HashMap::new();
    for (location, value) in points {
        let phi_index = to_phi_index(&location);
        grouped
            .entry(phi_index)
            .or_default()
            .push(EntryLarge::new(location, value, m2));
    }

    let mut buckets: Vec<Bucket<D, T, P, H>> = grouped
        .into_iter()
        .map(|(phi_index, items)| Bucket { phi_index, items })
        .collect();

    parallel_sort_by_key_desc(&mut buckets, |b| b.items.len());
    buckets
}
