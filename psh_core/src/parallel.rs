//! Parallel substrate (C8): sort, for-each, and a serial-dispatch /
//! parallel-consume pipeline used by the offset jiggler.
//!
//! Grounded in `ptr_hash_patched`'s construction code: rayon for bulk data
//! parallelism, plus a hand-rolled pipeline where the work generator must
//! stay serial (it hands out consecutive offset candidates) but the
//! per-candidate test fans out across threads.

use rayon::prelude::*;
use std::sync::Mutex;

/// Parallel sort, largest-first by a derived key (C3 bucket ordering).
pub fn parallel_sort_by_key_desc<T, K, F>(items: &mut [T], key: F)
where
    T: Send,
    K: Ord,
    F: Fn(&T) -> K + Sync,
{
    items.par_sort_unstable_by(|a, b| key(b).cmp(&key(a)));
}

/// Parallel for-each over a slice, for bulk independent work (e.g.
/// recomputing positional-hash tags across all of H in C5).
pub fn parallel_for_each<T, F>(items: &[T], f: F)
where
    T: Sync,
    F: Fn(&T) + Sync + Send,
{
    items.par_iter().for_each(f);
}

/// Serial-dispatch / parallel-consume search over a bounded candidate
/// range `0..limit`. `test(candidate)` is evaluated concurrently across
/// candidates in chunks; as soon as one returns `Some(result)`, the search
/// stops dispatching new chunks and returns that result. If no candidate
/// satisfies `test`, returns `None`.
///
/// Matches spec.md §4.4's required pipeline shape: the chunk index is
/// handed out serially (so candidates are tried in a reproducible, bounded
/// order), but each chunk's candidates are tested in parallel, with a
/// shared `found` flag short-circuiting remaining work once a hit lands.
pub fn parallel_pipeline_search<R, F>(limit: u64, chunk_size: u64, test: F) -> Option<R>
where
    R: Send,
    F: Fn(u64) -> Option<R> + Sync,
{
    if limit == 0 || chunk_size == 0 {
        return None;
    }
    let found: Mutex<Option<R>> = Mutex::new(None);
    let mut start = 0u64;
    while start < limit {
        if found.lock().unwrap().is_some() {
            break;
        }
        let end = (start + chunk_size).min(limit);
        let hit = (start..end).into_par_iter().find_map_any(|c| test(c));
        if let Some(result) = hit {
            let mut slot = found.lock().unwrap();
            if slot.is_none() {
                *slot = Some(result);
            }
            break;
        }
        start = end;
    }
    found.into_inner().unwrap()
}
