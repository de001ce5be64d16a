//! Worker-pool execution for bulk operations.
//!
//! The bulk entry points apply one per-key operation to every element
//! of an input range with no cross-element synchronization. Work is
//! distributed grid-stride style: a pool of workers sized to hardware
//! parallelism, each repeatedly claiming the next unprocessed chunk of
//! indices through a shared atomic cursor until the input is exhausted.
//! A claimed chunk runs to completion; there is no cancellation path.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use tracing::trace;

use crate::error::{Error, Result};

/// Indices per claim. Coarse enough to amortize the cursor bump, fine
/// enough to keep the pool balanced on skewed per-key costs.
const CHUNK: usize = 128;

fn pool_size(len: usize) -> usize {
    let hw = thread::available_parallelism().map_or(1, |n| n.get());
    hw.min(len.div_ceil(CHUNK)).max(1)
}

/// Applies `op` to every index in `0..len` across the worker pool.
///
/// Returns [`Error::BulkAborted`] if any worker panicked; results of an
/// aborted operation are undefined and it is not retried.
pub(crate) fn for_each_index<F>(len: usize, op: F) -> Result<()>
where
    F: Fn(usize) + Sync,
{
    if len == 0 {
        return Ok(());
    }
    let workers = pool_size(len);
    if workers == 1 {
        for idx in 0..len {
            op(idx);
        }
        return Ok(());
    }

    trace!(len, workers, "dispatching bulk operation");
    let cursor = AtomicUsize::new(0);
    let aborted = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| loop {
                    let start = cursor.fetch_add(CHUNK, Ordering::Relaxed);
                    if start >= len {
                        break;
                    }
                    for idx in start..len.min(start + CHUNK) {
                        op(idx);
                    }
                })
            })
            .collect();
        handles.into_iter().any(|h| h.join().is_err())
    });

    if aborted {
        Err(Error::BulkAborted)
    } else {
        Ok(())
    }
}

/// Computes `f(idx)` for every index and writes it to `out[idx]`.
///
/// Same pool and claiming discipline as [`for_each_index`]; outputs are
/// written element-wise with no synchronization between elements.
pub(crate) fn map_into<T, F>(out: &mut [T], f: F) -> Result<()>
where
    T: Send,
    F: Fn(usize) -> T + Sync,
{
    let len = out.len();
    if len == 0 {
        return Ok(());
    }
    let workers = pool_size(len);
    if workers == 1 {
        for (idx, slot) in out.iter_mut().enumerate() {
            *slot = f(idx);
        }
        return Ok(());
    }

    trace!(len, workers, "dispatching bulk operation with output");
    let out_base = SendPtr(out.as_mut_ptr());
    let cursor = AtomicUsize::new(0);
    let cursor = &cursor;
    let f = &f;
    let aborted = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(move || {
                    // Rebind the whole wrapper so the closure captures
                    // `SendPtr`, not the raw pointer field.
                    let out_base = out_base;
                    loop {
                        let start = cursor.fetch_add(CHUNK, Ordering::Relaxed);
                        if start >= len {
                            break;
                        }
                        for idx in start..len.min(start + CHUNK) {
                            // Safety: `idx < out.len()` and each index
                            // is claimed by exactly one worker (the
                            // cursor hands out disjoint chunks), so
                            // this write is in-bounds and unaliased.
                            // The scope joins all workers before `out`
                            // is released.
                            unsafe { out_base.0.add(idx).write(f(idx)) };
                        }
                    }
                })
            })
            .collect();
        handles.into_iter().any(|h| h.join().is_err())
    });

    if aborted {
        Err(Error::BulkAborted)
    } else {
        Ok(())
    }
}

/// Raw output pointer handed to workers writing disjoint indices.
struct SendPtr<T>(*mut T);

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

// Safety: the pointer is only dereferenced at indices a worker has
// claimed through the shared cursor, which never hands the same index
// to two workers.
unsafe impl<T: Send> Send for SendPtr<T> {}
unsafe impl<T: Send> Sync for SendPtr<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_index_is_visited_exactly_once() {
        let len = 10_000;
        let hits: Vec<AtomicUsize> = (0..len).map(|_| AtomicUsize::new(0)).collect();
        for_each_index(len, |idx| {
            hits[idx].fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
        assert!(hits.iter().all(|h| h.load(Ordering::Relaxed) == 1));
    }

    #[test]
    fn map_into_writes_positionally() {
        let mut out = vec![0usize; 5000];
        map_into(&mut out, |idx| idx * 2).unwrap();
        for (idx, v) in out.iter().enumerate() {
            assert_eq!(*v, idx * 2);
        }
    }

    #[test]
    fn map_into_handles_non_copy_outputs() {
        let mut out = vec![String::new(); CHUNK * 4 + 17];
        map_into(&mut out, |idx| idx.to_string()).unwrap();
        for (idx, v) in out.iter().enumerate() {
            assert_eq!(v, &idx.to_string());
        }
    }

    #[test]
    fn empty_input_is_a_no_op() {
        for_each_index(0, |_| panic!("must not run")).unwrap();
        let mut out: Vec<bool> = Vec::new();
        map_into(&mut out, |_| panic!("must not run")).unwrap();
    }

    #[test]
    fn worker_panic_surfaces_once_after_join() {
        if thread::available_parallelism().map_or(1, |n| n.get()) < 2 {
            // Serial fallback propagates the panic directly.
            return;
        }
        let err = for_each_index(CHUNK * 8, |idx| {
            if idx == 0 {
                panic!("boom");
            }
        });
        assert!(matches!(err, Err(Error::BulkAborted)));
    }
}
