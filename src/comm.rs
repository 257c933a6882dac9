//! Row-partitioned execution across ranks joined by an all-reduce-sum.
//!
//! Every rank owns a contiguous block of state rows. After each right-hand-side
//! evaluation the contributions of all ranks are summed so that every rank
//! holds the full vector again.

use std::{
    ops::Range,
    sync::{Arc, Barrier, Mutex},
    thread,
};

use crate::{Error, Float};

/// Collective communication between the ranks of a group.
pub trait Communicator: Send + Sync {
    /// Rank of the caller in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the group.
    fn size(&self) -> usize;

    /// Replaces `buf` on every rank by the element-wise sum over all ranks.
    ///
    /// Collective: every rank must call it with a buffer of the same length.
    fn all_reduce_sum(&self, buf: &mut [Float]) -> Result<(), Error>;
}

/// Rows `[rank·n/size, (rank+1)·n/size)` owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub rank: usize,
    pub size: usize,
}

impl Partition {
    pub fn new(rank: usize, size: usize) -> Self {
        Self { rank, size: size.max(1) }
    }

    pub fn of(comm: &dyn Communicator) -> Self {
        Self::new(comm.rank(), comm.size())
    }

    /// Row range of this rank for an `ndim`-dimensional system.
    pub fn rows(&self, ndim: usize) -> Range<usize> {
        let start = self.rank * ndim / self.size;
        let end = (self.rank + 1) * ndim / self.size;
        start..end
    }
}

/// Single-rank group. All-reduce is a no-op.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialComm;

impl Communicator for SerialComm {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn all_reduce_sum(&self, _buf: &mut [Float]) -> Result<(), Error> {
        Ok(())
    }
}

struct Shared {
    acc: Mutex<Vec<Float>>,
    barrier: Barrier,
}

/// In-process group where every rank runs on its own thread.
pub struct ThreadComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl ThreadComm {
    /// Creates the `size` members of one group, rank `k` at index `k`.
    pub fn group(size: usize) -> Vec<ThreadComm> {
        let size = size.max(1);
        let shared = Arc::new(Shared {
            acc: Mutex::new(Vec::new()),
            barrier: Barrier::new(size),
        });
        (0..size)
            .map(|rank| ThreadComm { rank, size, shared: Arc::clone(&shared) })
            .collect()
    }

    /// Runs `task` once per rank on scoped threads and returns the results in
    /// rank order.
    pub fn run<R, F>(size: usize, task: F) -> Vec<R>
    where
        R: Send,
        F: Fn(Arc<dyn Communicator>) -> R + Sync,
    {
        let task = &task;
        thread::scope(|s| {
            let handles: Vec<_> = ThreadComm::group(size)
                .into_iter()
                .map(|comm| {
                    let comm: Arc<dyn Communicator> = Arc::new(comm);
                    s.spawn(move || task(comm))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| match h.join() {
                    Ok(r) => r,
                    Err(payload) => std::panic::resume_unwind(payload),
                })
                .collect()
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Float>>, Error> {
        self.shared
            .acc
            .lock()
            .map_err(|_| Error::Comm(format!("rank {} found a poisoned accumulator", self.rank)))
    }
}

impl Communicator for ThreadComm {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn all_reduce_sum(&self, buf: &mut [Float]) -> Result<(), Error> {
        if self.size == 1 {
            return Ok(());
        }
        let barrier = &self.shared.barrier;

        // Everybody has finished reading the previous result
        let leader = barrier.wait().is_leader();
        let reset = if leader {
            self.lock().map(|mut acc| {
                acc.clear();
                acc.resize(buf.len(), 0.0);
            })
        } else {
            Ok(())
        };
        barrier.wait();

        let added = reset.and_then(|_| {
            let mut acc = self.lock()?;
            if acc.len() != buf.len() {
                return Err(Error::Comm(format!(
                    "rank {} reduces {} values, group expects {}",
                    self.rank,
                    buf.len(),
                    acc.len()
                )));
            }
            acc.iter_mut().zip(buf.iter()).for_each(|(a, b)| *a += b);
            Ok(())
        });
        barrier.wait();

        added?;
        let acc = self.lock()?;
        if acc.len() != buf.len() {
            return Err(Error::Comm(format!("rank {} missed the reduction", self.rank)));
        }
        buf.copy_from_slice(&acc);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_covers_all_rows() {
        let ndim = 7;
        let mut covered = Vec::new();
        for rank in 0..3 {
            covered.extend(Partition::new(rank, 3).rows(ndim));
        }
        assert_eq!(covered, (0..ndim).collect::<Vec<_>>());
        assert_eq!(Partition::new(0, 1).rows(ndim), 0..ndim);
    }

    #[test]
    fn thread_group_sums_contributions() {
        let results = ThreadComm::run(3, |comm| {
            let mut out = Vec::new();
            for round in 0..4 {
                let mut buf = vec![0.0; 3];
                buf[comm.rank()] = (comm.rank() + 1 + round) as Float;
                comm.all_reduce_sum(&mut buf).unwrap();
                out.push(buf);
            }
            out
        });
        for per_rank in &results {
            for (round, buf) in per_rank.iter().enumerate() {
                let r = round as Float;
                assert_eq!(buf, &vec![1.0 + r, 2.0 + r, 3.0 + r]);
            }
        }
    }
}
