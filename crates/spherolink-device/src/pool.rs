use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender, TrySendError};
use tracing::{debug, error, warn};

use crate::error::{DeviceError, Result};
use crate::sync::lock;

/// What [`HandlerPool::submit`] does when the queue is full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backpressure {
    /// Discard the oldest queued job. The submitter never blocks.
    #[default]
    DropOldest,
    /// Wait until a worker frees a slot.
    Block,
}

/// Result of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submitted {
    Queued,
    /// Queued after discarding the oldest job.
    DisplacedOldest,
    /// The pool is shutting down; the job was dropped.
    Rejected,
}

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of worker threads draining a bounded FIFO queue.
///
/// Jobs are dequeued exactly once, in submission order. A panicking job is
/// logged and does not take its worker down.
pub struct HandlerPool {
    /// `None` once shut down. Workers exit when every sender is gone and the
    /// queue is empty.
    sender: Mutex<Option<Sender<Job>>>,
    /// Pool-side receiver, used to evict the oldest job under `DropOldest`.
    evict: Receiver<Job>,
    policy: Backpressure,
    dropped: AtomicU64,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl HandlerPool {
    /// Start `workers` threads (at least one) over a queue of `capacity` jobs
    /// (at least one).
    pub fn new(workers: usize, capacity: usize, policy: Backpressure) -> Result<Self> {
        let (sender, receiver) = channel::bounded::<Job>(capacity.max(1));

        let pool = Self {
            sender: Mutex::new(Some(sender)),
            evict: receiver.clone(),
            policy,
            dropped: AtomicU64::new(0),
            workers: Mutex::new(Vec::new()),
        };
        for index in 0..workers.max(1) {
            let jobs = receiver.clone();
            let spawned = thread::Builder::new()
                .name(format!("spherolink-handler-{index}"))
                .spawn(move || worker_loop(jobs));
            match spawned {
                Ok(handle) => lock(&pool.workers).push(handle),
                Err(err) => {
                    pool.shutdown();
                    return Err(DeviceError::Spawn(err));
                }
            }
        }
        Ok(pool)
    }

    /// Queue a job according to the backpressure policy.
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Submitted {
        // Clone out of the lock so a blocked submitter never holds up shutdown.
        let Some(sender) = lock(&self.sender).clone() else {
            return Submitted::Rejected;
        };
        let job: Job = Box::new(job);

        match self.policy {
            Backpressure::Block => match sender.send(job) {
                Ok(()) => Submitted::Queued,
                Err(_) => Submitted::Rejected,
            },
            Backpressure::DropOldest => self.displace(&sender, job),
        }
    }

    fn displace(&self, sender: &Sender<Job>, mut job: Job) -> Submitted {
        let mut outcome = Submitted::Queued;
        loop {
            match sender.try_send(job) {
                Ok(()) => return outcome,
                Err(TrySendError::Disconnected(_)) => return Submitted::Rejected,
                Err(TrySendError::Full(returned)) => {
                    job = returned;
                    // A worker may have taken the oldest job first; retry either way.
                    if self.evict.try_recv().is_ok() {
                        let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        outcome = Submitted::DisplacedOldest;
                        warn!(
                            dropped,
                            capacity = sender.capacity().unwrap_or_default(),
                            "handler queue full, discarding oldest event"
                        );
                    }
                }
            }
        }
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.evict.len()
    }

    /// Jobs discarded by [`Backpressure::DropOldest`] so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Stop accepting jobs, let workers finish what is queued, and join them.
    ///
    /// Safe to call more than once and from a worker thread (that worker is
    /// not joined).
    pub fn shutdown(&self) {
        lock(&self.sender).take();

        let current = thread::current().id();
        let handles: Vec<_> = lock(&self.workers).drain(..).collect();
        for handle in handles {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                error!("handler worker exited abnormally");
            }
        }
    }
}

impl Drop for HandlerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(jobs: Receiver<Job>) {
    for job in jobs.iter() {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("event handler panicked");
        }
    }
    debug!("handler worker stopping");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    use super::*;

    #[test]
    fn runs_jobs_in_submission_order_on_single_worker() {
        let pool = HandlerPool::new(1, 16, Backpressure::Block).unwrap();
        let (tx, rx) = mpsc::channel();
        for value in 0..10 {
            let tx = tx.clone();
            pool.submit(move || tx.send(value).unwrap());
        }
        let received: Vec<i32> = (0..10)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert_eq!(received, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn drop_oldest_discards_under_flood() {
        let pool = HandlerPool::new(1, 2, Backpressure::DropOldest).unwrap();
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        pool.submit(move || {
            started_tx.send(()).unwrap();
            gate_rx.recv().unwrap();
        });
        started_rx.recv_timeout(Duration::from_secs(2)).unwrap();

        let (tx, rx) = mpsc::channel();
        let mut outcomes = Vec::new();
        for value in 0..5 {
            let tx = tx.clone();
            outcomes.push(pool.submit(move || tx.send(value).unwrap()));
        }
        assert_eq!(outcomes[..2], [Submitted::Queued, Submitted::Queued]);
        assert!(outcomes[2..]
            .iter()
            .all(|outcome| *outcome == Submitted::DisplacedOldest));
        assert_eq!(pool.dropped(), 3);

        gate_tx.send(()).unwrap();
        let survivors: Vec<i32> = (0..2)
            .map(|_| rx.recv_timeout(Duration::from_secs(2)).unwrap())
            .collect();
        assert_eq!(survivors, vec![3, 4]);
    }

    #[test]
    fn block_policy_waits_for_space() {
        let pool = Arc::new(HandlerPool::new(1, 1, Backpressure::Block).unwrap());
        let (gate_tx, gate_rx) = mpsc::channel::<()>();
        let (started_tx, started_rx) = mpsc::channel::<()>();
        pool.submit(move || {
            started_tx.send(()).unwrap();
            gate_rx.recv().unwrap();
        });
        started_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        pool.submit(|| {});

        let counter = Arc::new(AtomicUsize::new(0));
        let submitter = {
            let pool = Arc::clone(&pool);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                let outcome = pool.submit(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                });
                assert_eq!(outcome, Submitted::Queued);
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!submitter.is_finished());
        gate_tx.send(()).unwrap();
        submitter.join().unwrap();
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(pool.dropped(), 0);
    }

    #[test]
    fn panicking_job_does_not_kill_worker() {
        let pool = HandlerPool::new(1, 4, Backpressure::DropOldest).unwrap();
        pool.submit(|| panic!("handler failure"));
        let (tx, rx) = mpsc::channel();
        pool.submit(move || tx.send(7).unwrap());
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
    }

    #[test]
    fn shutdown_runs_queued_jobs_first() {
        let pool = HandlerPool::new(1, 8, Backpressure::Block).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                thread::sleep(Duration::from_millis(5));
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 8);
        assert_eq!(pool.queued(), 0);
    }

    #[test]
    fn shutdown_rejects_new_jobs() {
        let pool = HandlerPool::new(2, 4, Backpressure::DropOldest).unwrap();
        pool.shutdown();
        pool.shutdown();
        assert_eq!(pool.submit(|| {}), Submitted::Rejected);
        assert_eq!(pool.queued(), 0);
    }
}
