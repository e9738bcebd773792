//! Background work engine: runs jobs on a fixed pool of worker threads and
//! hands their results back to the owning thread as completion callbacks.
//!
//! Jobs execute concurrently on the pool. Completions never run on a worker:
//! they are queued and only invoked when the owner calls
//! [`drain`](WorkEngine::drain), with exclusive access to the owner's state.
//! A panicking job is caught and its completion receives
//! [`JobError::Panicked`]; the worker keeps serving the queue.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, trace};

use crate::error::{JobError, StreamError};

type Job = Box<dyn FnOnce() + Send>;
type Completion<C> = Box<dyn FnOnce(&mut C) + Send>;

/// Worker count used when none is configured: all cores but two (render
/// and main thread), and at least one.
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(2).max(1)
}

/// Thread pool whose completions are applied to a context `C` owned by the
/// caller.
pub struct WorkEngine<C> {
    /// Job queue feeding the workers. `None` once shut down.
    job_sender: Option<Sender<Job>>,
    completion_sender: Sender<Completion<C>>,
    completion_receiver: Receiver<Completion<C>>,
    worker_handles: Vec<JoinHandle<()>>,
    /// Jobs submitted whose completion has not been applied yet.
    pending: AtomicUsize,
    submitted: AtomicU64,
}

impl<C: 'static> WorkEngine<C> {
    /// Spawn `worker_count` workers (at least one). Workers are named
    /// `vista-worker-N`.
    pub fn new(worker_count: usize) -> Result<Self, StreamError> {
        let worker_count = worker_count.max(1);
        let (job_tx, job_rx) = crossbeam_channel::unbounded::<Job>();
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();

        let mut handles = Vec::with_capacity(worker_count);
        for index in 0..worker_count {
            let rx = job_rx.clone();
            let handle = std::thread::Builder::new()
                .name(format!("vista-worker-{index}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                })
                .map_err(StreamError::WorkerSpawn)?;
            handles.push(handle);
        }

        debug!(workers = worker_count, "work engine started");

        Ok(Self {
            job_sender: Some(job_tx),
            completion_sender: completion_tx,
            completion_receiver: completion_rx,
            worker_handles: handles,
            pending: AtomicUsize::new(0),
            submitted: AtomicU64::new(0),
        })
    }

    /// Queue `job` for execution. `completion` receives the job's result (or
    /// the reason there is none) during a later [`drain`](Self::drain).
    ///
    /// Never runs `completion` synchronously. Fails with
    /// [`JobError::Disconnected`] after [`shutdown`](Self::shutdown).
    pub fn submit<T, J, F>(&self, job: J, completion: F) -> Result<(), JobError>
    where
        T: Send + 'static,
        J: FnOnce() -> T + Send + 'static,
        F: FnOnce(&mut C, Result<T, JobError>) + Send + 'static,
    {
        let sender = self.job_sender.as_ref().ok_or(JobError::Disconnected)?;
        let completions = self.completion_sender.clone();

        let task: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job))
                .map_err(|payload| JobError::Panicked(panic_message(payload.as_ref())));
            let apply: Completion<C> = Box::new(move |ctx: &mut C| completion(ctx, result));
            // The receiver lives as long as the engine itself.
            let _ = completions.send(apply);
        });

        self.pending.fetch_add(1, Ordering::Relaxed);
        if sender.send(task).is_err() {
            self.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(JobError::Disconnected);
        }
        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Apply the completions that are ready right now, in arrival order.
    ///
    /// Only the completions queued when the call starts are applied; any that
    /// land while draining wait for the next call. Returns the number applied.
    pub fn drain(&self, ctx: &mut C) -> usize {
        let ready = self.completion_receiver.len();
        let mut applied = 0;
        for _ in 0..ready {
            match self.completion_receiver.try_recv() {
                Ok(completion) => {
                    completion(ctx);
                    applied += 1;
                }
                Err(_) => break,
            }
        }
        if applied > 0 {
            self.pending.fetch_sub(applied, Ordering::Relaxed);
            trace!(applied, "completions drained");
        }
        applied
    }

    /// Jobs submitted but not yet drained.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    /// Jobs accepted since the engine started.
    pub fn submitted_total(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    pub fn worker_count(&self) -> usize {
        self.worker_handles.len()
    }

    pub fn is_running(&self) -> bool {
        self.job_sender.is_some()
    }

    /// Stop accepting jobs and join the workers once the queue is empty.
    ///
    /// Completions of jobs that finish during shutdown stay queued and can
    /// still be drained.
    pub fn shutdown(&mut self) {
        if self.job_sender.take().is_none() {
            return;
        }
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
        debug!("work engine stopped");
    }
}

impl<C> Drop for WorkEngine<C> {
    fn drop(&mut self) {
        self.job_sender.take();
        for handle in self.worker_handles.drain(..) {
            let _ = handle.join();
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
